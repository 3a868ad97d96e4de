//! Electric-vehicle specification dashboard: load a CSV of vehicles, filter
//! by brand, segment and body type, and compute the four chart KPIs.

pub mod config;
pub mod data;
