/// Data layer: schema, loading, filtering and the KPI queries.
///
/// Architecture:
/// ```text
///  .csv / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  validate against schema → RecordBatch
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ TabularStore  │  current table, distinct filter values
///   └──────────────┘
///        │  Predicate (from filter::build_predicate)
///        ▼
///   ┌──────────┐
///   │   kpi     │  four fixed aggregations → KpiResult
///   └──────────┘
/// ```

pub mod error;
pub mod filter;
pub mod kpi;
pub mod loader;
pub mod model;
pub mod schema;
pub mod store;

pub use error::{DashboardError, EncodingError, LoadError};
pub use filter::{available_filters, build_predicate, summarize, FilterSelection, Predicate};
pub use model::{FilterColumn, KpiKind, KpiResult, LoadReport};
pub use store::TabularStore;
