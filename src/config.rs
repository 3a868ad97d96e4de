use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::loader::LoadOptions;

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV: &str = "EV_DASHBOARD_CONFIG";

/// Dashboard settings. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Reject the whole file on a non-numeric measure instead of the row.
    pub strict_numeric: bool,
    /// How many brands the acceleration chart shows.
    pub top_brands: usize,
    pub chart_height: f32,
    /// Loaded on startup when set.
    pub initial_file: Option<PathBuf>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            strict_numeric: false,
            top_brands: 15,
            chart_height: 400.0,
            initial_file: None,
        }
    }
}

impl DashboardConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Config from `EV_DASHBOARD_CONFIG`, or defaults when unset.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_path(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            strict_numeric: self.strict_numeric,
        }
    }
}
