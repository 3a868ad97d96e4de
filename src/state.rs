use std::collections::BTreeMap;
use std::path::Path;

use ev_dashboard::config::DashboardConfig;
use ev_dashboard::data::{
    available_filters, build_predicate, summarize, FilterColumn, FilterSelection, KpiKind,
    KpiResult, TabularStore,
};

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full session state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Loaded vehicles (empty until the user loads a file).
    pub store: TabularStore,

    /// Per-column filter selections.
    pub selection: FilterSelection,

    /// Distinct values offered by each filter (cached per load).
    pub filter_options: BTreeMap<FilterColumn, Vec<String>>,

    /// KPI results for the current selection, in `KpiKind::ALL` order (cached).
    pub results: Vec<KpiResult>,

    /// Rows passing the current filters.
    pub matching: usize,

    /// Segment → colour for the scatter chart.
    pub segment_colors: Option<ColorMap>,

    /// Show each KPI's numbers as a table under its chart.
    pub show_tables: bool,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        let store = TabularStore::new(config.load_options());
        let mut state = Self {
            config,
            store,
            selection: FilterSelection::new(),
            filter_options: BTreeMap::new(),
            results: empty_results(),
            matching: 0,
            segment_colors: None,
            show_tables: false,
            status_message: None,
        };
        if let Some(path) = state.config.initial_file.clone() {
            state.load_path(&path);
        }
        state
    }

    /// Load a file, replacing the current table on success. A failed load
    /// leaves the previous table and filters untouched.
    pub fn load_path(&mut self, path: &Path) {
        match self.store.load_path(path) {
            Ok(records) => {
                self.selection.reset();
                self.filter_options = available_filters(&self.store);
                self.segment_colors = self
                    .filter_options
                    .get(&FilterColumn::Segment)
                    .map(|segments| ColorMap::new(segments));
                self.status_message = Some(self.load_message(records));
                self.refresh();
            }
            Err(e) => {
                log::error!("Failed to load file: {e}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    fn load_message(&self, records: usize) -> String {
        let Some(report) = self.store.last_report() else {
            return format!("{records} vehicles loaded");
        };
        if records == 0 {
            return "No valid vehicle found: brand, model, segment and car_body_type must not be empty"
                .to_string();
        }
        let mut msg = format!("{records} vehicles loaded");
        if report.skipped_incomplete > 0 {
            msg.push_str(&format!(", {} incomplete row(s) skipped", report.skipped_incomplete));
        }
        if report.rejected() > 0 {
            msg.push_str(&format!(", {} row(s) with invalid numbers rejected", report.rejected()));
        }
        msg
    }

    pub fn clear(&mut self) {
        self.store.clear();
        self.selection.reset();
        self.filter_options.clear();
        self.segment_colors = None;
        self.status_message = Some("Data cleared".to_string());
        self.refresh();
    }

    /// Recompute `results` and `matching` after a filter change.
    pub fn refresh(&mut self) {
        let predicate = build_predicate(&self.selection);
        self.matching = self.store.matching_count(&predicate);
        match self.store.query_all(&predicate) {
            Ok(results) => self.results = results,
            Err(e) => {
                log::error!("KPI query failed: {e}");
                self.status_message = Some(format!("Error: {e}"));
                self.results = empty_results();
            }
        }
    }

    pub fn result(&self, kind: KpiKind) -> Option<&KpiResult> {
        self.results.iter().find(|r| r.kind() == kind)
    }

    /// Toggle a single value in a column's filter.
    pub fn toggle_filter_value(&mut self, column: FilterColumn, value: &str) {
        self.selection.toggle(column, value);
        self.refresh();
    }

    pub fn clear_filter(&mut self, column: FilterColumn) {
        self.selection.clear_column(column);
        self.refresh();
    }

    pub fn filter_summary(&self) -> String {
        summarize(&self.selection)
    }
}

fn empty_results() -> Vec<KpiResult> {
    KpiKind::ALL.iter().map(|k| KpiResult::empty(*k)).collect()
}
