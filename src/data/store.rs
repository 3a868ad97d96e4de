use std::collections::BTreeSet;
use std::path::Path;

use arrow::array::AsArray;
use arrow::compute::filter_record_batch;
use arrow::record_batch::RecordBatch;

use super::error::Result;
use super::filter::Predicate;
use super::kpi;
use super::loader::{self, LoadOptions, LoadOutcome};
use super::model::{FilterColumn, KpiKind, KpiResult, LoadReport};

// ---------------------------------------------------------------------------
// TabularStore – the loaded vehicle table
// ---------------------------------------------------------------------------

/// In-memory columnar table of vehicles.
///
/// The schema is fixed; a load replaces the whole table, and only once the
/// new file has been fully validated.
#[derive(Debug, Default)]
pub struct TabularStore {
    table: Option<RecordBatch>,
    report: Option<LoadReport>,
    options: LoadOptions,
}

impl TabularStore {
    pub fn new(options: LoadOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Load CSV bytes and return the number of vehicles kept.
    pub fn load_csv(&mut self, bytes: &[u8]) -> Result<usize> {
        let outcome = loader::load_csv_bytes(bytes, self.options)?;
        Ok(self.replace(outcome))
    }

    /// Load a `.csv` or `.parquet` file and return the number of vehicles kept.
    pub fn load_path(&mut self, path: &Path) -> Result<usize> {
        let outcome = loader::load_file(path, self.options)?;
        log::info!("Loaded {}", path.display());
        Ok(self.replace(outcome))
    }

    fn replace(&mut self, outcome: LoadOutcome) -> usize {
        let LoadOutcome { table, report } = outcome;
        if report.skipped_incomplete > 0 {
            log::warn!(
                "Skipped {} row(s) missing brand, model, segment or body type",
                report.skipped_incomplete
            );
        }
        for issue in &report.issues {
            log::debug!("{issue}");
        }
        let records = table.num_rows();
        log::info!("Table holds {records} vehicles");
        self.table = Some(table);
        self.report = Some(report);
        records
    }

    /// Drop all data. Later queries return empty results.
    pub fn clear(&mut self) {
        log::info!("Clearing vehicle table");
        self.table = None;
        self.report = None;
    }

    pub fn is_loaded(&self) -> bool {
        self.table.is_some()
    }

    pub fn record_count(&self) -> usize {
        self.table.as_ref().map_or(0, RecordBatch::num_rows)
    }

    pub fn last_report(&self) -> Option<&LoadReport> {
        self.report.as_ref()
    }

    /// Distinct non-null values of a filter column in the unfiltered table.
    pub fn distinct_values(&self, column: FilterColumn) -> BTreeSet<String> {
        let Some(values) = self
            .table
            .as_ref()
            .and_then(|t| t.column_by_name(column.column_name()))
            .and_then(|a| a.as_string_opt::<i32>())
        else {
            return BTreeSet::new();
        };
        values.iter().flatten().map(str::to_string).collect()
    }

    /// Rows matching `predicate`, or `None` when nothing is loaded.
    pub fn filtered(&self, predicate: &Predicate) -> Result<Option<RecordBatch>> {
        let Some(table) = &self.table else {
            return Ok(None);
        };
        if predicate.is_trivial() {
            return Ok(Some(table.clone()));
        }
        let mask = predicate.mask(table);
        Ok(Some(filter_record_batch(table, &mask)?))
    }

    pub fn matching_count(&self, predicate: &Predicate) -> usize {
        let Some(table) = &self.table else {
            return 0;
        };
        let mask = predicate.mask(table);
        mask.true_count()
    }

    pub fn query_kpi(&self, kind: KpiKind, predicate: &Predicate) -> Result<KpiResult> {
        Ok(match self.filtered(predicate)? {
            Some(rows) => kpi::compute(kind, &rows),
            None => KpiResult::empty(kind),
        })
    }

    /// Run every KPI against the same filtered rows.
    pub fn query_all(&self, predicate: &Predicate) -> Result<Vec<KpiResult>> {
        let rows = self.filtered(predicate)?;
        Ok(KpiKind::ALL
            .iter()
            .map(|kind| match &rows {
                Some(rows) => kpi::compute(*kind, rows),
                None => KpiResult::empty(*kind),
            })
            .collect())
    }
}
