use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use arrow::array::{Array, AsArray, BooleanArray, StringArray};
use arrow::record_batch::RecordBatch;

use super::model::FilterColumn;
use super::store::TabularStore;

// ---------------------------------------------------------------------------
// Filter selection: which values are accepted per column
// ---------------------------------------------------------------------------

/// Per-column selection state: maps filter column → set of accepted values.
/// If a column is absent or its set is empty, it means "no filter" (show all).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    columns: BTreeMap<FilterColumn, BTreeSet<String>>,
}

impl FilterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: FilterColumn, values: &[&str]) -> Self {
        self.set(column, values.iter().map(|v| v.to_string()).collect());
        self
    }

    pub fn selected(&self, column: FilterColumn) -> Option<&BTreeSet<String>> {
        self.columns.get(&column).filter(|vals| !vals.is_empty())
    }

    pub fn contains(&self, column: FilterColumn, value: &str) -> bool {
        self.columns
            .get(&column)
            .is_some_and(|vals| vals.contains(value))
    }

    /// Toggle a single value in a column's selection.
    pub fn toggle(&mut self, column: FilterColumn, value: &str) {
        let selected = self.columns.entry(column).or_default();
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
        if selected.is_empty() {
            self.columns.remove(&column);
        }
    }

    pub fn set(&mut self, column: FilterColumn, values: BTreeSet<String>) {
        if values.is_empty() {
            self.columns.remove(&column);
        } else {
            self.columns.insert(column, values);
        }
    }

    pub fn clear_column(&mut self, column: FilterColumn) {
        self.columns.remove(&column);
    }

    pub fn reset(&mut self) {
        self.columns.clear();
    }

    pub fn is_unrestricted(&self) -> bool {
        self.columns.values().all(BTreeSet::is_empty)
    }

    /// Restricted columns with their value sets, in column order.
    pub fn iter(&self) -> impl Iterator<Item = (FilterColumn, &BTreeSet<String>)> {
        self.columns
            .iter()
            .filter(|(_, vals)| !vals.is_empty())
            .map(|(col, vals)| (*col, vals))
    }
}

// ---------------------------------------------------------------------------
// Predicate: AND across columns, OR within a column's value set
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    clauses: Vec<(FilterColumn, BTreeSet<String>)>,
}

impl Predicate {
    /// Matches every row.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_trivial(&self) -> bool {
        self.clauses.is_empty()
    }

    /// `lookup` returns the row's value for a column, `None` for null.
    /// A null never matches a constrained column.
    pub fn matches<'a>(&self, lookup: impl Fn(FilterColumn) -> Option<&'a str>) -> bool {
        self.clauses
            .iter()
            .all(|(col, accepted)| lookup(*col).is_some_and(|v| accepted.contains(v)))
    }

    /// Boolean selection vector over `table`, one entry per row.
    pub fn mask(&self, table: &RecordBatch) -> BooleanArray {
        let columns: Vec<(FilterColumn, Option<&StringArray>)> = self
            .clauses
            .iter()
            .map(|(col, _)| {
                let array = table
                    .column_by_name(col.column_name())
                    .and_then(|a| a.as_string_opt::<i32>());
                (*col, array)
            })
            .collect();

        (0..table.num_rows())
            .map(|row| {
                let hit = self.matches(|col| {
                    columns
                        .iter()
                        .find(|(c, _)| *c == col)
                        .and_then(|(_, array)| *array)
                        .filter(|array| array.is_valid(row))
                        .map(|array| array.value(row))
                });
                Some(hit)
            })
            .collect()
    }
}

/// Renders as a SQL `WHERE` fragment, e.g. `brand IN ('Audi', 'BMW') AND segment IN ('F - Luxury')`.
impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.clauses.is_empty() {
            return f.write_str("TRUE");
        }
        for (i, (col, values)) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(" AND ")?;
            }
            let quoted: Vec<String> = values
                .iter()
                .map(|v| format!("'{}'", v.replace('\'', "''")))
                .collect();
            write!(f, "{} IN ({})", col.column_name(), quoted.join(", "))?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Resolver operations
// ---------------------------------------------------------------------------

/// Sorted distinct values of every filterable column in the loaded table.
pub fn available_filters(store: &TabularStore) -> BTreeMap<FilterColumn, Vec<String>> {
    FilterColumn::ALL
        .iter()
        .map(|col| (*col, store.distinct_values(*col).into_iter().collect()))
        .collect()
}

/// One clause per restricted column; an empty selection matches every row.
pub fn build_predicate(selection: &FilterSelection) -> Predicate {
    Predicate {
        clauses: selection
            .iter()
            .map(|(col, vals)| (col, vals.clone()))
            .collect(),
    }
}

/// Human-readable description of the active filters.
pub fn summarize(selection: &FilterSelection) -> String {
    if selection.is_unrestricted() {
        return "No filters applied".to_string();
    }
    selection
        .iter()
        .map(|(col, vals)| {
            let vals: Vec<&str> = vals.iter().map(String::as_str).collect();
            format!("{col}: {}", vals.join(", "))
        })
        .collect::<Vec<_>>()
        .join(" | ")
}
