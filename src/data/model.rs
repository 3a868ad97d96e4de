use std::fmt;

use serde::Serialize;

use super::schema;

// ---------------------------------------------------------------------------
// FilterColumn – the categorical columns a user can restrict
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterColumn {
    Brand,
    Segment,
    BodyType,
}

impl FilterColumn {
    pub const ALL: [FilterColumn; 3] = [
        FilterColumn::Brand,
        FilterColumn::Segment,
        FilterColumn::BodyType,
    ];

    /// Name of the backing column in the table.
    pub fn column_name(self) -> &'static str {
        match self {
            FilterColumn::Brand => schema::BRAND,
            FilterColumn::Segment => schema::SEGMENT,
            FilterColumn::BodyType => schema::BODY_TYPE,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FilterColumn::Brand => "Brand",
            FilterColumn::Segment => "Segment",
            FilterColumn::BodyType => "Body type",
        }
    }
}

impl fmt::Display for FilterColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

// ---------------------------------------------------------------------------
// Load report
// ---------------------------------------------------------------------------

/// A schema problem found in one row that did not abort the load.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ValidationIssue {
    /// Row dropped because a numeric cell did not parse.
    Rejected {
        line: u64,
        column: String,
        value: String,
    },
    /// Row kept, but a measure is below zero.
    Negative { line: u64, column: String, value: f64 },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::Rejected {
                line,
                column,
                value,
            } => write!(f, "line {line}: rejected, {column} = '{value}' is not a number"),
            ValidationIssue::Negative {
                line,
                column,
                value,
            } => write!(f, "line {line}: {column} is negative ({value})"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    /// Rows that made it into the table.
    pub records: usize,
    /// Rows dropped for lacking brand, model, segment or body type.
    pub skipped_incomplete: usize,
    pub issues: Vec<ValidationIssue>,
}

impl LoadReport {
    pub fn rejected(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| matches!(i, ValidationIssue::Rejected { .. }))
            .count()
    }
}

// ---------------------------------------------------------------------------
// KPI definitions and results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KpiKind {
    RangeBySegment,
    AccelerationByBrand,
    BatteryVsEfficiency,
    BodyTypeDistribution,
}

impl KpiKind {
    pub const ALL: [KpiKind; 4] = [
        KpiKind::RangeBySegment,
        KpiKind::AccelerationByBrand,
        KpiKind::BatteryVsEfficiency,
        KpiKind::BodyTypeDistribution,
    ];

    pub fn number(self) -> u8 {
        match self {
            KpiKind::RangeBySegment => 1,
            KpiKind::AccelerationByBrand => 2,
            KpiKind::BatteryVsEfficiency => 3,
            KpiKind::BodyTypeDistribution => 4,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            KpiKind::RangeBySegment => "Average range by segment (km)",
            KpiKind::AccelerationByBrand => "Average 0-100 km/h by brand (s)",
            KpiKind::BatteryVsEfficiency => "Battery capacity vs efficiency",
            KpiKind::BodyTypeDistribution => "Distribution by body type",
        }
    }

    /// Shown in place of the chart when no rows matched.
    pub fn no_data_message(self) -> String {
        format!("No data available for KPI {}", self.number())
    }
}

/// Mean of a measure over one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMean {
    pub group: String,
    pub mean: f64,
    /// Rows contributing a non-null measure.
    pub count: usize,
}

/// One vehicle in the battery/efficiency scatter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub battery_capacity_kwh: f64,
    pub efficiency_wh_per_km: f64,
    pub segment: String,
    pub brand: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Share {
    pub group: String,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "rows", rename_all = "snake_case")]
pub enum KpiResult {
    RangeBySegment(Vec<GroupMean>),
    AccelerationByBrand(Vec<GroupMean>),
    BatteryVsEfficiency(Vec<ScatterPoint>),
    BodyTypeDistribution(Vec<Share>),
}

impl KpiResult {
    pub fn empty(kind: KpiKind) -> Self {
        match kind {
            KpiKind::RangeBySegment => KpiResult::RangeBySegment(Vec::new()),
            KpiKind::AccelerationByBrand => KpiResult::AccelerationByBrand(Vec::new()),
            KpiKind::BatteryVsEfficiency => KpiResult::BatteryVsEfficiency(Vec::new()),
            KpiKind::BodyTypeDistribution => KpiResult::BodyTypeDistribution(Vec::new()),
        }
    }

    pub fn kind(&self) -> KpiKind {
        match self {
            KpiResult::RangeBySegment(_) => KpiKind::RangeBySegment,
            KpiResult::AccelerationByBrand(_) => KpiKind::AccelerationByBrand,
            KpiResult::BatteryVsEfficiency(_) => KpiKind::BatteryVsEfficiency,
            KpiResult::BodyTypeDistribution(_) => KpiKind::BodyTypeDistribution,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            KpiResult::RangeBySegment(rows) | KpiResult::AccelerationByBrand(rows) => rows.len(),
            KpiResult::BatteryVsEfficiency(points) => points.len(),
            KpiResult::BodyTypeDistribution(shares) => shares.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Group means for KPI 1 and 2, `None` for the other shapes.
    pub fn means(&self) -> Option<&[GroupMean]> {
        match self {
            KpiResult::RangeBySegment(rows) | KpiResult::AccelerationByBrand(rows) => {
                Some(rows.as_slice())
            }
            _ => None,
        }
    }
}
