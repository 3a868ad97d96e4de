//! The four fixed aggregations behind the dashboard charts.
//!
//! Each function takes the already-filtered table and returns an empty
//! result (never an error) when nothing matched.

use std::collections::BTreeMap;

use arrow::array::{Array, AsArray, Float64Array, StringArray};
use arrow::datatypes::Float64Type;
use arrow::record_batch::RecordBatch;

use super::model::{GroupMean, KpiKind, KpiResult, ScatterPoint, Share};
use super::schema;

pub fn compute(kind: KpiKind, table: &RecordBatch) -> KpiResult {
    match kind {
        KpiKind::RangeBySegment => {
            let mut rows = group_mean(table, schema::SEGMENT, schema::RANGE);
            rows.sort_by(|a, b| b.mean.total_cmp(&a.mean).then_with(|| a.group.cmp(&b.group)));
            KpiResult::RangeBySegment(rows)
        }
        KpiKind::AccelerationByBrand => {
            let mut rows = group_mean(table, schema::BRAND, schema::ACCELERATION);
            rows.sort_by(|a, b| a.mean.total_cmp(&b.mean).then_with(|| a.group.cmp(&b.group)));
            KpiResult::AccelerationByBrand(rows)
        }
        KpiKind::BatteryVsEfficiency => KpiResult::BatteryVsEfficiency(battery_vs_efficiency(table)),
        KpiKind::BodyTypeDistribution => KpiResult::BodyTypeDistribution(body_type_shares(table)),
    }
}

fn text<'a>(table: &'a RecordBatch, name: &str) -> Option<&'a StringArray> {
    table.column_by_name(name)?.as_string_opt::<i32>()
}

fn measure<'a>(table: &'a RecordBatch, name: &str) -> Option<&'a Float64Array> {
    table.column_by_name(name)?.as_primitive_opt::<Float64Type>()
}

/// Mean of `value_col` per distinct `group_col`. Null measures are left out
/// of the mean; a group with no non-null measure is left out entirely.
fn group_mean(table: &RecordBatch, group_col: &str, value_col: &str) -> Vec<GroupMean> {
    let (Some(groups), Some(values)) = (text(table, group_col), measure(table, value_col)) else {
        return Vec::new();
    };

    let mut acc: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for row in 0..table.num_rows() {
        if groups.is_null(row) || values.is_null(row) {
            continue;
        }
        let entry = acc.entry(groups.value(row)).or_default();
        entry.0 += values.value(row);
        entry.1 += 1;
    }

    acc.into_iter()
        .map(|(group, (sum, count))| GroupMean {
            group: group.to_string(),
            mean: sum / count as f64,
            count,
        })
        .collect()
}

/// One point per vehicle with both measures present, in table order.
fn battery_vs_efficiency(table: &RecordBatch) -> Vec<ScatterPoint> {
    let (Some(battery), Some(efficiency), Some(segment), Some(brand), Some(model)) = (
        measure(table, schema::BATTERY_CAPACITY),
        measure(table, schema::EFFICIENCY),
        text(table, schema::SEGMENT),
        text(table, schema::BRAND),
        text(table, schema::MODEL),
    ) else {
        return Vec::new();
    };

    let label = |array: &StringArray, row: usize| {
        if array.is_null(row) {
            String::new()
        } else {
            array.value(row).to_string()
        }
    };

    (0..table.num_rows())
        .filter(|&row| battery.is_valid(row) && efficiency.is_valid(row))
        .map(|row| ScatterPoint {
            battery_capacity_kwh: battery.value(row),
            efficiency_wh_per_km: efficiency.value(row),
            segment: label(segment, row),
            brand: label(brand, row),
            model: label(model, row),
        })
        .collect()
}

/// Count and share of each body type among the matching rows, largest first.
fn body_type_shares(table: &RecordBatch) -> Vec<Share> {
    let Some(body) = text(table, schema::BODY_TYPE) else {
        return Vec::new();
    };

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in body.iter().flatten() {
        *counts.entry(value).or_default() += 1;
    }
    let total: usize = counts.values().sum();
    if total == 0 {
        return Vec::new();
    }

    let mut shares: Vec<Share> = counts
        .into_iter()
        .map(|(group, count)| Share {
            group: group.to_string(),
            count,
            percentage: count as f64 / total as f64 * 100.0,
        })
        .collect();
    shares.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.group.cmp(&b.group)));
    shares
}
