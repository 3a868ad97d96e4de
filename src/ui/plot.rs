use std::collections::BTreeMap;

use eframe::egui::{self, Color32, Ui};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, Legend, Plot, PlotPoints, Points};

use ev_dashboard::data::model::{GroupMean, ScatterPoint, Share};
use ev_dashboard::data::{KpiKind, KpiResult};

use crate::state::AppState;

const BAR_COLOR: Color32 = Color32::from_rgb(70, 130, 180);

// ---------------------------------------------------------------------------
// KPI grid (central panel)
// ---------------------------------------------------------------------------

/// Render the 2x2 grid of KPI charts.
pub fn kpi_grid(ui: &mut Ui, state: &AppState) {
    if !state.store.is_loaded() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Load a file to view the KPIs  (File → Open…)");
        });
        return;
    }

    egui::ScrollArea::vertical().show(ui, |ui: &mut Ui| {
        for pair in KpiKind::ALL.chunks(2) {
            ui.columns(2, |cols| {
                for (ui, kind) in cols.iter_mut().zip(pair) {
                    kpi_cell(ui, state, *kind);
                }
            });
            ui.add_space(8.0);
        }
    });
}

fn kpi_cell(ui: &mut Ui, state: &AppState, kind: KpiKind) {
    ui.heading(format!("KPI {}: {}", kind.number(), kind.title()));

    let Some(result) = state.result(kind).filter(|r| !r.is_empty()) else {
        ui.label(kind.no_data_message());
        return;
    };

    let height = state.config.chart_height;
    match result {
        KpiResult::RangeBySegment(rows) => {
            mean_bars(ui, "kpi_range", rows, "Average range (km)", height);
        }
        KpiResult::AccelerationByBrand(rows) => {
            let top = &rows[..rows.len().min(state.config.top_brands)];
            mean_bars(ui, "kpi_accel", top, "0-100 km/h (s)", height);
        }
        KpiResult::BatteryVsEfficiency(points) => scatter(ui, state, points, height),
        KpiResult::BodyTypeDistribution(shares) => share_bars(ui, shares, height),
    }

    if state.show_tables {
        ui.push_id(kind.number(), |ui: &mut Ui| table(ui, result));
    }
}

/// Bar chart with one category per bar, labelled on the x axis.
fn category_bars(
    ui: &mut Ui,
    id: &str,
    bars: Vec<Bar>,
    labels: Vec<String>,
    y_label: &str,
    height: f32,
) {
    Plot::new(id)
        .height(height)
        .y_axis_label(y_label)
        .x_axis_formatter(move |mark, _range| {
            let idx = mark.value.round();
            if (mark.value - idx).abs() > f64::EPSILON || idx < 0.0 {
                return String::new();
            }
            labels.get(idx as usize).cloned().unwrap_or_default()
        })
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).color(BAR_COLOR));
        });
}

fn mean_bars(ui: &mut Ui, id: &str, rows: &[GroupMean], y_label: &str, height: f32) {
    let bars = rows
        .iter()
        .enumerate()
        .map(|(i, r)| Bar::new(i as f64, r.mean).name(&r.group).width(0.7))
        .collect();
    let labels = rows.iter().map(|r| r.group.clone()).collect();
    category_bars(ui, id, bars, labels, y_label, height);
}

fn share_bars(ui: &mut Ui, shares: &[Share], height: f32) {
    let bars = shares
        .iter()
        .enumerate()
        .map(|(i, s)| {
            Bar::new(i as f64, s.percentage)
                .name(format!("{} ({})", s.group, s.count))
                .width(0.7)
        })
        .collect();
    let labels = shares.iter().map(|s| s.group.clone()).collect();
    category_bars(ui, "kpi_body", bars, labels, "Share of vehicles (%)", height);
}

/// One series per segment so the legend doubles as the colour key.
fn scatter(ui: &mut Ui, state: &AppState, points: &[ScatterPoint], height: f32) {
    let mut by_segment: BTreeMap<&str, Vec<[f64; 2]>> = BTreeMap::new();
    for p in points {
        by_segment
            .entry(p.segment.as_str())
            .or_default()
            .push([p.battery_capacity_kwh, p.efficiency_wh_per_km]);
    }

    let hover_points = points.to_vec();
    Plot::new("kpi_scatter")
        .height(height)
        .legend(Legend::default())
        .x_axis_label("Battery capacity (kWh)")
        .y_axis_label("Efficiency (Wh/km)")
        .label_formatter(move |name, value| hover_label(&hover_points, name, value.x, value.y))
        .allow_boxed_zoom(true)
        .show(ui, |plot_ui| {
            for (segment, coords) in by_segment {
                let color = state
                    .segment_colors
                    .as_ref()
                    .map(|cm| cm.color_for(segment))
                    .unwrap_or(Color32::LIGHT_BLUE);
                let series = Points::new(PlotPoints::new(coords))
                    .name(segment)
                    .color(color)
                    .radius(3.0);
                plot_ui.points(series);
            }
        });
}

/// Hover text for the scatter. `segment` is the hovered series name, empty
/// when the cursor is not on a point.
fn hover_label(points: &[ScatterPoint], segment: &str, x: f64, y: f64) -> String {
    let coords = format!("{x:.1} kWh, {y:.0} Wh/km");
    if segment.is_empty() {
        return coords;
    }
    let distance = |p: &ScatterPoint| {
        (p.battery_capacity_kwh - x).powi(2) + (p.efficiency_wh_per_km - y).powi(2)
    };
    points
        .iter()
        .filter(|p| p.segment == segment)
        .min_by(|a, b| distance(a).total_cmp(&distance(b)))
        .map(|p| format!("{} {}\n{segment}\n{coords}", p.brand, p.model))
        .unwrap_or(coords)
}

// ---------------------------------------------------------------------------
// Tabular view of a KPI result
// ---------------------------------------------------------------------------

fn table(ui: &mut Ui, result: &KpiResult) {
    let (headers, rows): (&[&str], Vec<Vec<String>>) = match result {
        KpiResult::RangeBySegment(rows) | KpiResult::AccelerationByBrand(rows) => (
            &["Group", "Mean", "Vehicles"][..],
            rows.iter()
                .map(|r| vec![r.group.clone(), format!("{:.2}", r.mean), r.count.to_string()])
                .collect(),
        ),
        KpiResult::BatteryVsEfficiency(points) => (
            &["Brand", "Model", "Segment", "kWh", "Wh/km"][..],
            points
                .iter()
                .map(|p| {
                    vec![
                        p.brand.clone(),
                        p.model.clone(),
                        p.segment.clone(),
                        format!("{:.1}", p.battery_capacity_kwh),
                        format!("{:.0}", p.efficiency_wh_per_km),
                    ]
                })
                .collect(),
        ),
        KpiResult::BodyTypeDistribution(shares) => (
            &["Body type", "Count", "%"][..],
            shares
                .iter()
                .map(|s| vec![s.group.clone(), s.count.to_string(), format!("{:.2}", s.percentage)])
                .collect(),
        ),
    };

    TableBuilder::new(ui)
        .striped(true)
        .max_scroll_height(200.0)
        .columns(Column::auto().at_least(60.0), headers.len())
        .header(20.0, |mut header| {
            for h in headers {
                header.col(|ui| {
                    ui.strong(*h);
                });
            }
        })
        .body(|mut body| {
            for row in rows {
                body.row(18.0, |mut table_row| {
                    for cell in row {
                        table_row.col(|ui| {
                            ui.label(cell);
                        });
                    }
                });
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(brand: &str, segment: &str, kwh: f64, wh_km: f64) -> ScatterPoint {
        ScatterPoint {
            battery_capacity_kwh: kwh,
            efficiency_wh_per_km: wh_km,
            segment: segment.into(),
            brand: brand.into(),
            model: "M".into(),
        }
    }

    #[test]
    fn hover_names_the_nearest_vehicle_in_the_series() {
        let points = [
            point("Tesla", "C - Medium", 75.0, 150.0),
            point("BMW", "C - Medium", 81.5, 170.0),
            point("Audi", "D - Large", 75.0, 150.0),
        ];
        let label = hover_label(&points, "C - Medium", 81.5, 170.0);
        assert_eq!(label, "BMW M\nC - Medium\n81.5 kWh, 170 Wh/km");

        let label = hover_label(&points, "D - Large", 75.0, 150.0);
        assert!(label.starts_with("Audi M"));

        assert_eq!(hover_label(&points, "", 60.0, 140.0), "60.0 kWh, 140 Wh/km");
    }
}
