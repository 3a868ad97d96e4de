use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use ev_dashboard::data::FilterColumn;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    if !state.store.is_loaded() {
        ui.label("Load data first.");
        return;
    }

    // Clone what we need so we can mutate state inside the loop.
    let options = state.filter_options.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for column in FilterColumn::ALL {
                let Some(all_values) = options.get(&column) else {
                    continue;
                };

                let n_selected = state.selection.selected(column).map_or(0, |s| s.len());
                let header_text = if n_selected == 0 {
                    format!("{}  (all)", column.label())
                } else {
                    format!("{}  ({n_selected}/{})", column.label(), all_values.len())
                };

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(column.column_name())
                    .default_open(column != FilterColumn::Brand)
                    .show(ui, |ui: &mut Ui| {
                        if ui.small_button("Clear").clicked() {
                            state.clear_filter(column);
                        }

                        for value in all_values {
                            let mut checked = state.selection.contains(column, value);
                            if ui.checkbox(&mut checked, value.as_str()).changed() {
                                state.toggle_filter_value(column, value);
                            }
                        }
                    });
            }

            ui.separator();
            ui.label(RichText::new(state.filter_summary()).italics());
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(state.store.is_loaded(), egui::Button::new("Clear data"))
                .clicked()
            {
                state.clear();
                ui.close_menu();
            }
        });

        ui.separator();

        if state.store.is_loaded() {
            ui.label(format!(
                "{} vehicles loaded, {} matching",
                state.store.record_count(),
                state.matching
            ));
            ui.separator();
        }

        if ui
            .selectable_label(state.show_tables, "Show tables")
            .clicked()
        {
            state.show_tables = !state.show_tables;
        }

        if let Some(msg) = &state.status_message {
            let color = if msg.starts_with("Error") {
                Color32::RED
            } else {
                ui.visuals().text_color()
            };
            ui.label(RichText::new(msg).color(color));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open vehicle data")
        .add_filter("Supported files", &["csv", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.load_path(&path);
    }
}
