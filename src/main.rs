mod app;
mod color;
mod state;
mod ui;

use anyhow::{anyhow, Result};
use app::EvDashboardApp;
use eframe::egui;
use ev_dashboard::config::DashboardConfig;
use state::AppState;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = DashboardConfig::from_env()?;
    log::debug!("Using config {config:?}");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 950.0])
            .with_min_inner_size([800.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "EV Analytics Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(EvDashboardApp::new(AppState::new(config))))),
    )
    .map_err(|e| anyhow!("running dashboard: {e}"))
}
