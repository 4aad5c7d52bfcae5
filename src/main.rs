//! Philadelphia Crash Map - hexagon-binned crash explorer.

use anyhow::anyhow;
use clap::Parser;
use eframe::egui;
use phila_crash_map::cli::{run_export, run_summary, Cli, Commands};
use phila_crash_map::config::AppConfig;
use phila_crash_map::gui::CrashMapApp;

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let cli = Cli::parse();
    let config = cli.app_config()?;

    match cli.command {
        None | Some(Commands::Gui) => run_gui(config),
        Some(Commands::Export {
            metric,
            radius,
            opacity,
            mode,
            csv,
            png,
            html,
            json,
        }) => run_export(config, metric, radius, opacity, mode, csv, png, html, json),
        Some(Commands::Summary {
            threshold,
            outlier_threshold,
            include_non_numeric,
            plots,
        }) => run_summary(
            &config,
            threshold,
            outlier_threshold,
            include_non_numeric,
            plots.as_deref(),
        ),
    }
}

fn run_gui(config: AppConfig) -> anyhow::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1100.0, 700.0])
            .with_title("Philadelphia Crash Map"),
        ..Default::default()
    };

    eframe::run_native(
        "Philadelphia Crash Map",
        options,
        Box::new(|cc| Ok(Box::new(CrashMapApp::new(cc, config)))),
    )
    .map_err(|e| anyhow!("viewer failed: {e}"))
}
