//! Crash Map Main Application
//! Main window with control panel and map viewer.

use crate::charts::{HexMapData, MapStyle};
use crate::config::AppConfig;
use crate::data::{CrashDataCache, DataLoader};
use crate::gui::{ControlPanel, ControlPanelAction, MapViewer, UserSettings};
use crate::pipeline::{render_pass, RenderPass};
use egui::SidePanel;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use std::thread;

/// Loading result from background thread
enum LoadResult {
    Complete { df: Arc<DataFrame>, source: PathBuf },
    Error(String),
}

/// Main application window.
pub struct CrashMapApp {
    config: AppConfig,
    cache: CrashDataCache,
    loader: DataLoader,
    control_panel: ControlPanel,
    map_viewer: MapViewer,
    pass: Option<RenderPass>,

    // Async loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl CrashMapApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        let options = config.data.load_options();
        let mut app = Self {
            control_panel: ControlPanel::new(UserSettings::from_config(&config)),
            cache: CrashDataCache::new(options.clone()),
            loader: DataLoader::new(options),
            map_viewer: MapViewer::new(),
            pass: None,
            load_rx: None,
            is_loading: false,
            config,
        };
        let directory = app.config.data.directory.clone();
        app.start_loading(directory);
        app
    }

    /// Load `path` through the cache on a background thread.
    fn start_loading(&mut self, path: PathBuf) {
        if self.is_loading {
            return;
        }

        self.map_viewer.clear();
        self.pass = None;
        self.control_panel.has_map = false;
        self.control_panel.settings.data_path = Some(path.clone());
        self.control_panel
            .set_status(format!("Loading {}...", path.display()));
        self.set_loading(true);

        let (tx, rx) = channel();
        self.load_rx = Some(rx);
        let cache = self.cache.clone();

        thread::spawn(move || {
            let result = match cache.get_or_load(&path) {
                Ok(df) => LoadResult::Complete { df, source: path },
                Err(e) => LoadResult::Error(e.to_string()),
            };
            let _ = tx.send(result);
        });
    }

    fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
        self.control_panel.is_busy = loading;
    }

    /// Check for loading results
    fn check_load_results(&mut self) {
        let Some(rx) = self.load_rx.take() else {
            return;
        };

        match rx.try_recv() {
            Ok(LoadResult::Complete { df, source }) => {
                self.loader.set_dataframe(df, source);
                self.control_panel.row_count = self.loader.get_row_count();
                self.set_loading(false);
                self.refresh_map();
            }
            Ok(LoadResult::Error(error)) => {
                log::error!("Load failed: {error}");
                self.control_panel.set_status(format!("Error: {error}"));
                self.set_loading(false);
            }
            Err(std::sync::mpsc::TryRecvError::Empty) => self.load_rx = Some(rx),
            Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                self.control_panel
                    .set_status("Error: loader thread stopped");
                self.set_loading(false);
            }
        }
    }

    /// Re-run the aggregation for the current panel settings.
    fn refresh_map(&mut self) {
        let Some(df) = self.loader.get_dataframe() else {
            return;
        };
        let settings = &self.control_panel.settings;
        let render = settings.render_settings(&self.config.render);

        match render_pass(df, settings.metric, &render, &self.config.color_scheme) {
            Ok(pass) => {
                self.control_panel.set_status(format!(
                    "{}: {} hexagons",
                    pass.aggregation.metric,
                    pass.aggregation.bins.len()
                ));
                self.map_viewer.set_map(HexMapData::new(
                    pass.aggregation.clone(),
                    self.config.color_scheme.clone(),
                ));
                self.control_panel.has_map = true;
                self.pass = Some(pass);
            }
            Err(e) => {
                log::error!("Aggregation failed: {e}");
                self.control_panel.set_status(format!("Error: {e}"));
            }
        }
    }

    fn handle_browse_folder(&mut self) {
        if let Some(dir) = rfd::FileDialog::new().pick_folder() {
            self.start_loading(dir);
        }
    }

    fn handle_browse_file(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Crash data", &["csv", "parquet"])
            .pick_file()
        {
            self.start_loading(path);
        }
    }

    fn handle_reload(&mut self) {
        let Some(path) = self.control_panel.settings.data_path.clone() else {
            return;
        };
        self.cache.invalidate();
        self.start_loading(path);
    }

    /// Ask for an output path, then run `write` with it.
    fn handle_export(
        &mut self,
        name: &str,
        extension: &str,
        write: impl FnOnce(&RenderPass, &Path) -> Result<(), crate::pipeline::ExportError>,
    ) -> Option<PathBuf> {
        let pass = self.pass.as_ref()?;
        let file_name = format!("{}.{extension}", pass.aggregation.metric.key());
        let path = rfd::FileDialog::new()
            .add_filter(name, &[extension])
            .set_file_name(file_name)
            .save_file()?;

        match write(pass, &path) {
            Ok(()) => {
                self.control_panel
                    .set_status(format!("Exported {}", path.display()));
                Some(path)
            }
            Err(e) => {
                log::error!("Export failed: {e}");
                self.control_panel.set_status(format!("Error: {e}"));
                None
            }
        }
    }

    fn handle_action(&mut self, action: ControlPanelAction) {
        let render = self
            .control_panel
            .settings
            .render_settings(&self.config.render);
        let scheme = self.config.color_scheme.clone();

        match action {
            ControlPanelAction::BrowseFolder => self.handle_browse_folder(),
            ControlPanelAction::BrowseFile => self.handle_browse_file(),
            ControlPanelAction::Reload => self.handle_reload(),
            ControlPanelAction::SettingsChanged => self.refresh_map(),
            ControlPanelAction::ExportPng => {
                self.handle_export("PNG image", "png", |pass, path| {
                    pass.write_png(path, &render, &scheme)
                });
            }
            ControlPanelAction::ExportHtml => {
                let written = self.handle_export("Web page", "html", |pass, path| {
                    pass.write_html(path, &render, &scheme, MapStyle::from_env())
                });
                if let Some(path) = written {
                    if let Err(e) = open::that(&path) {
                        log::warn!("Could not open {}: {e}", path.display());
                    }
                }
            }
            ControlPanelAction::ExportCsv => {
                self.handle_export("CSV", "csv", |pass, path| pass.write_csv(path));
            }
            ControlPanelAction::None => {}
        }
    }
}

impl eframe::App for CrashMapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for background results
        self.check_load_results();

        // Request repaint while loading
        if self.is_loading {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(300.0)
            .max_width(350.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.control_panel.show(ui);
                    self.handle_action(action);
                });
            });

        // Central panel - Map Viewer
        egui::CentralPanel::default().show(ctx, |ui| {
            self.map_viewer.show(ui);
        });
    }
}
