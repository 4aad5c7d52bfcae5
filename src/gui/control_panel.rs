//! Control Panel Widget
//! Left side panel with data source, map filters and appearance controls.

use crate::config::{AppConfig, RenderMode, RenderSettings};
use crate::hex::MetricSelector;
use egui::{Color32, ComboBox, RichText};
use std::path::PathBuf;
use strum::IntoEnumIterator;

pub const RADIUS_RANGE: std::ops::RangeInclusive<u32> = 100..=1000;
pub const RADIUS_STEP: f64 = 100.0;
pub const OPACITY_RANGE: std::ops::RangeInclusive<u32> = 30..=100;
pub const OPACITY_STEP: f64 = 10.0;

const ABOUT_TEXT: &str = "To explore the map in depth, you can:\n\
    1. Scroll or pinch to zoom in/out.\n\
    2. Click and drag to move around.\n\
    3. Hover a hexagon to see its value.";

/// User settings for the map
#[derive(Debug, Clone, PartialEq)]
pub struct UserSettings {
    pub data_path: Option<PathBuf>,
    pub metric: MetricSelector,
    pub mode: RenderMode,
    /// Bin radius in meters.
    pub radius_m: u32,
    /// Layer opacity in percent.
    pub opacity_pct: u32,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl UserSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            data_path: Some(config.data.directory.clone()),
            metric: config.metric,
            mode: config.render.mode,
            radius_m: (config.render.radius.round() as u32)
                .clamp(*RADIUS_RANGE.start(), *RADIUS_RANGE.end()),
            opacity_pct: ((config.render.opacity * 100.0).round() as u32)
                .clamp(*OPACITY_RANGE.start(), *OPACITY_RANGE.end()),
        }
    }

    /// Render settings with the panel's choices applied over `base`.
    pub fn render_settings(&self, base: &RenderSettings) -> RenderSettings {
        RenderSettings {
            mode: self.mode,
            radius: self.radius_m as f64,
            opacity: self.opacity_pct as f64 / 100.0,
            ..base.clone()
        }
    }
}

/// Left side control panel with data source and map controls.
pub struct ControlPanel {
    pub settings: UserSettings,
    pub row_count: usize,
    pub status: String,
    pub is_busy: bool,
    pub has_map: bool,
}

impl ControlPanel {
    pub fn new(settings: UserSettings) -> Self {
        Self {
            settings,
            row_count: 0,
            status: "Ready".to_string(),
            is_busy: false,
            has_map: false,
        }
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;
        let before = self.settings.clone();

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("Philadelphia Crash Map")
                    .size(20.0)
                    .color(Color32::from_rgb(247, 131, 17)),
            );
            ui.label(
                RichText::new("Motor vehicle crashes, 2010-2021")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source Section =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                let path_text = self
                    .settings
                    .data_path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "No data selected".to_string());
                ui.label(RichText::new(&path_text).size(12.0));
                ui.label(
                    RichText::new(format!("{} located crashes", self.row_count))
                        .size(11.0)
                        .color(Color32::GRAY),
                );

                ui.add_enabled_ui(!self.is_busy, |ui| {
                    ui.horizontal(|ui| {
                        if ui.button("📂 Folder").clicked() {
                            action = ControlPanelAction::BrowseFolder;
                        }
                        if ui.button("📄 File").clicked() {
                            action = ControlPanelAction::BrowseFile;
                        }
                        if ui.button("⟳ Reload").clicked() {
                            action = ControlPanelAction::Reload;
                        }
                    });
                });
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Map Filters Section =====
        ui.label(RichText::new("🔎 Map Filters").size(14.0).strong());
        ui.add_space(5.0);

        ui.horizontal(|ui| {
            ui.label("Filter Data By:");
            ComboBox::from_id_salt("metric")
                .width(170.0)
                .selected_text(self.settings.metric.to_string())
                .show_ui(ui, |ui| {
                    for metric in MetricSelector::iter() {
                        ui.selectable_value(&mut self.settings.metric, metric, metric.to_string());
                    }
                });
        });

        ui.add_space(5.0);
        ui.horizontal(|ui| {
            ui.label("Select Mode:");
            for mode in RenderMode::iter() {
                ui.radio_value(&mut self.settings.mode, mode, mode.to_string());
            }
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Map Appearance Section =====
        ui.label(RichText::new("🎨 Map Appearance").size(14.0).strong());
        ui.add_space(5.0);

        ui.label("Hexagon Bin Size (in meters):");
        ui.add(egui::Slider::new(&mut self.settings.radius_m, RADIUS_RANGE).step_by(RADIUS_STEP));
        ui.add_space(5.0);
        ui.label("Hexagon Opacity (%):");
        ui.add(
            egui::Slider::new(&mut self.settings.opacity_pct, OPACITY_RANGE).step_by(OPACITY_STEP),
        );

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Export Section =====
        ui.label(RichText::new("💾 Export").size(14.0).strong());
        ui.add_space(5.0);
        ui.add_enabled_ui(self.has_map && !self.is_busy, |ui| {
            ui.horizontal(|ui| {
                if ui.button("PNG").clicked() {
                    action = ControlPanelAction::ExportPng;
                }
                if ui.button("HTML").clicked() {
                    action = ControlPanelAction::ExportHtml;
                }
                if ui.button("CSV").clicked() {
                    action = ControlPanelAction::ExportCsv;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Status Section =====
        if self.is_busy {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(RichText::new(&self.status).size(11.0));
            });
        } else {
            let status_color = if self.status.starts_with("Error") {
                Color32::from_rgb(220, 53, 69)
            } else {
                Color32::GRAY
            };
            ui.label(RichText::new(&self.status).size(11.0).color(status_color));
        }

        ui.add_space(15.0);
        ui.separator();
        egui::CollapsingHeader::new("About")
            .default_open(true)
            .show(ui, |ui| {
                ui.label(RichText::new(ABOUT_TEXT).size(11.0));
            });

        if action == ControlPanelAction::None && self.settings != before {
            action = ControlPanelAction::SettingsChanged;
        }
        action
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    BrowseFolder,
    BrowseFile,
    Reload,
    SettingsChanged,
    ExportPng,
    ExportHtml,
    ExportCsv,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_slider_defaults() {
        let settings = UserSettings::default();
        assert_eq!(settings.radius_m, 300);
        assert_eq!(settings.opacity_pct, 50);
        assert_eq!(settings.metric, MetricSelector::TotalCollisions);
        assert_eq!(settings.mode, RenderMode::ThreeD);
    }

    #[test]
    fn config_values_are_clamped_to_sliders() {
        let mut config = AppConfig::default();
        config.render.radius = 5000.0;
        config.render.opacity = 0.1;
        let settings = UserSettings::from_config(&config);
        assert_eq!(settings.radius_m, 1000);
        assert_eq!(settings.opacity_pct, 30);
    }

    #[test]
    fn panel_choices_override_render_settings() {
        let settings = UserSettings {
            mode: RenderMode::TwoD,
            radius_m: 700,
            opacity_pct: 80,
            ..UserSettings::default()
        };
        let render = settings.render_settings(&RenderSettings::default());
        assert_eq!(render.mode, RenderMode::TwoD);
        assert_eq!(render.radius, 700.0);
        assert_eq!(render.opacity, 0.8);
        assert_eq!(render.zoom, 9.95);
    }
}
