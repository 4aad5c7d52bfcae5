//! Map Viewer Widget
//! Central panel showing the hex map, its legend and the busiest bins.

use crate::charts::{HexMapData, HexMapPlotter};
use crate::hex::HexBin;
use egui::{Color32, RichText, ScrollArea};

const TABLE_ROWS: usize = 10;
const MIN_MAP_HEIGHT: f32 = 320.0;

#[derive(Default)]
pub struct MapViewer {
    pub map: Option<HexMapData>,
    pub hovered: Option<HexBin>,
}

impl MapViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.map = None;
        self.hovered = None;
    }

    pub fn set_map(&mut self, map: HexMapData) {
        self.map = Some(map);
        self.hovered = None;
    }

    pub fn show(&mut self, ui: &mut egui::Ui) {
        let Some(map) = &self.map else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        };

        let aggregation = &map.aggregation;
        ui.vertical_centered(|ui| {
            ui.label(
                RichText::new("Mapping Philadelphia Motor Vehicle Crashes")
                    .size(22.0)
                    .strong(),
            );
        });
        ui.horizontal(|ui| {
            ui.label(
                RichText::new(format!(
                    "{}: {} in {} hexagons of {} m",
                    aggregation.metric,
                    aggregation.total_value(),
                    aggregation.bins.len(),
                    aggregation.radius()
                ))
                .size(13.0),
            );
            if let Some(legend) = &map.legend {
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Min), |ui| {
                    HexMapPlotter::draw_legend(ui, legend);
                });
            }
        });
        ui.add_space(6.0);

        if aggregation.is_empty() {
            ui.label(
                RichText::new(format!("No crashes recorded for {}", aggregation.metric))
                    .color(Color32::GRAY),
            );
            return;
        }

        let map_height = (ui.available_height() * 0.65).max(MIN_MAP_HEIGHT);
        self.hovered = HexMapPlotter::draw_hex_map(ui, map, map_height);

        ui.add_space(8.0);
        ScrollArea::vertical()
            .auto_shrink([false, true])
            .show(ui, |ui| {
                ui.label(RichText::new("Busiest hexagons").size(14.0).strong());
                HexMapPlotter::draw_bin_table(ui, map, TABLE_ROWS);
            });
    }
}
