//! Hex Map Plotter Module
//! Draws an aggregation pass as interactive hexagons using egui_plot.

use super::legend::{format_value, Legend};
use super::palette::{ColorScheme, Rgba};
use crate::hex::{HexAggregation, HexBin, PlanarPoint};
use egui::{Color32, RichText, Stroke};
use egui_plot::{Plot, PlotPoints, Polygon};

/// Outline drawn around every hexagon.
pub const OUTLINE_COLOR: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 90);

/// Map plus the scheme it is colored with.
#[derive(Clone)]
pub struct HexMapData {
    pub aggregation: HexAggregation,
    pub legend: Option<Legend>,
    pub scheme: ColorScheme,
}

impl HexMapData {
    pub fn new(aggregation: HexAggregation, scheme: ColorScheme) -> Self {
        let legend = Legend::from_aggregation(&aggregation, &scheme);
        Self {
            aggregation,
            legend,
            scheme,
        }
    }

    /// Fill color of a bin, with the layer opacity applied.
    pub fn bin_color(&self, bin: &HexBin) -> Color32 {
        let color = match self.aggregation.value_range {
            Some(range) => self.scheme.color_for(bin.value as f64, range),
            None => self.scheme.first(),
        };
        to_color32(color, self.aggregation.opacity)
    }

    /// The `n` highest-valued bins, ties broken by coordinate.
    pub fn top_bins(&self, n: usize) -> Vec<HexBin> {
        let mut bins = self.aggregation.bins.clone();
        bins.sort_by(|a, b| b.value.cmp(&a.value).then(a.coord.cmp(&b.coord)));
        bins.truncate(n);
        bins
    }
}

/// Scheme color scaled by `opacity`.
pub fn to_color32(color: Rgba, opacity: f64) -> Color32 {
    let alpha = (color.a() as f64 * opacity.clamp(0.0, 1.0)).round() as u8;
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}

/// Creates the interactive hex map using egui_plot.
pub struct HexMapPlotter;

impl HexMapPlotter {
    /// Draw the hexagons in projected meters. Returns the bin under the
    /// pointer, if any.
    pub fn draw_hex_map(ui: &mut egui::Ui, data: &HexMapData, height: f32) -> Option<HexBin> {
        let aggregation = &data.aggregation;
        let title = aggregation.metric.to_string();

        let response = Plot::new("hex_map")
            .height(height)
            .data_aspect(1.0)
            .show_axes([false, false])
            .show_grid([false, false])
            .allow_scroll(false)
            .show_x(false)
            .show_y(false)
            .show(ui, |plot_ui| {
                for bin in &aggregation.bins {
                    let corners: PlotPoints = aggregation
                        .grid
                        .vertices(bin.coord)
                        .iter()
                        .map(|v| [v.x, v.y])
                        .collect();
                    plot_ui.polygon(
                        Polygon::new(corners)
                            .fill_color(data.bin_color(bin))
                            .stroke(Stroke::new(0.5, OUTLINE_COLOR)),
                    );
                }

                plot_ui
                    .pointer_coordinate()
                    .and_then(|p| aggregation.bin_at(PlanarPoint::new(p.x, p.y)).copied())
            });

        let hovered = response.inner.filter(|_| response.response.hovered());
        if let Some(bin) = hovered {
            response.response.on_hover_ui_at_pointer(|ui| {
                ui.label(RichText::new(format!("{title} : {}", bin.value)).strong());
                ui.label(format!(
                    "{:.5}, {:.5}  ({} crashes)",
                    bin.position.latitude, bin.position.longitude, bin.count
                ));
            });
        }
        hovered
    }

    /// Horizontal swatch strip with Low/High captions.
    pub fn draw_legend(ui: &mut egui::Ui, legend: &Legend) {
        egui::Frame::none()
            .fill(Color32::from_rgba_unmultiplied(0, 0, 0, 180))
            .rounding(5.0)
            .inner_margin(6.0)
            .show(ui, |ui| {
                if !legend.title.is_empty() {
                    ui.label(RichText::new(&legend.title).color(Color32::WHITE).size(11.0));
                }
                ui.horizontal(|ui| {
                    ui.spacing_mut().item_spacing.x = 2.0;
                    for entry in &legend.entries {
                        let (rect, response) =
                            ui.allocate_exact_size(egui::vec2(20.0, 10.0), egui::Sense::hover());
                        ui.painter().rect_filled(rect, 0.0, to_color32(entry.color, 1.0));
                        response.on_hover_text(entry.label());
                    }
                });
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new(format!("Low ({})", format_value(legend.range.min)))
                            .color(Color32::WHITE)
                            .size(10.0),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(
                            RichText::new(format!("High ({})", format_value(legend.range.max)))
                                .color(Color32::WHITE)
                                .size(10.0),
                        );
                    });
                });
            });
    }

    /// Table of the highest-valued bins.
    pub fn draw_bin_table(ui: &mut egui::Ui, data: &HexMapData, rows: usize) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                egui::Grid::new("hex_bin_table")
                    .striped(true)
                    .min_col_width(55.0)
                    .spacing([8.0, 4.0])
                    .show(ui, |ui| {
                        ui.label(RichText::new("").size(11.0));
                        ui.label(RichText::new("Latitude").strong().size(11.0));
                        ui.label(RichText::new("Longitude").strong().size(11.0));
                        ui.label(RichText::new("Value").strong().size(11.0));
                        ui.label(RichText::new("Crashes").strong().size(11.0));
                        ui.end_row();

                        for bin in data.top_bins(rows) {
                            let (rect, _) =
                                ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::hover());
                            ui.painter().rect_filled(rect, 2.0, data.bin_color(&bin));
                            ui.label(
                                RichText::new(format!("{:.5}", bin.position.latitude)).size(11.0),
                            );
                            ui.label(
                                RichText::new(format!("{:.5}", bin.position.longitude)).size(11.0),
                            );
                            ui.label(RichText::new(bin.value.to_string()).size(11.0));
                            ui.label(RichText::new(bin.count.to_string()).size(11.0));
                            ui.end_row();
                        }
                    });
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CrashRecord;
    use crate::hex::{AggregationRequest, HexAggregator, MetricSelector};

    fn data() -> HexMapData {
        let mut rows = vec![
            CrashRecord::at(-75.16, 39.95),
            CrashRecord::at(-75.05, 40.05),
            CrashRecord::at(-75.20, 39.90),
        ];
        rows[0].injury_count = 5;
        rows[1].injury_count = 1;
        rows[2].injury_count = 3;
        let df = CrashRecord::to_dataframe(&rows).unwrap();
        let agg = HexAggregator::aggregate(
            &df,
            &AggregationRequest {
                metric: MetricSelector::TotalInjured,
                radius: 300.0,
                opacity: 0.5,
            },
        )
        .unwrap();
        HexMapData::new(agg, ColorScheme::default())
    }

    #[test]
    fn opacity_scales_alpha() {
        let c = to_color32(Rgba::rgb(10, 20, 30), 0.5);
        assert_eq!(c.a(), 128);
        assert_eq!(to_color32(Rgba::rgb(10, 20, 30), 1.0).a(), 255);
    }

    #[test]
    fn top_bins_are_sorted_by_value() {
        let data = data();
        let values: Vec<u64> = data.top_bins(2).iter().map(|b| b.value).collect();
        assert_eq!(values, vec![5, 3]);
    }

    #[test]
    fn legend_is_built_with_the_map() {
        let data = data();
        let legend = data.legend.as_ref().unwrap();
        assert_eq!(legend.title, "Total Injured");
        assert_eq!(legend.entries.len(), data.scheme.len());
    }
}
