//! Static Map Renderer
//! Draws one aggregation pass to a PNG with plotters.
//!
//! Layout:
//! 1. Title: "{metric} ({radius} m bins)" top left
//! 2. Map: hexagons fitted to the image, north up, colored by the scheme
//! 3. Legend column on the right: one swatch per class with its range

use super::legend::{format_value, Legend};
use super::palette::{ColorScheme, Rgba};
use crate::hex::{HexAggregation, PlanarPoint};
use image::{ImageFormat, RgbImage};
use plotters::prelude::*;
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid image size {0}x{1}")]
    InvalidSize(u32, u32),
    #[error("Drawing failed: {0}")]
    Draw(String),
    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),
}

const BACKGROUND: RGBColor = RGBColor(17, 17, 17);
const OUTLINE: RGBColor = RGBColor(0, 0, 0);
const TEXT: RGBColor = RGBColor(235, 235, 235);

const BAR: RGBColor = RGBColor(52, 152, 219);

const TITLE_H: u32 = 40;
const LEGEND_W: u32 = 190;
const PADDING: f64 = 20.0;

/// Pixel rectangle the map is fitted into.
#[derive(Debug, Clone, Copy)]
struct Viewport {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

/// Planar bounds of the bins and the scale that fits them into a viewport.
#[derive(Debug, Clone, Copy)]
struct Projection {
    min_x: f64,
    max_y: f64,
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl Projection {
    fn fit(aggregation: &HexAggregation, view: Viewport) -> Option<Self> {
        let radius = aggregation.radius();
        let mut bins = aggregation.bins.iter();
        let first = bins.next()?;
        let (mut min_x, mut max_x) = (first.center.x, first.center.x);
        let (mut min_y, mut max_y) = (first.center.y, first.center.y);
        for bin in bins {
            min_x = min_x.min(bin.center.x);
            max_x = max_x.max(bin.center.x);
            min_y = min_y.min(bin.center.y);
            max_y = max_y.max(bin.center.y);
        }
        min_x -= radius;
        max_x += radius;
        min_y -= radius;
        max_y += radius;

        let span_x = max_x - min_x;
        let span_y = max_y - min_y;
        let scale = ((view.width - 2.0 * PADDING) / span_x).min((view.height - 2.0 * PADDING) / span_y);
        Some(Self {
            min_x,
            max_y,
            scale,
            offset_x: view.left + (view.width - span_x * scale) / 2.0,
            offset_y: view.top + (view.height - span_y * scale) / 2.0,
        })
    }

    fn map(&self, p: PlanarPoint) -> (i32, i32) {
        let x = self.offset_x + (p.x - self.min_x) * self.scale;
        let y = self.offset_y + (self.max_y - p.y) * self.scale;
        (x.round() as i32, y.round() as i32)
    }
}

fn to_rgb(color: Rgba) -> RGBColor {
    RGBColor(color.r(), color.g(), color.b())
}

fn draw_err<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Draw(e.to_string())
}

pub struct StaticMapRenderer;

impl StaticMapRenderer {
    /// Render `aggregation` to an RGB image of `width` x `height` pixels.
    pub fn render(
        aggregation: &HexAggregation,
        legend: Option<&Legend>,
        scheme: &ColorScheme,
        width: u32,
        height: u32,
    ) -> Result<RgbImage, RenderError> {
        if width <= LEGEND_W || height <= TITLE_H {
            return Err(RenderError::InvalidSize(width, height));
        }

        let mut buffer = vec![0u8; width as usize * height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            Self::draw_map(&root, aggregation, legend, scheme, (width, height))?;
        }

        RgbImage::from_raw(width, height, buffer).ok_or(RenderError::InvalidSize(width, height))
    }

    /// Render and encode as PNG bytes.
    pub fn render_png(
        aggregation: &HexAggregation,
        legend: Option<&Legend>,
        scheme: &ColorScheme,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        let image = Self::render(aggregation, legend, scheme, width, height)?;
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }

    /// Render straight to a PNG file through the plotters bitmap encoder.
    pub fn save_png(
        path: &Path,
        aggregation: &HexAggregation,
        legend: Option<&Legend>,
        scheme: &ColorScheme,
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        if width <= LEGEND_W || height <= TITLE_H {
            return Err(RenderError::InvalidSize(width, height));
        }
        let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
        Self::draw_map(&root, aggregation, legend, scheme, (width, height))?;
        log::info!("Saved map image to {}", path.display());
        Ok(())
    }

    fn draw_map<DB: DrawingBackend>(
        root: &DrawingArea<DB, plotters::coord::Shift>,
        aggregation: &HexAggregation,
        legend: Option<&Legend>,
        scheme: &ColorScheme,
        (width, height): (u32, u32),
    ) -> Result<(), RenderError> {
        root.fill(&BACKGROUND).map_err(draw_err)?;

        let title = format!(
            "{} ({} m bins)",
            aggregation.metric,
            format_value(aggregation.radius())
        );
        Self::draw_text(root, &title, (15, 12), 22);

        let map_w = if legend.is_some() { width - LEGEND_W } else { width };
        let view = Viewport {
            left: 0.0,
            top: TITLE_H as f64,
            width: map_w as f64,
            height: (height - TITLE_H) as f64,
        };

        match Projection::fit(aggregation, view) {
            Some(projection) => Self::draw_bins(root, aggregation, scheme, projection)?,
            None => {
                let message = format!("No crashes for {}", aggregation.metric);
                Self::draw_text(root, &message, (map_w as i32 / 2 - 90, height as i32 / 2), 18);
            }
        }

        if let Some(legend) = legend {
            Self::draw_legend(root, legend, map_w as i32 + 10, TITLE_H as i32 + 10)?;
        }

        // Flushes the file for path-backed areas.
        root.present().map_err(draw_err)
    }

    fn draw_bins<DB: DrawingBackend>(
        root: &DrawingArea<DB, plotters::coord::Shift>,
        aggregation: &HexAggregation,
        scheme: &ColorScheme,
        projection: Projection,
    ) -> Result<(), RenderError> {
        for bin in &aggregation.bins {
            let color = match aggregation.value_range {
                Some(range) => scheme.color_for(bin.value as f64, range),
                None => scheme.first(),
            };
            let corners: Vec<(i32, i32)> = aggregation
                .grid
                .vertices(bin.coord)
                .iter()
                .map(|&v| projection.map(v))
                .collect();

            let fill = to_rgb(color).mix(aggregation.opacity.max(0.05)).filled();
            root.draw(&Polygon::new(corners.clone(), fill))
                .map_err(draw_err)?;

            let mut outline = corners;
            if let Some(&first) = outline.first() {
                outline.push(first);
            }
            root.draw(&PathElement::new(outline, OUTLINE.mix(0.35).stroke_width(1)))
                .map_err(draw_err)?;
        }
        Ok(())
    }

    fn draw_legend<DB: DrawingBackend>(
        root: &DrawingArea<DB, plotters::coord::Shift>,
        legend: &Legend,
        x: i32,
        y: i32,
    ) -> Result<(), RenderError> {
        let row_h = 22;
        let swatch = 16;

        if !legend.title.is_empty() {
            Self::draw_text(root, &legend.title, (x, y), 14);
        }

        // Highest class on top.
        for (i, entry) in legend.entries.iter().rev().enumerate() {
            let top = y + 24 + i as i32 * row_h;
            root.draw(&Rectangle::new(
                [(x, top), (x + swatch, top + swatch)],
                to_rgb(entry.color).filled(),
            ))
            .map_err(draw_err)?;
            Self::draw_text(root, &entry.label(), (x + swatch + 8, top + 1), 13);
        }
        Ok(())
    }

    /// Text needs a system font; a missing font only loses the label.
    fn draw_text<DB: DrawingBackend>(
        root: &DrawingArea<DB, plotters::coord::Shift>,
        text: &str,
        pos: (i32, i32),
        size: u32,
    ) {
        let style = ("sans-serif", f64::from(size)).into_font().color(&TEXT);
        if let Err(e) = root.draw(&Text::new(text.to_string(), pos, style)) {
            log::warn!("Could not draw label '{text}': {e}");
        }
    }
}

/// Count chart of one categorical column: one bar per value, most frequent
/// first, labels under the bars.
pub struct CountChartRenderer;

impl CountChartRenderer {
    pub fn save_png(
        path: &Path,
        title: &str,
        counts: &[(String, usize)],
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        if width <= 2 * PADDING as u32 || height <= TITLE_H + 2 * PADDING as u32 + 20 {
            return Err(RenderError::InvalidSize(width, height));
        }
        let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
        Self::draw(&root, title, counts, (width, height))?;
        log::info!("Saved count chart to {}", path.display());
        Ok(())
    }

    fn draw<DB: DrawingBackend>(
        root: &DrawingArea<DB, plotters::coord::Shift>,
        title: &str,
        counts: &[(String, usize)],
        (width, height): (u32, u32),
    ) -> Result<(), RenderError> {
        root.fill(&BACKGROUND).map_err(draw_err)?;
        StaticMapRenderer::draw_text(root, title, (15, 12), 20);

        let max = counts.iter().map(|(_, n)| *n).max().unwrap_or(0);
        if counts.is_empty() || max == 0 {
            return root.present().map_err(draw_err);
        }

        let label_h = 20.0;
        let left = PADDING;
        let bottom = height as f64 - PADDING - label_h;
        let plot_h = bottom - TITLE_H as f64;
        let slot = (width as f64 - 2.0 * PADDING) / counts.len() as f64;

        for (i, (value, n)) in counts.iter().enumerate() {
            let x0 = left + i as f64 * slot + slot * 0.1;
            let x1 = left + (i + 1) as f64 * slot - slot * 0.1;
            let top = bottom - plot_h * (*n as f64 / max as f64);
            root.draw(&Rectangle::new(
                [
                    (x0.round() as i32, top.round() as i32),
                    (x1.round() as i32, bottom.round() as i32),
                ],
                BAR.filled(),
            ))
            .map_err(draw_err)?;
            StaticMapRenderer::draw_text(
                root,
                &n.to_string(),
                (x0.round() as i32, top.round() as i32 - 16),
                12,
            );
            StaticMapRenderer::draw_text(
                root,
                value,
                (x0.round() as i32, bottom.round() as i32 + 4),
                12,
            );
        }

        root.present().map_err(draw_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CrashRecord;
    use crate::hex::{AggregationRequest, HexAggregator, MetricSelector};

    fn aggregation(records: &[CrashRecord]) -> HexAggregation {
        let df = CrashRecord::to_dataframe(records).unwrap();
        HexAggregator::aggregate(
            &df,
            &AggregationRequest {
                metric: MetricSelector::TotalCollisions,
                radius: 400.0,
                opacity: 0.8,
            },
        )
        .unwrap()
    }

    #[test]
    fn renders_requested_size() {
        let agg = aggregation(&[
            CrashRecord::at(-75.16, 39.95),
            CrashRecord::at(-75.16, 39.95),
            CrashRecord::at(-75.10, 40.00),
        ]);
        let scheme = ColorScheme::default();
        let legend = Legend::from_aggregation(&agg, &scheme);
        let image = StaticMapRenderer::render(&agg, legend.as_ref(), &scheme, 640, 480).unwrap();
        assert_eq!(image.dimensions(), (640, 480));

        // Some pixel carries the brightest ramp color's red channel.
        let top = to_rgb(scheme.last());
        assert!(image.pixels().any(|p| p.0[0] > BACKGROUND.0 + 40 && p.0[0] <= top.0));
    }

    #[test]
    fn png_bytes_have_signature() {
        let agg = aggregation(&[CrashRecord::at(-75.16, 39.95)]);
        let bytes =
            StaticMapRenderer::render_png(&agg, None, &ColorScheme::default(), 400, 300).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn empty_pass_still_renders() {
        let agg = aggregation(&[]);
        assert!(agg.is_empty());
        let image =
            StaticMapRenderer::render(&agg, None, &ColorScheme::default(), 400, 300).unwrap();
        assert_eq!(image.get_pixel(5, 299).0, [17, 17, 17]);
    }

    #[test]
    fn saves_png_through_plotters() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("map.png");
        let agg = aggregation(&[CrashRecord::at(-75.16, 39.95)]);
        StaticMapRenderer::save_png(&path, &agg, None, &ColorScheme::default(), 400, 300).unwrap();

        let saved = image::open(&path).unwrap();
        assert_eq!((saved.width(), saved.height()), (400, 300));
    }

    #[test]
    fn count_chart_is_written() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("ROAD.png");
        let counts = vec![("dry".to_string(), 5), ("wet".to_string(), 2)];
        CountChartRenderer::save_png(&path, "Countplot for ROAD", &counts, 500, 300).unwrap();

        let saved = image::open(&path).unwrap().to_rgb8();
        assert_eq!(saved.dimensions(), (500, 300));
        assert!(saved.pixels().any(|p| p.0 == [BAR.0, BAR.1, BAR.2]));
    }

    #[test]
    fn tiny_images_are_rejected() {
        let agg = aggregation(&[CrashRecord::at(-75.16, 39.95)]);
        let err = StaticMapRenderer::render(&agg, None, &ColorScheme::default(), 100, 20)
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidSize(100, 20)));
    }
}
