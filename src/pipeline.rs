//! One request end to end: filter, aggregate, build the legend, export.

use crate::charts::{ColorScheme, DeckSpec, Legend, MapStyle, RenderError, StaticMapRenderer};
use crate::config::RenderSettings;
use crate::hex::{AggregateError, HexAggregation, HexAggregator, MetricSelector};
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Output of one rendering request.
#[derive(Debug, Clone)]
pub struct RenderPass {
    pub aggregation: HexAggregation,
    /// `None` when no bins were produced.
    pub legend: Option<Legend>,
}

/// Aggregate `df` for `metric` with the radius and opacity of `settings`.
pub fn render_pass(
    df: &DataFrame,
    metric: MetricSelector,
    settings: &RenderSettings,
    scheme: &ColorScheme,
) -> Result<RenderPass, AggregateError> {
    let aggregation = HexAggregator::aggregate(df, &settings.request(metric))?;
    let legend = Legend::from_aggregation(&aggregation, scheme);
    log::info!(
        "{metric}: {} bins at {} m from {} rows",
        aggregation.bins.len(),
        settings.radius,
        aggregation.point_count
    );
    Ok(RenderPass {
        aggregation,
        legend,
    })
}

impl RenderPass {
    pub fn deck_spec(
        &self,
        settings: &RenderSettings,
        scheme: &ColorScheme,
        map: MapStyle,
    ) -> DeckSpec {
        DeckSpec::new(&self.aggregation, settings, scheme, map)
    }

    /// Bin table as CSV.
    pub fn write_csv(&self, path: &Path) -> Result<(), ExportError> {
        let mut df = self.aggregation.to_dataframe()?;
        let mut file = File::create(path).map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        CsvWriter::new(&mut file).finish(&mut df)?;
        log::info!("Wrote {} bins to {}", df.height(), path.display());
        Ok(())
    }

    pub fn write_png(
        &self,
        path: &Path,
        settings: &RenderSettings,
        scheme: &ColorScheme,
    ) -> Result<(), ExportError> {
        StaticMapRenderer::save_png(
            path,
            &self.aggregation,
            self.legend.as_ref(),
            scheme,
            settings.image_width,
            settings.image_height,
        )?;
        Ok(())
    }

    /// deck.gl JSON spec. The basemap token is never written.
    pub fn write_json(
        &self,
        path: &Path,
        settings: &RenderSettings,
        scheme: &ColorScheme,
        map: MapStyle,
    ) -> Result<(), ExportError> {
        let json = self.deck_spec(settings, scheme, map).to_json()?;
        write_text(path, &json)
    }

    /// Standalone map page with the legend overlay.
    pub fn write_html(
        &self,
        path: &Path,
        settings: &RenderSettings,
        scheme: &ColorScheme,
        map: MapStyle,
    ) -> Result<(), ExportError> {
        let title = format!("Philadelphia Crashes: {}", self.aggregation.metric);
        let html = self
            .deck_spec(settings, scheme, map)
            .to_html(&title, self.legend.as_ref())?;
        write_text(path, &html)
    }
}

fn write_text(path: &Path, text: &str) -> Result<(), ExportError> {
    fs::write(path, text).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("Wrote {}", path.display());
    Ok(())
}
