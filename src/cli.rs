//! Command line interface.
//!
//! ```text
//! phila_crash_map [--config app.toml] [--data DIR] [gui]
//! phila_crash_map export --metric total_fatalities --radius 500 --png map.png --html map.html
//! phila_crash_map summary [--threshold 15] [--outlier-threshold 1.5] [--plots DIR]
//! ```

use crate::charts::{CountChartRenderer, MapStyle};
use crate::config::{AppConfig, RenderMode};
use crate::data::{CrashDataCache, DataLoader};
use crate::hex::MetricSelector;
use crate::pipeline::render_pass;
use crate::stats::{
    StatsCalculator, DEFAULT_MAX_CATEGORIES, DEFAULT_MISSING_THRESHOLD, DEFAULT_OUTLIER_THRESHOLD,
};
use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use polars::prelude::DataFrame;
use std::fs;
use std::path::{Path, PathBuf};

const COUNT_CHART_SIZE: (u32, u32) = (900, 600);

#[derive(Parser, Debug)]
#[command(
    name = "phila_crash_map",
    version,
    about = "Map Philadelphia motor vehicle crashes into hexagon bins"
)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory of CRASH* extracts, or a single CSV/Parquet file
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Open the interactive map (default)
    Gui,
    /// Aggregate once and write the requested outputs
    Export {
        /// Metric to aggregate ("Total Fatalities" or "total_fatalities")
        #[arg(long, value_parser = MetricSelector::parse)]
        metric: Option<MetricSelector>,
        /// Hexagon radius in meters
        #[arg(long)]
        radius: Option<f64>,
        /// Layer opacity between 0 and 1
        #[arg(long)]
        opacity: Option<f64>,
        /// 3D or 2D
        #[arg(long)]
        mode: Option<RenderMode>,
        /// Bin table as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Static map image
        #[arg(long)]
        png: Option<PathBuf>,
        /// Standalone deck.gl page
        #[arg(long)]
        html: Option<PathBuf>,
        /// deck.gl JSON spec
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Print an exploratory summary of the raw extracts
    Summary {
        /// Columns missing more than this percentage are dropped before the outlier scan
        #[arg(long, default_value_t = DEFAULT_MISSING_THRESHOLD)]
        threshold: f64,
        /// IQR multiplier for outliers
        #[arg(long, default_value_t = DEFAULT_OUTLIER_THRESHOLD)]
        outlier_threshold: f64,
        /// Also report rare values of text columns
        #[arg(long)]
        include_non_numeric: bool,
        /// Write a count chart per low-cardinality text column into this directory
        #[arg(long)]
        plots: Option<PathBuf>,
    },
}

impl Cli {
    /// Config file merged with the global flags.
    pub fn app_config(&self) -> anyhow::Result<AppConfig> {
        let mut config = AppConfig::load(self.config.as_deref())?;
        if let Some(data) = &self.data {
            config.data.directory = data.clone();
        }
        Ok(config)
    }
}

/// Run the `export` subcommand.
#[allow(clippy::too_many_arguments)]
pub fn run_export(
    mut config: AppConfig,
    metric: Option<MetricSelector>,
    radius: Option<f64>,
    opacity: Option<f64>,
    mode: Option<RenderMode>,
    csv: Option<PathBuf>,
    png: Option<PathBuf>,
    html: Option<PathBuf>,
    json: Option<PathBuf>,
) -> anyhow::Result<()> {
    if csv.is_none() && png.is_none() && html.is_none() && json.is_none() {
        bail!("nothing to export: pass at least one of --csv, --png, --html, --json");
    }

    let metric = metric.unwrap_or(config.metric);
    if let Some(radius) = radius {
        config.render.radius = radius;
    }
    if let Some(opacity) = opacity {
        config.render.opacity = opacity;
    }
    if let Some(mode) = mode {
        config.render.mode = mode;
    }
    config.render.validate()?;

    let cache = CrashDataCache::new(config.data.load_options());
    let df = cache
        .get_or_load(&config.data.directory)
        .with_context(|| format!("loading {}", config.data.directory.display()))?;

    let pass = render_pass(&df, metric, &config.render, &config.color_scheme)?;
    let scheme = &config.color_scheme;

    if let Some(path) = csv {
        pass.write_csv(&path)?;
    }
    if let Some(path) = png {
        pass.write_png(&path, &config.render, scheme)?;
    }
    if let Some(path) = json {
        pass.write_json(&path, &config.render, scheme, MapStyle::from_env())?;
    }
    if let Some(path) = html {
        pass.write_html(&path, &config.render, scheme, MapStyle::from_env())?;
    }

    println!(
        "{metric}: {} hexagons, total {}",
        pass.aggregation.bins.len(),
        pass.aggregation.total_value()
    );
    Ok(())
}

/// Run the `summary` subcommand.
pub fn run_summary(
    config: &AppConfig,
    threshold: f64,
    outlier_threshold: f64,
    include_non_numeric: bool,
    plots: Option<&Path>,
) -> anyhow::Result<()> {
    let df = DataLoader::read_raw_path(&config.data.directory, &config.data.load_options())
        .with_context(|| format!("loading {}", config.data.directory.display()))?;

    let summary = StatsCalculator::dataframe_summary(&df)?;
    println!("{summary}");

    let filtered = StatsCalculator::filter_columns_by_missing_data(&df, threshold)?;
    println!(
        "Columns kept at {threshold}% missing: {} of {}\n---",
        filtered.width(),
        df.width()
    );

    let outliers =
        StatsCalculator::get_outliers(&filtered, outlier_threshold, include_non_numeric)?;
    println!("Outliers count per column:");
    for (column, found) in &outliers {
        println!(" {column:<24} {}", found.count());
    }

    if let Some(dir) = plots {
        let written = write_count_charts(&df, dir)?;
        println!("---\nWrote {} count chart(s) to {}", written.len(), dir.display());
    }
    Ok(())
}

/// One bar chart per text column with fewer than [`DEFAULT_MAX_CATEGORIES`]
/// distinct values. Returns the written paths.
pub fn write_count_charts(df: &DataFrame, dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let mut written = Vec::new();
    for column in StatsCalculator::low_cardinality_columns(df, DEFAULT_MAX_CATEGORIES)? {
        let counts = StatsCalculator::value_counts(df, &column)?;
        let file_name: String = column
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        let path = dir.join(format!("{file_name}.png"));
        let (width, height) = COUNT_CHART_SIZE;
        CountChartRenderer::save_png(
            &path,
            &format!("Countplot for {column}"),
            &counts,
            width,
            height,
        )?;
        written.push(path);
    }
    Ok(written)
}
