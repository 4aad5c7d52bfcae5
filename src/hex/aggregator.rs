//! Hex Aggregator Module
//! Filters the crash table for a metric and sums it into hexagonal bins.

use super::grid::{HexCoord, HexGrid};
use super::metric::MetricSelector;
use super::projection::{project, unproject, GeoPoint, PlanarPoint};
use crate::data::columns::{DEC_LAT, DEC_LONG};
use crate::data::{DataProcessor, ProcessorError};
use polars::prelude::*;
use rayon::prelude::*;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error(transparent)]
    Processor(#[from] ProcessorError),
}

/// Parameters of one aggregation pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregationRequest {
    pub metric: MetricSelector,
    /// Hexagon circumradius in meters.
    pub radius: f64,
    /// Layer opacity, carried through for the renderer.
    pub opacity: f64,
}

/// A located row and its contribution to the selected metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedPoint {
    pub position: GeoPoint,
    pub weight: u64,
}

/// One non-empty hexagon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HexBin {
    pub coord: HexCoord,
    /// Center in projected meters.
    pub center: PlanarPoint,
    /// Center converted back to longitude/latitude.
    pub position: GeoPoint,
    /// Sum of the metric over member rows.
    pub value: u64,
    /// Number of member rows.
    pub count: usize,
}

/// Smallest and largest bin value of a pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    /// Range over `values`, or `None` when there are none.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        values.into_iter().fold(None, |range, v| {
            Some(match range {
                None => Self { min: v, max: v },
                Some(Self { min, max }) => Self {
                    min: min.min(v),
                    max: max.max(v),
                },
            })
        })
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    /// True when every bin has the same value.
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0
    }
}

/// Result of one aggregation pass, consumed by the legend and the renderers.
#[derive(Debug, Clone, PartialEq)]
pub struct HexAggregation {
    pub metric: MetricSelector,
    pub grid: HexGrid,
    pub opacity: f64,
    /// Bins sorted by axial coordinate.
    pub bins: Vec<HexBin>,
    /// `None` when no bins were produced.
    pub value_range: Option<ValueRange>,
    /// Rows that fell into some bin.
    pub point_count: usize,
}

impl HexAggregation {
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn radius(&self) -> f64 {
        self.grid.radius()
    }

    /// Sum of all bin values.
    pub fn total_value(&self) -> u64 {
        self.bins.iter().map(|b| b.value).sum()
    }

    /// Bin with the given coordinate, if it is non-empty.
    pub fn bin(&self, coord: HexCoord) -> Option<&HexBin> {
        self.bins
            .binary_search_by_key(&coord, |b| b.coord)
            .ok()
            .map(|idx| &self.bins[idx])
    }

    /// Bin under a projected point, if any.
    pub fn bin_at(&self, point: PlanarPoint) -> Option<&HexBin> {
        self.bin(self.grid.locate(point))
    }

    /// Bin table for the map collaborator and CSV export.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let bins = &self.bins;
        DataFrame::new(vec![
            Column::new("q".into(), bins.iter().map(|b| b.coord.q).collect::<Vec<_>>()),
            Column::new("r".into(), bins.iter().map(|b| b.coord.r).collect::<Vec<_>>()),
            Column::new("x_m".into(), bins.iter().map(|b| b.center.x).collect::<Vec<_>>()),
            Column::new("y_m".into(), bins.iter().map(|b| b.center.y).collect::<Vec<_>>()),
            Column::new(
                "longitude".into(),
                bins.iter().map(|b| b.position.longitude).collect::<Vec<_>>(),
            ),
            Column::new(
                "latitude".into(),
                bins.iter().map(|b| b.position.latitude).collect::<Vec<_>>(),
            ),
            Column::new("value".into(), bins.iter().map(|b| b.value).collect::<Vec<_>>()),
            Column::new(
                "count".into(),
                bins.iter().map(|b| b.count as u64).collect::<Vec<_>>(),
            ),
        ])
    }
}

/// Per-cell accumulator: metric sum and member count.
type CellTotals = HashMap<HexCoord, (u64, usize)>;

/// Runs the filter → project → bin → reduce pipeline.
pub struct HexAggregator;

impl HexAggregator {
    /// Aggregate `df` for `request`.
    ///
    /// The radius is validated before any row is touched. An empty selection
    /// is not an error: it yields no bins and no value range.
    pub fn aggregate(
        df: &DataFrame,
        request: &AggregationRequest,
    ) -> Result<HexAggregation, AggregateError> {
        let grid = HexGrid::new(request.radius)?;
        let selected = DataProcessor::select_for_metric(df, request.metric)?;
        let points = Self::collect_points(&selected, request.metric)?;
        Ok(Self::aggregate_points(&points, grid, request))
    }

    /// Located rows of `df` with their weight for `metric`.
    pub fn collect_points(
        df: &DataFrame,
        metric: MetricSelector,
    ) -> Result<Vec<WeightedPoint>, AggregateError> {
        let lon = df.column(DEC_LONG)?.cast(&DataType::Float64)?;
        let lat = df.column(DEC_LAT)?.cast(&DataType::Float64)?;
        let lon = lon.f64()?;
        let lat = lat.f64()?;

        let values: Vec<Option<i64>> = match metric.column() {
            Some(name) => {
                let values = df.column(name)?.cast(&DataType::Int64)?;
                values.i64()?.into_iter().collect()
            }
            None => vec![None; df.height()],
        };

        let points = lon
            .into_iter()
            .zip(lat)
            .zip(values)
            .filter(|(_, value)| metric.includes(*value))
            .filter_map(|((lon, lat), value)| {
                let (lon, lat) = (lon?, lat?);
                (lon.is_finite() && lat.is_finite()).then(|| WeightedPoint {
                    position: GeoPoint::new(lon, lat),
                    weight: metric.weight(value),
                })
            })
            .collect();
        Ok(points)
    }

    /// Bin already-selected points. Order of `points` does not matter.
    pub fn aggregate_points(
        points: &[WeightedPoint],
        grid: HexGrid,
        request: &AggregationRequest,
    ) -> HexAggregation {
        let totals: CellTotals = points
            .par_iter()
            .fold(CellTotals::new, |mut acc, point| {
                let coord = grid.locate(project(point.position));
                let cell = acc.entry(coord).or_insert((0, 0));
                cell.0 += point.weight;
                cell.1 += 1;
                acc
            })
            .reduce(CellTotals::new, merge_totals);

        let mut bins: Vec<HexBin> = totals
            .into_iter()
            .map(|(coord, (value, count))| {
                let center = grid.center(coord);
                HexBin {
                    coord,
                    center,
                    position: unproject(center),
                    value,
                    count,
                }
            })
            .collect();
        bins.sort_by_key(|b| b.coord);

        let value_range = ValueRange::from_values(bins.iter().map(|b| b.value as f64));
        match value_range {
            Some(range) => log::debug!(
                "{}: {} points in {} bins, values {}..={}",
                request.metric,
                points.len(),
                bins.len(),
                range.min,
                range.max
            ),
            None => log::warn!("{}: no rows to aggregate", request.metric),
        }

        HexAggregation {
            metric: request.metric,
            grid,
            opacity: request.opacity,
            bins,
            value_range,
            point_count: points.len(),
        }
    }
}

fn merge_totals(mut left: CellTotals, right: CellTotals) -> CellTotals {
    if left.len() < right.len() {
        return merge_totals(right, left);
    }
    for (coord, (value, count)) in right {
        let cell = left.entry(coord).or_insert((0, 0));
        cell.0 += value;
        cell.1 += count;
    }
    left
}
