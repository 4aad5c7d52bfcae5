pub mod aggregator;
pub mod grid;
pub mod metric;
pub mod projection;

pub use aggregator::{
    AggregateError, AggregationRequest, HexAggregation, HexAggregator, HexBin, ValueRange,
    WeightedPoint,
};
pub use grid::{HexCoord, HexGrid};
pub use metric::MetricSelector;
pub use projection::{project, unproject, GeoPoint, PlanarPoint, METERS_PER_DEGREE};
