//! Local planar projection for city-scale data.
//!
//! `x = lon * 111000 * cos(lat)`, `y = lat * 111000`. This is a flat-earth
//! approximation: distances are only trustworthy across a region the size of
//! a single city, and the longitude scale is taken at each point's own
//! latitude rather than at a shared reference.

/// Meters per degree of latitude.
pub const METERS_PER_DEGREE: f64 = 111_000.0;

/// WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }
}

/// Position in projected meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanarPoint {
    pub x: f64,
    pub y: f64,
}

impl PlanarPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Project a geographic position to planar meters.
pub fn project(point: GeoPoint) -> PlanarPoint {
    PlanarPoint {
        x: point.longitude * METERS_PER_DEGREE * point.latitude.to_radians().cos(),
        y: point.latitude * METERS_PER_DEGREE,
    }
}

/// Inverse of [`project`]. Longitude is undefined at the poles and comes
/// back as 0 there.
pub fn unproject(point: PlanarPoint) -> GeoPoint {
    let latitude = point.y / METERS_PER_DEGREE;
    let scale = METERS_PER_DEGREE * latitude.to_radians().cos();
    let longitude = if scale.abs() < f64::EPSILON {
        0.0
    } else {
        point.x / scale
    };
    GeoPoint {
        longitude,
        latitude,
    }
}
