//! Pointy-top hexagonal grid over projected meters.
//!
//! Cells are addressed with axial coordinates `(q, r)`. The grid radius is
//! the hexagon circumradius (center to vertex, equal to the edge length),
//! the same quantity the map layer uses for its hexagon radius.

use super::aggregator::AggregateError;
use super::projection::PlanarPoint;

const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// Axial coordinate of one hexagon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HexCoord {
    pub q: i64,
    pub r: i64,
}

impl HexCoord {
    pub const fn new(q: i64, r: i64) -> Self {
        Self { q, r }
    }
}

/// Hexagonal tiling of the plane with a fixed cell size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HexGrid {
    radius: f64,
}

impl HexGrid {
    /// Create a grid of hexagons with the given circumradius in meters.
    pub fn new(radius: f64) -> Result<Self, AggregateError> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(AggregateError::InvalidParameter(format!(
                "bin radius must be a positive number of meters, got {radius}"
            )));
        }
        Ok(Self { radius })
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Cell containing `point`.
    pub fn locate(&self, point: PlanarPoint) -> HexCoord {
        let q = (SQRT_3 / 3.0 * point.x - point.y / 3.0) / self.radius;
        let r = (2.0 / 3.0 * point.y) / self.radius;
        cube_round(q, r)
    }

    /// Planar center of a cell.
    pub fn center(&self, coord: HexCoord) -> PlanarPoint {
        let (q, r) = (coord.q as f64, coord.r as f64);
        PlanarPoint {
            x: self.radius * (SQRT_3 * q + SQRT_3 / 2.0 * r),
            y: self.radius * 1.5 * r,
        }
    }

    /// Corners of a cell, counter-clockwise starting at 30 degrees.
    pub fn vertices(&self, coord: HexCoord) -> [PlanarPoint; 6] {
        let center = self.center(coord);
        std::array::from_fn(|i| {
            let angle = (60.0 * i as f64 + 30.0).to_radians();
            PlanarPoint {
                x: center.x + self.radius * angle.cos(),
                y: center.y + self.radius * angle.sin(),
            }
        })
    }
}

/// Round fractional axial coordinates to the nearest hexagon.
fn cube_round(fq: f64, fr: f64) -> HexCoord {
    let fs = -fq - fr;
    let mut q = fq.round();
    let mut r = fr.round();
    let s = fs.round();

    let dq = (q - fq).abs();
    let dr = (r - fr).abs();
    let ds = (s - fs).abs();

    if dq > dr && dq > ds {
        q = -r - s;
    } else if dr > ds {
        r = -q - s;
    }

    HexCoord {
        q: q as i64,
        r: r as i64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn distance(a: PlanarPoint, b: PlanarPoint) -> f64 {
        ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
    }

    #[test]
    fn rejects_non_positive_radius() {
        assert!(HexGrid::new(0.0).is_err());
        assert!(HexGrid::new(-5.0).is_err());
        assert!(HexGrid::new(f64::NAN).is_err());
        assert!(HexGrid::new(f64::INFINITY).is_err());
        assert!(HexGrid::new(300.0).is_ok());
    }

    #[test]
    fn centers_locate_to_their_own_cell() {
        let grid = HexGrid::new(250.0).unwrap();
        for q in -3..=3 {
            for r in -3..=3 {
                let coord = HexCoord::new(q, r);
                assert_eq!(grid.locate(grid.center(coord)), coord);
            }
        }
    }

    #[test]
    fn points_land_in_the_nearest_center() {
        let grid = HexGrid::new(100.0).unwrap();
        let samples = [
            PlanarPoint::new(12.0, 40.0),
            PlanarPoint::new(-95.0, 60.0),
            PlanarPoint::new(160.0, -130.0),
            PlanarPoint::new(-8_343_000.5, 4_434_600.25),
        ];
        for p in samples {
            let coord = grid.locate(p);
            let d = distance(p, grid.center(coord));
            assert!(d <= grid.radius() + 1e-6);
            for (dq, dr) in [(1, 0), (-1, 0), (0, 1), (0, -1), (1, -1), (-1, 1)] {
                let neighbour = HexCoord::new(coord.q + dq, coord.r + dr);
                assert!(d <= distance(p, grid.center(neighbour)) + 1e-6);
            }
        }
    }

    #[test]
    fn neighbouring_centers_are_sqrt3_radius_apart() {
        let grid = HexGrid::new(100.0).unwrap();
        let origin = grid.center(HexCoord::new(0, 0));
        let east = grid.center(HexCoord::new(1, 0));
        let north_east = grid.center(HexCoord::new(0, 1));
        assert!((distance(origin, east) - 100.0 * SQRT_3).abs() < 1e-9);
        assert!((distance(origin, north_east) - 100.0 * SQRT_3).abs() < 1e-9);
    }

    #[test]
    fn vertices_sit_on_the_circumradius() {
        let grid = HexGrid::new(500.0).unwrap();
        let coord = HexCoord::new(2, -1);
        let center = grid.center(coord);
        for v in grid.vertices(coord) {
            assert!((distance(center, v) - 500.0).abs() < 1e-9);
        }
    }
}
