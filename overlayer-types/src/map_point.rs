use approx::{AbsDiffEq, RelativeEq};
use serde::{Deserialize, Serialize};

use crate::projection::WebMercator;
use crate::GeoCoordinate;

/// Point in the global planar map space.
///
/// The space is a square of [`WebMercator::WORLD_SIZE`] units on each side. `(0, 0)` is the north-west
/// corner of the world, `x` grows eastwards and `y` grows southwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Deserialize, Serialize)]
pub struct MapPoint {
    /// Easting.
    pub x: f64,
    /// Southing.
    pub y: f64,
}

impl MapPoint {
    /// Creates a new point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns a copy of the point moved by the given offsets.
    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Euclidean distance to the other point in planar units.
    pub fn distance(&self, other: &MapPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Converts the point back into geographic coordinates.
    pub fn to_geo_coordinate(&self) -> GeoCoordinate {
        WebMercator::default().to_geo_coordinate(self)
    }
}

impl AbsDiffEq for MapPoint {
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.x.abs_diff_eq(&other.x, epsilon) && self.y.abs_diff_eq(&other.y, epsilon)
    }
}

impl RelativeEq for MapPoint {
    fn default_max_relative() -> Self::Epsilon {
        f64::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        self.x.relative_eq(&other.x, epsilon, max_relative)
            && self.y.relative_eq(&other.y, epsilon, max_relative)
    }
}
