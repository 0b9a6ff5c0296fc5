use approx::{AbsDiffEq, RelativeEq};
use serde::{Deserialize, Serialize};

use crate::projection::WebMercator;
use crate::MapPoint;

/// Point on the surface of the Earth, latitude and longitude in degrees (WGS84).
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Deserialize, Serialize)]
pub struct GeoCoordinate {
    lat: f64,
    lon: f64,
}

impl GeoCoordinate {
    /// Creates a new coordinate from latitude and longitude in degrees.
    pub const fn latlon(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Creates a new coordinate from longitude and latitude in degrees.
    pub const fn lonlat(lon: f64, lat: f64) -> Self {
        Self { lat, lon }
    }

    /// Latitude in degrees.
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in degrees.
    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// Latitude in radians.
    pub fn lat_rad(&self) -> f64 {
        self.lat.to_radians()
    }

    /// Longitude in radians.
    pub fn lon_rad(&self) -> f64 {
        self.lon.to_radians()
    }

    /// Returns true if both values are finite and lie within `[-90, 90]` and `[-180, 180]`.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Projects the coordinate into the planar map space with the [`WebMercator`] projection.
    ///
    /// Latitudes outside of the Mercator range are clamped.
    pub fn to_map_point(&self) -> MapPoint {
        WebMercator::default().to_map_point(self)
    }
}

impl AbsDiffEq for GeoCoordinate {
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.lat.abs_diff_eq(&other.lat, epsilon) && self.lon.abs_diff_eq(&other.lon, epsilon)
    }
}

impl RelativeEq for GeoCoordinate {
    fn default_max_relative() -> Self::Epsilon {
        f64::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        self.lat.relative_eq(&other.lat, epsilon, max_relative)
            && self.lon.relative_eq(&other.lon, epsilon, max_relative)
    }
}

/// Creates a new [`GeoCoordinate`] from latitude and longitude values (in degrees).
///
/// ```
/// use overlayer_types::latlon;
///
/// let point = latlon!(37.7, -122.45);
/// assert_eq!(point.lat(), 37.7);
/// ```
#[macro_export]
macro_rules! latlon {
    ($lat:expr, $lon:expr) => {
        $crate::GeoCoordinate::latlon($lat, $lon)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validity() {
        assert!(latlon!(37.7, -122.45).is_valid());
        assert!(latlon!(-90.0, 180.0).is_valid());
        assert!(!latlon!(91.0, 0.0).is_valid());
        assert!(!latlon!(0.0, -180.5).is_valid());
        assert!(!latlon!(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn lonlat_swaps_arguments() {
        assert_eq!(GeoCoordinate::lonlat(10.0, 20.0), latlon!(20.0, 10.0));
    }
}
