//! Conversion between geographic coordinates, the planar map space and local pixel space.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use crate::{Datum, GeoCoordinate, MapPoint};

/// Projection converts points of one coordinate space into another.
pub trait Projection {
    /// Type of input point.
    type InPoint;
    /// Type of output point.
    type OutPoint;

    /// Projects a point. Returns `None` if the point cannot be projected.
    fn project(&self, input: &Self::InPoint) -> Option<Self::OutPoint>;
    /// Projects a point back. Returns `None` if the point cannot be unprojected.
    fn unproject(&self, input: &Self::OutPoint) -> Option<Self::InPoint>;
}

/// Spherical Mercator projection (EPSG:3857) shifted so that the world occupies the square
/// `[0, WORLD_SIZE] x [0, WORLD_SIZE]` with `y` axis pointing south.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WebMercator {
    datum: Datum,
}

impl WebMercator {
    /// Largest latitude representable by the projection, in degrees.
    pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;
    /// Side of the world square in planar units for the WGS84 datum.
    pub const WORLD_SIZE: f64 = 2.0 * PI * 6_378_137.0;

    /// Creates a projection for the given datum.
    pub fn new(datum: Datum) -> Self {
        Self { datum }
    }

    /// Side of the world square in planar units.
    pub fn world_size(&self) -> f64 {
        2.0 * PI * self.datum.semimajor()
    }

    /// Projects a coordinate into the planar space. Latitude is clamped to
    /// `[-MAX_LATITUDE, MAX_LATITUDE]`.
    pub fn to_map_point(&self, coordinate: &GeoCoordinate) -> MapPoint {
        let r = self.datum.semimajor();
        let half = self.world_size() / 2.0;
        let lat = coordinate
            .lat()
            .clamp(-Self::MAX_LATITUDE, Self::MAX_LATITUDE)
            .to_radians();

        let x = half + r * coordinate.lon_rad();
        let y = half - r * (FRAC_PI_4 + lat / 2.0).tan().ln();

        MapPoint::new(x, y)
    }

    /// Converts a planar point back into geographic coordinates.
    pub fn to_geo_coordinate(&self, point: &MapPoint) -> GeoCoordinate {
        let r = self.datum.semimajor();
        let half = self.world_size() / 2.0;

        let lon = (point.x - half) / r;
        let lat = 2.0 * ((half - point.y) / r).exp().atan() - FRAC_PI_2;

        GeoCoordinate::latlon(lat.to_degrees(), lon.to_degrees())
    }
}

impl Default for WebMercator {
    fn default() -> Self {
        Self::new(Datum::WGS84)
    }
}

impl Projection for WebMercator {
    type InPoint = GeoCoordinate;
    type OutPoint = MapPoint;

    fn project(&self, input: &GeoCoordinate) -> Option<MapPoint> {
        let point = self.to_map_point(input);
        if point.x.is_finite() && point.y.is_finite() {
            Some(point)
        } else {
            None
        }
    }

    fn unproject(&self, input: &MapPoint) -> Option<GeoCoordinate> {
        let coordinate = self.to_geo_coordinate(input);
        if coordinate.lat().is_finite() && coordinate.lon().is_finite() {
            Some(coordinate)
        } else {
            None
        }
    }
}

/// Maps a planar point into the local pixel space of a region whose top-left corner is
/// `region_origin`, rendered with `zoom_scale` pixels per planar unit.
pub fn local_pixel(map_point: MapPoint, zoom_scale: f64, region_origin: MapPoint) -> (f64, f64) {
    (
        (map_point.x - region_origin.x) * zoom_scale,
        (map_point.y - region_origin.y) * zoom_scale,
    )
}

/// Number of meters on the ground covered by one planar unit at the given latitude.
pub fn meters_per_map_point(latitude: f64) -> f64 {
    latitude
        .clamp(-WebMercator::MAX_LATITUDE, WebMercator::MAX_LATITUDE)
        .to_radians()
        .cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::latlon;
    use approx::assert_abs_diff_eq;

    #[test]
    fn round_trip() {
        let projection = WebMercator::default();
        let mut lat = -85.0;
        while lat <= 85.0 {
            let mut lon = -180.0;
            while lon <= 180.0 {
                let coordinate = latlon!(lat, lon);
                let projected = projection.project(&coordinate).expect("finite point");
                let back = projection.unproject(&projected).expect("finite coordinate");
                assert_abs_diff_eq!(back, coordinate, epsilon = 1e-9);
                lon += 7.5;
            }
            lat += 2.5;
        }
    }

    #[test]
    fn world_corners() {
        let projection = WebMercator::default();
        let size = WebMercator::WORLD_SIZE;

        assert_abs_diff_eq!(
            projection.to_map_point(&latlon!(0.0, 0.0)),
            MapPoint::new(size / 2.0, size / 2.0),
            epsilon = 1e-6
        );
        assert_abs_diff_eq!(
            projection.to_map_point(&latlon!(WebMercator::MAX_LATITUDE, -180.0)),
            MapPoint::new(0.0, 0.0),
            epsilon = 1e-6
        );
        assert_abs_diff_eq!(
            projection.to_map_point(&latlon!(-WebMercator::MAX_LATITUDE, 180.0)),
            MapPoint::new(size, size),
            epsilon = 1e-6
        );
    }

    #[test]
    fn latitude_is_clamped() {
        let projection = WebMercator::default();
        let pole = projection.to_map_point(&latlon!(90.0, 10.0));
        let limit = projection.to_map_point(&latlon!(WebMercator::MAX_LATITUDE, 10.0));

        assert!(pole.y.is_finite());
        assert_abs_diff_eq!(pole, limit, epsilon = 1e-9);
        assert!(projection.project(&latlon!(-90.0, 0.0)).is_some());
    }

    #[test]
    fn north_is_up() {
        let north = latlon!(10.0, 0.0).to_map_point();
        let south = latlon!(-10.0, 0.0).to_map_point();
        assert!(north.y < south.y);
    }

    #[test]
    fn local_pixel_offsets_and_scales() {
        let origin = MapPoint::new(1000.0, 2000.0);
        let (x, y) = local_pixel(MapPoint::new(1010.0, 2005.0), 0.5, origin);
        assert_abs_diff_eq!(x, 5.0);
        assert_abs_diff_eq!(y, 2.5);

        let (x, y) = local_pixel(origin, 3.0, origin);
        assert_abs_diff_eq!(x, 0.0);
        assert_abs_diff_eq!(y, 0.0);
    }

    #[test]
    fn meters_per_point() {
        assert_abs_diff_eq!(meters_per_map_point(0.0), 1.0);
        assert_abs_diff_eq!(meters_per_map_point(60.0), 0.5, epsilon = 1e-12);
        assert!(meters_per_map_point(90.0) > 0.0);
    }
}
