//! Coordinate types used by `overlayer`.
//!
//! * [`GeoCoordinate`] is a WGS84 latitude/longitude pair in degrees.
//! * [`MapPoint`] is a point in the global planar map space, which is a spherical Mercator square with
//!   the origin at the north-west corner of the world and `y` growing southwards.
//! * [`MapRect`] is an axis aligned rectangle in the same planar space.
//!
//! Conversion between the first two is done by the [`WebMercator`] projection. [`local_pixel`] maps
//! planar points into the pixel space of a rendered region.

mod datum;
mod geo_point;
mod map_point;
pub mod projection;
mod rect;

pub use datum::Datum;
pub use geo_point::GeoCoordinate;
pub use map_point::MapPoint;
pub use projection::{local_pixel, meters_per_map_point, Projection, WebMercator};
pub use rect::MapRect;
