//! Typed geometry records produced by an upstream feed decoder.
//!
//! A feed hands over a sequence of [`Geometry`] records. Each record is converted into an [`Overlay`]
//! independently, so one malformed record never prevents the others from being displayed.

#[cfg(feature = "geojson")]
pub mod geojson;

use overlayer_types::GeoCoordinate;

use crate::error::FeedError;
use crate::overlay::{Overlay, Polygon, Polyline};

/// Rings as delivered by a feed: the first ring is the outer boundary, the rest are holes.
pub type Rings = Vec<Vec<GeoCoordinate>>;

/// Geometry record of a feed.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// Named point, becomes a marker.
    Point {
        /// Position.
        coordinate: GeoCoordinate,
        /// Value of the `name` property, if any.
        name: Option<String>,
    },
    /// Open line.
    LineString(Vec<GeoCoordinate>),
    /// Single polygon.
    Polygon(Rings),
    /// Set of polygons.
    MultiPolygon(Vec<Rings>),
}

impl Geometry {
    /// Name of the geometry type, as used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point { .. } => "Point",
            Geometry::LineString(_) => "LineString",
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiPolygon(_) => "MultiPolygon",
        }
    }

    /// Validates the record and converts it into an overlay without a style.
    pub fn into_overlay(self) -> Result<Overlay, FeedError> {
        match self {
            Geometry::Point { coordinate, name } => {
                validate(&coordinate)?;
                Ok(Overlay::marker(coordinate, name))
            }
            Geometry::LineString(coordinates) => Ok(Overlay::new(
                crate::overlay::OverlayGeometry::Polyline(line(coordinates)?),
            )),
            Geometry::Polygon(rings) => Ok(Overlay::new(
                crate::overlay::OverlayGeometry::Polygon(polygon(rings)?),
            )),
            Geometry::MultiPolygon(polygons) => {
                if polygons.is_empty() {
                    return Err(FeedError::MalformedGeometry(
                        "multi-polygon without polygons".into(),
                    ));
                }

                let polygons = polygons
                    .into_iter()
                    .map(polygon)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Overlay::multi_polygon(polygons))
            }
        }
    }
}

impl TryFrom<Geometry> for Overlay {
    type Error = FeedError;

    fn try_from(value: Geometry) -> Result<Self, Self::Error> {
        value.into_overlay()
    }
}

fn validate(coordinate: &GeoCoordinate) -> Result<(), FeedError> {
    if coordinate.is_valid() {
        Ok(())
    } else {
        Err(FeedError::InvalidCoordinate {
            lat: coordinate.lat(),
            lon: coordinate.lon(),
        })
    }
}

fn line(coordinates: Vec<GeoCoordinate>) -> Result<Polyline, FeedError> {
    coordinates.iter().try_for_each(validate)?;
    if coordinates.len() < 2 {
        return Err(FeedError::MalformedGeometry(format!(
            "line string needs at least 2 points, got {}",
            coordinates.len()
        )));
    }

    Ok(Polyline::new(coordinates))
}

fn polygon(mut rings: Rings) -> Result<Polygon, FeedError> {
    if rings.is_empty() {
        return Err(FeedError::MalformedGeometry("polygon without rings".into()));
    }

    for ring in &rings {
        ring.iter().try_for_each(validate)?;
    }

    let exterior = rings.remove(0);
    let polygon = Polygon::new(exterior, rings);
    for ring in polygon.rings() {
        if ring.len() < 3 {
            return Err(FeedError::MalformedGeometry(format!(
                "polygon ring needs at least 3 distinct points, got {}",
                ring.len()
            )));
        }
    }

    Ok(polygon)
}
