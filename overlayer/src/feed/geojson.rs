//! Decoding of GeoJSON feature collections into [`Geometry`] records.

use geojson::{FeatureCollection, GeoJson, Position, Value};
use overlayer_types::GeoCoordinate;

use crate::error::FeedError;
use crate::feed::{Geometry, Rings};

/// Parses a GeoJSON feature collection.
///
/// Fails only if the payload itself is not a valid feature collection. Every feature is converted
/// separately: features with unsupported or broken geometries produce an error in their slot of the
/// returned vector.
pub fn decode(json: &str) -> Result<Vec<Result<Geometry, FeedError>>, FeedError> {
    let geojson = json
        .parse::<GeoJson>()
        .map_err(|err| FeedError::Decoding(err.to_string()))?;
    let collection =
        FeatureCollection::try_from(geojson).map_err(|err| FeedError::Decoding(err.to_string()))?;

    Ok(collection.features.iter().map(convert_feature).collect())
}

fn convert_feature(feature: &geojson::Feature) -> Result<Geometry, FeedError> {
    let Some(geometry) = &feature.geometry else {
        return Err(FeedError::MalformedGeometry("feature has no geometry".into()));
    };

    match &geometry.value {
        Value::Point(position) => Ok(Geometry::Point {
            coordinate: coordinate(position)?,
            name: feature
                .property("name")
                .and_then(|name| name.as_str())
                .map(str::to_owned),
        }),
        Value::LineString(line) => Ok(Geometry::LineString(coordinates(line)?)),
        Value::Polygon(polygon) => Ok(Geometry::Polygon(rings(polygon)?)),
        Value::MultiPolygon(polygons) => Ok(Geometry::MultiPolygon(
            polygons.iter().map(|p| rings(p)).collect::<Result<_, _>>()?,
        )),
        Value::MultiPoint(_) => Err(FeedError::Unsupported("MultiPoint".into())),
        Value::MultiLineString(_) => Err(FeedError::Unsupported("MultiLineString".into())),
        Value::GeometryCollection(_) => Err(FeedError::Unsupported("GeometryCollection".into())),
    }
}

fn coordinate(position: &Position) -> Result<GeoCoordinate, FeedError> {
    match position.as_slice() {
        [lon, lat, ..] => Ok(GeoCoordinate::lonlat(*lon, *lat)),
        _ => Err(FeedError::MalformedGeometry(format!(
            "position needs 2 values, got {}",
            position.len()
        ))),
    }
}

fn coordinates(positions: &[Position]) -> Result<Vec<GeoCoordinate>, FeedError> {
    positions.iter().map(coordinate).collect()
}

fn rings(polygon: &[Vec<Position>]) -> Result<Rings, FeedError> {
    polygon.iter().map(|ring| coordinates(ring)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use overlayer_types::latlon;

    const MUSEUMS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "name": "Exploratorium" },
                "geometry": { "type": "Point", "coordinates": [-122.3987, 37.8016] }
            },
            {
                "type": "Feature",
                "properties": {},
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [[[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]]
                }
            },
            {
                "type": "Feature",
                "properties": null,
                "geometry": { "type": "MultiPoint", "coordinates": [[0.0, 0.0]] }
            },
            {
                "type": "Feature",
                "properties": null,
                "geometry": null
            }
        ]
    }"#;

    #[test]
    fn decodes_each_feature_separately() {
        let records = decode(MUSEUMS).unwrap();
        assert_eq!(records.len(), 4);

        assert_matches!(
            &records[0],
            Ok(Geometry::Point { coordinate, name }) if *coordinate == latlon!(37.8016, -122.3987)
                && name.as_deref() == Some("Exploratorium")
        );
        assert_matches!(&records[1], Ok(Geometry::MultiPolygon(polygons)) if polygons[0][0].len() == 4);
        assert_matches!(&records[2], Err(FeedError::Unsupported(name)) if name == "MultiPoint");
        assert_matches!(&records[3], Err(FeedError::MalformedGeometry(_)));
    }

    #[test]
    fn invalid_payload_is_an_error() {
        assert_matches!(decode("{ not json"), Err(FeedError::Decoding(_)));
        assert_matches!(
            decode(r#"{"type": "Point", "coordinates": [0.0, 0.0]}"#),
            Err(FeedError::Decoding(_))
        );
    }
}
