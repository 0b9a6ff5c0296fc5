use overlayer_types::{meters_per_map_point, GeoCoordinate, MapPoint, MapRect};

/// Named point. Markers carry no drawable geometry; the host displays them as annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    /// Position of the marker, also used as its label location.
    pub coordinate: GeoCoordinate,
    /// Display name.
    pub name: Option<String>,
}

/// Circle with a radius measured in meters on the ground.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    center: GeoCoordinate,
    radius: f64,
    center_point: MapPoint,
}

impl Circle {
    /// Creates a circle. Negative radius is treated as zero.
    pub fn new(center: GeoCoordinate, radius_meters: f64) -> Self {
        Self {
            center,
            radius: radius_meters.max(0.0),
            center_point: center.to_map_point(),
        }
    }

    /// Center of the circle.
    pub fn center(&self) -> GeoCoordinate {
        self.center
    }

    /// Radius in meters.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Center in the planar map space.
    pub fn center_point(&self) -> MapPoint {
        self.center_point
    }

    /// Radius in planar units, which grows with latitude.
    pub fn radius_in_map_points(&self) -> f64 {
        self.radius / meters_per_map_point(self.center.lat())
    }

    pub(crate) fn extent(&self) -> MapRect {
        let r = self.radius_in_map_points();
        MapRect::new(self.center_point.offset(-r, -r), 2.0 * r, 2.0 * r)
    }
}

/// Ordered sequence of vertices, projected into the planar space at construction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polyline {
    coordinates: Vec<GeoCoordinate>,
    points: Vec<MapPoint>,
}

impl Polyline {
    /// Creates a polyline from geographic vertices.
    pub fn new(coordinates: Vec<GeoCoordinate>) -> Self {
        let points = coordinates.iter().map(|c| c.to_map_point()).collect();
        Self {
            coordinates,
            points,
        }
    }

    fn ring(mut coordinates: Vec<GeoCoordinate>) -> Self {
        if coordinates.len() > 1 && coordinates.first() == coordinates.last() {
            coordinates.pop();
        }
        Self::new(coordinates)
    }

    /// Geographic vertices.
    pub fn coordinates(&self) -> &[GeoCoordinate] {
        &self.coordinates
    }

    /// Projected vertices.
    pub fn points(&self) -> &[MapPoint] {
        &self.points
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the polyline has no vertices.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Length of the line in planar units.
    pub fn planar_length(&self) -> f64 {
        self.points.windows(2).map(|w| w[0].distance(&w[1])).sum()
    }

    pub(crate) fn extent(&self) -> MapRect {
        MapRect::from_points(self.points.iter().copied()).unwrap_or(MapRect::NULL)
    }
}

/// Polygon with an outer ring and optional holes.
///
/// Rings are stored open: the closing vertex is implied.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon {
    exterior: Polyline,
    interiors: Vec<Polyline>,
}

impl Polygon {
    /// Creates a polygon. An explicit closing vertex equal to the first one is removed from every ring.
    pub fn new(exterior: Vec<GeoCoordinate>, interiors: Vec<Vec<GeoCoordinate>>) -> Self {
        Self {
            exterior: Polyline::ring(exterior),
            interiors: interiors.into_iter().map(Polyline::ring).collect(),
        }
    }

    /// Outer ring.
    pub fn exterior(&self) -> &Polyline {
        &self.exterior
    }

    /// Holes.
    pub fn interiors(&self) -> &[Polyline] {
        &self.interiors
    }

    /// Returns true if the polygon has at least one interior ring.
    pub fn has_holes(&self) -> bool {
        !self.interiors.is_empty()
    }

    /// Outer ring followed by the holes.
    pub fn rings(&self) -> impl Iterator<Item = &Polyline> {
        std::iter::once(&self.exterior).chain(self.interiors.iter())
    }

    pub(crate) fn extent(&self) -> MapRect {
        self.rings().map(Polyline::extent).collect()
    }
}
