//! Overlay data model: geometry records anchored to geographic coordinates.
//!
//! Every [`Overlay`] computes its representative [coordinate](Overlay::coordinate) and its
//! [bounding extent](Overlay::bounding_extent) once, when it is constructed or its geometry is replaced.
//! Renderers rely on the extent to skip regions the overlay does not touch.

mod grid;
mod shapes;

pub use grid::{Sampling, ScalarGrid};
pub use shapes::{Circle, Marker, Polygon, Polyline};

use overlayer_types::{GeoCoordinate, MapRect};

use crate::style::RenderStyle;
use crate::tile::TileOverlay;

/// Geometry of an overlay.
#[derive(Debug, Clone)]
pub enum OverlayGeometry {
    /// Named point without drawable geometry.
    Marker(Marker),
    /// Circle with a ground radius.
    Circle(Circle),
    /// Open line.
    Polyline(Polyline),
    /// Polygon with optional holes.
    Polygon(Polygon),
    /// Set of polygons sharing one style.
    MultiPolygon(Vec<Polygon>),
    /// Set of lines sharing one style.
    MultiPolyline(Vec<Polyline>),
    /// Scalar field drawn as colored cells.
    Grid(ScalarGrid),
    /// Bitmap tiles from a URL template or a custom source.
    Tiles(TileOverlay),
}

/// Variant tag of [`OverlayGeometry`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum OverlayKind {
    /// [`OverlayGeometry::Marker`]
    Marker,
    /// [`OverlayGeometry::Circle`]
    Circle,
    /// [`OverlayGeometry::Polyline`]
    Polyline,
    /// [`OverlayGeometry::Polygon`]
    Polygon,
    /// [`OverlayGeometry::MultiPolygon`]
    MultiPolygon,
    /// [`OverlayGeometry::MultiPolyline`]
    MultiPolyline,
    /// [`OverlayGeometry::Grid`]
    Grid,
    /// [`OverlayGeometry::Tiles`]
    Tiles,
}

impl OverlayGeometry {
    /// Variant tag.
    pub fn kind(&self) -> OverlayKind {
        match self {
            OverlayGeometry::Marker(_) => OverlayKind::Marker,
            OverlayGeometry::Circle(_) => OverlayKind::Circle,
            OverlayGeometry::Polyline(_) => OverlayKind::Polyline,
            OverlayGeometry::Polygon(_) => OverlayKind::Polygon,
            OverlayGeometry::MultiPolygon(_) => OverlayKind::MultiPolygon,
            OverlayGeometry::MultiPolyline(_) => OverlayKind::MultiPolyline,
            OverlayGeometry::Grid(_) => OverlayKind::Grid,
            OverlayGeometry::Tiles(_) => OverlayKind::Tiles,
        }
    }

    fn extent(&self) -> MapRect {
        match self {
            OverlayGeometry::Marker(marker) => {
                MapRect::new(marker.coordinate.to_map_point(), 0.0, 0.0)
            }
            OverlayGeometry::Circle(circle) => circle.extent(),
            OverlayGeometry::Polyline(line) => line.extent(),
            OverlayGeometry::Polygon(polygon) => polygon.extent(),
            OverlayGeometry::MultiPolygon(polygons) => polygons.iter().map(Polygon::extent).collect(),
            OverlayGeometry::MultiPolyline(lines) => lines.iter().map(Polyline::extent).collect(),
            OverlayGeometry::Grid(grid) => grid.extent(),
            OverlayGeometry::Tiles(_) => MapRect::WORLD,
        }
    }

    fn coordinate(&self, extent: &MapRect) -> GeoCoordinate {
        match self {
            OverlayGeometry::Marker(marker) => marker.coordinate,
            OverlayGeometry::Circle(circle) => circle.center(),
            OverlayGeometry::Grid(grid) => grid.center(),
            OverlayGeometry::Tiles(_) => MapRect::WORLD.origin.to_geo_coordinate(),
            _ if extent.is_null() => GeoCoordinate::default(),
            _ => extent.center().to_geo_coordinate(),
        }
    }
}

/// Geographic overlay: geometry, cached anchor and extent, and an optional style.
#[derive(Debug, Clone)]
pub struct Overlay {
    geometry: OverlayGeometry,
    coordinate: GeoCoordinate,
    extent: MapRect,
    style: Option<RenderStyle>,
}

impl Overlay {
    /// Creates an overlay without a style.
    pub fn new(geometry: OverlayGeometry) -> Self {
        let extent = geometry.extent();
        let coordinate = geometry.coordinate(&extent);
        Self {
            geometry,
            coordinate,
            extent,
            style: None,
        }
    }

    /// Named point.
    pub fn marker(coordinate: GeoCoordinate, name: Option<String>) -> Self {
        Self::new(OverlayGeometry::Marker(Marker { coordinate, name }))
    }

    /// Circle with the radius in meters.
    pub fn circle(center: GeoCoordinate, radius_meters: f64) -> Self {
        Self::new(OverlayGeometry::Circle(Circle::new(center, radius_meters)))
    }

    /// Open line through the given vertices.
    pub fn polyline(coordinates: Vec<GeoCoordinate>) -> Self {
        Self::new(OverlayGeometry::Polyline(Polyline::new(coordinates)))
    }

    /// Polygon with the outer ring and holes.
    pub fn polygon(exterior: Vec<GeoCoordinate>, interiors: Vec<Vec<GeoCoordinate>>) -> Self {
        Self::new(OverlayGeometry::Polygon(Polygon::new(exterior, interiors)))
    }

    /// Multi-polygon.
    pub fn multi_polygon(polygons: Vec<Polygon>) -> Self {
        Self::new(OverlayGeometry::MultiPolygon(polygons))
    }

    /// Multi-polyline.
    pub fn multi_polyline(lines: Vec<Polyline>) -> Self {
        Self::new(OverlayGeometry::MultiPolyline(lines))
    }

    /// Scalar grid.
    pub fn grid(grid: ScalarGrid) -> Self {
        Self::new(OverlayGeometry::Grid(grid))
    }

    /// Tile source.
    pub fn tiles(tiles: TileOverlay) -> Self {
        Self::new(OverlayGeometry::Tiles(tiles))
    }

    /// Returns the overlay with the given style.
    pub fn with_style(mut self, style: RenderStyle) -> Self {
        self.style = Some(style);
        self
    }

    /// Geometry of the overlay.
    pub fn geometry(&self) -> &OverlayGeometry {
        &self.geometry
    }

    /// Variant tag.
    pub fn kind(&self) -> OverlayKind {
        self.geometry.kind()
    }

    /// Representative anchor point.
    pub fn coordinate(&self) -> GeoCoordinate {
        self.coordinate
    }

    /// Minimal planar rectangle containing every vertex of the overlay.
    pub fn bounding_extent(&self) -> MapRect {
        self.extent
    }

    /// Style set for the overlay, if any.
    pub fn style(&self) -> Option<&RenderStyle> {
        self.style.as_ref()
    }

    /// Replaces the geometry and recomputes the anchor and the extent.
    pub fn set_geometry(&mut self, geometry: OverlayGeometry) {
        self.extent = geometry.extent();
        self.coordinate = geometry.coordinate(&self.extent);
        self.geometry = geometry;
    }
}
