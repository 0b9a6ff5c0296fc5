//! Renderers, renderer resolution and raster targets.
//!
//! [`resolve_renderer`] picks a drawing strategy for an [`Overlay`] and the current [`DisplayContext`].
//! The resulting [`Renderer`] draws the overlay into one rectangular map region at a time through
//! [`Renderer::draw`]. Renderers hold no mutable state, so the same renderer may draw many regions
//! concurrently, in any order.

mod gradient;
mod grid;
mod multi;
mod path;
mod pixmap;
mod target;
mod tile;

pub use gradient::GradientPathRenderer;
pub use grid::GridRenderer;
pub use multi::MultiGeometryRenderer;
pub use path::PathRenderer;
pub use pixmap::Pixmap;
pub use target::{ClipScope, FillRule, LocalRect, Paint, RasterTarget, Shader, Stroke};
pub use tile::TileRenderer;

use lyon::math::{point, Point};
use overlayer_types::{MapPoint, MapRect};

use crate::context::{DisplayContext, DisplayMode};
use crate::overlay::{Overlay, OverlayGeometry};
use crate::style::RenderStyle;

/// Anti-aliasing margin added around strokes, in points.
const AA_MARGIN: f64 = 1.0;

/// Region and scale of one draw call.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DrawContext {
    region: MapRect,
    visible: MapRect,
    zoom_scale: f64,
}

impl DrawContext {
    /// Context for drawing `region` at `zoom_scale` points per planar unit.
    pub fn new(region: MapRect, zoom_scale: f64) -> Self {
        Self {
            region,
            visible: region,
            zoom_scale,
        }
    }

    fn with_visible(mut self, visible: MapRect) -> Self {
        self.visible = visible;
        self
    }

    /// Requested region.
    pub fn region(&self) -> MapRect {
        self.region
    }

    /// Part of the region covered by the overlay extent.
    pub fn visible(&self) -> MapRect {
        self.visible
    }

    /// Points per planar unit.
    pub fn zoom_scale(&self) -> f64 {
        self.zoom_scale
    }

    /// Converts a planar point into the local point space of the region.
    pub fn to_local(&self, map_point: &MapPoint) -> Point {
        let (x, y) = overlayer_types::local_pixel(*map_point, self.zoom_scale, self.region.origin);
        point(x as f32, y as f32)
    }

    /// Converts a planar rectangle into the local point space of the region.
    pub fn local_rect(&self, rect: &MapRect) -> LocalRect {
        LocalRect::from_map_rect(rect, self.zoom_scale, self.region.origin)
    }

    /// Distance in planar units that strokes of the style reach beyond the geometry.
    pub(crate) fn stroke_padding(&self, style: &RenderStyle) -> f64 {
        let width = style.effective_line_width() as f64;
        if width <= 0.0 {
            return 0.0;
        }

        (width / 2.0 + AA_MARGIN) / self.zoom_scale
    }
}

/// Drawing strategy tag.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RendererKind {
    /// [`PathRenderer`] with the overlay style.
    Path,
    /// [`GradientPathRenderer`].
    GradientPath,
    /// [`MultiGeometryRenderer`].
    MultiGeometry,
    /// [`GridRenderer`].
    Grid,
    /// [`TileRenderer`].
    Tile,
    /// [`PathRenderer`] with a blend mode chosen by the polygon shape.
    Blend,
    /// Draws nothing.
    Noop,
}

/// Renderer of one overlay.
#[derive(Debug, Clone)]
pub enum Renderer<'a> {
    /// Circles, polylines and polygons.
    Path(PathRenderer<'a>),
    /// Polylines with a color gradient.
    GradientPath(GradientPathRenderer<'a>),
    /// Multi-polygons and multi-polylines.
    MultiGeometry(MultiGeometryRenderer<'a>),
    /// Scalar grids.
    Grid(GridRenderer<'a>),
    /// Bitmap tiles.
    Tile(TileRenderer<'a>),
    /// Polygons composited with a blend mode.
    Blend(PathRenderer<'a>),
    /// Pass-through renderer for overlays without drawable geometry.
    Noop,
}

/// Selects and configures the renderer for the overlay.
///
/// Polylines use the gradient renderer only in [`DisplayMode::GradientDemo`], polygons use the blend
/// renderer only in [`DisplayMode::BlendDemo`]. Markers have nothing to draw and get [`Renderer::Noop`].
/// Overlays without a style are drawn with [`RenderStyle::default`].
pub fn resolve_renderer<'a>(overlay: &'a Overlay, context: &DisplayContext) -> Renderer<'a> {
    let style = overlay.style().cloned().unwrap_or_default();

    match overlay.geometry() {
        OverlayGeometry::Marker(_) => Renderer::Noop,
        OverlayGeometry::Polyline(line) if context.mode == DisplayMode::GradientDemo => {
            Renderer::GradientPath(GradientPathRenderer::new(
                overlay,
                line,
                style,
                &context.palette.gradient,
            ))
        }
        OverlayGeometry::Polygon(polygon) if context.mode == DisplayMode::BlendDemo => {
            Renderer::Blend(PathRenderer::with_blend(
                overlay,
                style,
                polygon.has_holes(),
                &context.palette,
            ))
        }
        OverlayGeometry::Circle(_) | OverlayGeometry::Polyline(_) | OverlayGeometry::Polygon(_) => {
            Renderer::Path(PathRenderer::new(overlay, style))
        }
        OverlayGeometry::MultiPolygon(_) | OverlayGeometry::MultiPolyline(_) => {
            Renderer::MultiGeometry(MultiGeometryRenderer::new(overlay, style))
        }
        OverlayGeometry::Grid(grid) => Renderer::Grid(GridRenderer::new(overlay, grid, style)),
        OverlayGeometry::Tiles(tiles) => Renderer::Tile(TileRenderer::new(overlay, tiles, style)),
    }
}

impl<'a> Renderer<'a> {
    /// Strategy tag.
    pub fn kind(&self) -> RendererKind {
        match self {
            Renderer::Path(_) => RendererKind::Path,
            Renderer::GradientPath(_) => RendererKind::GradientPath,
            Renderer::MultiGeometry(_) => RendererKind::MultiGeometry,
            Renderer::Grid(_) => RendererKind::Grid,
            Renderer::Tile(_) => RendererKind::Tile,
            Renderer::Blend(_) => RendererKind::Blend,
            Renderer::Noop => RendererKind::Noop,
        }
    }

    /// Overlay drawn by the renderer, `None` for [`Renderer::Noop`].
    pub fn overlay(&self) -> Option<&'a Overlay> {
        match self {
            Renderer::Path(r) | Renderer::Blend(r) => Some(r.overlay()),
            Renderer::GradientPath(r) => Some(r.overlay()),
            Renderer::MultiGeometry(r) => Some(r.overlay()),
            Renderer::Grid(r) => Some(r.overlay()),
            Renderer::Tile(r) => Some(r.overlay()),
            Renderer::Noop => None,
        }
    }

    fn padding(&self, ctx: &DrawContext) -> f64 {
        match self {
            Renderer::Path(r) | Renderer::Blend(r) => ctx.stroke_padding(r.style()),
            Renderer::GradientPath(_) | Renderer::MultiGeometry(_) => {
                self.overlay()
                    .and_then(Overlay::style)
                    .map(|style| ctx.stroke_padding(style))
                    .unwrap_or_else(|| ctx.stroke_padding(&RenderStyle::default()))
            }
            Renderer::Grid(_) | Renderer::Tile(_) | Renderer::Noop => 0.0,
        }
    }

    /// Draws the part of the overlay inside `region` at `zoom_scale` points per planar unit.
    ///
    /// The region is mapped onto the target with its origin at the local point `(0, 0)`. The overlay extent
    /// is widened by the reach of strokes. Nothing is drawn if the region does not intersect the widened
    /// extent, otherwise all drawing is clipped to the intersection.
    pub fn draw(&self, region: &MapRect, zoom_scale: f64, target: &mut dyn RasterTarget) {
        let Some(overlay) = self.overlay() else {
            return;
        };
        if !(zoom_scale.is_finite() && zoom_scale > 0.0) {
            log::debug!("Ignoring draw call with zoom scale {zoom_scale}");
            return;
        }

        let extent = overlay.bounding_extent();
        let ctx = DrawContext::new(*region, zoom_scale);
        let padding = self.padding(&ctx);
        let Some(clip) = region.intersection(&extent.inset(-padding, -padding)) else {
            return;
        };
        let ctx = ctx.with_visible(region.intersection(&extent).unwrap_or(MapRect::NULL));

        let mut scope = ClipScope::new(target, ctx.local_rect(&clip));
        let target = &mut *scope;
        match self {
            Renderer::Path(r) | Renderer::Blend(r) => r.render(&ctx, target),
            Renderer::GradientPath(r) => r.render(&ctx, target),
            Renderer::MultiGeometry(r) => r.render(&ctx, target),
            Renderer::Grid(r) => r.render(&ctx, target),
            Renderer::Tile(r) => r.render(&ctx, target),
            Renderer::Noop => {}
        }
    }
}
