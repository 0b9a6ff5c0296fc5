use overlayer_types::MapRect;

use crate::overlay::{Overlay, OverlayGeometry};
use crate::render::path::{draw_polygon, draw_polyline};
use crate::render::target::{ClipScope, RasterTarget};
use crate::render::DrawContext;
use crate::style::RenderStyle;

/// Draws all children of a multi-polygon or multi-polyline with one shared style.
///
/// Children are drawn in their stored order, so later children end up on top. Each child is clipped to
/// its own padded extent, which makes the output identical to drawing the children as separate overlays.
#[derive(Debug, Clone)]
pub struct MultiGeometryRenderer<'a> {
    overlay: &'a Overlay,
    style: RenderStyle,
}

impl<'a> MultiGeometryRenderer<'a> {
    /// Creates a new renderer.
    pub fn new(overlay: &'a Overlay, style: RenderStyle) -> Self {
        Self { overlay, style }
    }

    /// Overlay being drawn.
    pub fn overlay(&self) -> &'a Overlay {
        self.overlay
    }

    pub(crate) fn render(&self, ctx: &DrawContext, target: &mut dyn RasterTarget) {
        let padding = ctx.stroke_padding(&self.style);
        match self.overlay.geometry() {
            OverlayGeometry::MultiPolygon(polygons) => {
                for polygon in polygons {
                    if let Some(mut scope) = child_scope(ctx, target, polygon.extent(), padding) {
                        draw_polygon(ctx, &mut *scope, polygon, &self.style);
                    }
                }
            }
            OverlayGeometry::MultiPolyline(lines) => {
                for line in lines {
                    if let Some(mut scope) = child_scope(ctx, target, line.extent(), padding) {
                        draw_polyline(ctx, &mut *scope, line, &self.style);
                    }
                }
            }
            other => log::trace!("Multi-geometry renderer cannot draw {:?}", other.kind()),
        }
    }
}

fn child_scope<'t>(
    ctx: &DrawContext,
    target: &'t mut dyn RasterTarget,
    extent: MapRect,
    padding: f64,
) -> Option<ClipScope<'t>> {
    let clip = ctx.region().intersection(&extent.inset(-padding, -padding))?;
    Some(ClipScope::new(target, ctx.local_rect(&clip)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::Polygon;
    use crate::render::{resolve_renderer, Pixmap, RendererKind};
    use crate::tests::RecordingTarget;
    use crate::{Color, DisplayContext};
    use overlayer_types::{latlon, GeoCoordinate};

    fn square(lat: f64, lon: f64, size: f64) -> Vec<GeoCoordinate> {
        vec![
            latlon!(lat + size, lon),
            latlon!(lat + size, lon + size),
            latlon!(lat, lon + size),
            latlon!(lat, lon),
        ]
    }

    fn children() -> Vec<Polygon> {
        vec![
            Polygon::new(square(0.0, 0.0, 1.0), vec![]),
            Polygon::new(square(0.5, 0.5, 1.0), vec![square(0.8, 0.8, 0.4)]),
            Polygon::new(square(-1.0, 1.2, 0.5), vec![]),
        ]
    }

    fn style() -> RenderStyle {
        RenderStyle::default()
            .with_fill_color(Color::rgba(200, 30, 30, 120))
            .with_stroke_color(Color::BLACK)
            .with_line_width(3.0)
    }

    #[test]
    fn multi_polygon_matches_separate_polygons() {
        let ctx = DisplayContext::default();
        let multi = Overlay::multi_polygon(children()).with_style(style());
        let separate: Vec<Overlay> = children()
            .into_iter()
            .map(|p| Overlay::new(OverlayGeometry::Polygon(p)).with_style(style()))
            .collect();

        let extent = multi.bounding_extent().inset(-20_000.0, -20_000.0);
        let zoom = 64.0 / extent.width;
        let half = extent.width / 2.0;
        let regions = [
            MapRect::new(extent.origin, half, half),
            MapRect::new(extent.origin.offset(half, 0.0), half, half),
            MapRect::new(extent.origin.offset(0.0, half), half, half),
            MapRect::new(extent.origin.offset(half, half), half, half),
        ];

        for region in regions {
            let mut combined = Pixmap::new(32, 32).unwrap();
            resolve_renderer(&multi, &ctx).draw(&region, zoom, &mut combined);

            let mut individual = Pixmap::new(32, 32).unwrap();
            for overlay in &separate {
                resolve_renderer(overlay, &ctx).draw(&region, zoom, &mut individual);
            }

            assert_eq!(combined.to_rgba_image(), individual.to_rgba_image());
        }
    }

    #[test]
    fn children_outside_region_are_skipped() {
        let multi = Overlay::multi_polygon(children()).with_style(style());
        let renderer = resolve_renderer(&multi, &DisplayContext::default());
        assert_eq!(renderer.kind(), RendererKind::MultiGeometry);

        let first = children()[0].extent();
        let region = first.inset(first.width * 0.25, first.height * 0.25);
        let mut target = RecordingTarget::new(100.0, 100.0);
        renderer.draw(&region, 100.0 / region.width, &mut target);

        // Fill and outline of the first child, fill and two ring outlines of the second. The third
        // child lies outside of the region.
        assert_eq!(target.ops.len(), 5);
    }

    #[test]
    fn multi_polyline_draws_each_line() {
        let lines = vec![
            crate::overlay::Polyline::new(vec![latlon!(0.0, 0.0), latlon!(1.0, 1.0)]),
            crate::overlay::Polyline::new(vec![latlon!(1.0, 0.0), latlon!(0.0, 1.0)]),
            crate::overlay::Polyline::new(vec![latlon!(0.5, 0.5)]),
        ];
        let multi = Overlay::multi_polyline(lines);
        let region = multi.bounding_extent().inset(-1000.0, -1000.0);
        let mut target = RecordingTarget::new(100.0, 100.0);
        resolve_renderer(&multi, &DisplayContext::default()).draw(&region, 100.0 / region.width, &mut target);

        assert_eq!(target.ops.len(), 2);
    }
}
