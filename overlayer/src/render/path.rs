use std::f32::consts::TAU;

use lyon::math::{point, Point};
use lyon::path::Path;

use crate::context::Palette;
use crate::overlay::{Circle, Overlay, OverlayGeometry, Polygon, Polyline};
use crate::render::target::{FillRule, Paint, RasterTarget, Shader, Stroke};
use crate::render::DrawContext;
use crate::style::{BlendMode, RenderStyle};

const MIN_CIRCLE_SEGMENTS: usize = 16;
const MAX_CIRCLE_SEGMENTS: usize = 256;

/// Strokes and fills circles, polylines and polygons.
///
/// Also used for the blend mode demo, where polygons are drawn with a mask or highlight color and a
/// non-default compositing operator.
#[derive(Debug, Clone)]
pub struct PathRenderer<'a> {
    overlay: &'a Overlay,
    style: RenderStyle,
}

impl<'a> PathRenderer<'a> {
    /// Creates a renderer drawing the overlay with the style.
    pub fn new(overlay: &'a Overlay, style: RenderStyle) -> Self {
        Self { overlay, style }
    }

    /// Renderer for the blend mode demo. A polygon with holes acts as a world covering mask with cutouts
    /// and darkens what is behind it, a polygon without holes highlights its area.
    pub fn with_blend(overlay: &'a Overlay, style: RenderStyle, has_holes: bool, palette: &Palette) -> Self {
        let style = if has_holes {
            style
                .with_fill_color(palette.mask)
                .with_blend_mode(BlendMode::Darken)
        } else {
            style
                .with_fill_color(palette.highlight)
                .with_blend_mode(BlendMode::Lighten)
        };

        Self::new(overlay, style)
    }

    /// Overlay being drawn.
    pub fn overlay(&self) -> &'a Overlay {
        self.overlay
    }

    /// Style used for drawing.
    pub fn style(&self) -> &RenderStyle {
        &self.style
    }

    pub(crate) fn render(&self, ctx: &DrawContext, target: &mut dyn RasterTarget) {
        match self.overlay.geometry() {
            OverlayGeometry::Circle(circle) => draw_circle(ctx, target, circle, &self.style),
            OverlayGeometry::Polyline(line) => draw_polyline(ctx, target, line, &self.style),
            OverlayGeometry::Polygon(polygon) => draw_polygon(ctx, target, polygon, &self.style),
            other => log::trace!("Path renderer cannot draw {:?}", other.kind()),
        }
    }
}

fn fill_paint(style: &RenderStyle) -> Paint {
    Paint {
        shader: Shader::Solid(style.fill_color),
        alpha: style.effective_alpha(),
        blend_mode: style.blend_mode,
    }
}

fn stroke_paint(style: &RenderStyle) -> Paint {
    Paint {
        shader: Shader::Solid(style.stroke_color),
        alpha: style.effective_alpha(),
        blend_mode: style.blend_mode,
    }
}

fn build_path<'p>(lines: impl IntoIterator<Item = (&'p [Point], bool)>) -> Path {
    let mut builder = Path::builder();
    for (points, closed) in lines {
        let Some((first, rest)) = points.split_first() else {
            continue;
        };

        builder.begin(*first);
        for p in rest {
            builder.line_to(*p);
        }
        builder.end(closed);
    }

    builder.build()
}

/// Stroke outline of the style, `None` if the style draws no lines.
pub(crate) fn stroke_for(style: &RenderStyle) -> Option<Stroke> {
    let width = style.effective_line_width();
    if width <= 0.0 {
        return None;
    }

    let stroke = Stroke::solid(width);
    Some(match style.dashes() {
        Some(pattern) => stroke.with_dashes(pattern.lengths().iter().map(|l| *l as f32).collect(), 0.0),
        None => stroke,
    })
}

/// Strokes one sub-path. Dashing restarts at the first vertex of every sub-path.
pub(crate) fn stroke_line(
    target: &mut dyn RasterTarget,
    points: &[Point],
    closed: bool,
    stroke: &Stroke,
    paint: &Paint,
) {
    if points.len() < 2 {
        return;
    }

    target.stroke_path(&build_path([(points, closed)]), stroke, paint);
}

/// Fills the rings with the even-odd rule and strokes every ring.
fn fill_and_stroke_rings(target: &mut dyn RasterTarget, rings: &[Vec<Point>], style: &RenderStyle) {
    if rings.is_empty() {
        return;
    }

    let fill = fill_paint(style);
    if !style.fill_color.is_transparent() {
        let path = build_path(rings.iter().map(|r| (r.as_slice(), true)));
        target.fill_path(&path, FillRule::EvenOdd, &fill);
    }

    let Some(stroke) = stroke_for(style) else {
        return;
    };
    let paint = stroke_paint(style);
    for ring in rings {
        stroke_line(target, ring, true, &stroke, &paint);
    }
}

fn project_ring(ctx: &DrawContext, ring: &Polyline) -> Vec<Point> {
    ring.points().iter().map(|p| ctx.to_local(p)).collect()
}

/// Draws a polygon. An exterior ring with fewer than three vertices skips the polygon, a degenerate
/// hole is skipped alone.
pub(crate) fn draw_polygon(
    ctx: &DrawContext,
    target: &mut dyn RasterTarget,
    polygon: &Polygon,
    style: &RenderStyle,
) {
    if polygon.exterior().len() < 3 {
        log::trace!(
            "Skipping polygon with {} exterior vertices",
            polygon.exterior().len()
        );
        return;
    }

    let mut rings = vec![project_ring(ctx, polygon.exterior())];
    for hole in polygon.interiors() {
        if hole.len() < 3 {
            log::trace!("Skipping polygon hole with {} vertices", hole.len());
            continue;
        }
        rings.push(project_ring(ctx, hole));
    }

    fill_and_stroke_rings(target, &rings, style);
}

/// Strokes an open line. Lines with fewer than two vertices are skipped.
pub(crate) fn draw_polyline(
    ctx: &DrawContext,
    target: &mut dyn RasterTarget,
    line: &Polyline,
    style: &RenderStyle,
) {
    if line.len() < 2 {
        log::trace!("Skipping polyline with {} vertices", line.len());
        return;
    }

    let Some(stroke) = stroke_for(style) else {
        return;
    };
    let points = project_ring(ctx, line);
    stroke_line(target, &points, false, &stroke, &stroke_paint(style));
}

fn draw_circle(ctx: &DrawContext, target: &mut dyn RasterTarget, circle: &Circle, style: &RenderStyle) {
    let radius = (circle.radius_in_map_points() * ctx.zoom_scale()) as f32;
    if !(radius.is_finite() && radius > 0.0) {
        log::trace!("Skipping circle with radius {}", circle.radius());
        return;
    }

    let center = ctx.to_local(&circle.center_point());
    let segments = ((radius / 2.0) as usize).clamp(MIN_CIRCLE_SEGMENTS, MAX_CIRCLE_SEGMENTS);
    let ring: Vec<Point> = (0..segments)
        .map(|i| {
            let angle = TAU * i as f32 / segments as f32;
            point(
                center.x + radius * angle.cos(),
                center.y + radius * angle.sin(),
            )
        })
        .collect();

    fill_and_stroke_rings(target, &[ring], style);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Pixmap;
    use crate::style::DashPattern;
    use crate::tests::{DrawOp, RecordingTarget};
    use crate::Color;
    use overlayer_types::{latlon, MapPoint, MapRect};

    fn square_context() -> (Overlay, DrawContext) {
        let overlay = Overlay::polygon(
            vec![
                latlon!(1.0, 0.0),
                latlon!(1.0, 1.0),
                latlon!(0.0, 1.0),
                latlon!(0.0, 0.0),
            ],
            vec![],
        );
        let extent = overlay.bounding_extent();
        let ctx = DrawContext::new(extent, 100.0 / extent.width);
        (overlay, ctx)
    }

    #[test]
    fn polygon_fills_and_strokes() {
        let (overlay, ctx) = square_context();
        let renderer = PathRenderer::new(&overlay, RenderStyle::default());
        let mut target = RecordingTarget::new(100.0, 100.0);

        renderer.render(&ctx, &mut target);
        assert_eq!(target.ops.len(), 2);
        assert!(matches!(target.ops[0], DrawOp::Fill { rule: FillRule::EvenOdd, .. }));
        assert!(matches!(target.ops[1], DrawOp::Stroke { width, .. } if width == 1.0));
    }

    #[test]
    fn degenerate_geometry_is_skipped() {
        let overlay = Overlay::polygon(vec![latlon!(0.0, 0.0), latlon!(1.0, 1.0)], vec![]);
        let ctx = DrawContext::new(MapRect::WORLD, 1.0);
        let mut target = RecordingTarget::new(100.0, 100.0);
        PathRenderer::new(&overlay, RenderStyle::default()).render(&ctx, &mut target);
        assert!(target.ops.is_empty());

        let line = Overlay::polyline(vec![latlon!(0.0, 0.0)]);
        PathRenderer::new(&line, RenderStyle::default()).render(&ctx, &mut target);
        assert!(target.ops.is_empty());
    }

    #[test]
    fn zero_width_line_draws_nothing() {
        let line = Overlay::polyline(vec![latlon!(0.0, 0.0), latlon!(1.0, 1.0)]);
        let ctx = DrawContext::new(line.bounding_extent(), 1e-3);
        let mut target = RecordingTarget::new(100.0, 100.0);
        PathRenderer::new(&line, RenderStyle::default().with_line_width(0.0)).render(&ctx, &mut target);
        assert!(target.ops.is_empty());
    }

    #[test]
    fn holes_stay_empty() {
        let overlay = Overlay::polygon(
            vec![
                latlon!(1.0, 0.0),
                latlon!(1.0, 1.0),
                latlon!(0.0, 1.0),
                latlon!(0.0, 0.0),
            ],
            vec![vec![
                latlon!(0.75, 0.25),
                latlon!(0.75, 0.75),
                latlon!(0.25, 0.75),
                latlon!(0.25, 0.25),
            ]],
        );
        let extent = overlay.bounding_extent();
        let ctx = DrawContext::new(extent, 100.0 / extent.width);
        let style = RenderStyle::default()
            .with_fill_color(Color::RED)
            .with_line_width(0.0);

        let mut pixmap = Pixmap::new(100, 100).unwrap();
        PathRenderer::new(&overlay, style).render(&ctx, &mut pixmap);

        assert_eq!(pixmap.pixel(10, 50), Some(Color::RED));
        assert_eq!(pixmap.pixel(50, 50), Some(Color::TRANSPARENT));
    }

    #[test]
    fn dashes_restart_for_every_ring() {
        let overlay = Overlay::polygon(
            vec![
                latlon!(1.0, 0.0),
                latlon!(1.0, 1.0),
                latlon!(0.0, 1.0),
                latlon!(0.0, 0.0),
            ],
            vec![vec![
                latlon!(0.75, 0.25),
                latlon!(0.75, 0.75),
                latlon!(0.25, 0.75),
                latlon!(0.25, 0.25),
            ]],
        );
        let extent = overlay.bounding_extent();
        let ctx = DrawContext::new(extent, 100.0 / extent.width);
        let style = RenderStyle::default()
            .with_fill_color(Color::TRANSPARENT)
            .with_line_width(2.0)
            .with_dash_pattern(DashPattern::new(vec![20.0, 25.0]).unwrap());
        let renderer = PathRenderer::new(&overlay, style);

        let mut target = RecordingTarget::new(100.0, 100.0);
        renderer.render(&ctx, &mut target);
        let strokes: Vec<_> = target
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Stroke {
                    dashes,
                    dash_offset,
                    sub_paths,
                    ..
                } => Some((dashes.clone(), *dash_offset, *sub_paths)),
                _ => None,
            })
            .collect();
        assert_eq!(strokes, vec![(vec![20.0, 25.0], 0.0, 1); 2]);

        // The hole starts at its top-left corner with a dash, not wherever the exterior pattern ended.
        let mut pixmap = Pixmap::new(100, 100).unwrap();
        renderer.render(&ctx, &mut pixmap);
        let start = ctx.to_local(&latlon!(0.75, 0.25).to_map_point());
        let (x, y) = (start.x.round() as u32 + 2, start.y.round() as u32);
        assert!(pixmap.pixel(x, y).is_some_and(|c| c.a() > 200));
    }

    #[test]
    fn blend_style_depends_on_holes() {
        let (overlay, _) = square_context();
        let palette = Palette::default();

        let mask = PathRenderer::with_blend(&overlay, RenderStyle::default(), true, &palette);
        assert_eq!(mask.style().blend_mode, BlendMode::Darken);
        assert_eq!(mask.style().fill_color, palette.mask);

        let highlight = PathRenderer::with_blend(&overlay, RenderStyle::default(), false, &palette);
        assert_eq!(highlight.style().blend_mode, BlendMode::Lighten);
        assert_eq!(highlight.style().fill_color, palette.highlight);
    }

    #[test]
    fn circle_is_polygonized_in_local_space() {
        let overlay = Overlay::circle(latlon!(0.0, 0.0), 1000.0);
        let center = overlay.bounding_extent().center();
        let ctx = DrawContext::new(
            MapRect::new(MapPoint::new(center.x - 1000.0, center.y - 1000.0), 2000.0, 2000.0),
            0.05,
        );
        let mut pixmap = Pixmap::new(100, 100).unwrap();
        PathRenderer::new(&overlay, RenderStyle::default().with_fill_color(Color::BLUE)).render(&ctx, &mut pixmap);

        assert_eq!(pixmap.pixel(50, 50), Some(Color::BLUE));
        assert_eq!(pixmap.pixel(2, 2), Some(Color::TRANSPARENT));
    }
}
