use lyon::math::Point;
use lyon::path::Path;

use crate::overlay::{Overlay, Polyline};
use crate::render::path::stroke_for;
use crate::render::target::{Paint, RasterTarget, Shader};
use crate::render::DrawContext;
use crate::style::{GradientStops, RenderStyle};
use crate::Color;

/// Strokes a polyline with colors changing along its length.
///
/// Every vertex gets the color of the gradient at its [location](GradientPathRenderer::location_at), and
/// each segment is drawn with a linear gradient between the colors of its end vertices.
#[derive(Debug, Clone)]
pub struct GradientPathRenderer<'a> {
    overlay: &'a Overlay,
    line: &'a Polyline,
    style: RenderStyle,
    stops: GradientStops,
    locations: Vec<f64>,
}

impl<'a> GradientPathRenderer<'a> {
    /// Creates a renderer. Stops of the style take precedence over `fallback_stops`.
    pub fn new(
        overlay: &'a Overlay,
        line: &'a Polyline,
        style: RenderStyle,
        fallback_stops: &GradientStops,
    ) -> Self {
        let stops = style
            .gradient_stops
            .clone()
            .unwrap_or_else(|| fallback_stops.clone());

        Self {
            overlay,
            line,
            style,
            stops,
            locations: locations(line),
        }
    }

    /// Overlay being drawn.
    pub fn overlay(&self) -> &'a Overlay {
        self.overlay
    }

    /// Fraction of the total path length at which the vertex lies: `0` for the first vertex, `1` for the
    /// last one. `None` if the index is out of range.
    pub fn location_at(&self, index: usize) -> Option<f64> {
        self.locations.get(index).copied()
    }

    /// Gradient color of the vertex.
    pub fn color_at(&self, index: usize) -> Option<Color> {
        let color = self.stops.color_at(self.location_at(index)?)?;
        Some(color)
    }

    pub(crate) fn render(&self, ctx: &DrawContext, target: &mut dyn RasterTarget) {
        if self.line.len() < 2 || self.stops.stops().is_empty() {
            return;
        }
        let Some(mut stroke) = stroke_for(&self.style) else {
            return;
        };

        let points: Vec<Point> = self.line.points().iter().map(|p| ctx.to_local(p)).collect();
        for (index, pair) in points.windows(2).enumerate() {
            let (Some(start_color), Some(end_color)) = (self.color_at(index), self.color_at(index + 1))
            else {
                continue;
            };

            let paint = Paint {
                shader: Shader::LinearGradient {
                    start: pair[0],
                    end: pair[1],
                    start_color,
                    end_color,
                },
                alpha: self.style.effective_alpha(),
                blend_mode: self.style.blend_mode,
            };

            let mut builder = Path::builder();
            builder.begin(pair[0]);
            builder.line_to(pair[1]);
            builder.end(false);
            target.stroke_path(&builder.build(), &stroke, &paint);

            // Segments are separate paths, so the dash pattern continues from where the previous one ended.
            stroke.dash_offset += (pair[1] - pair[0]).length();
        }
    }
}

/// Cumulative planar length up to each vertex divided by the total length.
fn locations(line: &Polyline) -> Vec<f64> {
    let points = line.points();
    let mut cumulative = Vec::with_capacity(points.len());
    let mut length = 0.0;
    for (index, point) in points.iter().enumerate() {
        if index > 0 {
            length += points[index - 1].distance(point);
        }
        cumulative.push(length);
    }

    if length > 0.0 {
        cumulative.iter_mut().for_each(|l| *l /= length);
    }

    cumulative
}
