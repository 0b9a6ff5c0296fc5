use std::ops::{Deref, DerefMut};

use lyon::math::Point;
use lyon::path::Path;
use overlayer_types::{local_pixel, MapPoint, MapRect};

use crate::bitmap::BitmapData;
use crate::style::BlendMode;
use crate::Color;

/// Axis aligned rectangle in the local point space of a raster target.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LocalRect {
    /// Left edge.
    pub min_x: f32,
    /// Top edge.
    pub min_y: f32,
    /// Right edge.
    pub max_x: f32,
    /// Bottom edge.
    pub max_y: f32,
}

impl LocalRect {
    /// Creates a new rectangle.
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Projects a planar rectangle into the local space of a region drawn at `zoom_scale`.
    pub fn from_map_rect(rect: &MapRect, zoom_scale: f64, region_origin: MapPoint) -> Self {
        let (min_x, min_y) = local_pixel(rect.origin, zoom_scale, region_origin);
        let (max_x, max_y) = local_pixel(
            MapPoint::new(rect.max_x(), rect.max_y()),
            zoom_scale,
            region_origin,
        );
        Self::new(min_x as f32, min_y as f32, max_x as f32, max_y as f32)
    }

    /// Width.
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    /// Height.
    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    /// Returns true if the rectangle covers no area.
    pub fn is_empty(&self) -> bool {
        !(self.max_x > self.min_x && self.max_y > self.min_y)
    }

    /// Common part of the rectangles. The result may be empty.
    pub fn intersection(&self, other: &LocalRect) -> LocalRect {
        LocalRect::new(
            self.min_x.max(other.min_x),
            self.min_y.max(other.min_y),
            self.max_x.min(other.max_x),
            self.max_y.min(other.max_y),
        )
    }

    /// Returns true if the point lies inside. Right and bottom edges are exclusive.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min_x && point.x < self.max_x && point.y >= self.min_y && point.y < self.max_y
    }

    /// Multiplies all coordinates by `factor`.
    pub fn scale(&self, factor: f32) -> LocalRect {
        LocalRect::new(
            self.min_x * factor,
            self.min_y * factor,
            self.max_x * factor,
            self.max_y * factor,
        )
    }
}

/// Rule deciding which areas of a self-intersecting or multi-ring path are inside.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum FillRule {
    /// Areas enclosed an odd number of times are inside. Interior rings become holes.
    #[default]
    EvenOdd,
    /// Areas with non-zero winding number are inside.
    NonZero,
}

/// Source of color for drawn pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Shader {
    /// Single color.
    Solid(Color),
    /// Color changing linearly from `start` to `end` (in local points). Beyond the end points the end
    /// colors extend.
    LinearGradient {
        /// Point with `start_color`.
        start: Point,
        /// Point with `end_color`.
        end: Point,
        /// Color at `start`.
        start_color: Color,
        /// Color at `end`.
        end_color: Color,
    },
}

/// Everything needed to color a primitive.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Paint {
    /// Color source.
    pub shader: Shader,
    /// Opacity multiplier in `[0, 1]`.
    pub alpha: f32,
    /// Compositing operator.
    pub blend_mode: BlendMode,
}

impl Paint {
    /// Opaque solid paint with normal blending.
    pub fn solid(color: Color) -> Self {
        Self {
            shader: Shader::Solid(color),
            alpha: 1.0,
            blend_mode: BlendMode::Normal,
        }
    }

    /// Sets opacity.
    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    /// Sets compositing operator.
    pub fn with_blend_mode(mut self, blend_mode: BlendMode) -> Self {
        self.blend_mode = blend_mode;
        self
    }
}

/// Outline of a stroked path.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    /// Line width in points.
    pub width: f32,
    /// Alternating dash and gap lengths in points, empty for a solid line. A list of odd length is
    /// repeated to make it even.
    pub dashes: Vec<f32>,
    /// Distance into the dash pattern at which every sub-path starts.
    pub dash_offset: f32,
}

impl Stroke {
    /// Solid stroke of the given width.
    pub fn solid(width: f32) -> Self {
        Self {
            width,
            dashes: vec![],
            dash_offset: 0.0,
        }
    }

    /// Sets the dash pattern.
    pub fn with_dashes(mut self, dashes: Vec<f32>, dash_offset: f32) -> Self {
        self.dashes = dashes;
        self.dash_offset = dash_offset;
        self
    }
}

/// Surface renderers draw into.
///
/// Geometry arrives in local points: `(map_point - region_origin) * zoom_scale`. The target maps points to
/// device pixels using its [content scale](RasterTarget::content_scale), so line widths given in points keep
/// their visual size on high density surfaces.
///
/// Implementations keep a stack of clip rectangles. Every drawing operation is limited to the
/// intersection of the stack and the target bounds.
pub trait RasterTarget {
    /// Size of the surface in points.
    fn size(&self) -> (f32, f32);

    /// Number of device pixels per point.
    fn content_scale(&self) -> f32;

    /// Adds a clip rectangle in local points. Prefer [`ClipScope`], which pops the clip automatically.
    fn push_clip(&mut self, rect: LocalRect);

    /// Removes the most recently pushed clip rectangle.
    fn pop_clip(&mut self);

    /// Currently effective clip rectangle in local points.
    fn clip_rect(&self) -> LocalRect;

    /// Fills the area enclosed by the path.
    fn fill_path(&mut self, path: &Path, fill_rule: FillRule, paint: &Paint);

    /// Strokes the path. The dash pattern restarts at the beginning of every sub-path.
    fn stroke_path(&mut self, path: &Path, stroke: &Stroke, paint: &Paint);

    /// Draws the image stretched into `dest`.
    fn draw_image(&mut self, image: &BitmapData, dest: LocalRect, alpha: f32, blend_mode: BlendMode);
}

/// Clip rectangle held for the lifetime of the guard.
///
/// Dereferences to the target, so all drawing done through the guard is clipped.
pub struct ClipScope<'a> {
    target: &'a mut dyn RasterTarget,
}

impl<'a> ClipScope<'a> {
    /// Pushes the clip rectangle onto the target.
    pub fn new(target: &'a mut dyn RasterTarget, rect: LocalRect) -> Self {
        target.push_clip(rect);
        Self { target }
    }
}

impl<'a> Deref for ClipScope<'a> {
    type Target = dyn RasterTarget + 'a;

    fn deref(&self) -> &Self::Target {
        &*self.target
    }
}

impl<'a> DerefMut for ClipScope<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.target
    }
}

impl Drop for ClipScope<'_> {
    fn drop(&mut self) {
        self.target.pop_clip();
    }
}
