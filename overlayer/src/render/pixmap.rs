use lyon::path::{Path, PathEvent};
use tiny_skia as sk;

use crate::bitmap::BitmapData;
use crate::error::RasterError;
use crate::render::target::{FillRule, LocalRect, Paint, RasterTarget, Shader, Stroke};
use crate::style::BlendMode;
use crate::Color;

const MAX_SIZE: u32 = 16384;
const MITER_LIMIT: f32 = 2.0;

/// CPU raster surface backed by a [`tiny_skia::Pixmap`].
///
/// Geometry is given in points and scaled to device pixels by the content scale. The clip stack is kept as
/// rectangles and turned into a [`tiny_skia::Mask`] whenever it changes.
#[derive(Clone)]
pub struct Pixmap {
    pixmap: sk::Pixmap,
    scale: f32,
    clips: Vec<LocalRect>,
    mask: Option<sk::Mask>,
}

impl std::fmt::Debug for Pixmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pixmap")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .field("scale", &self.scale)
            .field("clips", &self.clips)
            .finish()
    }
}

impl Pixmap {
    /// Creates a transparent surface of `width` x `height` pixels with content scale 1.
    pub fn new(width: u32, height: u32) -> Result<Self, RasterError> {
        Self::with_content_scale(width, height, 1.0)
    }

    /// Creates a transparent surface of `width` x `height` points with `scale` pixels per point.
    pub fn with_content_scale(width: u32, height: u32, scale: f32) -> Result<Self, RasterError> {
        let scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            1.0
        };
        let device_width = (width as f32 * scale).ceil() as u32;
        let device_height = (height as f32 * scale).ceil() as u32;

        if device_width > MAX_SIZE || device_height > MAX_SIZE {
            return Err(RasterError::InvalidSize { width, height });
        }
        let pixmap = sk::Pixmap::new(device_width, device_height)
            .ok_or(RasterError::InvalidSize { width, height })?;

        Ok(Self {
            pixmap,
            scale,
            clips: Vec::new(),
            mask: None,
        })
    }

    /// Width in device pixels.
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    /// Height in device pixels.
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Color of the device pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.pixmap.pixel(x, y).map(|px| px.demultiply().into())
    }

    /// Sets every pixel to the color, ignoring clips.
    pub fn fill(&mut self, color: Color) {
        self.pixmap.fill(color.into());
    }

    /// Replaces pixels with the ones of `other` placed with its top-left corner at device pixel `x`, `y`.
    /// Offsets may be negative to copy a part of a larger pixmap. Clips are ignored.
    pub fn copy_from(&mut self, other: &Pixmap, x: i32, y: i32) {
        let paint = sk::PixmapPaint {
            blend_mode: sk::BlendMode::Source,
            ..Default::default()
        };
        self.pixmap.draw_pixmap(
            x,
            y,
            other.pixmap.as_ref(),
            &paint,
            sk::Transform::identity(),
            None,
        );
    }

    /// Converts the surface into an image.
    pub fn to_rgba_image(&self) -> image::RgbaImage {
        let mut bytes = Vec::with_capacity(self.pixmap.data().len());
        for px in self.pixmap.pixels() {
            let color = px.demultiply();
            bytes.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
        }

        image::RgbaImage::from_raw(self.width(), self.height(), bytes)
            .unwrap_or_else(|| image::RgbaImage::new(self.width(), self.height()))
    }

    fn bounds(&self) -> LocalRect {
        LocalRect::new(
            0.0,
            0.0,
            self.width() as f32 / self.scale,
            self.height() as f32 / self.scale,
        )
    }

    fn transform(&self) -> sk::Transform {
        sk::Transform::from_scale(self.scale, self.scale)
    }

    fn update_mask(&mut self) {
        let Some(clip) = self.clips.last() else {
            self.mask = None;
            return;
        };

        let device = clip.scale(self.scale);
        let (width, height) = (self.width() as f32, self.height() as f32);
        if device.min_x <= 0.0 && device.min_y <= 0.0 && device.max_x >= width && device.max_y >= height {
            self.mask = None;
            return;
        }

        // Pixels are inside the clip when their centers are, so the mask is not anti-aliased.
        let mut mask = sk::Mask::new(self.width(), self.height());
        if let (Some(mask), Some(rect)) = (
            mask.as_mut(),
            sk::Rect::from_ltrb(device.min_x, device.min_y, device.max_x, device.max_y),
        ) {
            mask.fill_path(
                &sk::PathBuilder::from_rect(rect),
                sk::FillRule::Winding,
                false,
                sk::Transform::identity(),
            );
        }
        self.mask = mask;
    }
}

fn to_skia_path(path: &Path) -> Option<sk::Path> {
    let mut builder = sk::PathBuilder::new();
    for event in path.iter() {
        match event {
            PathEvent::Begin { at } => builder.move_to(at.x, at.y),
            PathEvent::Line { to, .. } => builder.line_to(to.x, to.y),
            PathEvent::Quadratic { ctrl, to, .. } => builder.quad_to(ctrl.x, ctrl.y, to.x, to.y),
            PathEvent::Cubic {
                ctrl1, ctrl2, to, ..
            } => builder.cubic_to(ctrl1.x, ctrl1.y, ctrl2.x, ctrl2.y, to.x, to.y),
            PathEvent::End { close, .. } => {
                if close {
                    builder.close();
                }
            }
        }
    }

    builder.finish()
}

fn to_skia_paint(paint: &Paint) -> sk::Paint<'static> {
    let alpha = paint.alpha.clamp(0.0, 1.0);
    let shader = match paint.shader {
        Shader::Solid(color) => sk::Shader::SolidColor(color.fade(alpha).into()),
        Shader::LinearGradient {
            start,
            end,
            start_color,
            end_color,
        } => {
            let (start_color, end_color) = (start_color.fade(alpha), end_color.fade(alpha));
            sk::LinearGradient::new(
                sk::Point::from_xy(start.x, start.y),
                sk::Point::from_xy(end.x, end.y),
                vec![
                    sk::GradientStop::new(0.0, start_color.into()),
                    sk::GradientStop::new(1.0, end_color.into()),
                ],
                sk::SpreadMode::Pad,
                sk::Transform::identity(),
            )
            .unwrap_or(sk::Shader::SolidColor(end_color.into()))
        }
    };

    sk::Paint {
        shader,
        blend_mode: paint.blend_mode.into(),
        anti_alias: true,
        ..Default::default()
    }
}

fn to_skia_stroke(stroke: &Stroke) -> sk::Stroke {
    let mut dashes = stroke.dashes.clone();
    if dashes.len() % 2 == 1 {
        dashes.extend_from_within(..);
    }

    let dash = if dashes.is_empty() {
        None
    } else {
        let dash = sk::StrokeDash::new(dashes, stroke.dash_offset);
        if dash.is_none() {
            log::debug!("Invalid dash pattern {:?}, drawing a solid line", stroke.dashes);
        }
        dash
    };

    sk::Stroke {
        width: stroke.width,
        miter_limit: MITER_LIMIT,
        dash,
        ..Default::default()
    }
}

impl From<FillRule> for sk::FillRule {
    fn from(value: FillRule) -> Self {
        match value {
            FillRule::EvenOdd => sk::FillRule::EvenOdd,
            FillRule::NonZero => sk::FillRule::Winding,
        }
    }
}

impl From<BlendMode> for sk::BlendMode {
    fn from(value: BlendMode) -> Self {
        match value {
            BlendMode::Normal => sk::BlendMode::SourceOver,
            BlendMode::Multiply => sk::BlendMode::Multiply,
            BlendMode::Screen => sk::BlendMode::Screen,
            BlendMode::Overlay => sk::BlendMode::Overlay,
            BlendMode::Darken => sk::BlendMode::Darken,
            BlendMode::Lighten => sk::BlendMode::Lighten,
            BlendMode::Difference => sk::BlendMode::Difference,
        }
    }
}

impl RasterTarget for Pixmap {
    fn size(&self) -> (f32, f32) {
        let bounds = self.bounds();
        (bounds.width(), bounds.height())
    }

    fn content_scale(&self) -> f32 {
        self.scale
    }

    fn push_clip(&mut self, rect: LocalRect) {
        let clip = self.clip_rect().intersection(&rect);
        self.clips.push(clip);
        self.update_mask();
    }

    fn pop_clip(&mut self) {
        if self.clips.pop().is_none() {
            log::warn!("Unbalanced clip stack pop");
        }
        self.update_mask();
    }

    fn clip_rect(&self) -> LocalRect {
        self.clips.last().copied().unwrap_or_else(|| self.bounds())
    }

    fn fill_path(&mut self, path: &Path, fill_rule: FillRule, paint: &Paint) {
        if self.clip_rect().is_empty() {
            return;
        }
        let Some(path) = to_skia_path(path) else {
            return;
        };

        let transform = self.transform();
        self.pixmap.fill_path(
            &path,
            &to_skia_paint(paint),
            fill_rule.into(),
            transform,
            self.mask.as_ref(),
        );
    }

    fn stroke_path(&mut self, path: &Path, stroke: &Stroke, paint: &Paint) {
        if stroke.width.is_nan() || stroke.width <= 0.0 || self.clip_rect().is_empty() {
            return;
        }
        let Some(path) = to_skia_path(path) else {
            return;
        };

        let transform = self.transform();
        self.pixmap.stroke_path(
            &path,
            &to_skia_paint(paint),
            &to_skia_stroke(stroke),
            transform,
            self.mask.as_ref(),
        );
    }

    fn draw_image(&mut self, image: &BitmapData, dest: LocalRect, alpha: f32, blend_mode: BlendMode) {
        if self.clip_rect().is_empty() {
            return;
        }
        let Some(rect) = sk::Rect::from_ltrb(dest.min_x, dest.min_y, dest.max_x, dest.max_y) else {
            return;
        };

        let image_transform = sk::Transform::from_row(
            dest.width() / image.width() as f32,
            0.0,
            0.0,
            dest.height() / image.height() as f32,
            dest.min_x,
            dest.min_y,
        );
        let paint = sk::Paint {
            shader: sk::Pattern::new(
                image.as_pixmap(),
                sk::SpreadMode::Pad,
                sk::FilterQuality::Nearest,
                alpha.clamp(0.0, 1.0),
                image_transform,
            ),
            blend_mode: blend_mode.into(),
            anti_alias: false,
            ..Default::default()
        };

        let transform = self.transform();
        self.pixmap
            .fill_rect(rect, &paint, transform, self.mask.as_ref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::target::ClipScope;
    use crate::style::DashPattern;
    use approx::assert_abs_diff_eq;
    use lyon::math::point;

    fn rect_path(x0: f32, y0: f32, x1: f32, y1: f32) -> Path {
        let mut builder = Path::builder();
        builder.begin(point(x0, y0));
        builder.line_to(point(x1, y0));
        builder.line_to(point(x1, y1));
        builder.line_to(point(x0, y1));
        builder.close();
        builder.build()
    }

    fn line_path(x0: f32, y0: f32, x1: f32, y1: f32) -> Path {
        let mut builder = Path::builder();
        builder.begin(point(x0, y0));
        builder.line_to(point(x1, y1));
        builder.end(false);
        builder.build()
    }

    #[test]
    fn invalid_size() {
        assert!(Pixmap::new(0, 10).is_err());
        assert!(Pixmap::new(10, MAX_SIZE + 1).is_err());
    }

    #[test]
    fn fills_rect_exactly() {
        let mut pixmap = Pixmap::new(10, 10).unwrap();
        pixmap.fill_path(&rect_path(2.0, 2.0, 6.0, 5.0), FillRule::NonZero, &Paint::solid(Color::RED));

        assert_eq!(pixmap.pixel(2, 2), Some(Color::RED));
        assert_eq!(pixmap.pixel(5, 4), Some(Color::RED));
        assert_eq!(pixmap.pixel(6, 4), Some(Color::TRANSPARENT));
        assert_eq!(pixmap.pixel(1, 2), Some(Color::TRANSPARENT));
    }

    #[test]
    fn even_odd_makes_holes() {
        let mut builder = Path::builder();
        for (x0, y0, x1, y1) in [(0.0, 0.0, 10.0, 10.0), (3.0, 3.0, 7.0, 7.0)] {
            builder.begin(point(x0, y0));
            builder.line_to(point(x1, y0));
            builder.line_to(point(x1, y1));
            builder.line_to(point(x0, y1));
            builder.close();
        }
        let path = builder.build();

        let mut pixmap = Pixmap::new(10, 10).unwrap();
        pixmap.fill_path(&path, FillRule::EvenOdd, &Paint::solid(Color::BLUE));
        assert_eq!(pixmap.pixel(1, 1), Some(Color::BLUE));
        assert_eq!(pixmap.pixel(5, 5), Some(Color::TRANSPARENT));
    }

    #[test]
    fn drawing_respects_clip() {
        let mut pixmap = Pixmap::new(10, 10).unwrap();
        {
            let mut clipped = ClipScope::new(&mut pixmap, LocalRect::new(0.0, 0.0, 4.0, 10.0));
            clipped.fill_path(&rect_path(0.0, 0.0, 10.0, 10.0), FillRule::NonZero, &Paint::solid(Color::RED));
        }

        assert_eq!(pixmap.pixel(3, 5), Some(Color::RED));
        assert_eq!(pixmap.pixel(4, 5), Some(Color::TRANSPARENT));

        pixmap.fill_path(&rect_path(8.0, 8.0, 9.0, 9.0), FillRule::NonZero, &Paint::solid(Color::GREEN));
        assert_eq!(pixmap.pixel(8, 8), Some(Color::GREEN));
    }

    #[test]
    fn empty_clip_draws_nothing() {
        let mut pixmap = Pixmap::new(10, 10).unwrap();
        let mut clipped = ClipScope::new(&mut pixmap, LocalRect::new(20.0, 20.0, 30.0, 30.0));
        clipped.fill_path(&rect_path(0.0, 0.0, 10.0, 10.0), FillRule::NonZero, &Paint::solid(Color::RED));
        drop(clipped);

        assert_eq!(pixmap.pixel(5, 5), Some(Color::TRANSPARENT));
    }

    #[test]
    fn self_overlapping_stroke_blends_once() {
        let mut builder = Path::builder();
        builder.begin(point(1.0, 5.0));
        builder.line_to(point(9.0, 5.0));
        builder.line_to(point(1.0, 5.5));
        builder.end(false);
        let path = builder.build();
        let paint = Paint::solid(Color::RED).with_alpha(0.5);

        let mut overlapping = Pixmap::new(10, 10).unwrap();
        overlapping.stroke_path(&path, &Stroke::solid(4.0), &paint);
        let mut straight = Pixmap::new(10, 10).unwrap();
        straight.stroke_path(&line_path(1.0, 5.0, 9.0, 5.0), &Stroke::solid(4.0), &paint);

        assert_eq!(overlapping.pixel(4, 4), straight.pixel(4, 4));
    }

    #[test]
    fn dash_pattern_on_66_points_makes_one_full_cycle() {
        let pattern = DashPattern::new(vec![20.0, 10.0, 5.0, 10.0, 1.0, 10.0]).unwrap();
        let lengths: Vec<f32> = pattern.lengths().iter().map(|l| *l as f32).collect();
        let dash = sk::StrokeDash::new(lengths, 0.0).unwrap();
        let line = to_skia_path(&line_path(0.0, 0.0, 66.0, 0.0)).unwrap();

        let dashed = line.dash(&dash, 1.0).unwrap();
        let mut dashes = vec![];
        for segment in dashed.segments() {
            match segment {
                sk::PathSegment::MoveTo(p) => dashes.push((p.x, p.x)),
                sk::PathSegment::LineTo(p) => {
                    if let Some(last) = dashes.last_mut() {
                        last.1 = p.x;
                    }
                }
                _ => {}
            }
        }

        let expected = [(0.0, 20.0), (30.0, 35.0), (45.0, 46.0), (56.0, 66.0)];
        assert_eq!(dashes.len(), expected.len());
        for (actual, expected) in dashes.into_iter().zip(expected) {
            assert_abs_diff_eq!(actual.0, expected.0, epsilon = 1e-3);
            assert_abs_diff_eq!(actual.1, expected.1, epsilon = 1e-3);
        }
        assert_eq!(pattern.full_cycles(66.0), 1);
    }

    #[test]
    fn dashed_stroke_leaves_gaps() {
        let mut pixmap = Pixmap::new(70, 4).unwrap();
        let stroke = Stroke::solid(2.0).with_dashes(vec![20.0, 10.0, 5.0, 10.0, 1.0, 10.0], 0.0);
        pixmap.stroke_path(&line_path(0.0, 2.0, 66.0, 2.0), &stroke, &Paint::solid(Color::BLACK));

        assert_eq!(pixmap.pixel(10, 2), Some(Color::BLACK));
        assert_eq!(pixmap.pixel(25, 2), Some(Color::TRANSPARENT));
        assert_eq!(pixmap.pixel(32, 2), Some(Color::BLACK));
        assert_eq!(pixmap.pixel(40, 2), Some(Color::TRANSPARENT));
        assert_eq!(pixmap.pixel(60, 2), Some(Color::BLACK));
    }

    #[test]
    fn odd_dash_list_is_repeated() {
        let mut pixmap = Pixmap::new(40, 4).unwrap();
        let stroke = Stroke::solid(2.0).with_dashes(vec![10.0], 0.0);
        pixmap.stroke_path(&line_path(0.0, 2.0, 40.0, 2.0), &stroke, &Paint::solid(Color::BLACK));

        assert_eq!(pixmap.pixel(5, 2), Some(Color::BLACK));
        assert_eq!(pixmap.pixel(15, 2), Some(Color::TRANSPARENT));
        assert_eq!(pixmap.pixel(25, 2), Some(Color::BLACK));
    }

    #[test]
    fn blend_modes_use_backdrop() {
        let gray = Color::rgb(128, 128, 128);
        let dark = Color::rgb(50, 50, 50);
        let cases = [
            (BlendMode::Normal, dark),
            (BlendMode::Darken, dark),
            (BlendMode::Lighten, gray),
        ];

        for (mode, expected) in cases {
            let mut pixmap = Pixmap::new(4, 4).unwrap();
            pixmap.fill(gray);
            let paint = Paint::solid(dark).with_blend_mode(mode);
            pixmap.fill_path(&rect_path(0.0, 0.0, 4.0, 4.0), FillRule::NonZero, &paint);
            assert_eq!(pixmap.pixel(1, 1), Some(expected), "{mode:?}");
        }
    }

    #[test]
    fn linear_gradient_runs_between_points() {
        let mut pixmap = Pixmap::new(100, 4).unwrap();
        let paint = Paint {
            shader: Shader::LinearGradient {
                start: point(0.0, 0.0),
                end: point(100.0, 0.0),
                start_color: Color::RED,
                end_color: Color::BLUE,
            },
            alpha: 1.0,
            blend_mode: BlendMode::Normal,
        };
        pixmap.fill_path(&rect_path(0.0, 0.0, 100.0, 4.0), FillRule::NonZero, &paint);

        let left = pixmap.pixel(1, 1).unwrap();
        let right = pixmap.pixel(98, 1).unwrap();
        assert!(left.r() > 240 && left.b() < 15);
        assert!(right.b() > 240 && right.r() < 15);
    }

    #[test]
    fn content_scale_doubles_pixels() {
        let mut pixmap = Pixmap::with_content_scale(10, 10, 2.0).unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (20, 20));
        assert_eq!(pixmap.size(), (10.0, 10.0));

        pixmap.fill_path(&rect_path(0.0, 0.0, 5.0, 5.0), FillRule::NonZero, &Paint::solid(Color::RED));
        assert_eq!(pixmap.pixel(9, 9), Some(Color::RED));
        assert_eq!(pixmap.pixel(10, 9), Some(Color::TRANSPARENT));
    }

    #[test]
    fn image_is_stretched_into_dest() {
        let bytes = [Color::RED, Color::GREEN, Color::BLUE, Color::WHITE]
            .iter()
            .flat_map(|c| c.to_u8_array())
            .collect();
        let image = BitmapData::from_raw(bytes, 2, 2).unwrap();

        let mut pixmap = Pixmap::new(8, 8).unwrap();
        pixmap.draw_image(&image, LocalRect::new(0.0, 0.0, 8.0, 8.0), 1.0, BlendMode::Normal);

        assert_eq!(pixmap.pixel(0, 0), Some(Color::RED));
        assert_eq!(pixmap.pixel(7, 0), Some(Color::GREEN));
        assert_eq!(pixmap.pixel(0, 7), Some(Color::BLUE));
        assert_eq!(pixmap.pixel(4, 4), Some(Color::WHITE));
    }

    #[test]
    fn copy_replaces_pixels() {
        let mut pixmap = Pixmap::new(3, 2).unwrap();
        pixmap.fill(Color::YELLOW);
        let mut other = Pixmap::new(2, 2).unwrap();
        other.fill(Color::BLUE.with_alpha(0));
        other.fill_path(&rect_path(1.0, 1.0, 2.0, 2.0), FillRule::NonZero, &Paint::solid(Color::BLUE));
        pixmap.copy_from(&other, 1, 0);

        let image = pixmap.to_rgba_image();
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(image.get_pixel(0, 0).0, [255, 255, 0, 255]);
        assert_eq!(image.get_pixel(1, 0).0, [0, 0, 0, 0]);
        assert_eq!(image.get_pixel(2, 1).0, [0, 0, 255, 255]);
    }

    #[test]
    fn copy_with_negative_offset_takes_part_of_source() {
        let mut large = Pixmap::new(4, 4).unwrap();
        large.fill_path(&rect_path(2.0, 2.0, 4.0, 4.0), FillRule::NonZero, &Paint::solid(Color::RED));

        let mut part = Pixmap::new(2, 2).unwrap();
        part.copy_from(&large, -2, -2);
        assert_eq!(part.pixel(0, 0), Some(Color::RED));
        assert_eq!(part.pixel(1, 1), Some(Color::RED));
    }
}
