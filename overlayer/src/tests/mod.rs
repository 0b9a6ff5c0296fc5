//! Test helpers shared by the unit tests of the crate.

use lyon::path::{Path, PathEvent};

use crate::bitmap::BitmapData;
use crate::render::{FillRule, LocalRect, Paint, RasterTarget, Stroke};
use crate::style::BlendMode;

/// Operation recorded by [`RecordingTarget`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DrawOp {
    Fill {
        rule: FillRule,
        sub_paths: usize,
        paint: Paint,
    },
    Stroke {
        width: f32,
        dashes: Vec<f32>,
        dash_offset: f32,
        sub_paths: usize,
        paint: Paint,
    },
    Image {
        dest: LocalRect,
        alpha: f32,
        size: (u32, u32),
    },
}

/// Raster target that records draw calls instead of producing pixels.
pub(crate) struct RecordingTarget {
    pub ops: Vec<DrawOp>,
    pub max_clip_depth: usize,
    pub first_clip: Option<LocalRect>,
    width: f32,
    height: f32,
    scale: f32,
    clips: Vec<LocalRect>,
}

impl RecordingTarget {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            ops: vec![],
            max_clip_depth: 0,
            first_clip: None,
            width,
            height,
            scale: 1.0,
            clips: vec![],
        }
    }

    pub fn with_content_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }
}

fn sub_paths(path: &Path) -> usize {
    path.iter()
        .filter(|event| matches!(event, PathEvent::Begin { .. }))
        .count()
}

impl RasterTarget for RecordingTarget {
    fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    fn content_scale(&self) -> f32 {
        self.scale
    }

    fn push_clip(&mut self, rect: LocalRect) {
        if self.first_clip.is_none() {
            self.first_clip = Some(rect);
        }

        let clip = self.clip_rect().intersection(&rect);
        self.clips.push(clip);
        self.max_clip_depth = self.max_clip_depth.max(self.clips.len());
    }

    fn pop_clip(&mut self) {
        assert!(self.clips.pop().is_some(), "unbalanced clip stack");
    }

    fn clip_rect(&self) -> LocalRect {
        self.clips
            .last()
            .copied()
            .unwrap_or(LocalRect::new(0.0, 0.0, self.width, self.height))
    }

    fn fill_path(&mut self, path: &Path, fill_rule: FillRule, paint: &Paint) {
        self.ops.push(DrawOp::Fill {
            rule: fill_rule,
            sub_paths: sub_paths(path),
            paint: *paint,
        });
    }

    fn stroke_path(&mut self, path: &Path, stroke: &Stroke, paint: &Paint) {
        self.ops.push(DrawOp::Stroke {
            width: stroke.width,
            dashes: stroke.dashes.clone(),
            dash_offset: stroke.dash_offset,
            sub_paths: sub_paths(path),
            paint: *paint,
        });
    }

    fn draw_image(&mut self, image: &BitmapData, dest: LocalRect, alpha: f32, _blend_mode: BlendMode) {
        self.ops.push(DrawOp::Image {
            dest,
            alpha,
            size: (image.width(), image.height()),
        });
    }
}
