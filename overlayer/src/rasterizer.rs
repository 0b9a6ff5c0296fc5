//! Reference coordinator that draws renderers region by region on a worker pool.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use overlayer_types::{MapPoint, MapRect};
use rayon::prelude::*;

use crate::error::RasterError;
use crate::render::{Pixmap, Renderer};
use crate::Color;

/// Counter identifying the current state of the viewport.
///
/// Every change of the viewport must [advance](ViewportGeneration::advance) the counter. Work started for an
/// older generation is abandoned and its results are never written into the output.
#[derive(Debug, Clone, Default)]
pub struct ViewportGeneration(Arc<AtomicU64>);

impl ViewportGeneration {
    /// Creates a counter starting at generation 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current generation.
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    /// Marks all running work as stale and returns the new generation.
    pub fn advance(&self) -> u64 {
        self.0.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Returns true if `generation` is still the current one.
    pub fn is_current(&self, generation: u64) -> bool {
        self.current() == generation
    }
}

/// Rectangular part of the visible area drawn by one job.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Region {
    /// Area of the region in planar space.
    pub rect: MapRect,
    /// Left edge in points from the left edge of the output.
    pub x: u32,
    /// Top edge in points from the top edge of the output.
    pub y: u32,
    /// Width in points.
    pub width: u32,
    /// Height in points.
    pub height: u32,
}

/// Draws overlays into an image by splitting the visible area into square regions and drawing the regions
/// concurrently.
///
/// Every region gets its own [`Pixmap`] holding a copy of its part of the background, and all renderers are
/// drawn into it in order. Blend modes therefore see the same backdrop as when drawing the whole view at once.
/// Finished regions replace their part of the output.
pub struct TiledRasterizer {
    pool: rayon::ThreadPool,
    region_size: u32,
    content_scale: f32,
    background: Option<Color>,
    generation: ViewportGeneration,
}

impl std::fmt::Debug for TiledRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TiledRasterizer")
            .field("threads", &self.pool.current_num_threads())
            .field("region_size", &self.region_size)
            .field("content_scale", &self.content_scale)
            .field("background", &self.background)
            .finish()
    }
}

impl TiledRasterizer {
    /// Default side of a region in points.
    pub const DEFAULT_REGION_SIZE: u32 = 256;

    /// Creates a rasterizer with `threads` workers. `0` lets rayon choose by the number of CPUs.
    pub fn new(threads: usize) -> Result<Self, RasterError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|index| format!("overlayer-raster-{index}"))
            .build()?;

        Ok(Self {
            pool,
            region_size: Self::DEFAULT_REGION_SIZE,
            content_scale: 1.0,
            background: None,
            generation: ViewportGeneration::new(),
        })
    }

    /// Sets the side of a region in points. Zero is replaced with 1.
    pub fn with_region_size(mut self, region_size: u32) -> Self {
        self.region_size = region_size.max(1);
        self
    }

    /// Sets the number of device pixels per point of the output.
    pub fn with_content_scale(mut self, content_scale: f32) -> Self {
        self.content_scale = content_scale;
        self
    }

    /// Sets the color the output is filled with before compositing regions.
    pub fn with_background(mut self, background: Color) -> Self {
        self.background = Some(background);
        self
    }

    /// Side of a region in points.
    pub fn region_size(&self) -> u32 {
        self.region_size
    }

    /// Viewport counter used to cancel stale work. Clones share the counter.
    pub fn generation(&self) -> ViewportGeneration {
        self.generation.clone()
    }

    /// Splits `visible` into regions in row-major order. Regions on the right and bottom edges may be smaller.
    pub fn regions(&self, visible: &MapRect, zoom_scale: f64) -> Vec<Region> {
        let Some((width, height)) = output_size(visible, zoom_scale) else {
            return vec![];
        };

        let size = self.region_size;
        let mut regions = vec![];
        for y in (0..height).step_by(size as usize) {
            for x in (0..width).step_by(size as usize) {
                let region_width = size.min(width - x);
                let region_height = size.min(height - y);
                let origin = MapPoint::new(
                    visible.origin.x + x as f64 / zoom_scale,
                    visible.origin.y + y as f64 / zoom_scale,
                );
                regions.push(Region {
                    rect: MapRect::new(
                        origin,
                        region_width as f64 / zoom_scale,
                        region_height as f64 / zoom_scale,
                    ),
                    x,
                    y,
                    width: region_width,
                    height: region_height,
                });
            }
        }

        regions
    }

    /// Draws the renderers into an image of the visible area.
    ///
    /// Returns `Ok(None)` if the viewport generation advanced while drawing.
    pub fn render(
        &self,
        renderers: &[Renderer<'_>],
        visible: &MapRect,
        zoom_scale: f64,
    ) -> Result<Option<Pixmap>, RasterError> {
        self.render_generation(renderers, visible, zoom_scale, self.generation.current())
    }

    /// Draws the renderers for the given viewport generation. Returns `Ok(None)` as soon as the generation
    /// is no longer current.
    pub fn render_generation(
        &self,
        renderers: &[Renderer<'_>],
        visible: &MapRect,
        zoom_scale: f64,
        generation: u64,
    ) -> Result<Option<Pixmap>, RasterError> {
        let (width, height) =
            output_size(visible, zoom_scale).ok_or(RasterError::InvalidSize { width: 0, height: 0 })?;
        let mut base = Pixmap::with_content_scale(width, height, self.content_scale)?;
        if let Some(background) = self.background {
            base.fill(background);
        }

        self.compose(renderers, visible, zoom_scale, base, generation)
    }

    /// Draws the renderers on top of `base`, for example a base map image of the visible area.
    ///
    /// The base must have the pixel size of the output, that is the visible area in points multiplied by the
    /// content scale. The background color is not used.
    pub fn render_over(
        &self,
        renderers: &[Renderer<'_>],
        visible: &MapRect,
        zoom_scale: f64,
        base: Pixmap,
    ) -> Result<Option<Pixmap>, RasterError> {
        let (width, height) =
            output_size(visible, zoom_scale).ok_or(RasterError::InvalidSize { width: 0, height: 0 })?;
        let expected = Pixmap::with_content_scale(width, height, self.content_scale)?;
        if (base.width(), base.height()) != (expected.width(), expected.height()) {
            return Err(RasterError::BaseSizeMismatch {
                width: expected.width(),
                height: expected.height(),
                actual_width: base.width(),
                actual_height: base.height(),
            });
        }

        self.compose(renderers, visible, zoom_scale, base, self.generation.current())
    }

    fn compose(
        &self,
        renderers: &[Renderer<'_>],
        visible: &MapRect,
        zoom_scale: f64,
        base: Pixmap,
        generation: u64,
    ) -> Result<Option<Pixmap>, RasterError> {
        let regions = self.regions(visible, zoom_scale);
        log::debug!(
            "Rasterizing {} renderers in {} regions of {}x{} pixels",
            renderers.len(),
            regions.len(),
            base.width(),
            base.height(),
        );

        let drawn: Vec<Option<(Region, Pixmap)>> = self.pool.install(|| {
            regions
                .par_iter()
                .map(|region| self.draw_region(renderers, region, zoom_scale, &base, generation))
                .collect::<Result<_, _>>()
        })?;

        if !self.generation.is_current(generation) {
            log::debug!("Viewport generation {generation} is stale, dropping rendered regions");
            return Ok(None);
        }

        let mut output = base;
        for (region, pixmap) in drawn.into_iter().flatten() {
            let (x, y) = self.device_offset(&region);
            output.copy_from(&pixmap, x, y);
        }

        Ok(Some(output))
    }

    fn device_offset(&self, region: &Region) -> (i32, i32) {
        let x = (region.x as f32 * self.content_scale).round() as i32;
        let y = (region.y as f32 * self.content_scale).round() as i32;
        (x, y)
    }

    fn draw_region(
        &self,
        renderers: &[Renderer<'_>],
        region: &Region,
        zoom_scale: f64,
        base: &Pixmap,
        generation: u64,
    ) -> Result<Option<(Region, Pixmap)>, RasterError> {
        if !self.generation.is_current(generation) {
            return Ok(None);
        }

        let mut pixmap = Pixmap::with_content_scale(region.width, region.height, self.content_scale)?;
        let (x, y) = self.device_offset(region);
        pixmap.copy_from(base, -x, -y);

        for renderer in renderers {
            if !self.generation.is_current(generation) {
                log::trace!("Region at {}, {} abandoned", region.x, region.y);
                return Ok(None);
            }

            renderer.draw(&region.rect, zoom_scale, &mut pixmap);
        }

        Ok(Some((*region, pixmap)))
    }
}

fn output_size(visible: &MapRect, zoom_scale: f64) -> Option<(u32, u32)> {
    if visible.is_empty() || !(zoom_scale.is_finite() && zoom_scale > 0.0) {
        return None;
    }

    let width = (visible.width * zoom_scale).round();
    let height = (visible.height * zoom_scale).round();
    if width < 1.0 || height < 1.0 || width > u32::MAX as f64 || height > u32::MAX as f64 {
        return None;
    }

    Some((width as u32, height as u32))
}
