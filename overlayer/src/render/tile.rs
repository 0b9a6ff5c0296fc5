use lyon::math::point;
use lyon::path::Path;

use crate::overlay::Overlay;
use crate::render::target::{FillRule, LocalRect, Paint, RasterTarget};
use crate::render::DrawContext;
use crate::style::RenderStyle;
use crate::tile::{TileOverlay, TileState};

/// Draws bitmap tiles of a [`TileOverlay`].
///
/// Only cached tiles are drawn. Missing tiles are requested from the loader in background and, if the
/// overlay has a placeholder color, covered with it until they arrive. Failed tiles are left empty.
#[derive(Debug, Clone)]
pub struct TileRenderer<'a> {
    overlay: &'a Overlay,
    tiles: &'a TileOverlay,
    style: RenderStyle,
}

impl<'a> TileRenderer<'a> {
    /// Creates a new renderer. Alpha and blend mode of the style apply to the tile images.
    pub fn new(overlay: &'a Overlay, tiles: &'a TileOverlay, style: RenderStyle) -> Self {
        Self {
            overlay,
            tiles,
            style,
        }
    }

    /// Overlay being drawn.
    pub fn overlay(&self) -> &'a Overlay {
        self.overlay
    }

    pub(crate) fn render(&self, ctx: &DrawContext, target: &mut dyn RasterTarget) {
        let z = self.tiles.zoom_level(ctx.zoom_scale());
        let scale = target.content_scale().round().max(1.0) as u32;
        let alpha = self.style.effective_alpha();
        let loader = self.tiles.loader();

        for (key, rect) in self.tiles.tiles_in(&ctx.visible(), z, scale) {
            let dest = ctx.local_rect(&rect);
            match loader.cached(&key) {
                Some(TileState::Loaded(bitmap)) => {
                    target.draw_image(&bitmap, dest, alpha, self.style.blend_mode);
                }
                Some(TileState::Failed(err)) => {
                    log::trace!("Tile {key:?} is not drawn: {err}");
                }
                None => {
                    loader.request(key);
                    if let Some(color) = self.tiles.placeholder() {
                        let paint = Paint::solid(color)
                            .with_alpha(alpha)
                            .with_blend_mode(self.style.blend_mode);
                        target.fill_path(&rect_path(dest), FillRule::NonZero, &paint);
                    }
                }
            }
        }
    }
}

fn rect_path(rect: LocalRect) -> Path {
    let mut builder = Path::builder();
    builder.begin(point(rect.min_x, rect.min_y));
    builder.line_to(point(rect.max_x, rect.min_y));
    builder.line_to(point(rect.max_x, rect.max_y));
    builder.line_to(point(rect.min_x, rect.max_y));
    builder.close();
    builder.build()
}
