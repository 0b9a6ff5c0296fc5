use overlayer_types::{GeoCoordinate, MapPoint};

use crate::bitmap::BitmapData;
use crate::overlay::{Overlay, ScalarGrid};
use crate::render::target::{LocalRect, RasterTarget};
use crate::render::DrawContext;
use crate::style::RenderStyle;

/// Draws a scalar grid as color coded cells at native pixel resolution.
///
/// Every device pixel inside the clip is mapped back to a geographic coordinate, sampled from the grid
/// and colored through the grid's ramp. The colored pixels are drawn as one image aligned with the device
/// pixels of the target.
#[derive(Debug, Clone)]
pub struct GridRenderer<'a> {
    overlay: &'a Overlay,
    grid: &'a ScalarGrid,
    style: RenderStyle,
}

impl<'a> GridRenderer<'a> {
    /// Creates a new renderer. Alpha and blend mode of the style apply to the cells.
    pub fn new(overlay: &'a Overlay, grid: &'a ScalarGrid, style: RenderStyle) -> Self {
        Self {
            overlay,
            grid,
            style,
        }
    }

    /// Overlay being drawn.
    pub fn overlay(&self) -> &'a Overlay {
        self.overlay
    }

    pub(crate) fn render(&self, ctx: &DrawContext, target: &mut dyn RasterTarget) {
        let scale = target.content_scale();
        let clip = target.clip_rect().scale(scale);
        if clip.is_empty() {
            return;
        }

        let (x_start, x_end) = center_span(clip.min_x, clip.max_x);
        let (y_start, y_end) = center_span(clip.min_y, clip.max_y);
        let (width, height) = (x_end.saturating_sub(x_start), y_end.saturating_sub(y_start));
        if width == 0 || height == 0 {
            return;
        }

        let pixels_per_unit = ctx.zoom_scale() * scale as f64;
        let origin = ctx.region().origin;

        // Longitude depends only on the column and latitude only on the row.
        let longitudes: Vec<f64> = (x_start..x_end)
            .map(|x| {
                let map_x = origin.x + (x as f64 + 0.5) / pixels_per_unit;
                MapPoint::new(map_x, 0.0).to_geo_coordinate().lon()
            })
            .collect();

        let mut bytes = vec![0; width as usize * height as usize * 4];
        for (row, y) in (y_start..y_end).enumerate() {
            let map_y = origin.y + (y as f64 + 0.5) / pixels_per_unit;
            let lat = MapPoint::new(0.0, map_y).to_geo_coordinate().lat();

            for (column, lon) in longitudes.iter().enumerate() {
                let Some(color) = self
                    .grid
                    .value_at(&GeoCoordinate::latlon(lat, *lon))
                    .and_then(|value| self.grid.color_for(value))
                else {
                    continue;
                };

                let offset = (row * width as usize + column) * 4;
                bytes[offset..offset + 4].copy_from_slice(&color.to_u8_array());
            }
        }

        let image = match BitmapData::from_raw(bytes, width, height) {
            Ok(image) => image,
            Err(err) => {
                log::warn!("Failed to build grid image: {err}");
                return;
            }
        };
        let dest = LocalRect::new(
            x_start as f32,
            y_start as f32,
            x_end as f32,
            y_end as f32,
        )
        .scale(1.0 / scale);

        target.draw_image(&image, dest, self.style.effective_alpha(), self.style.blend_mode);
    }
}

/// Range of device pixels whose centers lie in `min..max`.
fn center_span(min: f32, max: f32) -> (u32, u32) {
    let start = (min - 0.5).ceil().max(0.0) as u32;
    let end = (max - 0.5).ceil().max(0.0) as u32;
    (start, end)
}
