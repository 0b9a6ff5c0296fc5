//! Renders one of the demo scenes into a PNG file.
//!
//! ```shell
//! cargo run --example render_scene -- blend
//! cargo run --example render_scene -- polygon ./museums.geojson
//! ```
//!
//! The first argument is the scene name (`polyline`, `polygon`, `circle`, `gradient`, `blend`,
//! `multi_geometry`, `hazard_grid` or `custom_tiles`). The optional second argument is a GeoJSON feature
//! collection whose features are added on top of the scene.

use anyhow::{anyhow, Result};
use overlayer::feed::geojson;
use overlayer::scene::Scene;
use overlayer::{Color, DisplayContext, OverlayGeometry, RenderStyle, Theme, TiledRasterizer};

const IMAGE_WIDTH: u32 = 1024;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let scene_name = args.next().unwrap_or_else(|| "blend".to_string());
    let scene: Scene = serde_json::from_value(serde_json::Value::String(scene_name.clone()))
        .map_err(|_| anyhow!("Unknown scene {scene_name:?}"))?;

    let context = DisplayContext::new(scene.display_mode(), Theme::Light);
    let mut catalog = scene.catalog(&context.palette);

    if let Some(file_name) = args.next() {
        let json = std::fs::read_to_string(file_name)?;
        let style = RenderStyle::default()
            .with_fill_color(Color::from_hex("#FF950080"))
            .with_stroke_color(Color::from_hex("#FF9500"))
            .with_line_width(2.0);
        let errors = catalog.ingest(geojson::decode(&json)?, Some(&style));
        if !errors.is_empty() {
            log::warn!("{} features of the feed were skipped", errors.len());
        }
    }

    let view = scene.view();
    let zoom_scale = scene.zoom_scale(IMAGE_WIDTH);

    // Tile renderers never wait for tiles, so load everything the view needs before drawing.
    for overlay in catalog.overlays() {
        if let OverlayGeometry::Tiles(tiles) = overlay.geometry() {
            let failed = tiles.load_visible(&view, zoom_scale, 1).await;
            if let Some(err) = failed.first() {
                log::warn!("{} tiles failed to load, first error: {err}", failed.len());
            }
        }
    }

    let rasterizer = TiledRasterizer::new(0)?.with_background(Color::WHITE);
    let renderers = catalog.renderers(&context);
    let pixmap = rasterizer
        .render(&renderers, &view, zoom_scale)?
        .ok_or_else(|| anyhow!("Rendering was cancelled"))?;

    let file_name = format!("output_{scene_name}.png");
    pixmap.to_rgba_image().save(&file_name)?;
    log::info!("{} saved to {file_name}", scene.title());

    Ok(())
}
