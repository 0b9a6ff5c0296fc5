//! Bitmap tile overlays: tile addressing, URL templates, tile sources and the caching loader.

mod loader;
mod source;
mod template;

pub use loader::{TileLoader, TileState, TileStatus};
pub use source::{DebugTileSource, TileSource, UrlTileSource};
pub use template::{TileLocator, TileUrlTemplate};

use std::collections::HashSet;
use std::sync::Arc;

use overlayer_types::{MapPoint, MapRect, WebMercator};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;

use crate::error::{TemplateError, TileLoadError};
use crate::Color;

/// Address of one bitmap tile.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TileKey {
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
    /// Zoom level.
    pub z: u32,
    /// Device scale factor the tile is requested for (1 for regular, 2 for high density displays).
    pub scale: u32,
}

impl TileKey {
    /// Creates a new key.
    pub fn new(x: u32, y: u32, z: u32, scale: u32) -> Self {
        Self { x, y, z, scale }
    }
}

/// Serializable description of a URL based tile overlay.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TileOverlayConfig {
    /// URL template, see [`TileUrlTemplate`].
    pub url_template: String,
    /// Tile side in points.
    #[cfg_attr(feature = "serde", serde(default = "default_tile_size"))]
    pub tile_size: u32,
    /// Lowest zoom level the source has tiles for.
    #[cfg_attr(feature = "serde", serde(default))]
    pub min_zoom: u32,
    /// Highest zoom level the source has tiles for. Deeper zooms stretch tiles of this level.
    #[cfg_attr(feature = "serde", serde(default = "default_max_zoom"))]
    pub max_zoom: u32,
    /// Rows are counted from the south (TMS) rather than from the north.
    #[cfg_attr(feature = "serde", serde(default))]
    pub flip_y: bool,
}

#[cfg(feature = "serde")]
fn default_tile_size() -> u32 {
    TileOverlay::DEFAULT_TILE_SIZE
}

#[cfg(feature = "serde")]
fn default_max_zoom() -> u32 {
    TileOverlay::DEFAULT_MAX_ZOOM
}

/// Overlay drawing bitmap tiles produced by a [`TileLoader`].
#[derive(Clone)]
pub struct TileOverlay {
    loader: Arc<TileLoader>,
    tile_size: u32,
    min_zoom: u32,
    max_zoom: u32,
    flip_y: bool,
    placeholder: Option<Color>,
}

impl std::fmt::Debug for TileOverlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileOverlay")
            .field("tile_size", &self.tile_size)
            .field("min_zoom", &self.min_zoom)
            .field("max_zoom", &self.max_zoom)
            .field("flip_y", &self.flip_y)
            .finish()
    }
}

impl TileOverlay {
    /// Default tile side in points.
    pub const DEFAULT_TILE_SIZE: u32 = 256;
    /// Default highest zoom level.
    pub const DEFAULT_MAX_ZOOM: u32 = 19;
    /// Highest supported zoom level. Column and row indices of deeper levels would not fit into `u32`.
    pub const MAX_ZOOM_LEVEL: u32 = 31;

    /// Overlay loading tiles from the given template.
    pub fn new(template: TileUrlTemplate) -> Self {
        Self::with_source(UrlTileSource::new(template))
    }

    /// Overlay using a custom tile source.
    pub fn with_source(source: impl TileSource + 'static) -> Self {
        Self::with_loader(Arc::new(TileLoader::new(source)))
    }

    /// Overlay sharing an existing loader.
    pub fn with_loader(loader: Arc<TileLoader>) -> Self {
        Self {
            loader,
            tile_size: Self::DEFAULT_TILE_SIZE,
            min_zoom: 0,
            max_zoom: Self::DEFAULT_MAX_ZOOM,
            flip_y: false,
            placeholder: None,
        }
    }

    /// Creates an overlay from configuration.
    pub fn from_config(config: &TileOverlayConfig) -> Result<Self, TemplateError> {
        let template = TileUrlTemplate::new(config.url_template.clone())?;
        Ok(Self::new(template)
            .with_tile_size(config.tile_size)
            .with_zoom_range(config.min_zoom, config.max_zoom)
            .with_flip_y(config.flip_y))
    }

    /// Sets tile side in points.
    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size.max(1);
        self
    }

    /// Sets available zoom levels. Levels above [`TileOverlay::MAX_ZOOM_LEVEL`] are lowered to it.
    pub fn with_zoom_range(mut self, min_zoom: u32, max_zoom: u32) -> Self {
        let (min_zoom, max_zoom) = (min_zoom.min(Self::MAX_ZOOM_LEVEL), max_zoom.min(Self::MAX_ZOOM_LEVEL));
        self.min_zoom = min_zoom.min(max_zoom);
        self.max_zoom = max_zoom.max(min_zoom);
        self
    }

    /// Sets row direction.
    pub fn with_flip_y(mut self, flip_y: bool) -> Self {
        self.flip_y = flip_y;
        self
    }

    /// Sets the color drawn over tiles that are not available yet.
    pub fn with_placeholder(mut self, color: Color) -> Self {
        self.placeholder = Some(color);
        self
    }

    /// Loader producing the tiles.
    pub fn loader(&self) -> &Arc<TileLoader> {
        &self.loader
    }

    /// Tile side in points.
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Color drawn while a tile is missing.
    pub fn placeholder(&self) -> Option<Color> {
        self.placeholder
    }

    /// Zoom level whose tiles are closest to their native size at `zoom_scale` points per planar unit.
    pub fn zoom_level(&self, zoom_scale: f64) -> u32 {
        if !(zoom_scale.is_finite() && zoom_scale > 0.0) {
            return self.min_zoom;
        }

        let level = (WebMercator::WORLD_SIZE * zoom_scale / self.tile_size as f64)
            .log2()
            .round();
        (level.max(0.0) as u32).clamp(self.min_zoom, self.max_zoom)
    }

    /// Planar rectangle covered by the tile at `column`, `row` (counted from the north) of level `z`.
    pub fn tile_rect(column: u32, row: u32, z: u32) -> MapRect {
        let size = WebMercator::WORLD_SIZE / (1u64 << z.min(Self::MAX_ZOOM_LEVEL)) as f64;
        MapRect::new(
            MapPoint::new(column as f64 * size, row as f64 * size),
            size,
            size,
        )
    }

    /// Keys and planar rectangles of the tiles of level `z` that intersect `area`.
    pub fn tiles_in(&self, area: &MapRect, z: u32, scale: u32) -> Vec<(TileKey, MapRect)> {
        let Some(area) = area.intersection(&MapRect::WORLD) else {
            return vec![];
        };

        let count = 1u64 << z.min(Self::MAX_ZOOM_LEVEL);
        let size = WebMercator::WORLD_SIZE / count as f64;
        let last = (count - 1) as f64;
        let first_col = (area.min_x() / size).floor().clamp(0.0, last) as u32;
        let last_col = ((area.max_x() / size).ceil() - 1.0).clamp(0.0, last) as u32;
        let first_row = (area.min_y() / size).floor().clamp(0.0, last) as u32;
        let last_row = ((area.max_y() / size).ceil() - 1.0).clamp(0.0, last) as u32;

        let mut tiles = Vec::new();
        for row in first_row..=last_row {
            for column in first_col..=last_col {
                let y = if self.flip_y {
                    (count - 1) as u32 - row
                } else {
                    row
                };
                tiles.push((
                    TileKey::new(column, y, z, scale),
                    Self::tile_rect(column, row, z),
                ));
            }
        }

        tiles
    }

    /// Keys of the tiles needed to draw `area` at `zoom_scale` on a target with the given content scale.
    pub fn visible_keys(&self, area: &MapRect, zoom_scale: f64, content_scale: u32) -> HashSet<TileKey> {
        let z = self.zoom_level(zoom_scale);
        self.tiles_in(area, z, content_scale.max(1))
            .into_iter()
            .map(|(key, _)| key)
            .collect()
    }

    /// Loads every tile needed to draw `area` at `zoom_scale` and waits until all of them are loaded or
    /// failed. Returns the errors of the tiles that failed.
    pub async fn load_visible(
        &self,
        area: &MapRect,
        zoom_scale: f64,
        content_scale: u32,
    ) -> Vec<TileLoadError> {
        let mut tasks = JoinSet::new();
        for key in self.visible_keys(area, zoom_scale, content_scale) {
            let loader = self.loader.clone();
            tasks.spawn(async move { loader.load_tile(key).await });
        }

        let mut failed = vec![];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(_)) => {}
                Ok(Err(err)) => failed.push(err),
                Err(err) => {
                    log::warn!("Tile loading task did not complete: {err}");
                    failed.push(TileLoadError::Cancelled);
                }
            }
        }

        failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlay() -> TileOverlay {
        TileOverlay::with_source(DebugTileSource::new(256, Color::BLUE))
    }

    #[test]
    fn zoom_level_matches_tile_size() {
        let overlay = overlay();
        let world = WebMercator::WORLD_SIZE;

        assert_eq!(overlay.zoom_level(256.0 / world), 0);
        assert_eq!(overlay.zoom_level(1024.0 / world), 2);
        assert_eq!(overlay.zoom_level(1.0e9), TileOverlay::DEFAULT_MAX_ZOOM);
        assert_eq!(overlay.zoom_level(0.0), 0);

        let limited = overlay.with_zoom_range(3, 5);
        assert_eq!(limited.zoom_level(256.0 / world), 3);
    }

    #[test]
    fn tiles_covering_area() {
        let overlay = overlay();
        let quarter = WebMercator::WORLD_SIZE / 4.0;
        let area = MapRect::new(MapPoint::new(quarter * 0.5, quarter * 1.5), quarter, quarter * 0.25);

        let keys: Vec<_> = overlay.tiles_in(&area, 2, 1).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![TileKey::new(0, 1, 2, 1), TileKey::new(1, 1, 2, 1)]);

        let flipped = overlay.with_flip_y(true);
        let keys: Vec<_> = flipped.tiles_in(&area, 2, 1).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![TileKey::new(0, 2, 2, 1), TileKey::new(1, 2, 2, 1)]);
    }

    #[test]
    fn zoom_range_is_limited_to_addressable_levels() {
        let overlay = overlay().with_zoom_range(40, 64);
        assert_eq!(overlay.zoom_level(1.0e12), TileOverlay::MAX_ZOOM_LEVEL);
        assert_eq!(overlay.zoom_level(0.0), TileOverlay::MAX_ZOOM_LEVEL);

        let world = WebMercator::WORLD_SIZE;
        let area = MapRect::new(MapPoint::new(world * 0.3, world * 0.6), 1e-6, 1e-6);
        let tiles = overlay.tiles_in(&area, overlay.zoom_level(1.0e12), 1);
        assert_eq!(tiles.len(), 1);

        let (key, rect) = tiles[0];
        assert_eq!(key.z, 31);
        assert_eq!(rect, TileOverlay::tile_rect(key.x, key.y, key.z));
        assert!(rect.contains_point(&area.origin));
        assert!((rect.width - world / 2f64.powi(31)).abs() < 1e-12);
    }

    #[test]
    fn whole_world_at_level_one() {
        let tiles = overlay().tiles_in(&MapRect::WORLD, 1, 1);
        assert_eq!(tiles.len(), 4);
        let union: MapRect = tiles.iter().map(|(_, r)| *r).collect();
        assert_eq!(union, MapRect::WORLD);
    }

    #[tokio::test]
    async fn load_visible_fills_cache() {
        let overlay = overlay();
        let zoom = 512.0 / WebMercator::WORLD_SIZE;
        let failed = overlay.load_visible(&MapRect::WORLD, zoom, 1).await;

        assert!(failed.is_empty());
        assert_eq!(overlay.loader().cached_count(), 4);
        for key in overlay.visible_keys(&MapRect::WORLD, zoom, 1) {
            assert_eq!(key.z, 1);
            assert_eq!(overlay.loader().status(&key), TileStatus::Loaded);
        }
    }

    #[cfg(feature = "serde")]
    #[test]
    fn config_defaults() {
        let config: TileOverlayConfig =
            serde_json::from_str(r#"{"url_template": "file:///tiles/{z}/{x}/{y}.png"}"#).unwrap();
        assert_eq!(config.tile_size, 256);
        assert_eq!(config.max_zoom, 19);
        assert!(!config.flip_y);
        assert!(TileOverlay::from_config(&config).is_ok());

        let bad = TileOverlayConfig {
            url_template: "{lat}".into(),
            ..config
        };
        assert!(TileOverlay::from_config(&bad).is_err());
    }
}
