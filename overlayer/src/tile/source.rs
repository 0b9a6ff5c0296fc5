use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;

use crate::bitmap::BitmapData;
use crate::error::TileLoadError;
use crate::tile::{TileKey, TileLocator, TileUrlTemplate};
use crate::Color;

/// Strategy producing bitmap data for a tile key.
///
/// Implement this trait to substitute generated or otherwise non-networked imagery for a tile overlay.
#[async_trait]
pub trait TileSource: Send + Sync {
    /// Produces the tile with the given key.
    async fn load_tile(&self, key: TileKey) -> Result<BitmapData, TileLoadError>;
}

/// Loads tiles from local files or over HTTP, depending on the resolved template.
///
/// Failed requests are reported as they are, this source never retries.
#[derive(Debug, Clone)]
pub struct UrlTileSource {
    template: TileUrlTemplate,
    http_client: reqwest::Client,
}

impl UrlTileSource {
    /// Creates a new source.
    pub fn new(template: TileUrlTemplate) -> Self {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("overlayer/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            template,
            http_client,
        }
    }

    /// Template this source resolves.
    pub fn template(&self) -> &TileUrlTemplate {
        &self.template
    }

    /// Loads the raw, still encoded, tile payload.
    pub async fn load_bytes(&self, key: TileKey) -> Result<Bytes, TileLoadError> {
        match self.template.locator(&key) {
            TileLocator::File(path) => load_file(&path).await,
            TileLocator::Remote(url) => self.load_url(&url).await,
        }
    }

    async fn load_url(&self, url: &str) -> Result<Bytes, TileLoadError> {
        log::info!("Loading {url}");
        let response = self.http_client.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(TileLoadError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            log::info!("Failed to load {url}: {status}");
            return Err(TileLoadError::Network(format!("{url} responded with {status}")));
        }

        Ok(response.bytes().await?)
    }
}

async fn load_file(path: &Path) -> Result<Bytes, TileLoadError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(bytes.into()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            Err(TileLoadError::NotFound(path.display().to_string()))
        }
        Err(err) => Err(TileLoadError::Io(format!("{}: {err}", path.display()))),
    }
}

#[async_trait]
impl TileSource for UrlTileSource {
    async fn load_tile(&self, key: TileKey) -> Result<BitmapData, TileLoadError> {
        let bytes = self.load_bytes(key).await?;
        BitmapData::decode(&bytes)
    }
}

/// Synthetic source drawing a framed, tinted square for every tile. Useful to inspect tile boundaries.
#[derive(Debug, Clone)]
pub struct DebugTileSource {
    tile_size: u32,
    tint: Color,
}

impl DebugTileSource {
    /// Creates a source producing tiles of `tile_size` pixels.
    pub fn new(tile_size: u32, tint: Color) -> Self {
        Self {
            tile_size: tile_size.max(1),
            tint,
        }
    }

    /// Generates the tile image synchronously.
    pub fn render(&self, key: TileKey) -> Result<BitmapData, TileLoadError> {
        let size = self.tile_size * key.scale.max(1);
        let border = key.scale.max(1) * 2;
        // Alternate the fill between neighbouring tiles so that their edges stand out.
        let fill = if (key.x + key.y) % 2 == 0 {
            self.tint.fade(0.25)
        } else {
            self.tint.fade(0.45)
        };

        let mut bytes = Vec::with_capacity(size as usize * size as usize * 4);
        for y in 0..size {
            for x in 0..size {
                let on_border =
                    x < border || y < border || x >= size - border || y >= size - border;
                let color = if on_border { self.tint } else { fill };
                bytes.extend_from_slice(&color.to_u8_array());
            }
        }

        BitmapData::from_raw(bytes, size, size)
    }
}

#[async_trait]
impl TileSource for DebugTileSource {
    async fn load_tile(&self, key: TileKey) -> Result<BitmapData, TileLoadError> {
        self.render(key)
    }
}
