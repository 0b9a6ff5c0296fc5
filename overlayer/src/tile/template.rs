use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::TemplateError;
use crate::tile::TileKey;

/// Where a tile is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileLocator {
    /// Local file path.
    File(PathBuf),
    /// `http` or `https` URL.
    Remote(String),
}

/// Tile address pattern with `{x}`, `{y}`, `{z}` and `{scale}` placeholders, e.g.
/// `https://tile.example.com/{z}/{x}/{y}@{scale}x.png` or `file:///tiles/{z}/{x}/{y}.jpg`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileUrlTemplate {
    template: String,
}

impl TileUrlTemplate {
    /// Validates and creates a template. Placeholders other than the supported four are rejected.
    pub fn new(template: impl Into<String>) -> Result<Self, TemplateError> {
        let template = template.into();
        let sample_key = TileKey::new(0, 0, 0, 1);
        strfmt::strfmt(&template, &placeholders(&sample_key)).map_err(|err| {
            TemplateError::Invalid {
                template: template.clone(),
                reason: err.to_string(),
            }
        })?;

        Ok(Self { template })
    }

    /// The raw template string.
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Substitutes the key values into the template.
    pub fn resolve(&self, key: &TileKey) -> String {
        // The template was checked on construction, and all keys have the same set of placeholders.
        strfmt::strfmt(&self.template, &placeholders(key)).unwrap_or_else(|err| {
            log::error!("Tile template {} failed to format: {err}", self.template);
            self.template.clone()
        })
    }

    /// Resolves the template and classifies the result as a local or remote locator.
    pub fn locator(&self, key: &TileKey) -> TileLocator {
        let resolved = self.resolve(key);
        if let Some(path) = resolved.strip_prefix("file://") {
            TileLocator::File(PathBuf::from(path))
        } else if resolved.starts_with("http://") || resolved.starts_with("https://") {
            TileLocator::Remote(resolved)
        } else {
            TileLocator::File(PathBuf::from(resolved))
        }
    }
}

fn placeholders(key: &TileKey) -> HashMap<String, u32> {
    HashMap::from([
        ("x".to_string(), key.x),
        ("y".to_string(), key.y),
        ("z".to_string(), key.z),
        ("scale".to_string(), key.scale),
    ])
}
