use overlayer_types::MapRect;

use crate::context::DisplayContext;
use crate::error::FeedError;
use crate::feed::Geometry;
use crate::overlay::Overlay;
use crate::render::{resolve_renderer, Renderer};
use crate::style::RenderStyle;

/// Overlays of one scene.
///
/// The catalog is read-only while renderers borrowed from it are alive: [`OverlayCatalog::renderers`] borrows
/// the catalog, so replacing the overlays cannot race with a running draw.
#[derive(Debug, Clone, Default)]
pub struct OverlayCatalog {
    overlays: Vec<Overlay>,
}

impl OverlayCatalog {
    /// Creates a catalog with the given overlays.
    pub fn new(overlays: Vec<Overlay>) -> Self {
        Self { overlays }
    }

    /// Overlays in drawing order.
    pub fn overlays(&self) -> &[Overlay] {
        &self.overlays
    }

    /// Number of overlays.
    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    /// Returns true if the catalog has no overlays.
    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    /// Adds an overlay on top of the existing ones.
    pub fn push(&mut self, overlay: Overlay) {
        self.overlays.push(overlay);
    }

    /// Converts feed records into overlays and adds those that are valid.
    ///
    /// Records that fail to convert are skipped and their errors are returned. `style` is applied to every
    /// added overlay except markers.
    pub fn ingest<I>(&mut self, records: I, style: Option<&RenderStyle>) -> Vec<FeedError>
    where
        I: IntoIterator<Item = Result<Geometry, FeedError>>,
    {
        let mut errors = vec![];
        let before = self.overlays.len();
        for record in records {
            match record.and_then(Geometry::into_overlay) {
                Ok(overlay) => match style {
                    Some(style) if overlay.kind() != crate::OverlayKind::Marker => {
                        self.overlays.push(overlay.with_style(style.clone()))
                    }
                    _ => self.overlays.push(overlay),
                },
                Err(err) => {
                    log::warn!("Skipping feed record: {err}");
                    errors.push(err);
                }
            }
        }

        log::debug!(
            "Ingested {} feed records, {} failed",
            self.overlays.len() - before,
            errors.len()
        );
        errors
    }

    /// Replaces all overlays with a new batch.
    pub fn replace(&mut self, overlays: Vec<Overlay>) -> Vec<Overlay> {
        std::mem::replace(&mut self.overlays, overlays)
    }

    /// Union of the extents of all overlays, [`MapRect::NULL`] for an empty catalog.
    pub fn extent(&self) -> MapRect {
        self.overlays.iter().map(Overlay::bounding_extent).collect()
    }

    /// Resolves a renderer for every overlay, in drawing order.
    pub fn renderers(&self, context: &DisplayContext) -> Vec<Renderer<'_>> {
        self.overlays
            .iter()
            .map(|overlay| resolve_renderer(overlay, context))
            .collect()
    }
}
