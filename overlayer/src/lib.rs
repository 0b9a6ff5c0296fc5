//! Overlayer draws geographic overlays (shapes, scalar grids and bitmap tiles) on top of a map surface.
//!
//! # Quick start
//!
//! ```
//! use overlayer::render::resolve_renderer;
//! use overlayer::{DisplayContext, Overlay, Pixmap, RenderStyle, Color};
//! use overlayer::overlayer_types::latlon;
//!
//! let overlay = Overlay::circle(latlon!(37.7, -122.45), 9000.0)
//!     .with_style(RenderStyle::default().with_fill_color(Color::RED));
//!
//! let region = overlay.bounding_extent();
//! let zoom_scale = 256.0 / region.width;
//! let mut pixmap = Pixmap::new(256, 256).unwrap();
//! resolve_renderer(&overlay, &DisplayContext::default()).draw(&region, zoom_scale, &mut pixmap);
//!
//! assert_eq!(pixmap.pixel(128, 128), Some(Color::RED));
//! ```
//!
//! # Main components
//!
//! * [`Overlay`] is a geometry anchored to geographic coordinates, with its bounding extent in the planar map
//!   space and an optional [`RenderStyle`]. Overlays are created directly, or from the typed records of a
//!   [`feed`], and are kept in an [`OverlayCatalog`].
//! * [`resolve_renderer`](render::resolve_renderer) picks a [`Renderer`](render::Renderer) for an overlay
//!   based on the [`DisplayContext`].
//! * A renderer draws its overlay into one rectangular map region at a time, into any
//!   [`RasterTarget`](render::RasterTarget). Renderers are stateless, so many regions can be drawn at once.
//!   [`TiledRasterizer`] is a ready to use coordinator that does exactly that on a worker pool.
//! * [`tile`] contains the bitmap tile machinery: URL templates, tile sources and the caching
//!   [`TileLoader`](tile::TileLoader).

mod bitmap;
mod catalog;
mod color;
mod context;
pub mod error;
pub mod feed;
pub mod overlay;
mod rasterizer;
pub mod render;
pub mod scene;
pub mod style;
pub mod tile;

#[cfg(test)]
pub(crate) mod tests;

pub use bitmap::BitmapData;
pub use catalog::OverlayCatalog;
pub use color::Color;
pub use context::{DisplayContext, DisplayMode, Palette, Theme};
pub use overlay::{Overlay, OverlayGeometry, OverlayKind};
pub use rasterizer::{Region, TiledRasterizer, ViewportGeneration};
pub use render::Pixmap;
pub use style::{BlendMode, RenderStyle};

// Reexport overlayer_types
pub use overlayer_types;
