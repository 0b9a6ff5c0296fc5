//! Demo scenes showing every overlay kind around San Francisco.

use overlayer_types::{latlon, GeoCoordinate, MapRect, WebMercator};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::catalog::OverlayCatalog;
use crate::context::{DisplayMode, Palette};
use crate::overlay::{Overlay, Polygon, ScalarGrid};
use crate::style::{BlendMode, DashPattern, RenderStyle};
use crate::tile::{DebugTileSource, TileOverlay};
use crate::Color;

/// Demo scene.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Scene {
    /// Dashed route across the city.
    Polyline,
    /// City boundary rectangle.
    Polygon,
    /// Circle with a radius in meters.
    Circle,
    /// Route colored by the distance travelled.
    Gradient,
    /// Dimmed world with a cutout and a highlighted park.
    Blend,
    /// Islands drawn as one multi-polygon.
    MultiGeometry,
    /// Hazard intensity grid.
    HazardGrid,
    /// Synthetic bitmap tiles.
    CustomTiles,
}

impl Scene {
    /// All scenes in menu order.
    pub const ALL: [Scene; 8] = [
        Scene::Polyline,
        Scene::Polygon,
        Scene::Circle,
        Scene::Gradient,
        Scene::Blend,
        Scene::MultiGeometry,
        Scene::HazardGrid,
        Scene::CustomTiles,
    ];

    /// Display title.
    pub fn title(&self) -> &'static str {
        match self {
            Scene::Polyline => "Polyline",
            Scene::Polygon => "Polygon",
            Scene::Circle => "Circle",
            Scene::Gradient => "Gradient polyline",
            Scene::Blend => "Blend modes",
            Scene::MultiGeometry => "Multi-polygon",
            Scene::HazardGrid => "Hazard grid",
            Scene::CustomTiles => "Custom tiles",
        }
    }

    /// Display mode the scene is meant to be shown in.
    pub fn display_mode(&self) -> DisplayMode {
        match self {
            Scene::Gradient => DisplayMode::GradientDemo,
            Scene::Blend => DisplayMode::BlendDemo,
            _ => DisplayMode::Standard,
        }
    }

    /// Builds a fresh batch of overlays for the scene.
    pub fn overlays(&self, palette: &Palette) -> Vec<Overlay> {
        match self {
            Scene::Polyline => vec![Overlay::polyline(route()).with_style(RenderStyle {
                dash_pattern: DashPattern::new(vec![20.0, 10.0, 5.0, 10.0, 1.0, 10.0]).ok(),
                ..RenderStyle::default()
                    .with_stroke_color(Color::from_hex("#FF3B30"))
                    .with_line_width(4.0)
            })],
            Scene::Polygon => vec![Overlay::polygon(san_francisco(), vec![])],
            Scene::Circle => vec![Overlay::circle(latlon!(37.7, -122.45), 9000.0).with_style(
                RenderStyle::default()
                    .with_fill_color(Color::from_hex("#34C75966"))
                    .with_stroke_color(Color::from_hex("#34C759"))
                    .with_line_width(2.0),
            )],
            Scene::Gradient => vec![Overlay::polyline(route())
                .with_style(RenderStyle::default().with_line_width(6.0))],
            Scene::Blend => vec![
                Overlay::polygon(world_ring(), vec![san_francisco()]).with_style(
                    RenderStyle::default()
                        .with_fill_color(palette.mask)
                        .with_line_width(0.0),
                ),
                Overlay::polygon(golden_gate_park(), vec![]).with_style(
                    RenderStyle::default()
                        .with_fill_color(palette.highlight)
                        .with_line_width(0.0),
                ),
            ],
            Scene::MultiGeometry => vec![Overlay::multi_polygon(islands()).with_style(
                RenderStyle::default()
                    .with_fill_color(Color::from_hex("#AF52DE80"))
                    .with_stroke_color(Color::from_hex("#AF52DE"))
                    .with_blend_mode(BlendMode::Multiply),
            )],
            Scene::HazardGrid => hazard_grid().map(Overlay::grid).into_iter().collect(),
            Scene::CustomTiles => vec![Overlay::tiles(
                TileOverlay::with_source(DebugTileSource::new(
                    TileOverlay::DEFAULT_TILE_SIZE,
                    Color::from_hex("#5AC8FA"),
                ))
                .with_placeholder(Color::rgba(128, 128, 128, 64)),
            )
            .with_style(RenderStyle::default().with_alpha(0.8))],
        }
    }

    /// Builds a catalog with the overlays of the scene.
    pub fn catalog(&self, palette: &Palette) -> OverlayCatalog {
        OverlayCatalog::new(self.overlays(palette))
    }

    /// Area shown by the scene: the city with a margin.
    pub fn view(&self) -> MapRect {
        let Some(city) = MapRect::from_points(san_francisco().iter().map(|c| c.to_map_point())) else {
            return MapRect::WORLD;
        };
        let margin = city.width.max(city.height) * 0.25;
        let view = city.inset(-margin, -margin);

        view.intersection(&MapRect::WORLD).unwrap_or(view)
    }

    /// Zoom scale that fits the scene view into `width_points` points.
    pub fn zoom_scale(&self, width_points: u32) -> f64 {
        let width = self.view().width;
        if width > 0.0 {
            width_points as f64 / width
        } else {
            width_points as f64 / WebMercator::WORLD_SIZE
        }
    }
}

fn san_francisco() -> Vec<GeoCoordinate> {
    vec![
        latlon!(37.81641, -122.52262),
        latlon!(37.81641, -122.35554),
        latlon!(37.70208, -122.35554),
        latlon!(37.70208, -122.52262),
    ]
}

fn world_ring() -> Vec<GeoCoordinate> {
    let lat = WebMercator::MAX_LATITUDE;
    vec![
        latlon!(lat, -180.0),
        latlon!(lat, 180.0),
        latlon!(-lat, 180.0),
        latlon!(-lat, -180.0),
    ]
}

fn golden_gate_park() -> Vec<GeoCoordinate> {
    vec![
        latlon!(37.7745, -122.5110),
        latlon!(37.7745, -122.4545),
        latlon!(37.7660, -122.4545),
        latlon!(37.7660, -122.5110),
    ]
}

fn route() -> Vec<GeoCoordinate> {
    vec![
        latlon!(37.8083, -122.4156),
        latlon!(37.7955, -122.3937),
        latlon!(37.7793, -122.4193),
        latlon!(37.7599, -122.4148),
        latlon!(37.7694, -122.4862),
        latlon!(37.7340, -122.5020),
    ]
}

fn islands() -> Vec<Polygon> {
    let alcatraz = vec![
        latlon!(37.8280, -122.4250),
        latlon!(37.8280, -122.4195),
        latlon!(37.8245, -122.4195),
        latlon!(37.8245, -122.4250),
    ];
    let treasure_island = vec![
        latlon!(37.8320, -122.3760),
        latlon!(37.8320, -122.3660),
        latlon!(37.8170, -122.3660),
        latlon!(37.8170, -122.3760),
    ];
    let yerba_buena = vec![
        latlon!(37.8145, -122.3700),
        latlon!(37.8145, -122.3570),
        latlon!(37.8060, -122.3570),
        latlon!(37.8060, -122.3700),
    ];
    let lake = vec![
        latlon!(37.8120, -122.3670),
        latlon!(37.8120, -122.3630),
        latlon!(37.8090, -122.3630),
        latlon!(37.8090, -122.3670),
    ];

    vec![
        Polygon::new(alcatraz, vec![]),
        Polygon::new(treasure_island, vec![]),
        Polygon::new(yerba_buena, vec![lake]),
    ]
}

fn hazard_grid() -> Option<ScalarGrid> {
    const COLUMNS: usize = 24;
    const ROWS: usize = 16;

    // Intensity falls off with the distance from an epicenter in the south-east of the city.
    let values = (0..ROWS)
        .flat_map(|row| {
            (0..COLUMNS).map(move |column| {
                let dx = column as f32 - 17.0;
                let dy = row as f32 - 11.0;
                (1.0 - (dx * dx + dy * dy).sqrt() / 16.0).max(0.0)
            })
        })
        .collect();

    match ScalarGrid::new(latlon!(37.81641, -122.52262), latlon!(37.70208, -122.35554), COLUMNS, ROWS, values) {
        Ok(grid) => Some(grid),
        Err(err) => {
            log::warn!("Failed to build hazard grid: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{DisplayContext, Theme};
    use crate::overlay::OverlayKind;
    use crate::rasterizer::TiledRasterizer;
    use crate::render::RendererKind;

    #[test]
    fn every_scene_has_overlays() {
        let palette = Palette::default();
        for scene in Scene::ALL {
            let catalog = scene.catalog(&palette);
            assert!(!catalog.is_empty(), "{} is empty", scene.title());
            assert!(scene.view().intersects(&catalog.extent()), "{} is out of view", scene.title());
        }
    }

    #[test]
    fn scenes_resolve_demo_renderers() {
        let palette = Palette::for_theme(Theme::Dark);
        let kinds = |scene: Scene| -> Vec<RendererKind> {
            let context = DisplayContext::new(scene.display_mode(), Theme::Dark);
            scene
                .catalog(&palette)
                .renderers(&context)
                .iter()
                .map(|r| r.kind())
                .collect()
        };

        assert_eq!(kinds(Scene::Gradient), vec![RendererKind::GradientPath]);
        assert_eq!(kinds(Scene::Blend), vec![RendererKind::Blend, RendererKind::Blend]);
        assert_eq!(kinds(Scene::MultiGeometry), vec![RendererKind::MultiGeometry]);
        assert_eq!(kinds(Scene::HazardGrid), vec![RendererKind::Grid]);
        assert_eq!(kinds(Scene::CustomTiles), vec![RendererKind::Tile]);
    }

    #[test]
    fn blend_scene_masks_outside_city() {
        let palette = Palette::default();
        let overlays = Scene::Blend.overlays(&palette);
        assert_eq!(overlays[0].kind(), OverlayKind::Polygon);
        assert!(overlays[0].bounding_extent().contains_rect(&Scene::Blend.view()));

        let catalog = OverlayCatalog::new(overlays);
        let context = DisplayContext::new(DisplayMode::BlendDemo, Theme::Light);
        let view = Scene::Blend.view();
        let zoom = Scene::Blend.zoom_scale(64);
        let image = TiledRasterizer::new(2)
            .unwrap()
            .with_region_size(16)
            .render(&catalog.renderers(&context), &view, zoom)
            .unwrap()
            .unwrap();

        // Corner of the view is outside the city and gets the mask, the center of the city does not.
        assert!(image.pixel(0, 0).is_some_and(|c| c.a() > 0));
        let center = image.pixel(image.width() / 2, image.height() / 2);
        assert_eq!(center.map(|c| c.a()), Some(0));
    }
}
