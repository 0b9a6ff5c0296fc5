//! Ambient display state consulted when renderers are resolved.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::style::{ColorStop, GradientStops};
use crate::Color;

/// Demo mode selected by the host. Changes how some overlay kinds are drawn.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DisplayMode {
    /// Every overlay uses its default renderer.
    #[default]
    Standard,
    /// Polylines are drawn with a color gradient along their length.
    GradientDemo,
    /// Polygons are composited with a blend mode: masks with holes darken, plain polygons lighten.
    BlendDemo,
}

/// Appearance of the host map.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Theme {
    /// Light map imagery.
    #[default]
    Light,
    /// Dark map imagery.
    Dark,
}

/// Theme dependent colors, resolved once by the host and passed to renderer resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    /// Fill of polygons with holes in blend mode.
    pub mask: Color,
    /// Fill of polygons without holes in blend mode.
    pub highlight: Color,
    /// Gradient used by polylines without their own stops.
    pub gradient: GradientStops,
}

impl Palette {
    /// Colors for the theme.
    pub fn for_theme(theme: Theme) -> Self {
        let gradient = |stops: [Color; 3]| {
            GradientStops::new(vec![
                ColorStop::new(0.0, stops[0]),
                ColorStop::new(0.5, stops[1]),
                ColorStop::new(1.0, stops[2]),
            ])
            .unwrap_or_else(|_| GradientStops::linear(stops[0], stops[2]))
        };

        match theme {
            Theme::Light => Self {
                mask: Color::rgba(64, 64, 72, 160),
                highlight: Color::rgba(255, 244, 200, 140),
                gradient: gradient([
                    Color::rgb(0, 166, 81),
                    Color::rgb(255, 204, 0),
                    Color::rgb(230, 40, 40),
                ]),
            },
            Theme::Dark => Self {
                mask: Color::rgba(0, 0, 0, 190),
                highlight: Color::rgba(255, 255, 255, 110),
                gradient: gradient([
                    Color::rgb(90, 230, 150),
                    Color::rgb(255, 230, 90),
                    Color::rgb(255, 110, 110),
                ]),
            },
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::for_theme(Theme::default())
    }
}

/// Display state for [`resolve_renderer`](crate::render::resolve_renderer).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayContext {
    /// Selected demo mode.
    pub mode: DisplayMode,
    /// Active theme.
    pub theme: Theme,
    /// Colors derived from the theme.
    pub palette: Palette,
}

impl DisplayContext {
    /// Creates a context with the palette of the theme.
    pub fn new(mode: DisplayMode, theme: Theme) -> Self {
        Self {
            mode,
            theme,
            palette: Palette::for_theme(theme),
        }
    }

    /// Returns a copy with another mode.
    pub fn with_mode(&self, mode: DisplayMode) -> Self {
        Self {
            mode,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_follows_theme() {
        let light = DisplayContext::new(DisplayMode::BlendDemo, Theme::Light);
        let dark = DisplayContext::new(DisplayMode::BlendDemo, Theme::Dark);
        assert_ne!(light.palette.mask, dark.palette.mask);
        assert_eq!(light.palette, Palette::default());
        assert_eq!(dark.with_mode(DisplayMode::Standard).palette, dark.palette);
    }

    #[test]
    fn palette_gradient_is_ordered() {
        let stops = Palette::for_theme(Theme::Dark).gradient;
        assert_eq!(stops.stops().len(), 3);
        assert_eq!(stops.color_at(0.0), Some(Color::rgb(90, 230, 150)));
        assert_eq!(stops.color_at(1.0), Some(Color::rgb(255, 110, 110)));
    }
}
