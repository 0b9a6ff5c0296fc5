//! Styling options applied by renderers.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::StyleError;
use crate::Color;

/// Default stroke color used when a style does not specify one.
pub const DEFAULT_STROKE_COLOR: Color = Color::from_hex("#007AFF");
/// Default fill color used when a style does not specify one.
pub const DEFAULT_FILL_COLOR: Color = Color::from_hex("#007AFF40");

/// Compositing operator used to combine drawn pixels with the content already on the surface.
///
/// All modes are separable: they are computed per color channel and then mixed with the destination
/// using the source alpha.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BlendMode {
    /// Plain alpha compositing (source over).
    #[default]
    Normal,
    /// Multiplies source and destination.
    Multiply,
    /// Inverse of multiplying the inverses.
    Screen,
    /// Multiply or screen depending on the destination.
    Overlay,
    /// Keeps the darker of the two.
    Darken,
    /// Keeps the lighter of the two.
    Lighten,
    /// Absolute difference.
    Difference,
}

/// Sequence of dash and gap lengths in points, starting with a dash.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<f64>", into = "Vec<f64>"))]
pub struct DashPattern(Vec<f64>);

impl DashPattern {
    /// Creates a pattern. Every length must be a positive finite number.
    ///
    /// An empty pattern is valid and means a solid line.
    pub fn new(lengths: Vec<f64>) -> Result<Self, StyleError> {
        if let Some(invalid) = lengths.iter().find(|v| !v.is_finite() || **v <= 0.0) {
            return Err(StyleError::InvalidDashLength(*invalid));
        }

        Ok(Self(lengths))
    }

    /// Dash and gap lengths.
    pub fn lengths(&self) -> &[f64] {
        &self.0
    }

    /// Returns true if the pattern draws a solid line.
    pub fn is_solid(&self) -> bool {
        self.0.is_empty()
    }

    /// Length of one full cycle of the pattern.
    pub fn period(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Number of complete cycles the pattern makes along a path of the given length.
    pub fn full_cycles(&self, path_length: f64) -> usize {
        let period = self.period();
        if period <= 0.0 || path_length <= 0.0 {
            return 0;
        }

        (path_length / period).floor() as usize
    }
}

impl TryFrom<Vec<f64>> for DashPattern {
    type Error = StyleError;

    fn try_from(value: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DashPattern> for Vec<f64> {
    fn from(value: DashPattern) -> Self {
        value.0
    }
}

/// Color at a given fraction of a path length.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ColorStop {
    /// Position along the path in `[0, 1]`.
    pub fraction: f64,
    /// Color at this position.
    pub color: Color,
}

impl ColorStop {
    /// Creates a new stop.
    pub fn new(fraction: f64, color: Color) -> Self {
        Self { fraction, color }
    }
}

/// Ordered list of color stops, monotonic in fraction.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "Vec<ColorStop>", into = "Vec<ColorStop>")
)]
pub struct GradientStops(Vec<ColorStop>);

impl GradientStops {
    /// Creates a gradient. Stops are sorted by fraction, fractions are clamped into `[0, 1]`.
    pub fn new(mut stops: Vec<ColorStop>) -> Result<Self, StyleError> {
        if let Some(invalid) = stops.iter().find(|s| !s.fraction.is_finite()) {
            return Err(StyleError::InvalidStopFraction(invalid.fraction));
        }

        for stop in &mut stops {
            stop.fraction = stop.fraction.clamp(0.0, 1.0);
        }
        stops.sort_by(|a, b| a.fraction.total_cmp(&b.fraction));

        Ok(Self(stops))
    }

    /// Two stop gradient from `start` to `end`.
    pub fn linear(start: Color, end: Color) -> Self {
        Self(vec![ColorStop::new(0.0, start), ColorStop::new(1.0, end)])
    }

    /// Stops in ascending order.
    pub fn stops(&self) -> &[ColorStop] {
        &self.0
    }

    /// Interpolated color at the given fraction. Returns `None` for an empty gradient.
    pub fn color_at(&self, fraction: f64) -> Option<Color> {
        let first = self.0.first()?;
        let last = self.0.last()?;

        if fraction <= first.fraction {
            return Some(first.color);
        }
        if fraction >= last.fraction {
            return Some(last.color);
        }

        let upper = self.0.iter().position(|s| s.fraction >= fraction)?;
        let lo = &self.0[upper.saturating_sub(1)];
        let hi = &self.0[upper];
        let span = hi.fraction - lo.fraction;
        if span <= f64::EPSILON {
            return Some(hi.color);
        }

        Some(lo.color.lerp(hi.color, ((fraction - lo.fraction) / span) as f32))
    }
}

impl TryFrom<Vec<ColorStop>> for GradientStops {
    type Error = StyleError;

    fn try_from(value: Vec<ColorStop>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<GradientStops> for Vec<ColorStop> {
    fn from(value: GradientStops) -> Self {
        value.0
    }
}

/// Visual style of an overlay.
///
/// Every field has a default, so a style deserialized from an empty object, or no style at all, renders
/// with a 1 point opaque default-colored outline.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RenderStyle {
    /// Color of outlines and lines.
    pub stroke_color: Color,
    /// Color of polygon and circle interiors.
    pub fill_color: Color,
    /// Width of outlines in points. Does not scale with zoom.
    pub line_width: f64,
    /// Dash pattern of outlines, solid if `None`.
    pub dash_pattern: Option<DashPattern>,
    /// Opacity multiplier in `[0, 1]`.
    pub alpha: f32,
    /// Compositing operator.
    pub blend_mode: BlendMode,
    /// Colors along a polyline, used by the gradient renderer.
    pub gradient_stops: Option<GradientStops>,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            stroke_color: DEFAULT_STROKE_COLOR,
            fill_color: DEFAULT_FILL_COLOR,
            line_width: 1.0,
            dash_pattern: None,
            alpha: 1.0,
            blend_mode: BlendMode::Normal,
            gradient_stops: None,
        }
    }
}

impl RenderStyle {
    /// Creates a new instance from a copy of the current, but with the given stroke color.
    pub fn with_stroke_color(&self, stroke_color: Color) -> Self {
        Self {
            stroke_color,
            ..self.clone()
        }
    }

    /// Creates a new instance from a copy of the current, but with the given fill color.
    pub fn with_fill_color(&self, fill_color: Color) -> Self {
        Self {
            fill_color,
            ..self.clone()
        }
    }

    /// Creates a new instance from a copy of the current, but with the given line width.
    pub fn with_line_width(&self, line_width: f64) -> Self {
        Self {
            line_width,
            ..self.clone()
        }
    }

    /// Creates a new instance from a copy of the current, but with the given dash pattern.
    pub fn with_dash_pattern(&self, dash_pattern: DashPattern) -> Self {
        Self {
            dash_pattern: Some(dash_pattern),
            ..self.clone()
        }
    }

    /// Creates a new instance from a copy of the current, but with the given opacity.
    pub fn with_alpha(&self, alpha: f32) -> Self {
        Self {
            alpha,
            ..self.clone()
        }
    }

    /// Creates a new instance from a copy of the current, but with the given blend mode.
    pub fn with_blend_mode(&self, blend_mode: BlendMode) -> Self {
        Self {
            blend_mode,
            ..self.clone()
        }
    }

    /// Creates a new instance from a copy of the current, but with the given gradient.
    pub fn with_gradient_stops(&self, gradient_stops: GradientStops) -> Self {
        Self {
            gradient_stops: Some(gradient_stops),
            ..self.clone()
        }
    }

    /// Line width sanitized for drawing: non-finite and negative values become `0`.
    pub(crate) fn effective_line_width(&self) -> f32 {
        if self.line_width.is_finite() {
            self.line_width.max(0.0) as f32
        } else {
            0.0
        }
    }

    /// Alpha sanitized for drawing.
    pub(crate) fn effective_alpha(&self) -> f32 {
        if self.alpha.is_finite() {
            self.alpha.clamp(0.0, 1.0)
        } else {
            1.0
        }
    }

    /// Dash pattern to apply, `None` for solid lines.
    pub(crate) fn dashes(&self) -> Option<&DashPattern> {
        self.dash_pattern.as_ref().filter(|d| !d.is_solid())
    }
}
