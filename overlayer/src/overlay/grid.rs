use overlayer_types::{GeoCoordinate, MapRect};

use crate::error::GridError;
use crate::style::GradientStops;
use crate::Color;

/// How grid values are looked up between cell centers.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum Sampling {
    /// Value of the closest cell.
    #[default]
    Nearest,
    /// Bilinear interpolation between the four closest cell centers.
    Bilinear,
}

/// Regular latitude/longitude grid of scalar samples (e.g. hazard intensity).
///
/// Values are stored row by row starting at the north-west corner. `NaN` marks cells without data.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarGrid {
    north_west: GeoCoordinate,
    south_east: GeoCoordinate,
    columns: usize,
    rows: usize,
    values: Vec<f32>,
    range: (f32, f32),
    sampling: Sampling,
    ramp: GradientStops,
}

impl ScalarGrid {
    /// Creates a grid covering the area between the two corners.
    pub fn new(
        north_west: GeoCoordinate,
        south_east: GeoCoordinate,
        columns: usize,
        rows: usize,
        values: Vec<f32>,
    ) -> Result<Self, GridError> {
        if columns == 0 || rows == 0 || values.len() != columns * rows {
            return Err(GridError::DimensionMismatch {
                expected: columns * rows,
                actual: values.len(),
            });
        }

        if !north_west.is_valid()
            || !south_east.is_valid()
            || north_west.lat() <= south_east.lat()
            || north_west.lon() >= south_east.lon()
        {
            return Err(GridError::InvalidBounds);
        }

        let range = values
            .iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<(f32, f32)>, v| match acc {
                None => Some((*v, *v)),
                Some((lo, hi)) => Some((lo.min(*v), hi.max(*v))),
            })
            .unwrap_or((0.0, 1.0));

        Ok(Self {
            north_west,
            south_east,
            columns,
            rows,
            values,
            range,
            sampling: Sampling::default(),
            ramp: Self::hazard_ramp(),
        })
    }

    /// Green to red ramp used by default.
    pub fn hazard_ramp() -> GradientStops {
        GradientStops::new(vec![
            crate::style::ColorStop::new(0.0, Color::rgba(0, 160, 60, 120)),
            crate::style::ColorStop::new(0.5, Color::rgba(250, 210, 0, 160)),
            crate::style::ColorStop::new(1.0, Color::rgba(220, 20, 20, 200)),
        ])
        .unwrap_or_else(|_| GradientStops::linear(Color::GREEN, Color::RED))
    }

    /// Sets the sampling method.
    pub fn with_sampling(mut self, sampling: Sampling) -> Self {
        self.sampling = sampling;
        self
    }

    /// Sets the value range mapped onto the ramp. By default it is the range of finite values.
    pub fn with_range(mut self, min: f32, max: f32) -> Self {
        self.range = (min, max);
        self
    }

    /// Replaces the color ramp.
    pub fn with_ramp(mut self, ramp: GradientStops) -> Self {
        self.ramp = ramp;
        self
    }

    /// North-west corner.
    pub fn north_west(&self) -> GeoCoordinate {
        self.north_west
    }

    /// South-east corner.
    pub fn south_east(&self) -> GeoCoordinate {
        self.south_east
    }

    /// Number of columns and rows.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.columns, self.rows)
    }

    /// Center of the covered area.
    pub fn center(&self) -> GeoCoordinate {
        GeoCoordinate::latlon(
            (self.north_west.lat() + self.south_east.lat()) / 2.0,
            (self.north_west.lon() + self.south_east.lon()) / 2.0,
        )
    }

    fn cell(&self, column: usize, row: usize) -> Option<f32> {
        let value = *self.values.get(row * self.columns + column)?;
        value.is_finite().then_some(value)
    }

    /// Value at the given location, `None` outside of the grid or where there is no data.
    pub fn value_at(&self, coordinate: &GeoCoordinate) -> Option<f32> {
        let lon_span = self.south_east.lon() - self.north_west.lon();
        let lat_span = self.north_west.lat() - self.south_east.lat();
        let u = (coordinate.lon() - self.north_west.lon()) / lon_span;
        let v = (self.north_west.lat() - coordinate.lat()) / lat_span;
        if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
            return None;
        }

        // Fractional cell coordinates relative to cell centers.
        let cx = u * self.columns as f64 - 0.5;
        let cy = v * self.rows as f64 - 0.5;
        let max_col = (self.columns - 1) as f64;
        let max_row = (self.rows - 1) as f64;

        let nearest = || {
            self.cell(
                cx.round().clamp(0.0, max_col) as usize,
                cy.round().clamp(0.0, max_row) as usize,
            )
        };

        match self.sampling {
            Sampling::Nearest => nearest(),
            Sampling::Bilinear => {
                let x0 = cx.floor().clamp(0.0, max_col);
                let y0 = cy.floor().clamp(0.0, max_row);
                let x1 = (x0 + 1.0).min(max_col);
                let y1 = (y0 + 1.0).min(max_row);
                let tx = (cx - x0).clamp(0.0, 1.0) as f32;
                let ty = (cy - y0).clamp(0.0, 1.0) as f32;

                let corners = (
                    self.cell(x0 as usize, y0 as usize),
                    self.cell(x1 as usize, y0 as usize),
                    self.cell(x0 as usize, y1 as usize),
                    self.cell(x1 as usize, y1 as usize),
                );
                match corners {
                    (Some(a), Some(b), Some(c), Some(d)) => {
                        let top = a + (b - a) * tx;
                        let bottom = c + (d - c) * tx;
                        Some(top + (bottom - top) * ty)
                    }
                    _ => nearest(),
                }
            }
        }
    }

    /// Maps a value through the color ramp.
    pub fn color_for(&self, value: f32) -> Option<Color> {
        let (min, max) = self.range;
        let t = if max > min {
            (value - min) / (max - min)
        } else {
            0.0
        };

        self.ramp.color_at(t as f64)
    }

    pub(crate) fn extent(&self) -> MapRect {
        MapRect::from_corners(
            self.north_west.to_map_point(),
            self.south_east.to_map_point(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use assert_matches::assert_matches;
    use overlayer_types::latlon;

    fn grid() -> ScalarGrid {
        ScalarGrid::new(
            latlon!(10.0, 0.0),
            latlon!(0.0, 10.0),
            2,
            2,
            vec![0.0, 1.0, 2.0, f32::NAN],
        )
        .unwrap()
    }

    #[test]
    fn rejects_bad_input() {
        assert_matches!(
            ScalarGrid::new(latlon!(10.0, 0.0), latlon!(0.0, 10.0), 2, 2, vec![0.0]),
            Err(GridError::DimensionMismatch {
                expected: 4,
                actual: 1
            })
        );
        assert_matches!(
            ScalarGrid::new(latlon!(0.0, 0.0), latlon!(10.0, 10.0), 1, 1, vec![0.0]),
            Err(GridError::InvalidBounds)
        );
    }

    #[test]
    fn nearest_sampling() {
        let grid = grid();
        assert_eq!(grid.value_at(&latlon!(9.0, 1.0)), Some(0.0));
        assert_eq!(grid.value_at(&latlon!(9.0, 9.0)), Some(1.0));
        assert_eq!(grid.value_at(&latlon!(1.0, 1.0)), Some(2.0));
        assert_eq!(grid.value_at(&latlon!(1.0, 9.0)), None);
        assert_eq!(grid.value_at(&latlon!(11.0, 5.0)), None);
        assert_eq!(grid.value_at(&latlon!(5.0, -1.0)), None);
    }

    #[test]
    fn bilinear_sampling() {
        let grid = ScalarGrid::new(
            latlon!(10.0, 0.0),
            latlon!(0.0, 10.0),
            2,
            1,
            vec![0.0, 10.0],
        )
        .unwrap()
        .with_sampling(Sampling::Bilinear);

        assert_abs_diff_eq!(grid.value_at(&latlon!(5.0, 5.0)).unwrap(), 5.0, epsilon = 1e-4);
        assert_abs_diff_eq!(grid.value_at(&latlon!(5.0, 2.5)).unwrap(), 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(grid.value_at(&latlon!(5.0, 6.25)).unwrap(), 7.5, epsilon = 1e-4);
    }

    #[test]
    fn color_ramp_uses_value_range() {
        let grid = grid();
        let ramp = ScalarGrid::hazard_ramp();
        assert_eq!(grid.color_for(0.0), ramp.color_at(0.0));
        assert_eq!(grid.color_for(2.0), ramp.color_at(1.0));
        assert_eq!(grid.color_for(1.0), ramp.color_at(0.5));
    }
}
