use serde::{Deserialize, Serialize};

use crate::projection::WebMercator;
use crate::MapPoint;

/// Axis aligned rectangle in the planar map space.
///
/// `origin` is the top-left (north-west) corner.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapRect {
    /// Top-left corner.
    pub origin: MapPoint,
    /// Extent along `x` axis.
    pub width: f64,
    /// Extent along `y` axis.
    pub height: f64,
}

impl MapRect {
    /// Rectangle spanning the whole planar space.
    pub const WORLD: MapRect = MapRect {
        origin: MapPoint::new(0.0, 0.0),
        width: WebMercator::WORLD_SIZE,
        height: WebMercator::WORLD_SIZE,
    };

    /// Sentinel for "no extent". It intersects nothing and is the identity of [`MapRect::union`].
    pub const NULL: MapRect = MapRect {
        origin: MapPoint::new(f64::INFINITY, f64::INFINITY),
        width: 0.0,
        height: 0.0,
    };

    /// Creates a new rectangle.
    pub const fn new(origin: MapPoint, width: f64, height: f64) -> Self {
        Self {
            origin,
            width,
            height,
        }
    }

    /// Creates a rectangle from two opposite corners in any order.
    pub fn from_corners(a: MapPoint, b: MapPoint) -> Self {
        let x_min = a.x.min(b.x);
        let y_min = a.y.min(b.y);
        Self {
            origin: MapPoint::new(x_min, y_min),
            width: a.x.max(b.x) - x_min,
            height: a.y.max(b.y) - y_min,
        }
    }

    /// Minimal rectangle containing all the points, or `None` if the iterator is empty.
    pub fn from_points(mut points: impl Iterator<Item = MapPoint>) -> Option<Self> {
        let first = points.next()?;
        let mut x_min = first.x;
        let mut y_min = first.y;
        let mut x_max = first.x;
        let mut y_max = first.y;

        for p in points {
            x_min = x_min.min(p.x);
            y_min = y_min.min(p.y);
            x_max = x_max.max(p.x);
            y_max = y_max.max(p.y);
        }

        Some(Self::from_corners(
            MapPoint::new(x_min, y_min),
            MapPoint::new(x_max, y_max),
        ))
    }

    /// Smallest `x` value.
    pub fn min_x(&self) -> f64 {
        self.origin.x
    }

    /// Smallest `y` value.
    pub fn min_y(&self) -> f64 {
        self.origin.y
    }

    /// Largest `x` value.
    pub fn max_x(&self) -> f64 {
        self.origin.x + self.width
    }

    /// Largest `y` value.
    pub fn max_y(&self) -> f64 {
        self.origin.y + self.height
    }

    /// Center point.
    pub fn center(&self) -> MapPoint {
        MapPoint::new(
            self.origin.x + self.width / 2.0,
            self.origin.y + self.height / 2.0,
        )
    }

    /// Returns true for [`MapRect::NULL`] and for any rectangle with non-finite origin.
    pub fn is_null(&self) -> bool {
        !self.origin.x.is_finite() || !self.origin.y.is_finite()
    }

    /// Returns true if the rectangle covers no area.
    pub fn is_empty(&self) -> bool {
        self.is_null() || self.width <= 0.0 || self.height <= 0.0
    }

    /// Returns true if the rectangles share some area. Rectangles that only touch along an
    /// edge do not intersect.
    pub fn intersects(&self, other: &MapRect) -> bool {
        self.min_x() < other.max_x()
            && other.min_x() < self.max_x()
            && self.min_y() < other.max_y()
            && other.min_y() < self.max_y()
    }

    /// Common part of the two rectangles, `None` if they do not intersect.
    pub fn intersection(&self, other: &MapRect) -> Option<MapRect> {
        if !self.intersects(other) {
            return None;
        }

        Some(Self::from_corners(
            MapPoint::new(
                self.min_x().max(other.min_x()),
                self.min_y().max(other.min_y()),
            ),
            MapPoint::new(
                self.max_x().min(other.max_x()),
                self.max_y().min(other.max_y()),
            ),
        ))
    }

    /// Smallest rectangle containing both rectangles.
    pub fn union(&self, other: &MapRect) -> MapRect {
        if self.is_null() {
            return *other;
        }
        if other.is_null() {
            return *self;
        }

        Self::from_corners(
            MapPoint::new(
                self.min_x().min(other.min_x()),
                self.min_y().min(other.min_y()),
            ),
            MapPoint::new(
                self.max_x().max(other.max_x()),
                self.max_y().max(other.max_y()),
            ),
        )
    }

    /// Returns true if the point lies inside the rectangle or on its boundary.
    pub fn contains_point(&self, point: &MapPoint) -> bool {
        self.min_x() <= point.x
            && self.max_x() >= point.x
            && self.min_y() <= point.y
            && self.max_y() >= point.y
    }

    /// Returns true if the other rectangle lies fully inside this one.
    pub fn contains_rect(&self, other: &MapRect) -> bool {
        !other.is_null()
            && self.min_x() <= other.min_x()
            && self.max_x() >= other.max_x()
            && self.min_y() <= other.min_y()
            && self.max_y() >= other.max_y()
    }

    /// Returns a rectangle moved inwards by `dx` and `dy` on each side. Negative values grow the
    /// rectangle.
    pub fn inset(&self, dx: f64, dy: f64) -> MapRect {
        Self {
            origin: self.origin.offset(dx, dy),
            width: (self.width - 2.0 * dx).max(0.0),
            height: (self.height - 2.0 * dy).max(0.0),
        }
    }
}

impl FromIterator<MapRect> for MapRect {
    fn from_iter<T: IntoIterator<Item = MapRect>>(iter: T) -> Self {
        iter.into_iter()
            .fold(MapRect::NULL, |acc, rect| acc.union(&rect))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f64, y: f64, w: f64, h: f64) -> MapRect {
        MapRect::new(MapPoint::new(x, y), w, h)
    }

    #[test]
    fn intersection_is_commutative() {
        let cases = [
            (rect(0.0, 0.0, 10.0, 10.0), rect(5.0, 5.0, 10.0, 10.0)),
            (rect(0.0, 0.0, 10.0, 10.0), rect(2.0, 2.0, 3.0, 3.0)),
            (rect(0.0, 0.0, 10.0, 10.0), rect(10.0, 0.0, 10.0, 10.0)),
            (rect(0.0, 0.0, 10.0, 10.0), rect(20.0, 20.0, 1.0, 1.0)),
            (rect(-5.0, 3.0, 1.0, 100.0), MapRect::NULL),
            (rect(-5.0, 3.0, 1.0, 100.0), MapRect::WORLD),
        ];

        for (a, b) in cases {
            assert_eq!(a.intersects(&b), b.intersects(&a));
            assert_eq!(a.intersection(&b), b.intersection(&a));
        }
    }

    #[test]
    fn intersection_values() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let b = rect(5.0, -5.0, 10.0, 10.0);
        assert_eq!(a.intersection(&b), Some(rect(5.0, 0.0, 5.0, 5.0)));
    }

    #[test]
    fn touching_rects_do_not_intersect() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let b = rect(10.0, 0.0, 10.0, 10.0);
        assert!(!a.intersects(&b));
        assert_eq!(a.intersection(&b), None);
    }

    #[test]
    fn null_rect() {
        let a = rect(1.0, 2.0, 3.0, 4.0);
        assert!(MapRect::NULL.is_null());
        assert!(MapRect::NULL.is_empty());
        assert!(!MapRect::NULL.intersects(&MapRect::WORLD));
        assert_eq!(MapRect::NULL.union(&a), a);
        assert_eq!(a.union(&MapRect::NULL), a);
    }

    #[test]
    fn union_and_from_iter() {
        let a = rect(0.0, 0.0, 1.0, 1.0);
        let b = rect(5.0, 5.0, 1.0, 2.0);
        assert_eq!(a.union(&b), rect(0.0, 0.0, 6.0, 7.0));
        assert_eq!([a, b].into_iter().collect::<MapRect>(), rect(0.0, 0.0, 6.0, 7.0));
        assert!(std::iter::empty::<MapRect>().collect::<MapRect>().is_null());
    }

    #[test]
    fn from_points() {
        let points = [
            MapPoint::new(3.0, 1.0),
            MapPoint::new(-1.0, 4.0),
            MapPoint::new(2.0, -2.0),
        ];
        assert_eq!(
            MapRect::from_points(points.into_iter()),
            Some(rect(-1.0, -2.0, 4.0, 6.0))
        );
        assert_eq!(MapRect::from_points(std::iter::empty()), None);
    }

    #[test]
    fn containment() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        assert!(a.contains_point(&MapPoint::new(0.0, 10.0)));
        assert!(!a.contains_point(&MapPoint::new(-0.1, 5.0)));
        assert!(a.contains_rect(&rect(1.0, 1.0, 2.0, 2.0)));
        assert!(!a.contains_rect(&rect(9.0, 9.0, 2.0, 2.0)));
        assert!(MapRect::WORLD.contains_rect(&a));
    }

    #[test]
    fn inset() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        assert_eq!(a.inset(1.0, 2.0), rect(1.0, 2.0, 8.0, 6.0));
        assert_eq!(a.inset(-1.0, 0.0), rect(-1.0, 0.0, 12.0, 10.0));
    }
}
