// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geometry value types shared by visuals and drawing surfaces.

use kurbo::{BezPath, Ellipse, Point, Rect, RoundedRect, Shape as _, Size};

/// A shape used for clipping a visual or for drawing primitives.
///
/// All coordinates are in the local space of the visual that owns or draws
/// the geometry.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    /// An axis-aligned rectangle.
    Rect(Rect),
    /// A rectangle with rounded corners.
    RoundedRect(RoundedRect),
    /// An ellipse inscribed in a rectangle.
    Ellipse(Ellipse),
    /// An arbitrary path, filled with the non-zero winding rule.
    Path(BezPath),
}

impl Geometry {
    /// Returns the axis-aligned bounding box of the geometry.
    #[must_use]
    pub fn bounding_box(&self) -> Rect {
        match self {
            Self::Rect(r) => *r,
            Self::RoundedRect(r) => r.rect(),
            Self::Ellipse(e) => e.bounding_box(),
            Self::Path(p) => p.bounding_box(),
        }
    }

    /// Returns whether `pt` lies inside the geometry.
    #[must_use]
    pub fn contains(&self, pt: Point) -> bool {
        match self {
            Self::Rect(r) => r.contains(pt),
            Self::RoundedRect(r) => r.contains(pt),
            Self::Ellipse(e) => e.contains(pt),
            Self::Path(p) => p.contains(pt),
        }
    }

    /// Returns `true` if this is a plain rectangle, which surfaces can
    /// usually clip to without a mask.
    #[must_use]
    pub fn is_rect(&self) -> bool {
        matches!(self, Self::Rect(_))
    }
}

impl From<Rect> for Geometry {
    fn from(r: Rect) -> Self {
        Self::Rect(r)
    }
}

impl From<RoundedRect> for Geometry {
    fn from(r: RoundedRect) -> Self {
        Self::RoundedRect(r)
    }
}

impl From<Ellipse> for Geometry {
    fn from(e: Ellipse) -> Self {
        Self::Ellipse(e)
    }
}

impl From<BezPath> for Geometry {
    fn from(p: BezPath) -> Self {
        Self::Path(p)
    }
}

/// How the coordinates of a [`RelativePoint`] are interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RelativeUnit {
    /// Fractions of the visual's size (`0.0` = left/top, `1.0` = right/bottom).
    #[default]
    Relative,
    /// Absolute offsets in the visual's local coordinates.
    Absolute,
}

/// A point expressed either relative to a size or in absolute units.
///
/// Used as the pivot for a visual's render transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RelativePoint {
    /// The coordinates, interpreted according to `unit`.
    pub point: Point,
    /// The unit of `point`.
    pub unit: RelativeUnit,
}

impl RelativePoint {
    /// The center of the visual.
    pub const CENTER: Self = Self::relative(0.5, 0.5);

    /// The top-left corner of the visual.
    pub const TOP_LEFT: Self = Self::relative(0.0, 0.0);

    /// The bottom-right corner of the visual.
    pub const BOTTOM_RIGHT: Self = Self::relative(1.0, 1.0);

    /// Creates a point expressed as fractions of the visual's size.
    #[inline]
    #[must_use]
    pub const fn relative(x: f64, y: f64) -> Self {
        Self {
            point: Point::new(x, y),
            unit: RelativeUnit::Relative,
        }
    }

    /// Creates a point in absolute local coordinates.
    #[inline]
    #[must_use]
    pub const fn absolute(x: f64, y: f64) -> Self {
        Self {
            point: Point::new(x, y),
            unit: RelativeUnit::Absolute,
        }
    }

    /// Resolves the point against `size`, returning local coordinates.
    #[must_use]
    pub fn resolve(self, size: Size) -> Point {
        match self.unit {
            RelativeUnit::Relative => {
                Point::new(self.point.x * size.width, self.point.y * size.height)
            }
            RelativeUnit::Absolute => self.point,
        }
    }

    /// Is this point [finite]?
    ///
    /// [finite]: f64::is_finite
    #[inline]
    #[must_use]
    pub const fn is_finite(&self) -> bool {
        self.point.x.is_finite() && self.point.y.is_finite()
    }
}

impl Default for RelativePoint {
    fn default() -> Self {
        Self::CENTER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_point_resolves_against_size() {
        let size = Size::new(200.0, 100.0);
        assert_eq!(RelativePoint::CENTER.resolve(size), Point::new(100.0, 50.0));
        assert_eq!(RelativePoint::TOP_LEFT.resolve(size), Point::ZERO);
        assert_eq!(
            RelativePoint::BOTTOM_RIGHT.resolve(size),
            Point::new(200.0, 100.0)
        );
    }

    #[test]
    fn absolute_point_ignores_size() {
        let p = RelativePoint::absolute(7.0, 9.0);
        assert_eq!(p.resolve(Size::new(1000.0, 1000.0)), Point::new(7.0, 9.0));
    }

    #[test]
    fn default_origin_is_center() {
        assert_eq!(RelativePoint::default(), RelativePoint::CENTER);
    }

    #[test]
    fn rounded_rect_excludes_corner() {
        let g = Geometry::from(RoundedRect::new(0.0, 0.0, 10.0, 10.0, 4.0));
        assert!(g.contains(Point::new(5.0, 5.0)));
        assert!(!g.contains(Point::new(0.2, 0.2)));
        assert_eq!(g.bounding_box(), Rect::new(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn ellipse_bounding_box_matches_rect() {
        let g = Geometry::from(Ellipse::from_rect(Rect::new(0.0, 0.0, 20.0, 10.0)));
        let bb = g.bounding_box();
        let eps = 1e-9;
        assert!((bb.x0 - 0.0).abs() < eps);
        assert!((bb.x1 - 20.0).abs() < eps);
        assert!((bb.y1 - 10.0).abs() < eps);
        assert!(g.contains(Point::new(10.0, 5.0)));
        assert!(!g.contains(Point::new(0.5, 0.5)));
        assert!(!g.is_rect());
    }
}
