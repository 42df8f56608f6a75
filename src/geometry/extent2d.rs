use crate::math::Point2;

/// An axis-aligned 2D rectangle.
///
/// An extent is *empty* when it was never given a point, or when it has no
/// area (`x1 == x2` or `y1 == y2`). Empty extents carry no coverage and are
/// dropped by the rectangle union.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent2D {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    has_points: bool,
}

impl Extent2D {
    /// Creates the extent spanned by two opposite corners.
    ///
    /// The corners may be given in any order.
    #[must_use]
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
            has_points: true,
        }
    }

    /// Creates the extent spanned by two points.
    #[must_use]
    pub fn from_corners(a: &Point2, b: &Point2) -> Self {
        Self::new(a.x, a.y, b.x, b.y)
    }

    /// Grows the extent to include `(x, y)`.
    pub fn add_point(&mut self, x: f64, y: f64) {
        if self.has_points {
            self.x1 = self.x1.min(x);
            self.y1 = self.y1.min(y);
            self.x2 = self.x2.max(x);
            self.y2 = self.y2.max(y);
        } else {
            *self = Self::new(x, y, x, y);
        }
    }

    /// Grows the extent to include `other`.
    pub fn union(&mut self, other: &Extent2D) {
        if other.has_points {
            self.add_point(other.x1, other.y1);
            self.add_point(other.x2, other.y2);
        }
    }

    #[must_use]
    pub fn x1(&self) -> f64 {
        self.x1
    }

    #[must_use]
    pub fn y1(&self) -> f64 {
        self.y1
    }

    #[must_use]
    pub fn x2(&self) -> f64 {
        self.x2
    }

    #[must_use]
    pub fn y2(&self) -> f64 {
        self.y2
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// Returns `true` if the extent covers no area.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.has_points || self.x1 >= self.x2 || self.y1 >= self.y2
    }

    /// Returns `true` if `(x, y)` lies inside the closed rectangle.
    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.has_points && self.x1 <= x && x <= self.x2 && self.y1 <= y && y <= self.y2
    }

    /// Center of the rectangle, or `None` for an extent without points.
    #[must_use]
    pub fn center(&self) -> Option<Point2> {
        self.has_points.then(|| {
            Point2::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
        })
    }
}

impl Default for Extent2D {
    /// An extent with no points.
    fn default() -> Self {
        Self {
            x1: 0.0,
            y1: 0.0,
            x2: 0.0,
            y2: 0.0,
            has_points: false,
        }
    }
}
