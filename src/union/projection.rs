use std::cmp::Ordering;

use crate::error::{RangeError, Result};
use crate::geometry::Extent2D;

/// Axis along which rectangles are projected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// The `x1..x2` sides.
    Horizontal,
    /// The `y1..y2` sides.
    Vertical,
}

#[derive(Debug, Clone, Copy)]
struct Endpoint {
    rectangle: usize,
    value: f64,
    is_low: bool,
}

impl Endpoint {
    // High endpoints come first on ties, so that touching rectangles share
    // a single compressed coordinate.
    fn compare(&self, other: &Self) -> Ordering {
        self.value
            .total_cmp(&other.value)
            .then(self.is_low.cmp(&other.is_low))
    }
}

/// Coordinate compression of a list of rectangles along one axis.
///
/// Distinct endpoint values are sorted and numbered; every non-empty
/// rectangle becomes an integer interval `[low, high)` over those numbers.
/// Empty rectangles are skipped, so the `i`-th projected rectangle is the
/// `i`-th *non-empty* input rectangle.
#[derive(Debug, Clone)]
pub struct RectangleProjection {
    endpoints: Vec<f64>,
    lows: Vec<usize>,
    highs: Vec<usize>,
}

impl RectangleProjection {
    #[must_use]
    pub fn new(rectangles: &[Extent2D], axis: Axis) -> Self {
        let mut endpoints = Vec::with_capacity(2 * rectangles.len());

        for (rectangle, extent) in rectangles.iter().filter(|r| !r.is_empty()).enumerate() {
            let (low, high) = match axis {
                Axis::Horizontal => (extent.x1(), extent.x2()),
                Axis::Vertical => (extent.y1(), extent.y2()),
            };
            endpoints.push(Endpoint {
                rectangle,
                value: low,
                is_low: true,
            });
            endpoints.push(Endpoint {
                rectangle,
                value: high,
                is_low: false,
            });
        }

        endpoints.sort_by(Endpoint::compare);

        let count = endpoints.len() / 2;
        let mut values: Vec<f64> = Vec::with_capacity(endpoints.len());
        let mut lows = vec![0; count];
        let mut highs = vec![0; count];

        for endpoint in &endpoints {
            if values.last().is_none_or(|&last| last < endpoint.value) {
                values.push(endpoint.value);
            }

            let index = values.len() - 1;
            if endpoint.is_low {
                lows[endpoint.rectangle] = index;
            } else {
                highs[endpoint.rectangle] = index;
            }
        }

        Self {
            endpoints: values,
            lows,
            highs,
        }
    }

    /// Number of distinct endpoint values.
    #[must_use]
    pub fn endpoints_count(&self) -> usize {
        self.endpoints.len()
    }

    /// Real coordinate of the compressed endpoint `index`.
    ///
    /// # Errors
    ///
    /// Returns `RangeError::IndexOutOfBounds` for an unknown endpoint.
    pub fn endpoint_coordinate(&self, index: usize) -> Result<f64> {
        self.endpoints
            .get(index)
            .copied()
            .ok_or_else(|| {
                RangeError::IndexOutOfBounds {
                    index,
                    size: self.endpoints.len(),
                }
                .into()
            })
    }

    /// Number of non-empty rectangles.
    #[must_use]
    pub fn projected_rectangles_count(&self) -> usize {
        self.lows.len()
    }

    /// Compressed low bound of rectangle `index`.
    ///
    /// # Errors
    ///
    /// Returns `RangeError::IndexOutOfBounds` for an unknown rectangle.
    pub fn projected_rectangle_low(&self, index: usize) -> Result<usize> {
        self.interval_bound(&self.lows, index)
    }

    /// Compressed high bound of rectangle `index`.
    ///
    /// # Errors
    ///
    /// Returns `RangeError::IndexOutOfBounds` for an unknown rectangle.
    pub fn projected_rectangle_high(&self, index: usize) -> Result<usize> {
        self.interval_bound(&self.highs, index)
    }

    fn interval_bound(&self, bounds: &[usize], index: usize) -> Result<usize> {
        bounds.get(index).copied().ok_or_else(|| {
            RangeError::IndexOutOfBounds {
                index,
                size: self.projected_rectangles_count(),
            }
            .into()
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn bounds(projection: &RectangleProjection, i: usize) -> (usize, usize) {
        (
            projection.projected_rectangle_low(i).unwrap(),
            projection.projected_rectangle_high(i).unwrap(),
        )
    }

    fn coordinates(projection: &RectangleProjection) -> Vec<f64> {
        (0..projection.endpoints_count())
            .map(|i| projection.endpoint_coordinate(i).unwrap())
            .collect()
    }

    #[test]
    fn single_rectangle() {
        let rects = [Extent2D::new(10.0, 20.0, 30.0, 40.0)];

        let h = RectangleProjection::new(&rects, Axis::Horizontal);
        assert_eq!(coordinates(&h), vec![10.0, 30.0]);
        assert_eq!(h.projected_rectangles_count(), 1);
        assert_eq!(bounds(&h, 0), (0, 1));
        assert!(h.endpoint_coordinate(2).is_err());
        assert!(h.projected_rectangle_low(1).is_err());
        assert!(h.projected_rectangle_high(1).is_err());

        let v = RectangleProjection::new(&rects, Axis::Vertical);
        assert_eq!(coordinates(&v), vec![20.0, 40.0]);
        assert_eq!(bounds(&v, 0), (0, 1));
    }

    #[test]
    fn overlapping_rectangles() {
        let rects = [
            Extent2D::new(10.0, 20.0, 30.0, 40.0),
            Extent2D::new(20.0, 30.0, 40.0, 50.0),
        ];

        let h = RectangleProjection::new(&rects, Axis::Horizontal);
        assert_eq!(coordinates(&h), vec![10.0, 20.0, 30.0, 40.0]);
        assert_eq!(bounds(&h, 0), (0, 2));
        assert_eq!(bounds(&h, 1), (1, 3));

        let v = RectangleProjection::new(&rects, Axis::Vertical);
        assert_eq!(coordinates(&v), vec![20.0, 30.0, 40.0, 50.0]);
        assert_eq!(bounds(&v, 0), (0, 2));
        assert_eq!(bounds(&v, 1), (1, 3));
    }

    #[test]
    fn shared_endpoints_are_merged() {
        let rects = [
            Extent2D::new(0.0, 0.0, 1.0, 1.0),
            Extent2D::new(1.0, 0.0, 2.0, 1.0),
        ];
        let h = RectangleProjection::new(&rects, Axis::Horizontal);
        assert_eq!(coordinates(&h), vec![0.0, 1.0, 2.0]);
        assert_eq!(bounds(&h, 0), (0, 1));
        assert_eq!(bounds(&h, 1), (1, 2));

        let v = RectangleProjection::new(&rects, Axis::Vertical);
        assert_eq!(coordinates(&v), vec![0.0, 1.0]);
    }

    #[test]
    fn empty_rectangles_are_skipped() {
        let rects = [
            Extent2D::new(3.0, 3.0, 4.0, 3.0),
            Extent2D::new(10.0, 20.0, 30.0, 40.0),
        ];
        let h = RectangleProjection::new(&rects, Axis::Horizontal);
        assert_eq!(h.projected_rectangles_count(), 1);
        assert_eq!(coordinates(&h), vec![10.0, 30.0]);

        let none = RectangleProjection::new(&[], Axis::Vertical);
        assert_eq!(none.endpoints_count(), 0);
        assert_eq!(none.projected_rectangles_count(), 0);
    }
}
