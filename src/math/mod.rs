pub mod stats;

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Global tolerance for floating-point comparisons.
///
/// Most geometric input comes from single-precision DICOM strings, so the
/// threshold is ten times the `f32` machine epsilon.
pub const TOLERANCE: f64 = 10.0 * f32::EPSILON as f64;

/// Returns `true` if `|x - y| < threshold`.
#[inline]
#[must_use]
pub fn is_near(x: f64, y: f64, threshold: f64) -> bool {
    (x - y).abs() < threshold
}

/// Returns `true` if `x` is within [`TOLERANCE`] of zero.
#[inline]
#[must_use]
pub fn is_close_to_zero(x: f64) -> bool {
    is_near(x, 0.0, TOLERANCE)
}

/// Relative direction of two parallel vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    /// Both vectors point the same way.
    Parallel,
    /// The vectors point in opposite directions.
    Opposite,
}

/// Tests whether `u` and `v` are parallel or opposite.
///
/// Compares the cosine of the angle between the vectors against `±1` with
/// [`TOLERANCE`]. Returns `None` if the vectors are not aligned, or if either
/// of them is (close to) the zero vector.
#[must_use]
pub fn are_parallel_or_opposite(u: &Vector3, v: &Vector3) -> Option<Alignment> {
    let norm_u = u.norm();
    let norm_v = v.norm();

    if is_close_to_zero(norm_u) || is_close_to_zero(norm_v) {
        return None;
    }

    let cos_angle = u.dot(v) / (norm_u * norm_v);

    if is_close_to_zero(cos_angle - 1.0) {
        Some(Alignment::Parallel)
    } else if is_close_to_zero(cos_angle.abs() - 1.0) {
        Some(Alignment::Opposite)
    } else {
        None
    }
}

/// Tests whether `u` and `v` point in the same direction.
#[must_use]
pub fn is_parallel(u: &Vector3, v: &Vector3) -> bool {
    are_parallel_or_opposite(u, v) == Some(Alignment::Parallel)
}
