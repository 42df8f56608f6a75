use crate::math::TOLERANCE;

/// Parameters of the fallback geometry estimation of a structure set.
#[derive(Debug, Clone)]
pub struct EstimationParams {
    /// Buckets per spherical angle in the orientation histogram.
    pub angle_buckets: usize,
    /// Buckets of the inter-slice gap histogram.
    pub spacing_buckets: usize,
    /// Maximum distance of a point from the plane of its polygon.
    pub coplanarity_tolerance: f64,
    /// Spacing used when fewer than two distinct slices are found.
    pub default_spacing: f64,
}

impl Default for EstimationParams {
    fn default() -> Self {
        Self {
            angle_buckets: 9,
            spacing_buckets: 16,
            coplanarity_tolerance: TOLERANCE,
            default_spacing: 1.0,
        }
    }
}
