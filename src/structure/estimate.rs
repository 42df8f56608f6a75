use std::f64::consts::PI;

use tracing::debug;

use crate::error::Result;
use crate::histogram::{HistogramAccumulator1D, HistogramAccumulator2D};
use crate::math::stats::compute_median;
use crate::math::{is_close_to_zero, is_near, Point3, Vector3, TOLERANCE};

use super::{EstimationParams, Structure, StructurePolygon};

/// Fallback geometry of a structure set, used for polygons whose slice
/// geometry is still unknown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryEstimate {
    /// Dominant unit normal of the polygon planes.
    pub normal: Vector3,
    /// Typical distance between successive polygon planes.
    pub spacing: f64,
}

impl GeometryEstimate {
    /// Axial normal with the given spacing.
    #[must_use]
    pub fn axial(spacing: f64) -> Self {
        Self {
            normal: Vector3::z(),
            spacing,
        }
    }
}

/// Estimates the dominant normal and slice spacing of a set of structures.
///
/// The normal of every planar polygon is accumulated as spherical angles in a
/// 2D histogram; the median angles of the most populated bucket give the
/// estimated normal. The spacing is the median gap between the distinct
/// projections of the polygons along that normal, taken inside the most
/// populated bucket of a gap histogram.
///
/// # Errors
///
/// Returns an error if `params` describes an empty histogram.
pub fn estimate_geometry(
    structures: &[Structure],
    params: &EstimationParams,
) -> Result<GeometryEstimate> {
    let polygons: Vec<&StructurePolygon> =
        structures.iter().flat_map(Structure::polygons).collect();

    let normal = estimate_normal(&polygons, params)?;
    let spacing = estimate_spacing(&polygons, &normal, params)?;

    debug!(
        polygons = polygons.len(),
        normal = ?(normal.x, normal.y, normal.z),
        spacing,
        "estimated structure set geometry"
    );

    Ok(GeometryEstimate { normal, spacing })
}

/// Unit normal of a planar polygon, from its first non-degenerate triple of
/// successive points. Returns `None` if the points are not coplanar.
fn polygon_normal(points: &[Point3], tolerance: f64) -> Option<Vector3> {
    let normal = points.windows(3).find_map(|w| {
        let (a, b, c) = (&w[0], &w[1], &w[2]);
        (b - a)
            .cross(&(c - a))
            .try_normalize(f64::EPSILON)
            .filter(|n| n.iter().all(|x| x.is_finite()))
    })?;

    let d = points[0].coords.dot(&normal);
    points
        .iter()
        .all(|p| is_near(p.coords.dot(&normal), d, tolerance))
        .then_some(normal)
}

/// Flips `normal` into the upper hemisphere, so that opposite normals share
/// one set of spherical angles.
fn canonical_normal(normal: Vector3) -> Vector3 {
    let flip = if is_close_to_zero(normal.z) {
        normal.y < 0.0 || (is_close_to_zero(normal.y) && normal.x < 0.0)
    } else {
        normal.z < 0.0
    };
    if flip {
        -normal
    } else {
        normal
    }
}

fn estimate_normal(polygons: &[&StructurePolygon], params: &EstimationParams) -> Result<Vector3> {
    let mut accumulator = HistogramAccumulator2D::new(
        (0.0, PI, params.angle_buckets),
        (-PI, PI, params.angle_buckets),
        true,
    )?;

    for polygon in polygons {
        let points = polygon.points();
        if points.len() < 3 {
            continue;
        }
        let Some(normal) = polygon_normal(points, params.coplanarity_tolerance) else {
            continue;
        };

        let normal = canonical_normal(normal);
        let theta = normal.z.clamp(-1.0, 1.0).acos();
        // The azimuth of a vertical normal is meaningless; pin it to zero so
        // that signed zeros cannot split one orientation across buckets.
        let phi = if is_close_to_zero(normal.x) && is_close_to_zero(normal.y) {
            0.0
        } else {
            normal.y.atan2(normal.x)
        };
        accumulator.add_value(theta, phi)?;
    }

    let (best_x, best_y) = accumulator.find_best_bucket();
    if accumulator.bucket_content_size(best_x, best_y)? == 0 {
        return Ok(Vector3::z());
    }

    let (theta, phi) = accumulator.compute_best_median()?;
    let sin_theta = theta.sin();
    Ok(Vector3::new(
        sin_theta * phi.cos(),
        sin_theta * phi.sin(),
        theta.cos(),
    ))
}

fn estimate_spacing(
    polygons: &[&StructurePolygon],
    normal: &Vector3,
    params: &EstimationParams,
) -> Result<f64> {
    let mut projections: Vec<f64> = polygons
        .iter()
        .filter_map(|polygon| polygon.points().first())
        .map(|p| p.coords.dot(normal))
        .filter(|d| d.is_finite())
        .collect();
    projections.sort_by(f64::total_cmp);

    let mut deltas: Vec<f64> = projections
        .windows(2)
        .filter(|w| !is_near(w[0], w[1], TOLERANCE))
        .map(|w| w[1] - w[0])
        .collect();

    if deltas.is_empty() {
        return Ok(params.default_spacing);
    }

    let min = deltas.iter().copied().fold(f64::INFINITY, f64::min);
    let max = deltas.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max - min < TOLERANCE {
        return compute_median(&mut deltas);
    }

    let mut accumulator = HistogramAccumulator1D::new(min, max, params.spacing_buckets, true)?;
    for delta in &deltas {
        accumulator.add_value(*delta)?;
    }
    accumulator.compute_best_median()
}
