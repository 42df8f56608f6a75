use std::fmt;

use crate::error::{FormatError, GeometryError, Result};
use crate::math::{
    are_parallel_or_opposite, is_close_to_zero, is_near, Point2, Point3, Vector3, TOLERANCE,
};

/// An oriented plane with an orthonormal 2D frame.
///
/// Defined by an origin and two unit, mutually orthogonal axes. The normal is
/// `axis_x × axis_y` and is therefore unit-length by construction.
///
/// Points on the plane: `P(x, y) = origin + x * axis_x + y * axis_y`.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane3D {
    origin: Point3,
    axis_x: Vector3,
    axis_y: Vector3,
    normal: Vector3,
    d: f64,
}

impl Plane3D {
    /// Creates a plane from an origin and two axes.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::NotUnitVector` if either axis is not unit-length,
    /// or `GeometryError::NotOrthonormal` if the axes are not orthogonal.
    pub fn new(origin: Point3, axis_x: Vector3, axis_y: Vector3) -> Result<Self> {
        // DICOM direction cosines must be unit vectors...
        for (axis, v) in [("axis_x", &axis_x), ("axis_y", &axis_y)] {
            let norm = v.norm();
            if !is_near(norm, 1.0, TOLERANCE) {
                return Err(GeometryError::NotUnitVector { axis, norm }.into());
            }
        }

        // ...and orthogonal to each other.
        let dot = axis_x.dot(&axis_y);
        if !is_close_to_zero(dot) {
            return Err(GeometryError::NotOrthonormal { dot }.into());
        }

        let normal = axis_x.cross(&axis_y);
        let d = -normal.dot(&origin.coords);

        Ok(Self {
            origin,
            axis_x,
            axis_y,
            normal,
            d,
        })
    }

    /// Creates a plane from the "Image Position Patient" (3 values) and
    /// "Image Orientation Patient" (6 values) of a slice.
    ///
    /// # Errors
    ///
    /// Returns `FormatError::BadVectorSize` if the arities are wrong, or a
    /// geometry error if the orientation is not orthonormal.
    pub fn from_dicom(position: &[f64], orientation: &[f64]) -> Result<Self> {
        if position.len() != 3 {
            return Err(FormatError::BadVectorSize {
                tag: "ImagePositionPatient",
                expected: 3,
                found: position.len(),
            }
            .into());
        }
        if orientation.len() != 6 {
            return Err(FormatError::BadVectorSize {
                tag: "ImageOrientationPatient",
                expected: 6,
                found: orientation.len(),
            }
            .into());
        }

        Self::new(
            Point3::new(position[0], position[1], position[2]),
            Vector3::new(orientation[0], orientation[1], orientation[2]),
            Vector3::new(orientation[3], orientation[4], orientation[5]),
        )
    }

    /// Returns the origin of the plane.
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Returns the X axis of the plane frame.
    #[must_use]
    pub fn axis_x(&self) -> &Vector3 {
        &self.axis_x
    }

    /// Returns the Y axis of the plane frame.
    #[must_use]
    pub fn axis_y(&self) -> &Vector3 {
        &self.axis_y
    }

    /// Returns the unit normal of the plane.
    #[must_use]
    pub fn normal(&self) -> &Vector3 {
        &self.normal
    }

    /// Moves the origin of the plane. The axes are left untouched.
    pub fn set_origin(&mut self, origin: Point3) {
        self.origin = origin;
        self.d = -self.normal.dot(&origin.coords);
    }

    /// Maps 2D plane coordinates to a 3D world point.
    #[must_use]
    pub fn map_to_world(&self, x: f64, y: f64) -> Point3 {
        self.origin + self.axis_x * x + self.axis_y * y
    }

    /// Signed distance of `point` from the world origin along the normal.
    #[must_use]
    pub fn project_along_normal(&self, point: &Point3) -> f64 {
        point.coords.dot(&self.normal)
    }

    /// Orthogonal projection of `point` onto the plane frame.
    ///
    /// Returns the `(x, y)` offsets of the projected point from the origin.
    #[must_use]
    pub fn project(&self, point: &Point3) -> (f64, f64) {
        // The normal component of `point - origin` is orthogonal to both
        // axes, so the dot products ignore it.
        let diff = point - self.origin;
        (self.axis_x.dot(&diff), self.axis_y.dot(&diff))
    }

    /// Same as [`project`](Self::project), returning a [`Point2`].
    #[must_use]
    pub fn project_point(&self, point: &Point3) -> Point2 {
        let (x, y) = self.project(point);
        Point2::new(x, y)
    }

    /// Intersects the segment `a`–`b` with the plane.
    ///
    /// Returns `None` if both endpoints lie strictly on the same side, or if
    /// the segment is parallel to the plane.
    #[must_use]
    pub fn intersect_segment(&self, a: &Point3, b: &Point3) -> Option<Point3> {
        let da = self.normal.dot(&a.coords) + self.d;
        let db = self.normal.dot(&b.coords) + self.d;

        if (da > 0.0 && db > 0.0) || (da < 0.0 && db < 0.0) {
            return None;
        }

        let denom = da - db;
        if denom == 0.0 {
            return None;
        }

        let t = da / denom;
        Some(a + (b - a) * t)
    }

    /// Intersects the infinite line `origin + t * direction` with the plane.
    ///
    /// Returns `None` if the line is parallel to the plane.
    #[must_use]
    pub fn intersect_line(&self, origin: &Point3, direction: &Vector3) -> Option<Point3> {
        let denom = self.normal.dot(direction);
        if is_close_to_zero(denom) {
            return None;
        }

        let t = -(self.normal.dot(&origin.coords) + self.d) / denom;
        Some(origin + direction * t)
    }

    /// Distance between two parallel (or opposite) planes.
    ///
    /// Returns `None` if the planes are not parallel.
    #[must_use]
    pub fn distance_to(&self, other: &Plane3D) -> Option<f64> {
        are_parallel_or_opposite(&self.normal, &other.normal)?;
        Some(
            (self.project_along_normal(&self.origin) - self.project_along_normal(&other.origin))
                .abs(),
        )
    }

    /// Re-origins the plane so that the world origin `(0, 0, 0)` projects to
    /// `(0, 0)` in the plane frame.
    ///
    /// Keeps the projected offsets numerically small on cutting planes that
    /// are far from the world origin.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let (ox, oy) = self.project(&Point3::origin());
        let mut plane = self.clone();
        plane.set_origin(self.map_to_world(ox, oy));
        plane
    }
}

impl Default for Plane3D {
    /// The canonical axial plane: origin at zero, axes along world X and Y.
    fn default() -> Self {
        Self {
            origin: Point3::origin(),
            axis_x: Vector3::x(),
            axis_y: Vector3::y(),
            normal: Vector3::z(),
            d: 0.0,
        }
    }
}

impl fmt::Display for Plane3D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "origin: ({}, {}, {}) normal: ({}, {}, {}) axis_x: ({}, {}, {}) axis_y: ({}, {}, {})",
            self.origin.x,
            self.origin.y,
            self.origin.z,
            self.normal.x,
            self.normal.y,
            self.normal.z,
            self.axis_x.x,
            self.axis_x.y,
            self.axis_x.z,
            self.axis_y.x,
            self.axis_y.y,
            self.axis_y.z,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::error::SlicerError;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn v(x: f64, y: f64, z: f64) -> Vector3 {
        Vector3::new(x, y, z)
    }

    fn coronal(y: f64) -> Plane3D {
        Plane3D::new(p(0.0, y, 0.0), v(1.0, 0.0, 0.0), v(0.0, 0.0, -1.0)).unwrap()
    }

    // ── construction ──

    #[test]
    fn canonical_plane_is_axial() {
        let plane = Plane3D::default();
        assert_eq!(*plane.normal(), v(0.0, 0.0, 1.0));
        assert_eq!(*plane.origin(), p(0.0, 0.0, 0.0));
    }

    #[test]
    fn axes_and_normal_are_unit() {
        let s = std::f64::consts::FRAC_1_SQRT_2;
        let plane = Plane3D::new(p(1.0, 2.0, 3.0), v(s, s, 0.0), v(0.0, 0.0, 1.0)).unwrap();
        assert_abs_diff_eq!(plane.axis_x().norm(), 1.0, epsilon = TOLERANCE);
        assert_abs_diff_eq!(plane.axis_y().norm(), 1.0, epsilon = TOLERANCE);
        assert_abs_diff_eq!(plane.normal().norm(), 1.0, epsilon = TOLERANCE);
        assert_abs_diff_eq!(plane.axis_x().dot(plane.axis_y()), 0.0, epsilon = TOLERANCE);
        assert_abs_diff_eq!(*plane.normal(), v(s, -s, 0.0), epsilon = TOLERANCE);
    }

    #[test]
    fn non_unit_axis_is_rejected() {
        let err = Plane3D::new(p(0.0, 0.0, 0.0), v(2.0, 0.0, 0.0), v(0.0, 1.0, 0.0));
        assert!(matches!(
            err,
            Err(SlicerError::Geometry(GeometryError::NotUnitVector { axis: "axis_x", .. }))
        ));
    }

    #[test]
    fn non_orthogonal_axes_are_rejected() {
        let s = std::f64::consts::FRAC_1_SQRT_2;
        let err = Plane3D::new(p(0.0, 0.0, 0.0), v(1.0, 0.0, 0.0), v(s, s, 0.0));
        assert!(matches!(
            err,
            Err(SlicerError::Geometry(GeometryError::NotOrthonormal { .. }))
        ));
    }

    #[test]
    fn from_dicom_tags() {
        let plane =
            Plane3D::from_dicom(&[-250.0, -250.0, 12.5], &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0]).unwrap();
        assert_eq!(*plane.origin(), p(-250.0, -250.0, 12.5));
        assert_eq!(*plane.normal(), v(0.0, 0.0, 1.0));
    }

    #[test]
    fn from_dicom_wrong_arity() {
        assert!(matches!(
            Plane3D::from_dicom(&[0.0, 0.0], &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0]),
            Err(SlicerError::Format(FormatError::BadVectorSize { expected: 3, found: 2, .. }))
        ));
        assert!(matches!(
            Plane3D::from_dicom(&[0.0, 0.0, 0.0], &[1.0, 0.0, 0.0]),
            Err(SlicerError::Format(FormatError::BadVectorSize { expected: 6, found: 3, .. }))
        ));
    }

    // ── projection ──

    #[test]
    fn project_drops_normal_component() {
        let plane = coronal(10.0);
        let (x, y) = plane.project(&p(3.0, 42.0, -7.0));
        assert_abs_diff_eq!(x, 3.0);
        assert_abs_diff_eq!(y, 7.0);
    }

    #[test]
    fn map_then_project_round_trip() {
        let plane = coronal(-4.0);
        let world = plane.map_to_world(1.5, -2.5);
        let q = plane.project_point(&world);
        assert_abs_diff_eq!(q, Point2::new(1.5, -2.5), epsilon = 1e-12);
    }

    #[test]
    fn project_along_normal_is_signed() {
        let plane = coronal(0.0);
        // normal = (1,0,0) x (0,0,-1) = (0,1,0)
        assert_abs_diff_eq!(plane.project_along_normal(&p(5.0, -3.0, 2.0)), -3.0);
    }

    // ── intersections ──

    #[test]
    fn segment_crossing_plane() {
        let plane = Plane3D::default();
        let hit = plane
            .intersect_segment(&p(1.0, 1.0, -1.0), &p(1.0, 1.0, 3.0))
            .unwrap();
        assert_abs_diff_eq!(hit, p(1.0, 1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn segment_on_one_side() {
        let plane = Plane3D::default();
        assert!(plane.intersect_segment(&p(0.0, 0.0, 1.0), &p(0.0, 0.0, 3.0)).is_none());
        assert!(plane.intersect_segment(&p(0.0, 0.0, -1.0), &p(5.0, 0.0, -3.0)).is_none());
    }

    #[test]
    fn segment_parallel_to_plane() {
        let plane = Plane3D::default();
        assert!(plane.intersect_segment(&p(0.0, 0.0, 1.0), &p(5.0, 0.0, 1.0)).is_none());
        assert!(plane.intersect_segment(&p(0.0, 0.0, 0.0), &p(5.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn segment_touching_plane() {
        let plane = Plane3D::default();
        let hit = plane.intersect_segment(&p(2.0, 0.0, 0.0), &p(2.0, 0.0, 4.0)).unwrap();
        assert_abs_diff_eq!(hit, p(2.0, 0.0, 0.0));
    }

    #[test]
    fn line_crossing_plane() {
        let plane = coronal(5.0);
        let hit = plane
            .intersect_line(&p(1.0, 0.0, 1.0), &v(0.0, 2.0, 0.0))
            .unwrap();
        assert_abs_diff_eq!(hit, p(1.0, 5.0, 1.0), epsilon = 1e-12);
        assert!(plane.intersect_line(&p(0.0, 0.0, 0.0), &v(1.0, 0.0, 0.0)).is_none());
    }

    // ── plane pairs ──

    #[test]
    fn distance_between_parallel_planes() {
        assert_abs_diff_eq!(coronal(2.0).distance_to(&coronal(-3.0)).unwrap(), 5.0);
        assert!(coronal(0.0).distance_to(&Plane3D::default()).is_none());
    }

    #[test]
    fn normalized_plane_maps_world_origin_to_zero() {
        let plane = Plane3D::new(p(10.0, 20.0, 30.0), v(1.0, 0.0, 0.0), v(0.0, 1.0, 0.0)).unwrap();
        let normalized = plane.normalized();
        let (x, y) = normalized.project(&Point3::origin());
        assert_abs_diff_eq!(x, 0.0);
        assert_abs_diff_eq!(y, 0.0);
        assert_abs_diff_eq!(*normalized.origin(), p(0.0, 0.0, 30.0));
        assert_eq!(normalized.normal(), plane.normal());
    }
}
