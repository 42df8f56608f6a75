use std::collections::BTreeMap;

use tracing::warn;

use crate::geometry::{Extent2D, Plane3D};
use crate::math::{are_parallel_or_opposite, is_close_to_zero, is_near, Point3, Vector3, TOLERANCE};

use super::ReferencedSlice;

/// Geometry state of a polygon.
///
/// A polygon starts `Unbound` and becomes `Bound` once the geometry of its
/// referenced slice is known. The transition never reverts.
#[derive(Debug, Clone, PartialEq)]
pub enum SliceBinding {
    Unbound,
    Bound {
        plane: Plane3D,
        thickness: f64,
        /// `plane.origin · plane.normal`, cached for the slice test.
        projection_along_normal: f64,
    },
}

/// One closed planar contour of a structure, attached to an image slice.
#[derive(Debug, Clone)]
pub struct StructurePolygon {
    slice_id: String,
    points: Vec<Point3>,
    binding: SliceBinding,
    extent: Extent2D,
    extent_is_complete: bool,
}

/// Half-thickness of a slab, never below [`TOLERANCE`] so that zero-thickness
/// slices still match their own plane.
pub(crate) fn slab_tolerance(thickness: f64) -> f64 {
    (thickness / 2.0).max(TOLERANCE)
}

impl StructurePolygon {
    #[must_use]
    pub fn new(slice_id: impl Into<String>, points: Vec<Point3>) -> Self {
        Self {
            slice_id: slice_id.into(),
            points,
            binding: SliceBinding::Unbound,
            extent: Extent2D::default(),
            extent_is_complete: false,
        }
    }

    /// Identifier of the referenced image slice.
    #[must_use]
    pub fn slice_id(&self) -> &str {
        &self.slice_id
    }

    #[must_use]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    #[must_use]
    pub fn binding(&self) -> &SliceBinding {
        &self.binding
    }

    #[must_use]
    pub fn is_bound(&self) -> bool {
        matches!(self.binding, SliceBinding::Bound { .. })
    }

    /// Plane of the referenced slice, once bound.
    #[must_use]
    pub fn plane(&self) -> Option<&Plane3D> {
        match &self.binding {
            SliceBinding::Bound { plane, .. } => Some(plane),
            SliceBinding::Unbound => None,
        }
    }

    /// Thickness of the referenced slice, once bound.
    #[must_use]
    pub fn thickness(&self) -> Option<f64> {
        match self.binding {
            SliceBinding::Bound { thickness, .. } => Some(thickness),
            SliceBinding::Unbound => None,
        }
    }

    /// 2D extent of the points in the frame of the bound slice.
    ///
    /// Only points lying within the slab of the slice are counted. Empty
    /// while unbound.
    #[must_use]
    pub fn extent(&self) -> &Extent2D {
        &self.extent
    }

    /// Binds the polygon to its referenced slice if that slice is known.
    ///
    /// Returns `true` if the polygon is bound after the call.
    pub fn update_referenced_slice(&mut self, slices: &BTreeMap<String, ReferencedSlice>) -> bool {
        if self.is_bound() {
            return true;
        }

        let Some(slice) = slices.get(&self.slice_id) else {
            return false;
        };

        let plane = slice.plane().clone();
        let thickness = slice.thickness();
        let projection_along_normal = plane.project_along_normal(plane.origin());
        let tolerance = slab_tolerance(thickness);

        let mut extent = Extent2D::default();
        let mut off_slice = 0;
        for point in &self.points {
            if is_near(
                plane.project_along_normal(point),
                projection_along_normal,
                tolerance,
            ) {
                let (x, y) = plane.project(point);
                extent.add_point(x, y);
            } else {
                off_slice += 1;
            }
        }

        if off_slice > 0 {
            warn!(
                slice = %self.slice_id,
                off_slice,
                tolerance,
                "contour has points outside the slab of its slice"
            );
        }

        self.extent = extent;
        self.extent_is_complete = off_slice == 0;
        self.binding = SliceBinding::Bound {
            plane,
            thickness,
            projection_along_normal,
        };
        true
    }

    /// Tests whether the polygon lies within the slab of `cutting`.
    ///
    /// A bound polygon uses the exact plane and thickness of its slice. An
    /// unbound one falls back to the estimated normal and spacing of the set,
    /// measured from its first point.
    #[must_use]
    pub fn is_on_slice(
        &self,
        cutting: &Plane3D,
        estimated_normal: &Vector3,
        estimated_spacing: f64,
    ) -> bool {
        let Some(first) = self.points.first() else {
            return false;
        };

        match &self.binding {
            SliceBinding::Bound {
                plane,
                thickness,
                projection_along_normal,
            } => {
                if are_parallel_or_opposite(cutting.normal(), plane.normal()).is_none() {
                    return false;
                }
                let d = plane.project_along_normal(cutting.origin());
                is_near(d, *projection_along_normal, slab_tolerance(*thickness))
            }
            SliceBinding::Unbound => {
                if are_parallel_or_opposite(cutting.normal(), estimated_normal).is_none() {
                    return false;
                }
                let d1 = cutting.origin().coords.dot(estimated_normal);
                let d2 = first.coords.dot(estimated_normal);
                is_near(d1, d2, slab_tolerance(estimated_spacing))
            }
        }
    }

    /// Cross-sections of the polygon slab by a cutting plane orthogonal to it.
    ///
    /// The cutting plane meets the plane of the polygon along a line. Every
    /// pair of successive crossings of that line with the polygon boundary
    /// gives one segment, which is thickened by half the slab thickness on
    /// each side and returned as a rectangle in the frame of `cutting`.
    /// Concave polygons may therefore produce several rectangles.
    ///
    /// Returns nothing if the cutting plane is not orthogonal to the polygon.
    #[must_use]
    pub fn slab_rectangles(
        &self,
        cutting: &Plane3D,
        estimated_normal: &Vector3,
        estimated_spacing: f64,
    ) -> Vec<Extent2D> {
        if self.points.len() < 3 {
            return Vec::new();
        }

        let (origin, normal, thickness) = match &self.binding {
            SliceBinding::Bound {
                plane, thickness, ..
            } => (*plane.origin(), *plane.normal(), *thickness),
            SliceBinding::Unbound => (self.points[0], *estimated_normal, estimated_spacing),
        };

        let cutting_normal = cutting.normal();
        let alignment = cutting_normal.dot(&normal);
        if !is_close_to_zero(alignment) {
            return Vec::new();
        }

        if self.cutting_line_misses_extent(cutting) {
            return Vec::new();
        }

        // Local frame of the polygon plane with the Y axis across the
        // cutting line, so that the line is `y = y0`.
        let Some(axis_y) = (cutting_normal - normal * alignment).try_normalize(TOLERANCE) else {
            return Vec::new();
        };
        let axis_x = axis_y.cross(&normal);
        let local = |p: &Point3| {
            let d = p - origin;
            (axis_x.dot(&d), axis_y.dot(&d))
        };

        let (_, y0) = local(cutting.origin());

        let mut crossings = Vec::new();
        let mut previous = local(&self.points[self.points.len() - 1]);
        for point in &self.points {
            let current = local(point);
            let (x1, y1) = previous;
            let (x2, y2) = current;
            // Half-open rule: a vertex on the line counts for one edge only.
            if (y1 <= y0 && y0 < y2) || (y2 <= y0 && y0 < y1) {
                crossings.push(x1 + (y0 - y1) * (x2 - x1) / (y2 - y1));
            }
            previous = current;
        }

        crossings.sort_by(f64::total_cmp);

        let half = normal * (thickness / 2.0);
        let on_line = |x: f64| origin + axis_x * x + axis_y * y0;

        crossings
            .chunks_exact(2)
            .map(|pair| {
                let a = on_line(pair[0]) + half;
                let b = on_line(pair[1]) - half;
                Extent2D::from_corners(&cutting.project_point(&a), &cutting.project_point(&b))
            })
            .collect()
    }

    /// Tests whether `cutting` passes clear of the extent of a bound polygon.
    ///
    /// Always `false` for unbound polygons, and for bound ones with points
    /// outside their slab, whose extent does not cover every point.
    fn cutting_line_misses_extent(&self, cutting: &Plane3D) -> bool {
        let SliceBinding::Bound { plane, .. } = &self.binding else {
            return false;
        };
        if !self.extent_is_complete || self.extent.is_empty() {
            return false;
        }

        // Signed offset from `cutting` of the point (x, y) of the slice frame.
        let n = cutting.normal();
        let (a, b) = (n.dot(plane.axis_x()), n.dot(plane.axis_y()));
        let c = n.dot(&(plane.origin() - cutting.origin()));
        let e = &self.extent;
        let offsets = [
            (e.x1(), e.y1()),
            (e.x1(), e.y2()),
            (e.x2(), e.y1()),
            (e.x2(), e.y2()),
        ]
        .map(|(x, y)| a * x + b * y + c);

        offsets.iter().all(|&o| o > TOLERANCE) || offsets.iter().all(|&o| o < -TOLERANCE)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn v(x: f64, y: f64, z: f64) -> Vector3 {
        Vector3::new(x, y, z)
    }

    fn axial(z: f64) -> Plane3D {
        Plane3D::new(p(0.0, 0.0, z), v(1.0, 0.0, 0.0), v(0.0, 1.0, 0.0)).unwrap()
    }

    fn coronal(y: f64) -> Plane3D {
        Plane3D::new(p(0.0, y, 0.0), v(1.0, 0.0, 0.0), v(0.0, 0.0, -1.0)).unwrap()
    }

    fn square(z: f64) -> Vec<Point3> {
        vec![
            p(0.0, 0.0, z),
            p(10.0, 0.0, z),
            p(10.0, 10.0, z),
            p(0.0, 10.0, z),
        ]
    }

    fn slices(id: &str, z: f64, thickness: f64) -> BTreeMap<String, ReferencedSlice> {
        let mut map = BTreeMap::new();
        map.insert(id.to_owned(), ReferencedSlice::new("series", axial(z), thickness));
        map
    }

    fn z_axis() -> Vector3 {
        v(0.0, 0.0, 1.0)
    }

    // ── binding ──

    #[test]
    fn binding_requires_known_slice() {
        let mut polygon = StructurePolygon::new("a", square(2.0));
        assert!(!polygon.update_referenced_slice(&slices("b", 2.0, 1.0)));
        assert!(!polygon.is_bound());
        assert!(polygon.plane().is_none());

        assert!(polygon.update_referenced_slice(&slices("a", 2.0, 1.0)));
        assert!(polygon.is_bound());
        assert_eq!(polygon.thickness(), Some(1.0));
        assert_eq!(*polygon.extent(), Extent2D::new(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn binding_never_reverts() {
        let mut polygon = StructurePolygon::new("a", square(2.0));
        polygon.update_referenced_slice(&slices("a", 2.0, 1.0));
        assert!(polygon.update_referenced_slice(&BTreeMap::new()));
        assert_eq!(polygon.thickness(), Some(1.0));
    }

    #[test]
    fn off_slice_points_are_left_out_of_extent() {
        let mut points = square(2.0);
        points.push(p(50.0, 50.0, 9.0));
        let mut polygon = StructurePolygon::new("a", points);
        polygon.update_referenced_slice(&slices("a", 2.0, 1.0));
        assert_eq!(*polygon.extent(), Extent2D::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(polygon.points().len(), 5);
    }

    // ── slice test ──

    #[test]
    fn bound_polygon_matches_within_half_thickness() {
        let mut polygon = StructurePolygon::new("a", square(2.0));
        polygon.update_referenced_slice(&slices("a", 2.0, 2.0));
        let normal = z_axis();
        assert!(polygon.is_on_slice(&axial(2.0), &normal, 5.0));
        assert!(polygon.is_on_slice(&axial(2.9), &normal, 5.0));
        assert!(!polygon.is_on_slice(&axial(3.1), &normal, 5.0));
        assert!(!polygon.is_on_slice(&coronal(2.0), &normal, 5.0));
    }

    #[test]
    fn opposite_cutting_plane_still_matches() {
        let mut polygon = StructurePolygon::new("a", square(2.0));
        polygon.update_referenced_slice(&slices("a", 2.0, 2.0));
        let flipped =
            Plane3D::new(p(0.0, 0.0, 2.0), v(0.0, 1.0, 0.0), v(1.0, 0.0, 0.0)).unwrap();
        assert!(polygon.is_on_slice(&flipped, &z_axis(), 1.0));
    }

    #[test]
    fn unbound_polygon_uses_estimates() {
        let polygon = StructurePolygon::new("a", square(4.0));
        assert!(polygon.is_on_slice(&axial(4.0), &z_axis(), 3.0));
        assert!(polygon.is_on_slice(&axial(5.4), &z_axis(), 3.0));
        assert!(!polygon.is_on_slice(&axial(5.6), &z_axis(), 3.0));
        assert!(!polygon.is_on_slice(&axial(4.0), &v(1.0, 0.0, 0.0), 3.0));
    }

    #[test]
    fn empty_polygon_is_never_on_slice() {
        let polygon = StructurePolygon::new("a", Vec::new());
        assert!(!polygon.is_on_slice(&axial(0.0), &z_axis(), 1.0));
    }

    #[test]
    fn zero_thickness_matches_own_plane() {
        let mut polygon = StructurePolygon::new("a", square(2.0));
        polygon.update_referenced_slice(&slices("a", 2.0, 0.0));
        assert!(polygon.is_on_slice(&axial(2.0), &z_axis(), 1.0));
        assert!(!polygon.is_on_slice(&axial(2.1), &z_axis(), 1.0));
    }

    // ── slabs ──

    #[test]
    fn square_slab_through_coronal_plane() {
        let mut polygon = StructurePolygon::new("a", square(0.0));
        polygon.update_referenced_slice(&slices("a", 0.0, 2.0));
        let rects = polygon.slab_rectangles(&coronal(5.0).normalized(), &z_axis(), 1.0);
        assert_eq!(rects.len(), 1);
        let r = rects[0];
        assert_abs_diff_eq!(r.x1(), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(r.x2(), 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(r.y1(), -1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(r.y2(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn cutting_line_outside_polygon() {
        let mut polygon = StructurePolygon::new("a", square(0.0));
        polygon.update_referenced_slice(&slices("a", 0.0, 2.0));
        assert!(polygon
            .slab_rectangles(&coronal(15.0), &z_axis(), 1.0)
            .is_empty());
    }

    #[test]
    fn extent_rejects_distant_cutting_planes() {
        let mut polygon = StructurePolygon::new("a", square(2.0));
        assert!(!polygon.cutting_line_misses_extent(&coronal(20.0)));

        polygon.update_referenced_slice(&slices("a", 2.0, 1.0));
        assert!(polygon.cutting_line_misses_extent(&coronal(20.0)));
        assert!(polygon.cutting_line_misses_extent(&coronal(-0.5)));
        assert!(!polygon.cutting_line_misses_extent(&coronal(5.0)));
        assert!(!polygon.cutting_line_misses_extent(&coronal(10.0)));
        assert!(polygon.slab_rectangles(&coronal(20.0), &z_axis(), 1.0).is_empty());
        assert_eq!(polygon.slab_rectangles(&coronal(5.0), &z_axis(), 1.0).len(), 1);
    }

    #[test]
    fn off_slice_points_keep_their_slabs() {
        let mut points = square(2.0);
        points.push(p(50.0, 50.0, 9.0));
        let mut polygon = StructurePolygon::new("a", points);
        polygon.update_referenced_slice(&slices("a", 2.0, 1.0));

        assert!(!polygon.cutting_line_misses_extent(&coronal(30.0)));
        let slabs = polygon.slab_rectangles(&coronal(30.0), &z_axis(), 1.0);
        assert_eq!(slabs.len(), 1);
        assert_abs_diff_eq!(slabs[0].x1(), 25.0, epsilon = 1e-9);
        assert_abs_diff_eq!(slabs[0].x2(), 30.0, epsilon = 1e-9);
    }

    #[test]
    fn concave_polygon_gives_two_slabs() {
        // A "U" shape open toward +y.
        let points = vec![
            p(0.0, 0.0, 0.0),
            p(9.0, 0.0, 0.0),
            p(9.0, 9.0, 0.0),
            p(6.0, 9.0, 0.0),
            p(6.0, 3.0, 0.0),
            p(3.0, 3.0, 0.0),
            p(3.0, 9.0, 0.0),
            p(0.0, 9.0, 0.0),
        ];
        let mut polygon = StructurePolygon::new("a", points);
        polygon.update_referenced_slice(&slices("a", 0.0, 1.0));
        let rects = polygon.slab_rectangles(&coronal(6.0), &z_axis(), 1.0);
        assert_eq!(rects.len(), 2);
        assert_abs_diff_eq!(rects[0].x1(), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rects[0].x2(), 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rects[1].x1(), 6.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rects[1].x2(), 9.0, epsilon = 1e-9);
    }

    #[test]
    fn unbound_slab_uses_estimated_spacing() {
        let polygon = StructurePolygon::new("a", square(3.0));
        let rects = polygon.slab_rectangles(&coronal(5.0), &z_axis(), 4.0);
        assert_eq!(rects.len(), 1);
        assert_abs_diff_eq!(rects[0].height(), 4.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rects[0].width(), 10.0, epsilon = 1e-9);
    }

    #[test]
    fn parallel_cutting_plane_gives_no_slab() {
        let polygon = StructurePolygon::new("a", square(0.0));
        assert!(polygon
            .slab_rectangles(&axial(0.0), &z_axis(), 1.0)
            .is_empty());
    }
}
