use tracing::debug;

use crate::error::Result;
use crate::geometry::Plane3D;
use crate::math::{are_parallel_or_opposite, Point2};
use crate::structure::{Color, StructureSet};
use crate::union::RectangleUnion;

/// Relative orientation of a cutting plane and the slices of a structure set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionRegime {
    /// The slices are parallel to the cutting plane.
    Axial,
    /// The slice normal is along the X axis of the cutting plane.
    Sagittal,
    /// The slice normal is along the Y axis of the cutting plane.
    Coronal,
}

/// Contours of one structure, tagged with its display color.
#[derive(Debug, Clone, PartialEq)]
pub struct ColoredChains {
    pub color: Color,
    pub chains: Vec<Vec<Point2>>,
}

/// Projects the structures of a set onto cutting planes.
///
/// Every chain is returned in the 2D frame of the cutting plane, with its
/// first point repeated at the end.
#[derive(Debug, Clone, Copy)]
pub struct StructureSlicer<'a> {
    set: &'a StructureSet,
}

impl<'a> StructureSlicer<'a> {
    #[must_use]
    pub fn new(set: &'a StructureSet) -> Self {
        Self { set }
    }

    /// Classifies `cutting` against the normal of the set.
    ///
    /// Returns `None` if the cutting plane is skew to the slices.
    #[must_use]
    pub fn regime(&self, cutting: &Plane3D) -> Option<ProjectionRegime> {
        let normal = self.set.normal();

        if are_parallel_or_opposite(&normal, cutting.normal()).is_some() {
            Some(ProjectionRegime::Axial)
        } else if are_parallel_or_opposite(&normal, cutting.axis_x()).is_some() {
            Some(ProjectionRegime::Sagittal)
        } else if are_parallel_or_opposite(&normal, cutting.axis_y()).is_some() {
            Some(ProjectionRegime::Coronal)
        } else {
            None
        }
    }

    /// Cross-section of one structure by `cutting`.
    ///
    /// In the axial regime, each polygon lying on the cutting plane gives one
    /// chain, in storage order. Otherwise the slabs of all polygons are cut
    /// into rectangles whose union gives the contours, outer boundaries and
    /// holes alike.
    ///
    /// Returns `Ok(None)` if the cutting plane is skew to the slices, and an
    /// empty list if it misses the structure.
    ///
    /// # Errors
    ///
    /// Returns `RangeError::IndexOutOfBounds` for an unknown structure, or a
    /// `ConsistencyError` if the rectangle union fails.
    pub fn project(&self, index: usize, cutting: &Plane3D) -> Result<Option<Vec<Vec<Point2>>>> {
        let structure = self.set.structure(index)?;
        let cutting = cutting.normalized();

        let Some(regime) = self.regime(&cutting) else {
            return Ok(None);
        };

        let normal = self.set.estimated_normal();
        let spacing = self.set.estimated_spacing();

        let chains = match regime {
            ProjectionRegime::Axial => structure
                .polygons()
                .iter()
                .filter(|polygon| polygon.points().len() >= 3)
                .filter(|polygon| polygon.is_on_slice(&cutting, normal, spacing))
                .map(|polygon| {
                    let mut chain: Vec<Point2> = polygon
                        .points()
                        .iter()
                        .map(|point| cutting.project_point(point))
                        .collect();
                    chain.push(chain[0]);
                    chain
                })
                .collect(),
            ProjectionRegime::Sagittal | ProjectionRegime::Coronal => {
                let rectangles = structure
                    .polygons()
                    .iter()
                    .flat_map(|polygon| polygon.slab_rectangles(&cutting, normal, spacing))
                    .collect();
                RectangleUnion::new(rectangles).execute()?
            }
        };

        debug!(
            structure = structure.name(),
            ?regime,
            chains = chains.len(),
            "projected structure"
        );

        Ok(Some(chains))
    }

    /// Same as [`project`](Self::project), with the structure color attached.
    ///
    /// # Errors
    ///
    /// See [`project`](Self::project).
    pub fn project_colored(&self, index: usize, cutting: &Plane3D) -> Result<Option<ColoredChains>> {
        let color = self.set.structure_color(index)?;
        Ok(self
            .project(index, cutting)?
            .map(|chains| ColoredChains { color, chains }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::{RangeError, SlicerError};
    use crate::math::{Point3, Vector3};
    use crate::structure::{ContourDescription, RoiDescription};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn v(x: f64, y: f64, z: f64) -> Vector3 {
        Vector3::new(x, y, z)
    }

    fn pts(coords: &[(f64, f64)]) -> Vec<Point2> {
        coords.iter().map(|&(x, y)| Point2::new(x, y)).collect()
    }

    fn axial(z: f64) -> Plane3D {
        Plane3D::new(p(0.0, 0.0, z), v(1.0, 0.0, 0.0), v(0.0, 1.0, 0.0)).unwrap()
    }

    fn coronal(y: f64) -> Plane3D {
        Plane3D::new(p(0.0, y, 0.0), v(1.0, 0.0, 0.0), v(0.0, 0.0, -1.0)).unwrap()
    }

    fn sagittal(x: f64) -> Plane3D {
        Plane3D::new(p(x, 0.0, 0.0), v(0.0, 0.0, 1.0), v(0.0, 1.0, 0.0)).unwrap()
    }

    fn square(slice_id: &str, z: f64) -> ContourDescription {
        ContourDescription {
            geometric_type: "CLOSED_PLANAR".to_owned(),
            referenced_slice_id: slice_id.to_owned(),
            point_count: 4,
            data: vec![
                0.0, 0.0, z, 10.0, 0.0, z, 10.0, 10.0, z, 0.0, 10.0, z,
            ],
        }
    }

    fn stack() -> StructureSet {
        StructureSet::from_rois(&[RoiDescription {
            name: Some("Body".to_owned()),
            display_color: Some(vec![0.0, 0.0, 255.0]),
            contours: vec![square("s0", 0.0), square("s1", 2.0), square("s2", 4.0)],
            ..Default::default()
        }])
        .unwrap()
    }

    // ── regime ──

    #[test]
    fn regimes() {
        let set = stack();
        let slicer = StructureSlicer::new(&set);
        assert_eq!(slicer.regime(&axial(3.0)), Some(ProjectionRegime::Axial));
        assert_eq!(slicer.regime(&coronal(3.0)), Some(ProjectionRegime::Coronal));
        assert_eq!(slicer.regime(&sagittal(3.0)), Some(ProjectionRegime::Sagittal));

        let s = std::f64::consts::FRAC_1_SQRT_2;
        let skew = Plane3D::new(p(0.0, 0.0, 0.0), v(1.0, 0.0, 0.0), v(0.0, s, s)).unwrap();
        assert_eq!(slicer.regime(&skew), None);
        assert_eq!(slicer.project(0, &skew).unwrap(), None);
    }

    // ── axial ──

    #[test]
    fn axial_cut_reprojects_polygons() {
        let set = stack();
        let slicer = StructureSlicer::new(&set);

        let chains = slicer.project(0, &axial(2.0)).unwrap().unwrap();
        assert_eq!(
            chains,
            vec![pts(&[
                (0.0, 0.0),
                (10.0, 0.0),
                (10.0, 10.0),
                (0.0, 10.0),
                (0.0, 0.0),
            ])]
        );

        assert_eq!(slicer.project(0, &axial(2.5)).unwrap().unwrap().len(), 1);
        assert!(slicer.project(0, &axial(3.0)).unwrap().unwrap().is_empty());
        assert!(slicer.project(0, &axial(-5.0)).unwrap().unwrap().is_empty());
    }

    #[test]
    fn axial_cut_uses_bound_slices() {
        let mut set = stack();
        for (id, z) in [("s0", 0.0), ("s1", 2.0), ("s2", 4.0)] {
            set.add_referenced_slice(id, "series", axial(z), 0.5).unwrap();
        }
        let slicer = StructureSlicer::new(&set);

        assert_eq!(slicer.project(0, &axial(4.2)).unwrap().unwrap().len(), 1);
        assert!(slicer.project(0, &axial(3.5)).unwrap().unwrap().is_empty());
    }

    #[test]
    fn axial_cut_keeps_storage_order() {
        let set = StructureSet::from_rois(&[RoiDescription {
            contours: vec![
                ContourDescription {
                    point_count: 3,
                    data: vec![20.0, 0.0, 0.0, 30.0, 0.0, 0.0, 30.0, 10.0, 0.0],
                    ..square("s0", 0.0)
                },
                square("s0", 0.0),
            ],
            ..Default::default()
        }])
        .unwrap();
        let chains = StructureSlicer::new(&set)
            .project(0, &axial(0.0))
            .unwrap()
            .unwrap();
        assert_eq!(chains.len(), 2);
        assert_eq!(chains[0].len(), 4);
        assert_eq!(chains[0][0], Point2::new(20.0, 0.0));
        assert_eq!(chains[1].len(), 5);
    }

    // ── oblique ──

    #[test]
    fn coronal_cut_merges_slabs() {
        let set = stack();
        let chains = StructureSlicer::new(&set)
            .project(0, &coronal(5.0))
            .unwrap()
            .unwrap();
        assert_eq!(
            chains,
            vec![pts(&[
                (0.0, 1.0),
                (10.0, 1.0),
                (10.0, -5.0),
                (0.0, -5.0),
                (0.0, 1.0),
            ])]
        );
    }

    #[test]
    fn sagittal_cut_merges_slabs() {
        let expected = vec![pts(&[
            (-1.0, 10.0),
            (5.0, 10.0),
            (5.0, 0.0),
            (-1.0, 0.0),
            (-1.0, 10.0),
        ])];

        let mut set = stack();
        let chains = StructureSlicer::new(&set)
            .project(0, &sagittal(5.0))
            .unwrap()
            .unwrap();
        assert_eq!(chains, expected);

        for (id, z) in [("s0", 0.0), ("s1", 2.0), ("s2", 4.0)] {
            set.add_referenced_slice(id, "series", axial(z), 2.0).unwrap();
        }
        let chains = StructureSlicer::new(&set)
            .project(0, &sagittal(5.0))
            .unwrap()
            .unwrap();
        assert_eq!(chains, expected);
    }

    #[test]
    fn sagittal_cut_with_thin_bound_slices() {
        let mut set = stack();
        for (id, z) in [("s0", 0.0), ("s1", 2.0), ("s2", 4.0)] {
            set.add_referenced_slice(id, "series", axial(z), 1.0).unwrap();
        }
        let chains = StructureSlicer::new(&set)
            .project(0, &sagittal(5.0))
            .unwrap()
            .unwrap();
        assert_eq!(chains.len(), 3);
        assert!(chains.iter().all(|chain| chain.len() == 5));
    }

    #[test]
    fn coronal_cut_outside_structure() {
        let set = stack();
        let chains = StructureSlicer::new(&set)
            .project(0, &coronal(20.0))
            .unwrap()
            .unwrap();
        assert!(chains.is_empty());
    }

    // ── errors and color ──

    #[test]
    fn unknown_structure() {
        let set = stack();
        assert!(matches!(
            StructureSlicer::new(&set).project(3, &axial(0.0)),
            Err(SlicerError::Range(RangeError::IndexOutOfBounds { index: 3, .. }))
        ));
    }

    #[test]
    fn colored_projection() {
        let set = stack();
        let colored = StructureSlicer::new(&set)
            .project_colored(0, &axial(0.0))
            .unwrap()
            .unwrap();
        assert_eq!(colored.color, Color::new(0, 0, 255));
        assert_eq!(colored.chains.len(), 1);
    }
}
