use std::collections::{BTreeMap, BTreeSet};

use tracing::{error, info, warn};

use crate::error::{FormatError, PreconditionError, RangeError, Result, SlicerError};
use crate::geometry::Plane3D;
use crate::math::{is_parallel, Point3, Vector3};

use super::estimate::{estimate_geometry, GeometryEstimate};
use super::load::{ReferencedSliceTags, RoiDescription, CLOSED_PLANAR};
use super::{Color, EstimationParams, ReferencedSlice, Structure};

/// A contour rejected while loading a structure set.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadIssue {
    /// Index of the structure the contour belongs to.
    pub structure: usize,
    /// Index of the contour within its region of interest.
    pub contour: usize,
    pub error: FormatError,
}

/// A set of structures together with the geometry of the slices they
/// reference.
///
/// Slice geometry may arrive before or after the contours. Polygons bind to
/// their slice as soon as both are known; until then, slice tests use the
/// estimated normal and spacing of the whole set.
#[derive(Debug, Clone)]
pub struct StructureSet {
    structures: Vec<Structure>,
    names: BTreeMap<String, usize>,
    referenced_slices: BTreeMap<String, ReferencedSlice>,
    estimate: GeometryEstimate,
    params: EstimationParams,
    load_issues: Vec<LoadIssue>,
}

impl Default for StructureSet {
    fn default() -> Self {
        Self::new()
    }
}

impl StructureSet {
    /// Creates an empty set with default estimation parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::with_params(EstimationParams::default())
    }

    #[must_use]
    pub fn with_params(params: EstimationParams) -> Self {
        Self {
            structures: Vec::new(),
            names: BTreeMap::new(),
            referenced_slices: BTreeMap::new(),
            estimate: GeometryEstimate::axial(params.default_spacing),
            params,
            load_issues: Vec::new(),
        }
    }

    /// Creates a set from region of interest descriptions.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub fn from_rois(rois: &[RoiDescription]) -> Result<Self> {
        let mut set = Self::new();
        set.load(rois)?;
        Ok(set)
    }

    /// Replaces the structures of the set.
    ///
    /// Loading is permissive: contours of another geometric type than
    /// [`CLOSED_PLANAR`] are skipped, and malformed contours are skipped and
    /// recorded in [`load_issues`](Self::load_issues). Polygons whose slice is
    /// already known are bound immediately. The fallback geometry is
    /// re-estimated at the end.
    ///
    /// The set is left untouched if loading fails.
    ///
    /// # Errors
    ///
    /// Returns an error only if the geometry estimation fails.
    pub fn load(&mut self, rois: &[RoiDescription]) -> Result<()> {
        let mut structures = Vec::with_capacity(rois.len());
        let mut names = BTreeMap::new();
        let mut load_issues = Vec::new();

        for (index, roi) in rois.iter().enumerate() {
            let mut structure = Structure::new(
                roi.resolved_name(),
                roi.resolved_interpretation(),
                roi.resolved_color(),
            );

            for (contour_index, contour) in roi.contours.iter().enumerate() {
                if contour.geometric_type != CLOSED_PLANAR {
                    warn!(
                        structure = structure.name(),
                        geometric_type = %contour.geometric_type,
                        "ignoring contour with unsupported geometric type"
                    );
                    continue;
                }

                let mut polygon = match contour.to_polygon() {
                    Ok(polygon) => polygon,
                    Err(SlicerError::Format(issue)) => {
                        warn!(
                            structure = structure.name(),
                            contour = contour_index,
                            %issue,
                            "skipping malformed contour"
                        );
                        load_issues.push(LoadIssue {
                            structure: index,
                            contour: contour_index,
                            error: issue,
                        });
                        continue;
                    }
                    Err(other) => return Err(other),
                };

                if polygon.slice_id().trim().is_empty() {
                    warn!(
                        structure = structure.name(),
                        contour = contour_index,
                        "contour references an empty slice id"
                    );
                }

                polygon.update_referenced_slice(&self.referenced_slices);
                structure.add_polygon(polygon);
            }

            info!(
                name = structure.name(),
                interpretation = structure.interpretation(),
                contours = structure.polygons().len(),
                color = %structure.color(),
                "loaded structure"
            );

            names.entry(structure.name().to_owned()).or_insert(index);
            structures.push(structure);
        }

        self.estimate = estimate_geometry(&structures, &self.params)?;
        self.structures = structures;
        self.names = names;
        self.load_issues = load_issues;
        Ok(())
    }

    /// Recomputes the fallback normal and spacing from the loaded polygons.
    ///
    /// # Errors
    ///
    /// Returns an error if the estimation parameters describe an empty
    /// histogram.
    pub fn estimate_geometry(&mut self) -> Result<()> {
        self.estimate = estimate_geometry(&self.structures, &self.params)?;
        Ok(())
    }

    #[must_use]
    pub fn params(&self) -> &EstimationParams {
        &self.params
    }

    /// Contours skipped by the last [`load`](Self::load).
    #[must_use]
    pub fn load_issues(&self) -> &[LoadIssue] {
        &self.load_issues
    }

    // ── structures ──

    #[must_use]
    pub fn structures_count(&self) -> usize {
        self.structures.len()
    }

    /// # Errors
    ///
    /// Returns `RangeError::IndexOutOfBounds` for an unknown structure.
    pub fn structure(&self, index: usize) -> Result<&Structure> {
        self.structures.get(index).ok_or_else(|| {
            RangeError::IndexOutOfBounds {
                index,
                size: self.structures.len(),
            }
            .into()
        })
    }

    /// # Errors
    ///
    /// Returns `RangeError::IndexOutOfBounds` for an unknown structure.
    pub fn structure_name(&self, index: usize) -> Result<&str> {
        Ok(self.structure(index)?.name())
    }

    /// # Errors
    ///
    /// Returns `RangeError::IndexOutOfBounds` for an unknown structure.
    pub fn structure_interpretation(&self, index: usize) -> Result<&str> {
        Ok(self.structure(index)?.interpretation())
    }

    /// # Errors
    ///
    /// Returns `RangeError::IndexOutOfBounds` for an unknown structure.
    pub fn structure_color(&self, index: usize) -> Result<Color> {
        Ok(self.structure(index)?.color())
    }

    /// Mean of the first point of every polygon of the structure.
    ///
    /// # Errors
    ///
    /// Returns `RangeError::IndexOutOfBounds` for an unknown structure.
    pub fn structure_center(&self, index: usize) -> Result<Point3> {
        Ok(self.structure(index)?.center())
    }

    /// Index of the first structure called `name`.
    #[must_use]
    pub fn lookup_structure_name(&self, name: &str) -> Option<usize> {
        self.names.get(name).copied()
    }

    /// Identifiers of every slice referenced by a polygon.
    #[must_use]
    pub fn referenced_instances(&self) -> BTreeSet<String> {
        self.structures
            .iter()
            .flat_map(Structure::polygons)
            .map(|polygon| polygon.slice_id().to_owned())
            .collect()
    }

    /// Point lists of the polygons of a structure drawn on one slice.
    ///
    /// # Errors
    ///
    /// Returns `RangeError::IndexOutOfBounds` for an unknown structure.
    pub fn structure_points(&self, index: usize, slice_id: &str) -> Result<Vec<Vec<Point3>>> {
        Ok(self
            .structure(index)?
            .polygons()
            .iter()
            .filter(|polygon| polygon.slice_id() == slice_id)
            .map(|polygon| polygon.points().to_vec())
            .collect())
    }

    // ── geometry ──

    /// Normal of the slices of the set.
    ///
    /// The normal of the first referenced slice if any is known, otherwise
    /// the estimated normal.
    #[must_use]
    pub fn normal(&self) -> Vector3 {
        self.referenced_slices
            .values()
            .next()
            .map_or(self.estimate.normal, |slice| *slice.plane().normal())
    }

    #[must_use]
    pub fn estimated_normal(&self) -> &Vector3 {
        &self.estimate.normal
    }

    #[must_use]
    pub fn estimated_spacing(&self) -> f64 {
        self.estimate.spacing
    }

    #[must_use]
    pub fn referenced_slice(&self, slice_id: &str) -> Option<&ReferencedSlice> {
        self.referenced_slices.get(slice_id)
    }

    #[must_use]
    pub fn referenced_slices_count(&self) -> usize {
        self.referenced_slices.len()
    }

    /// Registers the geometry of a referenced slice and binds the polygons
    /// drawn on it.
    ///
    /// # Errors
    ///
    /// - `PreconditionError::DuplicateSlice` if the slice is already known.
    /// - `RangeError::NegativeThickness` if `thickness < 0`.
    /// - `FormatError::MixedSeries` if the slice belongs to another series
    ///   than the slices already known.
    /// - `FormatError::NonParallelSlices` if its normal is not parallel to
    ///   theirs. Opposite normals are rejected too.
    pub fn add_referenced_slice(
        &mut self,
        slice_id: &str,
        series_id: &str,
        plane: Plane3D,
        thickness: f64,
    ) -> Result<()> {
        if self.referenced_slices.contains_key(slice_id) {
            error!(slice = slice_id, "geometry of this slice is already known");
            return Err(PreconditionError::DuplicateSlice(slice_id.to_owned()).into());
        }

        if thickness.is_nan() || thickness < 0.0 {
            error!(slice = slice_id, thickness, "negative slice thickness");
            return Err(RangeError::NegativeThickness(thickness).into());
        }

        if let Some(reference) = self.referenced_slices.values().next() {
            if reference.series_id() != series_id {
                error!(
                    slice = slice_id,
                    expected = reference.series_id(),
                    found = series_id,
                    "structure set refers to several series"
                );
                return Err(FormatError::MixedSeries {
                    expected: reference.series_id().to_owned(),
                    found: series_id.to_owned(),
                }
                .into());
            }

            if !is_parallel(reference.plane().normal(), plane.normal()) {
                error!(slice = slice_id, "referenced slices are not parallel");
                return Err(FormatError::NonParallelSlices(slice_id.to_owned()).into());
            }
        }

        self.referenced_slices.insert(
            slice_id.to_owned(),
            ReferencedSlice::new(series_id, plane, thickness),
        );

        for structure in &mut self.structures {
            for polygon in structure.polygons_mut() {
                polygon.update_referenced_slice(&self.referenced_slices);
            }
        }

        Ok(())
    }

    /// Registers a referenced slice from its raw tag values.
    ///
    /// Missing position or orientation yields the canonical plane; missing
    /// or unparsable thickness yields 1 mm.
    ///
    /// # Errors
    ///
    /// `FormatError::MissingTag` if an identifier is absent, a parsing or
    /// geometry error for malformed position or orientation, and any error
    /// of [`add_referenced_slice`](Self::add_referenced_slice).
    pub fn add_referenced_slice_from_tags(&mut self, tags: &ReferencedSliceTags) -> Result<()> {
        let slice_id = tags.slice_id()?;
        let series_id = tags.series_id()?;
        let plane = tags.plane()?;
        self.add_referenced_slice(slice_id, series_id, plane, tags.thickness())
    }

    /// Binds every polygon whose slice is known and reports the others.
    ///
    /// Returns the number of polygons that remain unbound.
    pub fn check_referenced_slices(&mut self) -> usize {
        let mut unresolved = 0;

        for structure in &mut self.structures {
            for polygon in structure.polygons_mut() {
                if polygon.update_referenced_slice(&self.referenced_slices) {
                    continue;
                }

                unresolved += 1;
                if polygon.slice_id().trim().is_empty() {
                    warn!("missing geometry of referenced slice (empty slice id)");
                } else {
                    warn!(
                        slice = polygon.slice_id(),
                        "missing geometry of referenced slice"
                    );
                }
            }
        }

        unresolved
    }
}
