use crate::geometry::Plane3D;

/// Geometry of an image slice referenced by the contours of a structure set.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferencedSlice {
    series_id: String,
    plane: Plane3D,
    thickness: f64,
}

impl ReferencedSlice {
    #[must_use]
    pub fn new(series_id: impl Into<String>, plane: Plane3D, thickness: f64) -> Self {
        Self {
            series_id: series_id.into(),
            plane,
            thickness,
        }
    }

    /// Identifier of the series the slice belongs to.
    #[must_use]
    pub fn series_id(&self) -> &str {
        &self.series_id
    }

    #[must_use]
    pub fn plane(&self) -> &Plane3D {
        &self.plane
    }

    /// Slice thickness in millimeters.
    #[must_use]
    pub fn thickness(&self) -> f64 {
        self.thickness
    }
}
