use crate::error::{FormatError, Result, SlicerError};
use crate::geometry::Plane3D;
use crate::math::Point3;

use super::{Color, StructurePolygon};

/// Geometric type of the contours kept by the loader.
pub const CLOSED_PLANAR: &str = "CLOSED_PLANAR";

/// Slice thickness assumed when a slice does not declare one, in millimeters.
pub const DEFAULT_SLICE_THICKNESS: f64 = 1.0;

const DEFAULT_NAME: &str = "No name";
const DEFAULT_INTERPRETATION: &str = "No interpretation";

/// Parses a multi-valued decimal string, with values separated by `\`.
///
/// Surrounding whitespace around each value is ignored. An empty or blank
/// string yields no values.
///
/// # Errors
///
/// Returns `FormatError::InvalidNumber` if a value is not a finite decimal
/// number.
pub fn parse_decimal_string(value: &str) -> Result<Vec<f64>> {
    if value.trim().is_empty() {
        return Ok(Vec::new());
    }

    value
        .split('\\')
        .map(|item| {
            let item = item.trim();
            item.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| SlicerError::from(FormatError::InvalidNumber(item.to_owned())))
        })
        .collect()
}

/// One contour of a region of interest, as read from the source dataset.
#[derive(Debug, Clone, Default)]
pub struct ContourDescription {
    /// Contour geometric type; only [`CLOSED_PLANAR`] contours are kept.
    pub geometric_type: String,
    /// Identifier of the image slice the contour is drawn on.
    pub referenced_slice_id: String,
    /// Declared number of points.
    pub point_count: usize,
    /// Flat `x, y, z` coordinates.
    pub data: Vec<f64>,
}

impl ContourDescription {
    /// Checks the declared point count and converts the data to a polygon.
    ///
    /// # Errors
    ///
    /// Returns `FormatError::PointCountMismatch` if the data does not hold
    /// exactly three coordinates per declared point, or
    /// `FormatError::NonFiniteCoordinate` for a NaN or infinite coordinate.
    pub fn to_polygon(&self) -> Result<StructurePolygon> {
        if self.data.len() != 3 * self.point_count {
            return Err(FormatError::PointCountMismatch {
                expected: self.point_count,
                found: self.data.len(),
            }
            .into());
        }

        if let Some((index, &value)) = self.data.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(FormatError::NonFiniteCoordinate { index, value }.into());
        }

        let points = self
            .data
            .chunks_exact(3)
            .map(|c| Point3::new(c[0], c[1], c[2]))
            .collect();
        Ok(StructurePolygon::new(self.referenced_slice_id.clone(), points))
    }
}

/// One region of interest, as read from the source dataset.
#[derive(Debug, Clone, Default)]
pub struct RoiDescription {
    pub name: Option<String>,
    pub interpretation: Option<String>,
    /// Display color components, nominally three values in `[0, 255]`.
    pub display_color: Option<Vec<f64>>,
    pub contours: Vec<ContourDescription>,
}

impl RoiDescription {
    /// Name, or `"No name"` when absent or blank.
    #[must_use]
    pub fn resolved_name(&self) -> &str {
        non_blank(self.name.as_deref()).unwrap_or(DEFAULT_NAME)
    }

    /// Interpretation, or `"No interpretation"` when absent or blank.
    #[must_use]
    pub fn resolved_interpretation(&self) -> &str {
        non_blank(self.interpretation.as_deref()).unwrap_or(DEFAULT_INTERPRETATION)
    }

    /// Display color, or red when absent or malformed.
    #[must_use]
    pub fn resolved_color(&self) -> Color {
        self.display_color
            .as_deref()
            .and_then(Color::from_components)
            .unwrap_or(Color::RED)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

/// Raw tag values describing a referenced image slice.
///
/// Multi-valued entries use the `\` separator.
#[derive(Debug, Clone, Default)]
pub struct ReferencedSliceTags {
    pub sop_instance_uid: Option<String>,
    pub series_instance_uid: Option<String>,
    pub image_position: Option<String>,
    pub image_orientation: Option<String>,
    pub slice_thickness: Option<String>,
}

impl ReferencedSliceTags {
    /// Identifier of the slice.
    ///
    /// # Errors
    ///
    /// Returns `FormatError::MissingTag` if absent.
    pub fn slice_id(&self) -> Result<&str> {
        self.sop_instance_uid
            .as_deref()
            .ok_or_else(|| FormatError::MissingTag("SOPInstanceUID").into())
    }

    /// Identifier of the series.
    ///
    /// # Errors
    ///
    /// Returns `FormatError::MissingTag` if absent.
    pub fn series_id(&self) -> Result<&str> {
        self.series_instance_uid
            .as_deref()
            .ok_or_else(|| FormatError::MissingTag("SeriesInstanceUID").into())
    }

    /// Plane of the slice; the canonical plane if position or orientation
    /// is missing.
    ///
    /// # Errors
    ///
    /// Returns a `FormatError` if a present value cannot be parsed or has the
    /// wrong arity, or a geometry error if the orientation is not orthonormal.
    pub fn plane(&self) -> Result<Plane3D> {
        match (&self.image_position, &self.image_orientation) {
            (Some(position), Some(orientation)) => Plane3D::from_dicom(
                &parse_decimal_string(position)?,
                &parse_decimal_string(orientation)?,
            ),
            _ => Ok(Plane3D::default()),
        }
    }

    /// Thickness of the slice; [`DEFAULT_SLICE_THICKNESS`] if missing or
    /// unparsable.
    #[must_use]
    pub fn thickness(&self) -> f64 {
        self.slice_thickness
            .as_deref()
            .and_then(|s| parse_decimal_string(s).ok())
            .and_then(|values| values.first().copied())
            .unwrap_or(DEFAULT_SLICE_THICKNESS)
    }
}
