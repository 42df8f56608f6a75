use std::fmt;

use crate::math::{Point3, Vector3};

use super::StructurePolygon;

/// RGB display color of a structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    red: u8,
    green: u8,
    blue: u8,
}

impl Color {
    /// Color used when a structure carries no valid display color.
    pub const RED: Color = Color::new(255, 0, 0);

    #[must_use]
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Builds a color from decimal components, clamped to `[0, 255]`.
    ///
    /// Returns `None` unless exactly three components are given.
    #[must_use]
    pub fn from_components(components: &[f64]) -> Option<Self> {
        match components {
            [r, g, b] => Some(Self::new(clamp_component(*r), clamp_component(*g), clamp_component(*b))),
            _ => None,
        }
    }

    #[must_use]
    pub fn red(&self) -> u8 {
        self.red
    }

    #[must_use]
    pub fn green(&self) -> u8 {
        self.green
    }

    #[must_use]
    pub fn blue(&self) -> u8 {
        self.blue
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_component(value: f64) -> u8 {
    if value.is_nan() || value < 0.0 {
        0
    } else if value >= 255.0 {
        255
    } else {
        value as u8
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.red, self.green, self.blue)
    }
}

/// A named region of interest made of planar polygons.
#[derive(Debug, Clone)]
pub struct Structure {
    name: String,
    interpretation: String,
    color: Color,
    polygons: Vec<StructurePolygon>,
}

impl Structure {
    #[must_use]
    pub fn new(name: impl Into<String>, interpretation: impl Into<String>, color: Color) -> Self {
        Self {
            name: name.into(),
            interpretation: interpretation.into(),
            color,
            polygons: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn interpretation(&self) -> &str {
        &self.interpretation
    }

    #[must_use]
    pub fn color(&self) -> Color {
        self.color
    }

    #[must_use]
    pub fn polygons(&self) -> &[StructurePolygon] {
        &self.polygons
    }

    pub(crate) fn polygons_mut(&mut self) -> &mut [StructurePolygon] {
        &mut self.polygons
    }

    pub fn add_polygon(&mut self, polygon: StructurePolygon) {
        self.polygons.push(polygon);
    }

    /// Mean of the first point of every polygon.
    ///
    /// Polygons without points count in the denominator but add nothing.
    /// Returns the world origin for a structure without polygons.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn center(&self) -> Point3 {
        if self.polygons.is_empty() {
            return Point3::origin();
        }

        let n = self.polygons.len() as f64;
        let sum = self
            .polygons
            .iter()
            .filter_map(|polygon| polygon.points().first())
            .fold(Vector3::zeros(), |acc, point| acc + point.coords);
        Point3::from(sum / n)
    }
}
