pub mod estimate;
pub mod load;
pub mod params;
pub mod polygon;
pub mod set;
pub mod slice;
#[allow(clippy::module_inception)]
pub mod structure;

pub use estimate::GeometryEstimate;
pub use load::{parse_decimal_string, ContourDescription, ReferencedSliceTags, RoiDescription};
pub use params::EstimationParams;
pub use polygon::{SliceBinding, StructurePolygon};
pub use set::{LoadIssue, StructureSet};
pub use slice::ReferencedSlice;
pub use structure::{Color, Structure};
