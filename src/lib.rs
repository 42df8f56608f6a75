pub mod error;
pub mod geometry;
pub mod histogram;
pub mod math;
pub mod slicer;
pub mod structure;
pub mod union;

pub use error::{Result, SlicerError};
