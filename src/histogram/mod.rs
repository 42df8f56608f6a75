pub mod accumulator_1d;
pub mod accumulator_2d;
pub mod bucket_mapper;

pub use accumulator_1d::HistogramAccumulator1D;
pub use accumulator_2d::HistogramAccumulator2D;
pub use bucket_mapper::BucketMapper;
