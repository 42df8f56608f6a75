use crate::error::{PreconditionError, Result};
use crate::math::stats::compute_median;

use super::BucketMapper;

#[derive(Debug, Clone, Default)]
struct Bucket {
    count: usize,
    values: Vec<f64>,
}

/// A fixed-bucket histogram over a closed range of doubles.
///
/// When created with `store_values`, the raw values are retained per bucket
/// so that a robust median of the most populated bucket can be computed.
#[derive(Debug, Clone)]
pub struct HistogramAccumulator1D {
    mapper: BucketMapper,
    buckets: Vec<Bucket>,
    store_values: bool,
}

impl HistogramAccumulator1D {
    /// # Errors
    ///
    /// Returns `RangeError::InvalidRange` if `min >= max` or `count == 0`.
    pub fn new(min: f64, max: f64, count: usize, store_values: bool) -> Result<Self> {
        let mapper = BucketMapper::new(min, max, count)?;
        Ok(Self {
            mapper,
            buckets: vec![Bucket::default(); count],
            store_values,
        })
    }

    /// Number of buckets.
    #[must_use]
    pub fn size(&self) -> usize {
        self.mapper.size()
    }

    #[must_use]
    pub fn stores_values(&self) -> bool {
        self.store_values
    }

    /// # Errors
    ///
    /// Returns `RangeError::IndexOutOfBounds` if `i` is not a bucket index.
    pub fn bucket_low(&self, i: usize) -> Result<f64> {
        self.mapper.bucket_low(i)
    }

    /// # Errors
    ///
    /// Returns `RangeError::IndexOutOfBounds` if `i` is not a bucket index.
    pub fn bucket_high(&self, i: usize) -> Result<f64> {
        self.mapper.bucket_high(i)
    }

    /// # Errors
    ///
    /// Returns `RangeError::IndexOutOfBounds` if `i` is not a bucket index.
    pub fn bucket_center(&self, i: usize) -> Result<f64> {
        self.mapper.bucket_center(i)
    }

    /// # Errors
    ///
    /// Returns `RangeError::ValueOutOfRange` if `value` is outside the range.
    pub fn bucket_index(&self, value: f64) -> Result<usize> {
        self.mapper.bucket_index(value)
    }

    /// Number of values accumulated in bucket `i`.
    ///
    /// # Errors
    ///
    /// Returns `RangeError::IndexOutOfBounds` if `i` is not a bucket index.
    pub fn bucket_content_size(&self, i: usize) -> Result<usize> {
        self.mapper.bucket_low(i)?;
        Ok(self.buckets[i].count)
    }

    /// # Errors
    ///
    /// Returns `RangeError::ValueOutOfRange` if `value` is outside the range.
    pub fn add_value(&mut self, value: f64) -> Result<()> {
        let i = self.mapper.bucket_index(value)?;
        let bucket = &mut self.buckets[i];
        bucket.count += 1;
        if self.store_values {
            bucket.values.push(value);
        }
        Ok(())
    }

    /// Index of the most populated bucket. Ties go to the lowest index.
    #[must_use]
    pub fn find_best_bucket(&self) -> usize {
        let mut best = 0;
        for (i, bucket) in self.buckets.iter().enumerate() {
            if bucket.count > self.buckets[best].count {
                best = i;
            }
        }
        best
    }

    /// Center of the most populated bucket.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the best bucket is always a valid index.
    pub fn compute_best_center(&self) -> Result<f64> {
        self.mapper.bucket_center(self.find_best_bucket())
    }

    /// Median of the raw values of the most populated bucket.
    ///
    /// # Errors
    ///
    /// Returns `PreconditionError::ValuesNotStored` if the accumulator does not
    /// retain raw values, or `PreconditionError::EmptySample` if no value was
    /// ever added.
    pub fn compute_best_median(&self) -> Result<f64> {
        if !self.store_values {
            return Err(PreconditionError::ValuesNotStored.into());
        }
        let mut values = self.buckets[self.find_best_bucket()].values.clone();
        compute_median(&mut values)
    }
}
