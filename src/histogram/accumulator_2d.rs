use std::fmt;

use crate::error::{PreconditionError, RangeError, Result};
use crate::math::stats::compute_median;

use super::BucketMapper;

#[derive(Debug, Clone, Default)]
struct Bucket {
    count: usize,
    values_x: Vec<f64>,
    values_y: Vec<f64>,
}

/// A fixed-bucket 2D histogram over a closed rectangle of doubles.
///
/// Buckets are stored row-major: index `x + y * size_x`.
#[derive(Debug, Clone)]
pub struct HistogramAccumulator2D {
    mapper_x: BucketMapper,
    mapper_y: BucketMapper,
    buckets: Vec<Bucket>,
    store_values: bool,
}

impl HistogramAccumulator2D {
    /// # Errors
    ///
    /// Returns `RangeError::InvalidRange` if either axis has an empty range
    /// or no buckets.
    pub fn new(
        (min_x, max_x, count_x): (f64, f64, usize),
        (min_y, max_y, count_y): (f64, f64, usize),
        store_values: bool,
    ) -> Result<Self> {
        let mapper_x = BucketMapper::new(min_x, max_x, count_x)?;
        let mapper_y = BucketMapper::new(min_y, max_y, count_y)?;
        Ok(Self {
            mapper_x,
            mapper_y,
            buckets: vec![Bucket::default(); count_x * count_y],
            store_values,
        })
    }

    /// Number of buckets along each axis.
    #[must_use]
    pub fn size(&self) -> (usize, usize) {
        (self.mapper_x.size(), self.mapper_y.size())
    }

    #[must_use]
    pub fn stores_values(&self) -> bool {
        self.store_values
    }

    fn encode_index(&self, x: usize, y: usize) -> Result<usize> {
        let (size_x, size_y) = self.size();
        if x >= size_x {
            return Err(RangeError::IndexOutOfBounds {
                index: x,
                size: size_x,
            }
            .into());
        }
        if y >= size_y {
            return Err(RangeError::IndexOutOfBounds {
                index: y,
                size: size_y,
            }
            .into());
        }
        Ok(x + y * size_x)
    }

    fn decode_index(&self, index: usize) -> (usize, usize) {
        let size_x = self.mapper_x.size();
        (index % size_x, index / size_x)
    }

    /// Bucket coordinates of the value pair `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns `RangeError::ValueOutOfRange` if either value is out of range.
    pub fn bucket_index(&self, x: f64, y: f64) -> Result<(usize, usize)> {
        Ok((self.mapper_x.bucket_index(x)?, self.mapper_y.bucket_index(y)?))
    }

    /// Number of values accumulated in bucket `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns `RangeError::IndexOutOfBounds` for invalid bucket coordinates.
    pub fn bucket_content_size(&self, x: usize, y: usize) -> Result<usize> {
        Ok(self.buckets[self.encode_index(x, y)?].count)
    }

    /// # Errors
    ///
    /// Returns `RangeError::ValueOutOfRange` if either value is out of range.
    pub fn add_value(&mut self, x: f64, y: f64) -> Result<()> {
        let (bx, by) = self.bucket_index(x, y)?;
        let index = self.encode_index(bx, by)?;
        let store = self.store_values;
        let bucket = &mut self.buckets[index];
        bucket.count += 1;
        if store {
            bucket.values_x.push(x);
            bucket.values_y.push(y);
        }
        Ok(())
    }

    fn find_best_internal(&self) -> usize {
        let mut best = 0;
        for (i, bucket) in self.buckets.iter().enumerate() {
            if bucket.count > self.buckets[best].count {
                best = i;
            }
        }
        best
    }

    /// Coordinates of the most populated bucket. Ties go to the lowest
    /// row-major index.
    #[must_use]
    pub fn find_best_bucket(&self) -> (usize, usize) {
        self.decode_index(self.find_best_internal())
    }

    /// Center of the most populated bucket.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the best bucket is always valid.
    pub fn compute_best_center(&self) -> Result<(f64, f64)> {
        let (x, y) = self.find_best_bucket();
        Ok((self.mapper_x.bucket_center(x)?, self.mapper_y.bucket_center(y)?))
    }

    /// Per-axis median of the raw values of the most populated bucket.
    ///
    /// # Errors
    ///
    /// Returns `PreconditionError::ValuesNotStored` if raw values are not
    /// retained, or `PreconditionError::EmptySample` if the best bucket is empty.
    pub fn compute_best_median(&self) -> Result<(f64, f64)> {
        if !self.store_values {
            return Err(PreconditionError::ValuesNotStored.into());
        }
        let bucket = &self.buckets[self.find_best_internal()];
        let mut xs = bucket.values_x.clone();
        let mut ys = bucket.values_y.clone();
        Ok((compute_median(&mut xs)?, compute_median(&mut ys)?))
    }
}

impl fmt::Display for HistogramAccumulator2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (size_x, size_y) = self.size();

        write!(f, "         ")?;
        for x in 0..size_x {
            let center = self.mapper_x.bucket_center(x).map_err(|_| fmt::Error)?;
            write!(f, "{center:7.2} ")?;
        }
        writeln!(f)?;

        for y in 0..size_y {
            let center = self.mapper_y.bucket_center(y).map_err(|_| fmt::Error)?;
            write!(f, "{center:7.2}: ")?;
            for x in 0..size_x {
                write!(f, "{:7} ", self.buckets[x + y * size_x].count)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
