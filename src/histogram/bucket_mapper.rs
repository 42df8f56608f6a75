use crate::error::{RangeError, Result};

/// Maps values of a closed range `[min, max]` onto `count` equal-width buckets.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketMapper {
    min: f64,
    max: f64,
    count: usize,
}

impl BucketMapper {
    /// # Errors
    ///
    /// Returns `RangeError::InvalidRange` if `min >= max` or `count == 0`.
    pub fn new(min: f64, max: f64, count: usize) -> Result<Self> {
        if min.is_nan() || max.is_nan() || min >= max || count == 0 {
            return Err(RangeError::InvalidRange {
                min,
                max,
                buckets: count,
            }
            .into());
        }
        Ok(Self { min, max, count })
    }

    /// Number of buckets.
    #[must_use]
    pub fn size(&self) -> usize {
        self.count
    }

    #[must_use]
    pub fn min(&self) -> f64 {
        self.min
    }

    #[must_use]
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Lower bound of bucket `i` (inclusive).
    ///
    /// # Errors
    ///
    /// Returns `RangeError::IndexOutOfBounds` if `i` is not a bucket index.
    pub fn bucket_low(&self, i: usize) -> Result<f64> {
        self.check_index(i)?;
        Ok(self.interpolate(i, 0.0))
    }

    /// Upper bound of bucket `i` (exclusive, except for the last bucket).
    ///
    /// # Errors
    ///
    /// Returns `RangeError::IndexOutOfBounds` if `i` is not a bucket index.
    pub fn bucket_high(&self, i: usize) -> Result<f64> {
        self.check_index(i)?;
        Ok(self.interpolate(i, 1.0))
    }

    /// Middle of bucket `i`.
    ///
    /// # Errors
    ///
    /// Returns `RangeError::IndexOutOfBounds` if `i` is not a bucket index.
    pub fn bucket_center(&self, i: usize) -> Result<f64> {
        self.check_index(i)?;
        Ok(self.interpolate(i, 0.5))
    }

    /// Index of the bucket containing `value`.
    ///
    /// Consistent with the bucket bounds: `bucket_low(i) <= value <
    /// bucket_high(i)`, except for `max` itself, which belongs to the last
    /// bucket.
    ///
    /// # Errors
    ///
    /// Returns `RangeError::ValueOutOfRange` if `value` is outside `[min, max]`.
    pub fn bucket_index(&self, value: f64) -> Result<usize> {
        if value.is_nan() || value < self.min || value > self.max {
            return Err(RangeError::ValueOutOfRange {
                value,
                min: self.min,
                max: self.max,
            }
            .into());
        }

        #[allow(clippy::cast_precision_loss)]
        let scaled = (value - self.min) / (self.max - self.min) * self.count as f64;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let mut bucket = (scaled.floor() as usize).min(self.count - 1);

        // The scaled floor may land one bucket off the interpolated bounds.
        if bucket > 0 && value < self.interpolate(bucket, 0.0) {
            bucket -= 1;
        } else if bucket + 1 < self.count && value >= self.interpolate(bucket + 1, 0.0) {
            bucket += 1;
        }

        Ok(bucket)
    }

    fn check_index(&self, i: usize) -> Result<()> {
        if i >= self.count {
            return Err(RangeError::IndexOutOfBounds {
                index: i,
                size: self.count,
            }
            .into());
        }
        Ok(())
    }

    #[allow(clippy::cast_precision_loss)]
    fn interpolate(&self, i: usize, offset: f64) -> f64 {
        let alpha = (i as f64 + offset) / self.count as f64;
        (1.0 - alpha) * self.min + alpha * self.max
    }
}
