use crate::error::{PreconditionError, Result};

/// Computes the median of `values`, sorting the slice in place.
///
/// For an even number of values, returns the mean of the two middle ones.
///
/// # Errors
///
/// Returns `PreconditionError::EmptySample` if `values` is empty.
pub fn compute_median(values: &mut [f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(PreconditionError::EmptySample.into());
    }

    values.sort_by(f64::total_cmp);

    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Ok(values[mid])
    } else {
        Ok((values[mid - 1] + values[mid]) / 2.0)
    }
}
