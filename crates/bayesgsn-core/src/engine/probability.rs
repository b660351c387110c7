//! Probability validation helpers.
//!
//! [`is_valid_probability`] accepts a scalar or any nesting of slices, arrays
//! and vectors of scalars, and checks that every value lies in `[0, 1]`.

use crate::engine::errors::GsnError;

/// Values that can be checked element-wise for membership in `[0, 1]`.
pub trait ProbabilityValues {
    /// Returns true iff every contained value is a probability.
    fn all_probabilities(&self) -> bool;
}

impl ProbabilityValues for f64 {
    fn all_probabilities(&self) -> bool {
        // NaN fails both comparisons
        (0.0..=1.0).contains(self)
    }
}

impl ProbabilityValues for f32 {
    fn all_probabilities(&self) -> bool {
        (0.0..=1.0).contains(self)
    }
}

impl<T: ProbabilityValues> ProbabilityValues for [T] {
    fn all_probabilities(&self) -> bool {
        self.iter().all(ProbabilityValues::all_probabilities)
    }
}

impl<T: ProbabilityValues, const N: usize> ProbabilityValues for [T; N] {
    fn all_probabilities(&self) -> bool {
        self.as_slice().all_probabilities()
    }
}

impl<T: ProbabilityValues> ProbabilityValues for Vec<T> {
    fn all_probabilities(&self) -> bool {
        self.as_slice().all_probabilities()
    }
}

impl<T: ProbabilityValues + ?Sized> ProbabilityValues for &T {
    fn all_probabilities(&self) -> bool {
        (**self).all_probabilities()
    }
}

/// Checks that a scalar or (nested) collection holds only values in `[0, 1]`.
///
/// Empty collections are trivially valid.
pub fn is_valid_probability<T: ProbabilityValues + ?Sized>(values: &T) -> bool {
    values.all_probabilities()
}

/// Like [`is_valid_probability`] but returns `GsnError::InvalidProbability`
/// with `what` in the message.
pub(crate) fn ensure_probability<T>(values: &T, what: &str) -> Result<(), GsnError>
where
    T: ProbabilityValues + std::fmt::Debug + ?Sized,
{
    if is_valid_probability(values) {
        Ok(())
    } else {
        Err(GsnError::InvalidProbability(format!(
            "{} must be between 0...1 but is {:?}",
            what, values
        )))
    }
}
