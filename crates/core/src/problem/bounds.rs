use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A closed interval `[lower, upper]` constraining a variable.
///
/// Infinite endpoints mean the variable is unbounded on that side.
/// An interval with `lower == upper` fixes the variable to a single value.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

impl Bounds {
    /// Creates bounds from a lower and upper value.
    ///
    /// No ordering check happens here; inverted bounds are reported when the
    /// owning [`Layout`](super::Layout) is validated.
    #[must_use]
    pub const fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Bounds that fix a variable to `value`.
    #[must_use]
    pub const fn fixed(value: f64) -> Self {
        Self::new(value, value)
    }

    /// Bounds with no finite endpoint.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self::new(f64::NEG_INFINITY, f64::INFINITY)
    }

    /// Bounds that only constrain from below.
    #[must_use]
    pub const fn at_least(lower: f64) -> Self {
        Self::new(lower, f64::INFINITY)
    }

    /// Bounds that only constrain from above.
    #[must_use]
    pub const fn at_most(upper: f64) -> Self {
        Self::new(f64::NEG_INFINITY, upper)
    }

    /// Returns `true` if both endpoints coincide.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_fixed(&self) -> bool {
        self.lower == self.upper
    }

    /// Returns `true` if `value` lies within the bounds.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }

    /// Checks that the bounds are well formed.
    ///
    /// # Errors
    ///
    /// Returns [`BoundsError::NotANumber`] if either endpoint is NaN, or
    /// [`BoundsError::Inverted`] if `lower > upper`.
    pub fn check(&self, channel: impl Into<String>) -> Result<(), BoundsError> {
        if self.lower.is_nan() || self.upper.is_nan() {
            return Err(BoundsError::NotANumber {
                channel: channel.into(),
            });
        }
        if self.lower > self.upper {
            return Err(BoundsError::Inverted {
                channel: channel.into(),
                lower: self.lower,
                upper: self.upper,
            });
        }
        Ok(())
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl From<[f64; 2]> for Bounds {
    fn from([lower, upper]: [f64; 2]) -> Self {
        Self::new(lower, upper)
    }
}

impl From<(f64, f64)> for Bounds {
    fn from((lower, upper): (f64, f64)) -> Self {
        Self::new(lower, upper)
    }
}

/// Errors describing inconsistent variable bounds.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BoundsError {
    #[error("{channel}: lower bound {lower} exceeds upper bound {upper}")]
    Inverted {
        channel: String,
        lower: f64,
        upper: f64,
    },

    #[error("{channel}: bounds must not be NaN")]
    NotANumber { channel: String },

    #[error("final time bounds [{lower}, {upper}] must lie after the initial time {initial}")]
    FinalTime { initial: f64, lower: f64, upper: f64 },

    #[error("duplicate {kind} name: {name}")]
    Duplicate { kind: &'static str, name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors() {
        assert!(Bounds::fixed(2.0).is_fixed());
        assert!(!Bounds::unbounded().is_fixed());
        assert_eq!(Bounds::at_least(1.0).upper, f64::INFINITY);
        assert_eq!(Bounds::at_most(1.0).lower, f64::NEG_INFINITY);
        assert_eq!(Bounds::from([-1.0, 1.0]), Bounds::new(-1.0, 1.0));
        assert_eq!(Bounds::default(), Bounds::unbounded());
    }

    #[test]
    fn contains_is_inclusive() {
        let b = Bounds::new(-1.0, 1.0);
        assert!(b.contains(-1.0));
        assert!(b.contains(1.0));
        assert!(!b.contains(1.5));
    }

    #[test]
    fn check_rejects_inverted_and_nan() {
        let err = Bounds::new(2.0, 1.0).check("state x").unwrap_err();
        assert_eq!(
            err.to_string(),
            "state x: lower bound 2 exceeds upper bound 1"
        );

        let err = Bounds::new(f64::NAN, 1.0).check("control u").unwrap_err();
        assert!(matches!(err, BoundsError::NotANumber { .. }));

        assert!(Bounds::fixed(0.0).check("ok").is_ok());
        assert!(Bounds::unbounded().check("ok").is_ok());
    }
}
