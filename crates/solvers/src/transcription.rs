//! Transcription of optimal control problems into nonlinear programs.
//!
//! A transcription discretizes the problem's trajectories onto a grid of
//! `N` points spanning the time horizon and exposes the result as an
//! [`NlpProblem`](crate::nlp::NlpProblem): decision variables hold the states
//! and controls at every grid point, and defect constraints enforce the
//! dynamics between neighboring points.

mod trapezoidal;

pub use trapezoidal::Trapezoidal;

use std::{fmt, str::FromStr};

use thiserror::Error;
use trellis_core::{BoundsError, IterateError};

/// Collocation schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    /// Trapezoidal rule between neighboring grid points.
    #[default]
    Trapezoidal,
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trapezoidal => f.write_str("trapezoidal"),
        }
    }
}

/// A collocation scheme name that is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown collocation scheme `{0}` (expected `trapezoidal`)")]
pub struct UnknownScheme(pub String);

impl FromStr for Scheme {
    type Err = UnknownScheme;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            "trapezoidal" | "trapezoid" => Ok(Self::Trapezoidal),
            _ => Err(UnknownScheme(name.to_owned())),
        }
    }
}

/// Errors raised while building a transcription or mapping iterates onto it.
#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error(transparent)]
    Bounds(#[from] BoundsError),

    #[error("Expected at least 2 grid points for trapezoidal collocation, but got {0}.")]
    TooFewPoints(usize),

    #[error("Expected the iterate to have {expected} time points, but it has {actual}.")]
    GridSize { expected: usize, actual: usize },

    #[error(transparent)]
    Iterate(#[from] IterateError),
}
