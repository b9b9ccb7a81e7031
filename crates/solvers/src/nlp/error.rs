use trellis_core::BoundsError;

/// Errors that prevent a backend from starting a solve.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("expected {expected} {what}, but got {actual}")]
    Dimension {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error(transparent)]
    Bounds(#[from] BoundsError),

    #[error("problem error at the initial point: {0}")]
    Problem(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wraps a problem evaluation error.
    pub fn problem(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Problem(Box::new(err))
    }

    pub(crate) fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<(), Self> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self::Dimension {
                what,
                expected,
                actual,
            })
        }
    }
}
