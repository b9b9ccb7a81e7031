use std::{fmt, str::FromStr};

use thiserror::Error;
use trellis_core::Observer;

use super::{Action, Error, NlpProblem, NlpSolution, NlpSolver, Progress, interior_point};

/// The built-in NLP backends.
///
/// Parse a backend from its name with [`str::parse`]:
///
/// ```
/// use trellis_solvers::nlp::Backend;
///
/// let backend: Backend = "ipm".parse().unwrap();
/// assert_eq!(backend, Backend::default());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backend {
    /// The primal-dual interior-point method.
    InteriorPoint(interior_point::Config),
}

impl Default for Backend {
    fn default() -> Self {
        Self::InteriorPoint(interior_point::Config::default())
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InteriorPoint(_) => f.write_str("ipm"),
        }
    }
}

/// A backend name that is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown NLP backend `{0}` (expected `ipm`)")]
pub struct UnknownBackend(pub String);

impl FromStr for Backend {
    type Err = UnknownBackend;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            "ipm" | "interior-point" | "interior_point" => Ok(Self::default()),
            _ => Err(UnknownBackend(name.to_owned())),
        }
    }
}

impl NlpSolver for Backend {
    fn solve<P, Obs>(&self, problem: &P, x0: &[f64], observer: Obs) -> Result<NlpSolution, Error>
    where
        P: NlpProblem,
        Obs: Observer<Progress, Action>,
    {
        match self {
            Self::InteriorPoint(config) => interior_point::solve(problem, x0, config, observer),
        }
    }
}
