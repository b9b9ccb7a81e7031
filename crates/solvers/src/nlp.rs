//! Nonlinear programming backends.
//!
//! A backend solves
//!
//! ```text
//! min f(x)  subject to  g_l <= g(x) <= g_u,  x_l <= x <= x_u
//! ```
//!
//! for a problem exposed through [`NlpProblem`]. Infinite bounds are absent
//! bounds; equal bounds make a variable fixed or a constraint an equality.
//!
//! Backends report progress through an [`Observer`] receiving one
//! [`Progress`] event per iteration, which may answer with
//! [`Action::StopEarly`].

mod backend;
mod error;
mod sparsity;

pub mod interior_point;

pub use backend::{Backend, UnknownBackend};
pub use error::Error;
pub use sparsity::Sparsity;

use trellis_core::{Bounds, Observer};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A nonlinear program in the form consumed by an [`NlpSolver`].
///
/// Evaluation methods write into caller-provided buffers sized to
/// [`num_variables`](NlpProblem::num_variables) or
/// [`num_constraints`](NlpProblem::num_constraints).
pub trait NlpProblem {
    type Error: std::error::Error + Send + Sync + 'static;

    fn num_variables(&self) -> usize {
        self.variable_bounds().len()
    }

    fn num_constraints(&self) -> usize {
        self.constraint_bounds().len()
    }

    fn variable_bounds(&self) -> &[Bounds];

    fn constraint_bounds(&self) -> &[Bounds];

    /// Returns the constraint Jacobian structure.
    ///
    /// The structure is fixed for the lifetime of the problem.
    fn jacobian_structure(&self) -> &Sparsity;

    /// Evaluates the objective.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the objective cannot be evaluated at `x`.
    fn objective(&self, x: &[f64]) -> Result<f64, Self::Error>;

    /// Evaluates the objective gradient into `grad`.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the gradient cannot be evaluated at `x`.
    fn gradient(&self, x: &[f64], grad: &mut [f64]) -> Result<(), Self::Error>;

    /// Evaluates the constraint functions into `g`.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the constraints cannot be evaluated at `x`.
    fn constraints(&self, x: &[f64], g: &mut [f64]) -> Result<(), Self::Error>;

    /// Evaluates the constraint Jacobian in [`jacobian_structure`] order.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the Jacobian cannot be evaluated at `x`.
    ///
    /// [`jacobian_structure`]: NlpProblem::jacobian_structure
    fn jacobian(&self, x: &[f64], values: &mut [f64]) -> Result<(), Self::Error>;
}

/// A solver for [`NlpProblem`]s.
pub trait NlpSolver {
    /// Solves `problem` starting from `x0`.
    ///
    /// Failing to converge is not an error: the returned solution carries a
    /// non-converged [`Status`] along with the last iterate.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if the problem is malformed or cannot be
    /// evaluated at the starting point.
    fn solve<P, Obs>(&self, problem: &P, x0: &[f64], observer: Obs) -> Result<NlpSolution, Error>
    where
        P: NlpProblem,
        Obs: Observer<Progress, Action>;
}

/// Per-iteration progress of a backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// Iteration index, starting at zero for the initial point.
    pub iter: usize,

    pub objective: f64,

    /// Largest absolute constraint violation.
    pub primal_infeasibility: f64,

    /// Largest absolute component of the Lagrangian gradient.
    pub dual_infeasibility: f64,

    /// Current barrier parameter.
    pub barrier: f64,

    /// Step length accepted by the previous iteration.
    pub step: f64,

    /// Hessian regularization used by the previous iteration.
    pub regularization: f64,
}

/// Actions an observer can request from a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Stop and return the current iterate.
    StopEarly,
}

/// How a backend finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Status {
    /// Optimality and feasibility tolerances were met.
    Converged,

    /// The iteration limit was reached first.
    MaxIters,

    /// Progress stalled while the constraints were still violated.
    Infeasible,

    /// An evaluation or linear solve failed, or progress stalled otherwise.
    Error,

    /// An observer requested an early stop.
    StoppedByObserver,
}

/// The result of an NLP solve.
#[derive(Debug, Clone, PartialEq)]
pub struct NlpSolution {
    /// Final primal point, including fixed variables.
    pub x: Vec<f64>,

    /// Objective at `x`.
    pub objective: f64,

    pub status: Status,

    /// Number of completed iterations.
    pub iterations: usize,

    /// Human-readable description of how the solve ended.
    pub message: String,
}
