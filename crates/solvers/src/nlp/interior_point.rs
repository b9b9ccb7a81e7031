//! Primal-dual interior-point method for dense nonlinear programs.
//!
//! # Algorithm
//!
//! Fixed variables are removed and each inequality constraint gains a slack
//! variable, so the iteration solves
//!
//! ```text
//! min f(y)  subject to  c(y) = 0,  y_l <= y <= y_u
//! ```
//!
//! through a sequence of log-barrier subproblems with a decreasing barrier
//! parameter `μ`. Each iteration takes a Newton step on the primal-dual
//! optimality conditions:
//!
//! - the Lagrangian Hessian is approximated by central differences of the
//!   Lagrangian gradient;
//! - the Hessian block is regularized until the KKT matrix has the inertia of
//!   a minimizer, and the system is solved by LU factorization;
//! - step lengths follow the fraction-to-the-boundary rule, and a
//!   backtracking line search on an ℓ1 merit function picks the primal step.
//!
//! The solve converges when the scaled optimality error falls below
//! [`Config::tol`] and the constraint violation below
//! [`Config::constr_viol_tol`].
//!
//! # When to Use
//!
//! The method stores the Jacobian and Hessian densely, which suits the small
//! and medium programs produced by coarse collocation grids.
//!
//! # Observer Events
//!
//! The solver emits one [`Progress`] event per iteration, starting with the
//! initial point as iteration 0. Observers can return [`Action::StopEarly`]
//! to end the solve with [`Status::StoppedByObserver`].

mod config;
mod kkt;
mod reformulated;
mod search;
mod state;


pub use config::{Config, ConfigError};

use trellis_core::Observer;

use super::{Action, Error, NlpProblem, NlpSolution, Progress};

#[cfg(doc)]
use super::Status;

use search::search;

/// Solves the program starting from `x0`.
///
/// # Errors
///
/// Returns an error if the problem's dimensions or bounds are inconsistent,
/// or if it cannot be evaluated at `x0`. Later evaluation failures end the
/// solve with [`Status::Error`] instead.
pub fn solve<P, Obs>(
    problem: &P,
    x0: &[f64],
    config: &Config,
    observer: Obs,
) -> Result<NlpSolution, Error>
where
    P: NlpProblem,
    Obs: Observer<Progress, Action>,
{
    search(problem, x0, config, observer)
}

/// Solves the program without observer support.
///
/// This is a convenience wrapper around [`solve`] that uses a no-op observer.
///
/// # Errors
///
/// See [`solve`].
pub fn solve_unobserved<P: NlpProblem>(
    problem: &P,
    x0: &[f64],
    config: &Config,
) -> Result<NlpSolution, Error> {
    solve(problem, x0, config, ())
}
