//! Direct-collocation driver.
//!
//! [`DirectCollocation`] ties a problem, a collocation [`Scheme`], and an NLP
//! backend together. Each solve validates the guess against the problem's
//! layout, transcribes the problem, runs the backend from the guess, and
//! decodes the backend's answer into a [`Solution`].
//!
//! A backend that fails to converge still yields a [`Solution`] holding its
//! last iterate, with [`Phase::Failed`] and the backend's message. Errors are
//! reserved for solves that cannot start.

mod error;
mod solution;

#[cfg(test)]
mod tests;

pub use error::Error;
pub use solution::{Phase, Solution};

use tracing::debug;
use trellis_core::{Iterate, Observer, OptimalControlProblem};

use crate::{
    nlp::{Action, Backend, NlpSolver, Progress, Status},
    transcription::{Scheme, Trapezoidal},
};

/// Solves optimal control problems by direct collocation.
///
/// # Example
///
/// Move a unit of distance in unit time with the least control effort:
///
/// ```
/// # use std::convert::Infallible;
/// # use trellis_core::{Bounds, DaeInput, DaeOutput, Layout, OptimalControlProblem};
/// use trellis_solvers::DirectCollocation;
///
/// # struct Glide {
/// #     layout: Layout,
/// # }
/// #
/// # impl OptimalControlProblem for Glide {
/// #     type Error = Infallible;
/// #
/// #     fn layout(&self) -> &Layout {
/// #         &self.layout
/// #     }
/// #
/// #     fn dynamics(&self, input: &DaeInput<'_>, output: &mut DaeOutput<'_>) -> Result<(), Infallible> {
/// #         output.dynamics[0] = input.controls[0];
/// #         Ok(())
/// #     }
/// #
/// #     fn integral_cost(&self, input: &DaeInput<'_>) -> Result<f64, Infallible> {
/// #         Ok(input.controls[0].powi(2))
/// #     }
/// # }
/// let problem = Glide {
///     layout: Layout::new(0.0, 1.0)
///         .state("x", [-2.0, 2.0], Bounds::fixed(0.0), Bounds::fixed(1.0))
///         .control("u", [-10.0, 10.0]),
/// };
///
/// let mut guess = problem.guess_template();
/// guess.set_time([0.0, 0.5, 1.0]);
/// guess.set_state_guess("x", &[0.0, 0.5, 1.0])?;
/// guess.set_control_guess("u", &[1.0, 1.0, 1.0])?;
///
/// let solver = DirectCollocation::from_names(&problem, "trapezoidal", "ipm", 5)?;
/// let solution = solver.solve(&guess)?;
///
/// assert!(solution.success());
/// let u = solution.control("u").unwrap();
/// assert!(u.iter().all(|u| (u - 1.0).abs() < 1e-5));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct DirectCollocation<'p, P, B = Backend> {
    problem: &'p P,
    scheme: Scheme,
    backend: B,
    num_points: usize,
}

impl<'p, P: OptimalControlProblem> DirectCollocation<'p, P> {
    /// Creates a solver from a scheme name and a backend name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownScheme`] or [`Error::UnknownBackend`] if a name
    /// is not recognized.
    pub fn from_names(
        problem: &'p P,
        scheme: &str,
        backend: &str,
        num_points: usize,
    ) -> Result<Self, Error> {
        Ok(Self::new(problem, scheme.parse()?, backend.parse()?, num_points))
    }
}

impl<'p, P, B> DirectCollocation<'p, P, B>
where
    P: OptimalControlProblem,
    B: NlpSolver,
{
    /// Creates a solver on a grid of `num_points` points.
    pub fn new(problem: &'p P, scheme: Scheme, backend: B, num_points: usize) -> Self {
        Self {
            problem,
            scheme,
            backend,
            num_points,
        }
    }

    #[must_use]
    pub fn num_points(&self) -> usize {
        self.num_points
    }

    #[must_use]
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Solves from `guess` without observer support.
    ///
    /// # Errors
    ///
    /// See [`DirectCollocation::solve_observed`].
    pub fn solve(&self, guess: &Iterate) -> Result<Solution, Error> {
        self.solve_observed(guess, ())
    }

    /// Solves from `guess`, reporting backend progress to `observer`.
    ///
    /// A guess on a different number of time points is interpolated onto the
    /// solver's grid first. When the final time is fixed, the guess's time
    /// values are not used beyond ordering; its columns map to grid points by
    /// index.
    ///
    /// # Errors
    ///
    /// - [`Error::Guess`] if the guess does not match the problem's channels
    ///   or cannot be interpolated.
    /// - [`Error::Transcription`] if the problem's bounds are malformed or the
    ///   grid is too small.
    /// - [`Error::Backend`] if the backend rejects the program or cannot
    ///   evaluate it at the guess.
    pub fn solve_observed<Obs>(&self, guess: &Iterate, observer: Obs) -> Result<Solution, Error>
    where
        Obs: Observer<Progress, Action>,
    {
        let layout = self.problem.layout();
        debug!(phase = ?Phase::Unsolved, scheme = %self.scheme, num_points = self.num_points);

        debug!(phase = ?Phase::Validating, num_times = guess.num_times());
        guess.validate_against(layout).map_err(Error::Guess)?;
        let resampled;
        let guess = if guess.num_times() == self.num_points {
            guess
        } else {
            resampled = guess.interpolate(self.num_points).map_err(Error::Guess)?;
            &resampled
        };

        let transcription = match self.scheme {
            Scheme::Trapezoidal => Trapezoidal::new(self.problem, self.num_points)?,
        };
        let x0 = transcription.construct_variables(guess)?;
        debug!(phase = ?Phase::Transcribed, variables = x0.len());

        debug!(phase = ?Phase::Solving);
        let nlp = self.backend.solve(&transcription, &x0, observer)?;

        let phase = if nlp.status == Status::Converged {
            Phase::Converged
        } else {
            Phase::Failed
        };
        debug!(
            ?phase,
            status = ?nlp.status,
            iterations = nlp.iterations,
            objective = nlp.objective,
            message = %nlp.message,
        );

        Ok(Solution {
            iterate: transcription.deconstruct(&nlp.x),
            status: nlp.status,
            objective: nlp.objective,
            iterations: nlp.iterations,
            message: nlp.message,
            phase,
        })
    }
}
