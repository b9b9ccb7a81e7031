//! The optimal control problem contract.
//!
//! A problem declares its channels once through a [`Layout`] and supplies the
//! differential-algebraic equations and cost terms the transcription evaluates.

mod bounds;
mod layout;

pub use bounds::{Bounds, BoundsError};
pub use layout::{ControlInfo, FinalTime, Layout, PathConstraintInfo, StateInfo, TimeInfo};

use crate::Iterate;

/// Inputs to the problem's DAE and integral cost at one time point.
///
/// `states` and `controls` are ordered as declared in the problem's [`Layout`].
#[derive(Debug, Clone, Copy)]
pub struct DaeInput<'a> {
    pub time: f64,
    pub states: &'a [f64],
    pub controls: &'a [f64],
}

/// Outputs the problem's DAE writes at one time point.
///
/// `dynamics` has one slot per state and receives the state derivatives.
/// `path` has one slot per declared path constraint.
#[derive(Debug)]
pub struct DaeOutput<'a> {
    pub dynamics: &'a mut [f64],
    pub path: &'a mut [f64],
}

/// Defines a continuous-time optimal control problem.
///
/// The problem is consulted read-only: the same instance provides bounds to
/// the driver and is evaluated repeatedly by the transcription, possibly out
/// of temporal order and at perturbed points for derivative estimation.
/// Implementations must therefore be pure functions of their inputs.
///
/// Both cost terms default to zero, so a problem that overrides neither is a
/// feasibility problem.
pub trait OptimalControlProblem {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the declared channels, bounds, and time horizon.
    fn layout(&self) -> &Layout;

    /// Evaluates the state derivatives and path constraints.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the equations cannot be evaluated.
    fn dynamics(&self, input: &DaeInput<'_>, output: &mut DaeOutput<'_>)
    -> Result<(), Self::Error>;

    /// Evaluates the integrand of the integral cost.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the integrand cannot be evaluated.
    fn integral_cost(&self, _input: &DaeInput<'_>) -> Result<f64, Self::Error> {
        Ok(0.0)
    }

    /// Evaluates the cost at the final time.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the cost cannot be evaluated.
    fn endpoint_cost(&self, _final_time: f64, _final_states: &[f64]) -> Result<f64, Self::Error> {
        Ok(0.0)
    }

    /// Returns an empty iterate whose channels match the layout.
    ///
    /// Set the time grid and then each channel to build an initial guess.
    fn guess_template(&self) -> Iterate {
        let layout = self.layout();
        Iterate::new(layout.state_names(), layout.control_names())
    }
}
