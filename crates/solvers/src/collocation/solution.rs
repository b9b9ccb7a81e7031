use std::{ops::Deref, path::Path};

use trellis_core::{Iterate, TableError};

use crate::nlp::Status;

/// Stages of a direct-collocation solve.
///
/// A solve moves through
/// `Unsolved → Validating → Transcribed → Solving → {Converged, Failed}`.
/// Only the terminal phases are ever recorded on a [`Solution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Unsolved,
    Validating,
    Transcribed,
    Solving,
    Converged,
    Failed,
}

/// The result of a direct-collocation solve.
///
/// Dereferences to the solution [`Iterate`], so trajectories can be read
/// directly, as in `solution.state("x")`.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Trajectories on the solver's grid.
    pub iterate: Iterate,

    /// Backend status.
    pub status: Status,

    /// Objective at the returned trajectories.
    pub objective: f64,

    /// Backend iteration count.
    pub iterations: usize,

    /// Backend diagnostic message.
    pub message: String,

    /// Terminal phase: [`Phase::Converged`] or [`Phase::Failed`].
    pub phase: Phase,
}

impl Solution {
    /// Returns `true` if the backend converged.
    #[must_use]
    pub fn success(&self) -> bool {
        self.status == Status::Converged
    }

    /// Writes the solution trajectories in the [`Iterate::write`] format.
    ///
    /// # Errors
    ///
    /// Returns a [`TableError`] if the file cannot be written.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), TableError> {
        self.iterate.write(path)
    }
}

impl Deref for Solution {
    type Target = Iterate;

    fn deref(&self) -> &Iterate {
        &self.iterate
    }
}
