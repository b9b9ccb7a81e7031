use std::{cell::Cell, convert::Infallible};

use approx::assert_relative_eq;
use nalgebra::DVector;
use trellis_core::{
    Bounds, DaeInput, DaeOutput, ErrorKind, Iterate, Layout, Observer, OptimalControlProblem,
};

use crate::{
    nlp::{Action, Error as NlpError, NlpProblem, NlpSolution, NlpSolver, Progress, Status},
    transcription::{Scheme, TranscriptionError},
};

use super::{DirectCollocation, Error, Phase};

struct PointMass {
    layout: Layout,
}

impl PointMass {
    fn new() -> Self {
        Self::with_layout(
            Layout::new(0.0, 1.0)
                .state("x", [-1.5, 1.5], Bounds::fixed(0.0), None)
                .state("v", [-10.0, 10.0], Bounds::fixed(0.0), Bounds::fixed(0.0))
                .control("F", [-50.0, 50.0]),
        )
    }

    fn with_layout(layout: Layout) -> Self {
        Self { layout }
    }
}

impl OptimalControlProblem for PointMass {
    type Error = Infallible;

    fn layout(&self) -> &Layout {
        &self.layout
    }

    fn dynamics(&self, input: &DaeInput<'_>, output: &mut DaeOutput<'_>) -> Result<(), Infallible> {
        output.dynamics[0] = input.states[1];
        output.dynamics[1] = input.controls[0];
        Ok(())
    }
}

/// A backend that hands the starting point back with a fixed status.
struct Echo {
    status: Status,
    calls: Cell<usize>,
    variables: Cell<usize>,
}

impl Echo {
    fn new(status: Status) -> Self {
        Self {
            status,
            calls: Cell::new(0),
            variables: Cell::new(0),
        }
    }
}

impl NlpSolver for Echo {
    fn solve<P, Obs>(
        &self,
        problem: &P,
        x0: &[f64],
        mut observer: Obs,
    ) -> Result<NlpSolution, NlpError>
    where
        P: NlpProblem,
        Obs: Observer<Progress, Action>,
    {
        self.calls.set(self.calls.get() + 1);
        self.variables.set(problem.num_variables());
        let objective = problem.objective(x0).map_err(NlpError::problem)?;
        observer.observe(&Progress {
            iter: 0,
            objective,
            primal_infeasibility: 0.0,
            dual_infeasibility: 0.0,
            barrier: 0.0,
            step: 0.0,
            regularization: 0.0,
        });
        Ok(NlpSolution {
            x: x0.to_vec(),
            objective,
            status: self.status,
            iterations: 0,
            message: format!("{:?}", self.status),
        })
    }
}

fn ramp(num_times: usize) -> Iterate {
    let mut guess = PointMass::new().guess_template();
    let time = trellis_core::iterate::linspace(0.0, 1.0, num_times);
    guess.set_time(time.iter().copied());
    guess.set_state_guess("x", &time).unwrap();
    guess.set_control_guess("F", &vec![0.0; num_times]).unwrap();
    guess
}

#[test]
fn unknown_names_are_rejected() {
    let problem = PointMass::new();

    let Err(err) = DirectCollocation::from_names(&problem, "hermite-simpson", "ipm", 10) else {
        panic!("scheme name should be rejected");
    };
    assert!(matches!(err, Error::UnknownScheme(_)));
    assert_eq!(
        err.to_string(),
        "unknown collocation scheme `hermite-simpson` (expected `trapezoidal`)"
    );

    let Err(err) = DirectCollocation::from_names(&problem, "trapezoidal", "snopt", 10) else {
        panic!("backend name should be rejected");
    };
    assert!(matches!(err, Error::UnknownBackend(_)));

    let Ok(solver) = DirectCollocation::from_names(&problem, "Trapezoidal", " IPM ", 10) else {
        panic!("names should parse");
    };
    assert_eq!(solver.scheme(), Scheme::Trapezoidal);
    assert_eq!(solver.num_points(), 10);
}

#[test]
fn bad_guess_never_reaches_the_backend() {
    let problem = PointMass::new();
    let solver = DirectCollocation::new(
        &problem,
        Scheme::Trapezoidal,
        Echo::new(Status::Converged),
        5,
    );

    let mut guess = Iterate::new(["x"], ["F"]);
    guess.set_time([0.0, 0.5, 1.0]);
    guess.set_state_guess("x", &[0.0, 0.5, 1.0]).unwrap();

    let err = solver.solve(&guess).unwrap_err();
    assert!(matches!(err, Error::Guess(_)));
    assert_eq!(
        err.to_string(),
        "invalid guess: Expected states to have 2 rows, but it has 1 rows."
    );
    assert_eq!(solver.backend().calls.get(), 0);
}

#[test]
fn misnamed_guess_never_reaches_the_backend() {
    let problem = PointMass::new();
    let solver = DirectCollocation::new(
        &problem,
        Scheme::Trapezoidal,
        Echo::new(Status::Converged),
        3,
    );

    let mut guess = Iterate::new(["v", "x"], ["torque"]);
    guess.set_time([0.0, 0.5, 1.0]);
    guess.set_state_guess("x", &[0.0, 0.5, 1.0]).unwrap();
    guess.set_control_guess("torque", &[0.0; 3]).unwrap();

    let err = solver.solve(&guess).unwrap_err();
    let Error::Guess(source) = &err else {
        panic!("expected a guess error, got {err}");
    };
    assert_eq!(source.kind(), ErrorKind::UnknownChannel);
    assert_eq!(solver.backend().calls.get(), 0);
}

#[test]
fn malformed_bounds_never_reach_the_backend() {
    let problem = PointMass::with_layout(
        Layout::new(0.0, 1.0)
            .state("x", [1.0, -1.0], None, None)
            .control("F", [-1.0, 1.0]),
    );
    let solver = DirectCollocation::new(&problem, Scheme::Trapezoidal, Echo::new(Status::Converged), 4);

    let mut guess = problem.guess_template();
    guess.set_time([0.0, 0.25, 0.5, 0.75]);
    guess.set_state_guess("x", &[0.0; 4]).unwrap();
    guess.set_control_guess("F", &[0.0; 4]).unwrap();

    let err = solver.solve(&guess).unwrap_err();
    assert!(matches!(
        err,
        Error::Transcription(TranscriptionError::Bounds(_))
    ));
    assert_eq!(solver.backend().calls.get(), 0);
}

#[test]
fn guess_on_another_grid_is_resampled() {
    let problem = PointMass::new();
    let solver = DirectCollocation::new(&problem, Scheme::Trapezoidal, Echo::new(Status::Converged), 9);

    let solution = solver.solve(&ramp(5)).unwrap();

    // Two states and one control on each of 9 points; the final time is fixed.
    assert_eq!(solver.backend().variables.get(), 27);
    assert_eq!(solution.num_times(), 9);

    let expected = trellis_core::iterate::linspace(0.0, 1.0, 9);
    let x = solution.state("x").unwrap();
    for (actual, expected) in x.iter().zip(expected.iter()) {
        assert_relative_eq!(*actual, *expected, epsilon = 1e-12);
    }
    assert_eq!(solution.time(), &DVector::from_vec(expected));
    assert_eq!(solution.control_names(), ["F"]);
}

#[test]
fn status_decides_the_terminal_phase() {
    let problem = PointMass::new();

    let solver = DirectCollocation::new(&problem, Scheme::Trapezoidal, Echo::new(Status::Converged), 6);
    let solution = solver.solve(&ramp(6)).unwrap();
    assert!(solution.success());
    assert_eq!(solution.phase, Phase::Converged);
    assert_eq!(solution.iterate, ramp(6));

    let solver = DirectCollocation::new(&problem, Scheme::Trapezoidal, Echo::new(Status::MaxIters), 6);
    let solution = solver.solve(&ramp(6)).unwrap();
    assert!(!solution.success());
    assert_eq!(solution.phase, Phase::Failed);
    assert_eq!(solution.message, "MaxIters");
}

#[test]
fn observer_sees_backend_progress() {
    let problem = PointMass::new();
    let solver = DirectCollocation::new(&problem, Scheme::Trapezoidal, Echo::new(Status::Converged), 6);

    let mut seen = Vec::new();
    solver
        .solve_observed(&ramp(6), |progress: &Progress| -> Option<Action> {
            seen.push(progress.iter);
            None
        })
        .unwrap();

    assert_eq!(seen, [0]);
}
