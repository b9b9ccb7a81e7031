use nalgebra::{DMatrix, DVector};
use trellis_core::{
    Bounds, DaeInput, DaeOutput, Iterate, Layout, OptimalControlProblem, iterate::linspace,
};

use crate::nlp::{NlpProblem, Sparsity};

use super::TranscriptionError;

/// Trapezoidal direct collocation of an [`OptimalControlProblem`].
///
/// Decision variables are laid out as
///
/// ```text
/// [final time (if free), column 0, column 1, ..., column N-1]
/// ```
///
/// where each column holds the states then the controls at one grid point.
/// Grid points sit at `t_i = t_0 + τ_i (t_f - t_0)` with `τ_i = i / (N - 1)`.
///
/// Constraints are the `(N - 1) S` defects
///
/// ```text
/// x_{i+1} - x_i - h_i / 2 (f_i + f_{i+1}) = 0
/// ```
///
/// ordered by interval then state, followed by the `N P` path constraints
/// ordered by grid point then path constraint. The objective is the
/// trapezoidal quadrature of the integral cost plus the endpoint cost at the
/// last column.
///
/// Derivatives are central differences of the problem's functions, taken one
/// grid column at a time and assembled analytically.
#[derive(Debug)]
pub struct Trapezoidal<'p, P> {
    problem: &'p P,
    num_points: usize,
    num_states: usize,
    num_controls: usize,
    num_path: usize,
    initial_time: f64,
    final_time: Bounds,
    tau: Vec<f64>,
    variable_bounds: Vec<Bounds>,
    constraint_bounds: Vec<Bounds>,
    structure: Sparsity,
}

/// DAE outputs at one grid column and their central-difference sensitivities.
struct Sensitivity {
    /// State derivatives then path values.
    outputs: Vec<f64>,

    /// `∂outputs/∂column`, one row per output.
    by_column: DMatrix<f64>,

    /// `∂outputs/∂t`, present when the final time is free.
    by_time: Option<Vec<f64>>,
}

impl<'p, P: OptimalControlProblem> Trapezoidal<'p, P> {
    /// Builds the transcription on `num_points` grid points.
    ///
    /// # Errors
    ///
    /// Returns [`TranscriptionError::Bounds`] if the problem's layout is
    /// malformed, or [`TranscriptionError::TooFewPoints`] if
    /// `num_points < 2`.
    pub fn new(problem: &'p P, num_points: usize) -> Result<Self, TranscriptionError> {
        let layout = problem.layout();
        layout.validate()?;
        if num_points < 2 {
            return Err(TranscriptionError::TooFewPoints(num_points));
        }

        let time = layout.time();
        let mut transcription = Self {
            problem,
            num_points,
            num_states: layout.num_states(),
            num_controls: layout.num_controls(),
            num_path: layout.num_path_constraints(),
            initial_time: time.initial,
            final_time: time.final_bounds,
            tau: linspace(0.0, 1.0, num_points),
            variable_bounds: Vec::new(),
            constraint_bounds: Vec::new(),
            structure: Sparsity::new(0, 0),
        };
        transcription.variable_bounds = transcription.build_variable_bounds(layout);
        transcription.constraint_bounds = transcription.build_constraint_bounds(layout);
        transcription.structure = transcription.build_structure();
        Ok(transcription)
    }

    #[must_use]
    pub fn num_points(&self) -> usize {
        self.num_points
    }

    #[must_use]
    pub fn layout(&self) -> &Layout {
        self.problem.layout()
    }

    /// Returns `true` if the final time is a decision variable.
    #[must_use]
    pub fn has_free_final_time(&self) -> bool {
        !self.final_time.is_fixed()
    }

    /// Flattens an iterate into a decision vector.
    ///
    /// The iterate's columns map to grid points by index; its last time
    /// becomes the final-time variable when that is free.
    ///
    /// # Errors
    ///
    /// Returns [`TranscriptionError::Iterate`] if the iterate does not match
    /// the problem's channels, or [`TranscriptionError::GridSize`] if it has
    /// the wrong number of time points.
    pub fn construct_variables(&self, iterate: &Iterate) -> Result<Vec<f64>, TranscriptionError> {
        iterate.validate_against(self.layout())?;
        if iterate.num_times() != self.num_points {
            return Err(TranscriptionError::GridSize {
                expected: self.num_points,
                actual: iterate.num_times(),
            });
        }

        let mut x = Vec::with_capacity(self.variable_bounds.len());
        if self.has_free_final_time() {
            x.push(iterate.time()[self.num_points - 1]);
        }
        let (states, controls) = (iterate.states(), iterate.controls());
        for i in 0..self.num_points {
            x.extend((0..self.num_states).map(|r| states[(r, i)]));
            x.extend((0..self.num_controls).map(|r| controls[(r, i)]));
        }
        Ok(x)
    }

    /// Unflattens a decision vector into an iterate on this grid.
    ///
    /// # Panics
    ///
    /// Panics if `x` does not have one value per decision variable.
    #[must_use]
    pub fn deconstruct(&self, x: &[f64]) -> Iterate {
        assert_eq!(x.len(), self.variable_bounds.len(), "one value per variable");

        let n = self.num_points;
        let states = DMatrix::from_fn(self.num_states, n, |s, i| self.column(x, i)[s]);
        let controls =
            DMatrix::from_fn(self.num_controls, n, |c, i| self.column(x, i)[self.num_states + c]);
        let layout = self.layout();
        Iterate::from_parts(
            DVector::from_vec(self.times(self.final_time(x))),
            states,
            controls,
            layout.state_names(),
            layout.control_names(),
        )
    }

    fn width(&self) -> usize {
        self.num_states + self.num_controls
    }

    fn offset(&self) -> usize {
        usize::from(self.has_free_final_time())
    }

    fn column<'x>(&self, x: &'x [f64], i: usize) -> &'x [f64] {
        let start = self.offset() + i * self.width();
        &x[start..start + self.width()]
    }

    fn final_time(&self, x: &[f64]) -> f64 {
        if self.has_free_final_time() {
            x[0]
        } else {
            self.final_time.lower
        }
    }

    fn times(&self, final_time: f64) -> Vec<f64> {
        let span = final_time - self.initial_time;
        self.tau.iter().map(|tau| self.initial_time + tau * span).collect()
    }

    /// Trapezoidal quadrature weights on the grid.
    fn weights(times: &[f64]) -> Vec<f64> {
        let n = times.len();
        (0..n)
            .map(|i| {
                let before = if i > 0 { times[i] - times[i - 1] } else { 0.0 };
                let after = if i + 1 < n { times[i + 1] - times[i] } else { 0.0 };
                0.5 * (before + after)
            })
            .collect()
    }

    fn build_variable_bounds(&self, layout: &Layout) -> Vec<Bounds> {
        let n = self.num_points;
        let mut bounds = Vec::with_capacity(self.offset() + n * self.width());
        if self.has_free_final_time() {
            bounds.push(self.final_time);
        }
        for i in 0..n {
            let pick = |all: Bounds, initial: Option<Bounds>, last: Option<Bounds>| match i {
                0 => initial.unwrap_or(all),
                _ if i == n - 1 => last.unwrap_or(all),
                _ => all,
            };
            for s in layout.states() {
                bounds.push(pick(s.bounds, s.initial_bounds, s.final_bounds));
            }
            for c in layout.controls() {
                bounds.push(pick(c.bounds, c.initial_bounds, c.final_bounds));
            }
        }
        bounds
    }

    fn build_constraint_bounds(&self, layout: &Layout) -> Vec<Bounds> {
        let defects = (self.num_points - 1) * self.num_states;
        let mut bounds = vec![Bounds::fixed(0.0); defects];
        for _ in 0..self.num_points {
            bounds.extend(layout.path_constraints().iter().map(|p| p.bounds));
        }
        bounds
    }

    /// Builds the Jacobian structure in the order [`Self::jacobian`] fills it.
    fn build_structure(&self) -> Sparsity {
        let (n, s, w) = (self.num_points, self.num_states, self.width());
        let rows = (n - 1) * s + n * self.num_path;
        let cols = self.offset() + n * w;
        let mut structure = Sparsity::new(rows, cols);
        let free = self.has_free_final_time();
        let start = |i: usize| self.offset() + i * w;

        for i in 0..n - 1 {
            for state in 0..s {
                let row = i * s + state;
                if free {
                    structure.push(row, 0);
                }
                for k in 0..w {
                    structure.push(row, start(i) + k);
                }
                for k in 0..w {
                    structure.push(row, start(i + 1) + k);
                }
            }
        }
        for i in 0..n {
            for p in 0..self.num_path {
                let row = (n - 1) * s + i * self.num_path + p;
                if free {
                    structure.push(row, 0);
                }
                for k in 0..w {
                    structure.push(row, start(i) + k);
                }
            }
        }
        structure
    }

    /// Evaluates the DAE at one grid column.
    fn dae(&self, time: f64, column: &[f64]) -> Result<Vec<f64>, P::Error> {
        let (states, controls) = column.split_at(self.num_states);
        let mut outputs = vec![0.0; self.num_states + self.num_path];
        let (dynamics, path) = outputs.split_at_mut(self.num_states);
        self.problem.dynamics(
            &DaeInput {
                time,
                states,
                controls,
            },
            &mut DaeOutput { dynamics, path },
        )?;
        Ok(outputs)
    }

    fn integrand(&self, time: f64, column: &[f64]) -> Result<f64, P::Error> {
        let (states, controls) = column.split_at(self.num_states);
        self.problem.integral_cost(&DaeInput {
            time,
            states,
            controls,
        })
    }

    fn sensitivity(&self, time: f64, column: &[f64]) -> Result<Sensitivity, P::Error> {
        let outputs = self.dae(time, column)?;
        let mut by_column = DMatrix::zeros(outputs.len(), column.len());
        let mut perturbed = column.to_vec();
        for k in 0..column.len() {
            let h = step(column[k]);
            perturbed[k] = column[k] + h;
            let plus = self.dae(time, &perturbed)?;
            perturbed[k] = column[k] - h;
            let minus = self.dae(time, &perturbed)?;
            perturbed[k] = column[k];
            for (o, (p, m)) in plus.iter().zip(&minus).enumerate() {
                by_column[(o, k)] = (p - m) / (2.0 * h);
            }
        }

        let by_time = if self.has_free_final_time() {
            let h = step(time);
            let plus = self.dae(time + h, column)?;
            let minus = self.dae(time - h, column)?;
            Some(plus.iter().zip(&minus).map(|(p, m)| (p - m) / (2.0 * h)).collect())
        } else {
            None
        };

        Ok(Sensitivity {
            outputs,
            by_column,
            by_time,
        })
    }
}

/// Central-difference step for a variable of magnitude `value`.
fn step(value: f64) -> f64 {
    f64::EPSILON.cbrt() * value.abs().max(1.0)
}

impl<P: OptimalControlProblem> NlpProblem for Trapezoidal<'_, P> {
    type Error = P::Error;

    fn variable_bounds(&self) -> &[Bounds] {
        &self.variable_bounds
    }

    fn constraint_bounds(&self) -> &[Bounds] {
        &self.constraint_bounds
    }

    fn jacobian_structure(&self) -> &Sparsity {
        &self.structure
    }

    fn objective(&self, x: &[f64]) -> Result<f64, Self::Error> {
        let final_time = self.final_time(x);
        let times = self.times(final_time);
        let mut total = 0.0;
        for (i, weight) in Self::weights(&times).into_iter().enumerate() {
            total += weight * self.integrand(times[i], self.column(x, i))?;
        }
        let last = self.column(x, self.num_points - 1);
        total += self
            .problem
            .endpoint_cost(final_time, &last[..self.num_states])?;
        Ok(total)
    }

    fn gradient(&self, x: &[f64], grad: &mut [f64]) -> Result<(), Self::Error> {
        grad.fill(0.0);
        let final_time = self.final_time(x);
        let times = self.times(final_time);
        let weights = Self::weights(&times);
        let w = self.width();

        for i in 0..self.num_points {
            let column = self.column(x, i);
            let start = self.offset() + i * w;
            let mut perturbed = column.to_vec();
            for k in 0..w {
                let h = step(column[k]);
                perturbed[k] = column[k] + h;
                let plus = self.integrand(times[i], &perturbed)?;
                perturbed[k] = column[k] - h;
                let minus = self.integrand(times[i], &perturbed)?;
                perturbed[k] = column[k];
                grad[start + k] = weights[i] * (plus - minus) / (2.0 * h);
            }
        }

        let start = self.offset() + (self.num_points - 1) * w;
        let mut last = self.column(x, self.num_points - 1)[..self.num_states].to_vec();
        for s in 0..self.num_states {
            let value = last[s];
            let h = step(value);
            last[s] = value + h;
            let plus = self.problem.endpoint_cost(final_time, &last)?;
            last[s] = value - h;
            let minus = self.problem.endpoint_cost(final_time, &last)?;
            last[s] = value;
            grad[start + s] += (plus - minus) / (2.0 * h);
        }

        if self.has_free_final_time() {
            let h = step(x[0]);
            let mut shifted = x.to_vec();
            shifted[0] = x[0] + h;
            let plus = self.objective(&shifted)?;
            shifted[0] = x[0] - h;
            let minus = self.objective(&shifted)?;
            grad[0] = (plus - minus) / (2.0 * h);
        }
        Ok(())
    }

    fn constraints(&self, x: &[f64], g: &mut [f64]) -> Result<(), Self::Error> {
        let (n, s, p) = (self.num_points, self.num_states, self.num_path);
        let times = self.times(self.final_time(x));
        let outputs = (0..n)
            .map(|i| self.dae(times[i], self.column(x, i)))
            .collect::<Result<Vec<_>, _>>()?;

        for i in 0..n - 1 {
            let h = times[i + 1] - times[i];
            let (here, next) = (self.column(x, i), self.column(x, i + 1));
            for state in 0..s {
                g[i * s + state] = next[state]
                    - here[state]
                    - 0.5 * h * (outputs[i][state] + outputs[i + 1][state]);
            }
        }
        for (i, out) in outputs.iter().enumerate() {
            let row = (n - 1) * s + i * p;
            g[row..row + p].copy_from_slice(&out[s..]);
        }
        Ok(())
    }

    fn jacobian(&self, x: &[f64], values: &mut [f64]) -> Result<(), Self::Error> {
        let (n, s, w) = (self.num_points, self.num_states, self.width());
        let times = self.times(self.final_time(x));
        let sens = (0..n)
            .map(|i| self.sensitivity(times[i], self.column(x, i)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut k = 0;
        let mut put = |value: f64| {
            values[k] = value;
            k += 1;
        };

        for i in 0..n - 1 {
            let h = times[i + 1] - times[i];
            let dtau = self.tau[i + 1] - self.tau[i];
            let (a, b) = (&sens[i], &sens[i + 1]);
            for state in 0..s {
                if let (Some(da), Some(db)) = (&a.by_time, &b.by_time) {
                    put(-0.5 * dtau * (a.outputs[state] + b.outputs[state])
                        - 0.5 * h * (da[state] * self.tau[i] + db[state] * self.tau[i + 1]));
                }
                for var in 0..w {
                    let identity = if var == state { 1.0 } else { 0.0 };
                    put(-identity - 0.5 * h * a.by_column[(state, var)]);
                }
                for var in 0..w {
                    let identity = if var == state { 1.0 } else { 0.0 };
                    put(identity - 0.5 * h * b.by_column[(state, var)]);
                }
            }
        }
        for (i, sen) in sens.iter().enumerate() {
            for path in 0..self.num_path {
                let out = s + path;
                if let Some(dt) = &sen.by_time {
                    put(dt[out] * self.tau[i]);
                }
                for var in 0..w {
                    put(sen.by_column[(out, var)]);
                }
            }
        }
        Ok(())
    }
}
