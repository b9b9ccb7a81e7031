use std::cmp::Ordering;

use nalgebra::{DMatrix, DVector};
use ndarray::Array1;
use ninterp::{
    interpolator::Extrapolate,
    prelude::{Interp1DOwned, Interpolator},
    strategy::Linear,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{Iterate, IterateError, spline::CubicSpline};

/// Scheme used to resample trajectories onto a new time grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Interpolation {
    /// Natural cubic spline through each row.
    #[default]
    CubicSpline,

    /// Piecewise-linear interpolation between neighboring samples.
    Linear,
}

impl Iterate {
    /// Resamples onto `num_points` uniformly spaced times spanning the
    /// current first and last times, using a natural cubic spline.
    ///
    /// Returns an identical copy if `num_points` equals the current number of
    /// times.
    ///
    /// # Errors
    ///
    /// See [`Iterate::interpolate_with`].
    pub fn interpolate(&self, num_points: usize) -> Result<Self, IterateError> {
        self.interpolate_with(num_points, Interpolation::default())
    }

    /// Resamples onto `num_points` uniformly spaced times with the given
    /// scheme.
    ///
    /// Duplicate timestamps are allowed; the last sample at a repeated time
    /// is the one interpolated through.
    ///
    /// # Errors
    ///
    /// - [`IterateError::Order`] if time decreases anywhere.
    /// - [`IterateError::EmptyTime`] if there are no times to resample.
    /// - [`IterateError::TooFewPoints`] if `num_points < 2`.
    /// - [`IterateError::ColumnMismatch`] if a table disagrees
    ///   with the time grid.
    pub fn interpolate_with(
        &self,
        num_points: usize,
        method: Interpolation,
    ) -> Result<Self, IterateError> {
        check_non_decreasing(self.time.as_slice())?;

        if num_points == self.time.len() {
            return Ok(self.clone());
        }
        if self.time.is_empty() {
            return Err(IterateError::EmptyTime {
                operation: "interpolate",
            });
        }
        if num_points < 2 {
            return Err(IterateError::TooFewPoints {
                requested: num_points,
            });
        }
        self.check_columns()?;

        let knots = Knots::new(self.time.as_slice());
        let first = self.time[0];
        let last = self.time[self.time.len() - 1];
        let time = linspace(first, last, num_points);

        let states = resample_rows(&self.states, &knots, &time, method)?;
        let controls = resample_rows(&self.controls, &knots, &time, method)?;

        Ok(Self {
            time: DVector::from_vec(time),
            states,
            controls,
            state_names: self.state_names.clone(),
            control_names: self.control_names.clone(),
        })
    }
}

/// Returns `n` evenly spaced values from `start` to `end` inclusive.
///
/// The last value is exactly `end`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let span = end - start;
            let intervals = (n - 1) as f64;
            (0..n)
                .map(|i| {
                    if i == n - 1 {
                        end
                    } else {
                        start + span * (i as f64) / intervals
                    }
                })
                .collect()
        }
    }
}

pub(super) fn check_non_decreasing(time: &[f64]) -> Result<(), IterateError> {
    for (index, pair) in time.windows(2).enumerate() {
        let (previous, value) = (pair[0], pair[1]);
        if matches!(value.partial_cmp(&previous), Some(Ordering::Less) | None) {
            return Err(IterateError::Order {
                index: index + 1,
                previous,
                value,
            });
        }
    }
    Ok(())
}

/// Strictly increasing knot times and the source column behind each.
struct Knots {
    x: Vec<f64>,
    columns: Vec<usize>,
}

impl Knots {
    /// Collapses runs of equal times to their last column.
    #[allow(clippy::float_cmp)]
    fn new(time: &[f64]) -> Self {
        let mut x = Vec::with_capacity(time.len());
        let mut columns = Vec::with_capacity(time.len());
        for (i, &t) in time.iter().enumerate() {
            if time.get(i + 1) == Some(&t) {
                continue;
            }
            x.push(t);
            columns.push(i);
        }
        Self { x, columns }
    }
}

fn resample_rows(
    table: &DMatrix<f64>,
    knots: &Knots,
    at: &[f64],
    method: Interpolation,
) -> Result<DMatrix<f64>, IterateError> {
    let mut out = DMatrix::zeros(table.nrows(), at.len());
    for row in 0..table.nrows() {
        let y: Vec<f64> = knots.columns.iter().map(|&col| table[(row, col)]).collect();
        let values = resample(&knots.x, &y, at, method)?;
        for (col, value) in values.into_iter().enumerate() {
            out[(row, col)] = value;
        }
    }
    Ok(out)
}

fn resample(
    x: &[f64],
    y: &[f64],
    at: &[f64],
    method: Interpolation,
) -> Result<Vec<f64>, IterateError> {
    // A single distinct time leaves nothing to interpolate between.
    if x.len() == 1 {
        return Ok(vec![y[0]; at.len()]);
    }

    match method {
        Interpolation::CubicSpline => {
            let spline = CubicSpline::new(x, y);
            Ok(at.iter().map(|&t| spline.evaluate(t)).collect())
        }
        Interpolation::Linear => {
            let interp = Interp1DOwned::new(
                Array1::from(x.to_vec()),
                Array1::from(y.to_vec()),
                Linear,
                Extrapolate::Clamp,
            )?;
            at.iter()
                .map(|&t| interp.interpolate(&[t]).map_err(IterateError::from))
                .collect()
        }
    }
}
