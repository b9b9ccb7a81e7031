//! Time-indexed state and control trajectories.
//!
//! An [`Iterate`] is both the initial guess handed to a solve and the shape of
//! its result: a time grid plus one row per named state and control channel.

mod error;
mod interpolate;
mod names;
mod spline;
mod table;

#[cfg(test)]
mod tests;

pub use error::{ErrorKind, IterateError};
pub use interpolate::{Interpolation, linspace};
pub use table::TableError;

use nalgebra::{DMatrix, DVector, RowDVector};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Layout;
use names::Names;

/// Sampled trajectories of every state and control over a time grid.
///
/// `states` has one row per state name and `controls` one row per control
/// name; both have one column per time sample. A table stays empty until the
/// first channel is set, then holds zeros for channels not yet set.
///
/// # Example
///
/// ```
/// use trellis_core::Iterate;
///
/// let mut guess = Iterate::new(["x", "v"], ["F"]);
/// guess.set_time([0.0, 0.5, 1.0]);
/// guess.set_state_guess("x", &[0.0, 0.5, 1.0])?;
///
/// assert_eq!(guess.states().shape(), (2, 3));
/// assert_eq!(guess.state("v").unwrap()[1], 0.0);
/// # Ok::<(), trellis_core::IterateError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Iterate {
    time: DVector<f64>,
    states: DMatrix<f64>,
    controls: DMatrix<f64>,
    state_names: Names,
    control_names: Names,
}

impl Default for Iterate {
    fn default() -> Self {
        Self {
            time: DVector::zeros(0),
            states: DMatrix::zeros(0, 0),
            controls: DMatrix::zeros(0, 0),
            state_names: Names::default(),
            control_names: Names::default(),
        }
    }
}

impl Iterate {
    /// Creates an empty iterate with the given channels.
    ///
    /// Names are not checked for uniqueness here. With a repeated name,
    /// lookups by name resolve to its first row, and
    /// [`Iterate::validate_against`] rejects the iterate because a
    /// [`Layout`] never declares a name twice.
    pub fn new<S, C>(
        state_names: impl IntoIterator<Item = S>,
        control_names: impl IntoIterator<Item = C>,
    ) -> Self
    where
        S: Into<String>,
        C: Into<String>,
    {
        Self {
            state_names: Names::new(state_names),
            control_names: Names::new(control_names),
            ..Self::default()
        }
    }

    /// Assembles an iterate from its parts without checking consistency.
    ///
    /// Use [`Iterate::validate`] to check the shapes afterwards.
    pub fn from_parts<S, C>(
        time: DVector<f64>,
        states: DMatrix<f64>,
        controls: DMatrix<f64>,
        state_names: impl IntoIterator<Item = S>,
        control_names: impl IntoIterator<Item = C>,
    ) -> Self
    where
        S: Into<String>,
        C: Into<String>,
    {
        Self {
            time,
            states,
            controls,
            state_names: Names::new(state_names),
            control_names: Names::new(control_names),
        }
    }

    #[must_use]
    pub fn time(&self) -> &DVector<f64> {
        &self.time
    }

    #[must_use]
    pub fn states(&self) -> &DMatrix<f64> {
        &self.states
    }

    #[must_use]
    pub fn controls(&self) -> &DMatrix<f64> {
        &self.controls
    }

    #[must_use]
    pub fn state_names(&self) -> &[String] {
        self.state_names.as_slice()
    }

    #[must_use]
    pub fn control_names(&self) -> &[String] {
        self.control_names.as_slice()
    }

    /// Returns the number of time samples.
    #[must_use]
    pub fn num_times(&self) -> usize {
        self.time.len()
    }

    /// Returns the trajectory of a state, if the state exists and is stored.
    #[must_use]
    pub fn state(&self, name: &str) -> Option<RowDVector<f64>> {
        let row = self.state_names.index_of(name)?;
        (row < self.states.nrows()).then(|| self.states.row(row).into_owned())
    }

    /// Returns the trajectory of a control, if the control exists and is stored.
    #[must_use]
    pub fn control(&self, name: &str) -> Option<RowDVector<f64>> {
        let row = self.control_names.index_of(name)?;
        (row < self.controls.nrows()).then(|| self.controls.row(row).into_owned())
    }

    /// Replaces the time grid.
    ///
    /// Tables that hold no rows are resized to match; populated tables are
    /// left alone and must be reset to the new length channel by channel.
    pub fn set_time(&mut self, time: impl IntoIterator<Item = f64>) {
        self.time = DVector::from_vec(time.into_iter().collect());
        let n = self.time.len();
        if self.states.nrows() == 0 {
            self.states = DMatrix::zeros(0, n);
        }
        if self.controls.nrows() == 0 {
            self.controls = DMatrix::zeros(0, n);
        }
    }

    /// Sets the trajectory of one state.
    ///
    /// # Errors
    ///
    /// Checked in order:
    ///
    /// - [`IterateError::EmptyTime`] if no time grid is set.
    /// - [`IterateError::ValueLength`] if `values` and time differ in length.
    /// - [`IterateError::UnknownState`] if `name` is not a state.
    /// - [`IterateError::TableShape`] if the stored states table no longer
    ///   matches the channel count and time grid.
    pub fn set_state_guess(&mut self, name: &str, values: &[f64]) -> Result<(), IterateError> {
        self.check_guess("set a state guess", values)?;
        let row = self
            .state_names
            .index_of(name)
            .ok_or_else(|| IterateError::UnknownState(name.to_owned()))?;
        let table = prepare_table(
            &mut self.states,
            "states",
            self.state_names.len(),
            self.time.len(),
        )?;
        table.row_mut(row).copy_from_slice(values);
        Ok(())
    }

    /// Sets the trajectory of one control.
    ///
    /// # Errors
    ///
    /// As [`Iterate::set_state_guess`], with
    /// [`IterateError::UnknownControl`] for an unknown name.
    pub fn set_control_guess(&mut self, name: &str, values: &[f64]) -> Result<(), IterateError> {
        self.check_guess("set a control guess", values)?;
        let row = self
            .control_names
            .index_of(name)
            .ok_or_else(|| IterateError::UnknownControl(name.to_owned()))?;
        let table = prepare_table(
            &mut self.controls,
            "controls",
            self.control_names.len(),
            self.time.len(),
        )?;
        table.row_mut(row).copy_from_slice(values);
        Ok(())
    }

    fn check_guess(&self, operation: &'static str, values: &[f64]) -> Result<(), IterateError> {
        if self.time.is_empty() {
            return Err(IterateError::EmptyTime { operation });
        }
        if values.len() != self.time.len() {
            return Err(IterateError::ValueLength {
                expected: self.time.len(),
                actual: values.len(),
            });
        }
        Ok(())
    }

    /// Checks the table shapes against the expected channel counts.
    ///
    /// # Errors
    ///
    /// Checked in order:
    ///
    /// - [`IterateError::ColumnMismatch`] if time, states, and controls do
    ///   not share a column count.
    /// - [`IterateError::RowMismatch`] if the states or controls table has the
    ///   wrong number of rows.
    pub fn validate(&self, num_states: usize, num_controls: usize) -> Result<(), IterateError> {
        self.check_columns()?;
        check_rows("states", &self.states, num_states)?;
        check_rows("controls", &self.controls, num_controls)
    }

    /// Checks the table shapes and channel names against a problem's
    /// declared channels.
    ///
    /// Rows map to channels by position, so the names must match the
    /// layout's declaration order exactly.
    ///
    /// # Errors
    ///
    /// As [`Iterate::validate`] with the layout's channel counts, then
    /// [`IterateError::ChannelNames`] if the state or control names differ
    /// from the layout's.
    pub fn validate_against(&self, layout: &Layout) -> Result<(), IterateError> {
        self.validate(layout.num_states(), layout.num_controls())?;
        check_names("state", self.state_names(), layout.state_names())?;
        check_names("control", self.control_names(), layout.control_names())
    }

    fn check_columns(&self) -> Result<(), IterateError> {
        let time = self.time.len();
        let (states, controls) = (self.states.ncols(), self.controls.ncols());
        if states != time || controls != time {
            return Err(IterateError::ColumnMismatch {
                time,
                states,
                controls,
            });
        }
        Ok(())
    }
}

fn prepare_table<'a>(
    table: &'a mut DMatrix<f64>,
    name: &'static str,
    rows: usize,
    columns: usize,
) -> Result<&'a mut DMatrix<f64>, IterateError> {
    if table.nrows() == 0 {
        *table = DMatrix::zeros(rows, columns);
    } else if table.shape() != (rows, columns) {
        return Err(IterateError::TableShape {
            table: name,
            rows,
            columns,
            actual_rows: table.nrows(),
            actual_columns: table.ncols(),
        });
    }
    Ok(table)
}

fn check_rows(table: &'static str, values: &DMatrix<f64>, expected: usize) -> Result<(), IterateError> {
    if values.nrows() != expected {
        return Err(IterateError::RowMismatch {
            table,
            expected,
            actual: values.nrows(),
        });
    }
    Ok(())
}

fn check_names<'a>(
    kind: &'static str,
    actual: &[String],
    expected: impl Iterator<Item = &'a str>,
) -> Result<(), IterateError> {
    let expected: Vec<String> = expected.map(str::to_owned).collect();
    let first_difference = (0..actual.len().max(expected.len()))
        .find(|&i| actual.get(i).map(String::as_str) != expected.get(i).map(String::as_str));
    match first_difference {
        None => Ok(()),
        Some(index) => Err(IterateError::ChannelNames {
            kind,
            index,
            expected,
            actual: actual.to_vec(),
        }),
    }
}
