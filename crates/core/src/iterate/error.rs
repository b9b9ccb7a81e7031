use ninterp::error::{InterpolateError, ValidateError};
use thiserror::Error;

/// Broad classes of [`IterateError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// An operation was invoked before a prerequisite was satisfied.
    Precondition,

    /// Array dimensions do not match.
    Shape,

    /// A channel name is not declared.
    UnknownChannel,

    /// A sequence that must be monotonic is not.
    Order,

    /// The interpolation backend rejected its input.
    Interpolation,
}

/// Errors raised while building, validating, or resampling an iterate.
///
/// Messages embed the expected and actual counts so callers can match them.
#[derive(Debug, Error)]
pub enum IterateError {
    #[error("cannot {operation}: time is empty")]
    EmptyTime { operation: &'static str },

    #[error("Expected value to have {expected} elements, but it has {actual} elements.")]
    ValueLength { expected: usize, actual: usize },

    #[error("State {0} does not exist.")]
    UnknownState(String),

    #[error("Control {0} does not exist.")]
    UnknownControl(String),

    #[error(
        "Expected {table} to have {rows} rows and {columns} columns, \
         but it has {actual_rows} rows and {actual_columns} columns."
    )]
    TableShape {
        table: &'static str,
        rows: usize,
        columns: usize,
        actual_rows: usize,
        actual_columns: usize,
    },

    #[error(
        "Expected time, states, and controls to have the same number of columns \
         (they have {time}, {states}, {controls} columns, respectively)."
    )]
    ColumnMismatch {
        time: usize,
        states: usize,
        controls: usize,
    },

    #[error(
        "Expected {kind} names {expected:?}, but the iterate has {actual:?} \
         (first difference at position {index})."
    )]
    ChannelNames {
        kind: &'static str,
        index: usize,
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("Expected {table} to have {expected} rows, but it has {actual} rows.")]
    RowMismatch {
        table: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Expected time to be non-decreasing, but time[{index}] = {value} follows {previous}.")]
    Order {
        index: usize,
        previous: f64,
        value: f64,
    },

    #[error("Expected at least 2 points to interpolate onto, but {requested} were requested.")]
    TooFewPoints { requested: usize },

    #[error(transparent)]
    Validate(#[from] ValidateError),

    #[error(transparent)]
    Interpolate(#[from] InterpolateError),
}

impl IterateError {
    /// Returns the class this error belongs to.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyTime { .. } => ErrorKind::Precondition,
            Self::ValueLength { .. }
            | Self::TableShape { .. }
            | Self::ColumnMismatch { .. }
            | Self::RowMismatch { .. }
            | Self::TooFewPoints { .. } => ErrorKind::Shape,
            Self::UnknownState(_) | Self::UnknownControl(_) | Self::ChannelNames { .. } => {
                ErrorKind::UnknownChannel
            }
            Self::Order { .. } => ErrorKind::Order,
            Self::Validate(_) | Self::Interpolate(_) => ErrorKind::Interpolation,
        }
    }
}
