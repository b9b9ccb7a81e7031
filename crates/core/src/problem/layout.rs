use std::collections::HashSet;

use super::{Bounds, BoundsError};

/// Time horizon of a problem.
///
/// The initial time is fixed. The final time is fixed when its bounds
/// collapse to a single value and is otherwise a decision variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeInfo {
    pub initial: f64,
    pub final_bounds: Bounds,
}

impl TimeInfo {
    /// Returns `true` if the final time is a decision variable.
    #[must_use]
    pub fn is_final_free(&self) -> bool {
        !self.final_bounds.is_fixed()
    }
}

/// A declared state channel.
#[derive(Debug, Clone, PartialEq)]
pub struct StateInfo {
    pub name: String,

    /// Bounds applied on every grid column.
    pub bounds: Bounds,

    /// Replaces `bounds` on the first grid column, if present.
    pub initial_bounds: Option<Bounds>,

    /// Replaces `bounds` on the last grid column, if present.
    pub final_bounds: Option<Bounds>,
}

/// A declared control channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlInfo {
    pub name: String,
    pub bounds: Bounds,
    pub initial_bounds: Option<Bounds>,
    pub final_bounds: Option<Bounds>,
}

/// A declared algebraic path constraint, bounded on every grid column.
#[derive(Debug, Clone, PartialEq)]
pub struct PathConstraintInfo {
    pub name: String,
    pub bounds: Bounds,
}

/// The channels, bounds, and time horizon a problem declares.
///
/// Channel order is declaration order; it defines the order of the state and
/// control vectors passed to the problem and the row order of an
/// [`Iterate`](crate::Iterate).
///
/// # Example
///
/// ```
/// use trellis_core::{Bounds, Layout};
///
/// let layout = Layout::new(0.0, 1.0)
///     .state("x", [-1.5, 1.5], Bounds::fixed(0.0), None)
///     .state("v", [-10.0, 10.0], Bounds::fixed(0.0), Bounds::fixed(0.0))
///     .control("F", [-50.0, 50.0]);
///
/// assert_eq!(layout.num_states(), 2);
/// assert_eq!(layout.state_index("v"), Some(1));
/// assert!(layout.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    time: TimeInfo,
    states: Vec<StateInfo>,
    controls: Vec<ControlInfo>,
    path_constraints: Vec<PathConstraintInfo>,
}

impl Layout {
    /// Starts a layout with a fixed initial time and final-time bounds.
    ///
    /// Pass a plain `f64` (via [`Bounds::fixed`]) or a range to make the
    /// final time free.
    #[must_use]
    pub fn new(initial_time: f64, final_time: impl Into<FinalTime>) -> Self {
        Self {
            time: TimeInfo {
                initial: initial_time,
                final_bounds: final_time.into().0,
            },
            states: Vec::new(),
            controls: Vec::new(),
            path_constraints: Vec::new(),
        }
    }

    /// Declares a state channel.
    #[must_use]
    pub fn state(
        mut self,
        name: impl Into<String>,
        bounds: impl Into<Bounds>,
        initial_bounds: impl Into<Option<Bounds>>,
        final_bounds: impl Into<Option<Bounds>>,
    ) -> Self {
        self.states.push(StateInfo {
            name: name.into(),
            bounds: bounds.into(),
            initial_bounds: initial_bounds.into(),
            final_bounds: final_bounds.into(),
        });
        self
    }

    /// Declares a control channel bounded the same on every grid column.
    #[must_use]
    pub fn control(self, name: impl Into<String>, bounds: impl Into<Bounds>) -> Self {
        self.control_with_endpoints(name, bounds, None, None)
    }

    /// Declares a control channel with separate first/last column bounds.
    #[must_use]
    pub fn control_with_endpoints(
        mut self,
        name: impl Into<String>,
        bounds: impl Into<Bounds>,
        initial_bounds: impl Into<Option<Bounds>>,
        final_bounds: impl Into<Option<Bounds>>,
    ) -> Self {
        self.controls.push(ControlInfo {
            name: name.into(),
            bounds: bounds.into(),
            initial_bounds: initial_bounds.into(),
            final_bounds: final_bounds.into(),
        });
        self
    }

    /// Declares a path constraint.
    #[must_use]
    pub fn path_constraint(mut self, name: impl Into<String>, bounds: impl Into<Bounds>) -> Self {
        self.path_constraints.push(PathConstraintInfo {
            name: name.into(),
            bounds: bounds.into(),
        });
        self
    }

    #[must_use]
    pub fn time(&self) -> &TimeInfo {
        &self.time
    }

    #[must_use]
    pub fn states(&self) -> &[StateInfo] {
        &self.states
    }

    #[must_use]
    pub fn controls(&self) -> &[ControlInfo] {
        &self.controls
    }

    #[must_use]
    pub fn path_constraints(&self) -> &[PathConstraintInfo] {
        &self.path_constraints
    }

    #[must_use]
    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn num_controls(&self) -> usize {
        self.controls.len()
    }

    #[must_use]
    pub fn num_path_constraints(&self) -> usize {
        self.path_constraints.len()
    }

    /// Returns state names in declaration order.
    pub fn state_names(&self) -> impl Iterator<Item = &str> {
        self.states.iter().map(|s| s.name.as_str())
    }

    /// Returns control names in declaration order.
    pub fn control_names(&self) -> impl Iterator<Item = &str> {
        self.controls.iter().map(|c| c.name.as_str())
    }

    #[must_use]
    pub fn state_index(&self, name: &str) -> Option<usize> {
        self.states.iter().position(|s| s.name == name)
    }

    #[must_use]
    pub fn control_index(&self, name: &str) -> Option<usize> {
        self.controls.iter().position(|c| c.name == name)
    }

    /// Checks every declared bound and the channel names.
    ///
    /// # Errors
    ///
    /// Returns a [`BoundsError`] naming the first offending channel.
    pub fn validate(&self) -> Result<(), BoundsError> {
        let time = &self.time;
        time.final_bounds.check("final time")?;
        if !time.initial.is_finite() || time.final_bounds.lower <= time.initial {
            return Err(BoundsError::FinalTime {
                initial: time.initial,
                lower: time.final_bounds.lower,
                upper: time.final_bounds.upper,
            });
        }

        for s in &self.states {
            check_channel("state", &s.name, s.bounds, s.initial_bounds, s.final_bounds)?;
        }
        for c in &self.controls {
            check_channel("control", &c.name, c.bounds, c.initial_bounds, c.final_bounds)?;
        }
        for p in &self.path_constraints {
            p.bounds.check(format!("path constraint {}", p.name))?;
        }

        check_unique("state", self.state_names())?;
        check_unique("control", self.control_names())?;
        check_unique(
            "path constraint",
            self.path_constraints.iter().map(|p| p.name.as_str()),
        )
    }
}

/// Final time accepted by [`Layout::new`].
///
/// A plain value fixes the final time; bounds leave it free.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinalTime(pub Bounds);

impl From<f64> for FinalTime {
    fn from(value: f64) -> Self {
        Self(Bounds::fixed(value))
    }
}

impl From<Bounds> for FinalTime {
    fn from(bounds: Bounds) -> Self {
        Self(bounds)
    }
}

impl From<[f64; 2]> for FinalTime {
    fn from(bounds: [f64; 2]) -> Self {
        Self(bounds.into())
    }
}

fn check_channel(
    kind: &str,
    name: &str,
    bounds: Bounds,
    initial: Option<Bounds>,
    last: Option<Bounds>,
) -> Result<(), BoundsError> {
    bounds.check(format!("{kind} {name}"))?;
    if let Some(b) = initial {
        b.check(format!("initial value of {kind} {name}"))?;
    }
    if let Some(b) = last {
        b.check(format!("final value of {kind} {name}"))?;
    }
    Ok(())
}

fn check_unique<'a>(
    kind: &'static str,
    names: impl Iterator<Item = &'a str>,
) -> Result<(), BoundsError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(BoundsError::Duplicate {
                kind,
                name: name.to_owned(),
            });
        }
    }
    Ok(())
}
