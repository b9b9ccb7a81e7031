//! Core types for Trellis, a direct-collocation trajectory optimizer.
//!
//! This crate defines the shared abstractions that transcriptions, solvers,
//! and user problems build on:
//!
//! - [`OptimalControlProblem`]: a user-implemented problem that declares its
//!   channels and bounds through a [`Layout`] and evaluates dynamics and costs
//! - [`Iterate`]: a time grid with named state and control trajectories, used
//!   both as an initial guess and as a solution
//! - [`Observer`]: receives solver events and optionally returns control actions

mod observer;

pub mod iterate;
pub mod problem;

pub use iterate::{ErrorKind, Interpolation, Iterate, IterateError, TableError};
pub use observer::Observer;
pub use problem::{
    Bounds, BoundsError, DaeInput, DaeOutput, Layout, OptimalControlProblem,
};
