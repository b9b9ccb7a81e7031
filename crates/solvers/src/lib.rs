//! Direct-collocation trajectory optimization for Trellis problems.
//!
//! - [`collocation`]: the driver that validates a guess, transcribes a
//!   problem, and solves it
//! - [`transcription`]: collocation schemes that turn a problem into a
//!   nonlinear program
//! - [`nlp`]: the nonlinear programming contract and the built-in
//!   interior-point backend

pub mod collocation;
pub mod nlp;
pub mod transcription;

pub use collocation::{DirectCollocation, Phase, Solution};
