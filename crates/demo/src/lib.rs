//! Simulated walk through the lifecycle of a cross-chain swap: auction,
//! escrow deposit and secret reveal.
//!
//! [`state`] holds the pure state machine, [`scheduler`] drives it with a
//! timer.

pub mod scheduler;
pub mod state;

pub use {
    scheduler::Demo,
    state::{Action, DemoState, Phase, STEPS, TICK},
};
