//! Viewer input: window events reduced to a small set of actions.
//!
//! # Invariants
//! - Both render backends consume the same actions.
//! - Actions are queued in arrival order and drained once per frame.

pub mod action;

pub use action::{Action, ActionQueue};

pub fn crate_info() -> &'static str {
    concat!("surfview-input v", env!("CARGO_PKG_VERSION"))
}
