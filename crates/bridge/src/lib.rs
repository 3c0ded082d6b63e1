//! Display bridge: drives a viewer module through named JSON calls.
//!
//! The module behind the bridge is acquired lazily on first use and shared by
//! every later call. Payloads use named fields: points are `{x, y, z}`, faces
//! are `{a, b, c}`.
//!
//! # Invariants
//! - The module is loaded at most once, even under concurrent first use.
//! - A failed load is not remembered; the next call tries again.
//! - Disposing a bridge that never loaded its module does not load it.

pub mod bridge;
pub mod endpoint;
pub mod error;
pub mod wire;

pub use bridge::{DisplayBridge, FnLoader, ModuleLoader};
pub use endpoint::{ViewerEndpoint, ViewerModule};
pub use error::BridgeError;
pub use wire::{InitArgs, Method, mesh_from_json, mesh_to_json};

pub fn crate_info() -> &'static str {
    concat!("surfview-bridge v", env!("CARGO_PKG_VERSION"))
}
