//! Developer tooling: instance inspector, field summary, stats overlay text.
//!
//! # Invariants
//! - Tools only read the transform buffer; they never write to it.

mod inspector;
mod overlay;

pub use inspector::{FieldSummary, InstanceInfo, InstanceInspector};
pub use overlay::{StatsOverlay, StatsSnapshot};

pub fn crate_info() -> &'static str {
    "cubefield-tools v0.1.0"
}
