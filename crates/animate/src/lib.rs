//! Frame updater: animate the visible, nearby part of the field each frame.
//!
//! # Invariants
//! - With rotation disabled a pass is O(1) and touches nothing.
//! - `updated + skipped` always equals the instance count.
//! - Skipped instances are byte-for-byte unchanged; updated ones keep their
//!   translation exactly.
//! - Changed blocks reach the [`MeshSink`] in increasing offset order, followed
//!   by a single flush.
//!
//! The pass is single-threaded and must finish before the renderer reads the
//! buffer for the frame.

mod camera;
mod frustum;
mod sink;
mod stats;
mod updater;

pub use camera::{CameraView, CullCamera};
pub use frustum::Frustum;
pub use sink::{MeshSink, NullSink, RecordingSink};
pub use stats::{FrameTimer, UpdateStats};
pub use updater::{DEGREES_PER_SECOND, FrameUpdater, UpdaterConfig, is_active};

pub fn crate_info() -> &'static str {
    "cubefield-animate v0.1.0"
}
