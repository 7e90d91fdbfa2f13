//! Shared types for the cubefield workspace.
//!
//! # Invariants
//! - A [`TransformBuffer`] always holds exactly `instance_count * 16` floats.
//! - Blocks are stored transposed (translation at offsets 3, 7, 11); only the
//!   routines in [`buffer`] know the element order.
//! - Instance order is x outer, y middle, z inner over a 1-indexed grid.

pub mod buffer;
pub mod config;
pub mod error;
pub mod grid;
pub mod toggles;

pub use buffer::{BLOCK_LEN, TRANSLATION_OFFSETS, TransformBuffer, block_offset};
pub use config::{FieldConfig, Platform, RotationPolicy};
pub use error::{BufferError, ConfigError};
pub use grid::{GridCoord, grid_coord, instance_count, instance_index};
pub use toggles::FrameToggles;

pub fn crate_info() -> &'static str {
    "cubefield-common v0.1.0"
}
