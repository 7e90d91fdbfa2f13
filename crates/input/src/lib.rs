//! Input actions.
//!
//! # Invariants
//! - Platform key and mouse events are translated to [`Action`]s at the app
//!   edge; nothing below the app sees raw input.
//! - Toggles only change through [`apply_toggle`].

pub mod action;

pub use action::{Action, apply_toggle};
