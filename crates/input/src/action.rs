use cubefield_common::FrameToggles;
use glam::Vec3;

/// A high-level request produced by the desktop key and mouse handlers.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Move the camera by a local-space direction (x right, y up, z forward),
    /// scaled by the camera speed and frame time.
    Move(Vec3),
    /// Turn the camera by a mouse delta in pixels.
    Look { dx: f32, dy: f32 },
    /// Start or stop animating the field.
    ToggleRotation,
    /// Show or hide the stats overlay.
    ToggleStats,
    /// Unbound input.
    Noop,
}

/// Apply `action` to `toggles` if it is a toggle. Returns whether anything changed.
pub fn apply_toggle(toggles: &mut FrameToggles, action: &Action) -> bool {
    match action {
        Action::ToggleRotation => {
            toggles.toggle_rotation();
            tracing::info!(enabled = toggles.rotation_enabled, "rotation toggled");
            true
        }
        Action::ToggleStats => {
            toggles.toggle_stats();
            tracing::debug!(visible = toggles.stats_visible, "stats toggled");
            true
        }
        Action::Move(_) | Action::Look { .. } | Action::Noop => false,
    }
}
