/// Per-frame switches flipped by input and read by the updater and stats overlay.
///
/// Owned by the application state and passed by reference; there is no global copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameToggles {
    pub rotation_enabled: bool,
    pub stats_visible: bool,
}

impl Default for FrameToggles {
    fn default() -> Self {
        Self {
            rotation_enabled: false,
            stats_visible: true,
        }
    }
}

impl FrameToggles {
    pub fn toggle_rotation(&mut self) {
        self.rotation_enabled = !self.rotation_enabled;
    }

    pub fn toggle_stats(&mut self) {
        self.stats_visible = !self.stats_visible;
    }
}
