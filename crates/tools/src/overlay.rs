use std::time::Duration;

use cubefield_animate::UpdateStats;
use cubefield_common::FrameToggles;
use glam::Vec3;

/// Everything the stats overlay shows for one frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsSnapshot {
    pub fps: f32,
    pub instances: usize,
    pub camera_position: Vec3,
    pub update: UpdateStats,
    /// Average update-pass time over the recent window.
    pub update_average: Duration,
}

/// Builds the text lines drawn by the desktop overlay and printed by the CLI.
#[derive(Debug, Default)]
pub struct StatsOverlay;

impl StatsOverlay {
    pub fn new() -> Self {
        Self
    }

    /// The controls line. Always shown, even with stats hidden.
    pub fn help_line(&self, toggles: &FrameToggles) -> String {
        format!(
            "WASD + mouse drag: camera, F1: Toggle stats, SPACE: Toggle rotation. rotation={}",
            toggles.rotation_enabled
        )
    }

    /// Lines for the current frame. Only the help line when stats are hidden.
    pub fn lines(&self, snapshot: &StatsSnapshot, toggles: &FrameToggles) -> Vec<String> {
        let mut out = vec![self.help_line(toggles)];
        if !toggles.stats_visible {
            return out;
        }

        let p = snapshot.camera_position;
        out.push(format!(
            "Camera Position: x:{} y:{} z:{}",
            p.x.round() as i64,
            p.y.round() as i64,
            p.z.round() as i64
        ));
        out.push(format!(
            "FPS: {:.0} Instances: {}",
            snapshot.fps, snapshot.instances
        ));
        out.push(format!(
            "Updated: {} Skipped: {} Update: {:.2}ms (avg {:.2}ms)",
            snapshot.update.updated,
            snapshot.update.skipped,
            snapshot.update.elapsed.as_secs_f64() * 1000.0,
            snapshot.update_average.as_secs_f64() * 1000.0,
        ));
        out
    }
}
