use cubefield_animate::UpdateStats;
use cubefield_common::{FieldConfig, GridCoord, TransformBuffer, block_offset, grid};
use glam::{Quat, Vec3};

/// Read-only queries against the transform buffer, for debugging and the CLI.
pub struct InstanceInspector;

impl InstanceInspector {
    /// Summarize the field and the last update pass.
    pub fn summary(config: &FieldConfig, buffer: &TransformBuffer, last: &UpdateStats) -> FieldSummary {
        FieldSummary {
            side_count: config.side_count,
            instances: buffer.instance_count(),
            floats: buffer.len(),
            bytes: buffer.as_bytes().len(),
            culling_distance: config.culling_distance(),
            last_updated: last.updated,
            last_skipped: last.skipped,
        }
    }

    /// Look up the instance stored at `index`.
    pub fn inspect(buffer: &TransformBuffer, side_count: u32, index: usize) -> Option<InstanceInfo> {
        if index >= buffer.instance_count() {
            return None;
        }
        let (scale, rotation, position) = buffer.transform(index).to_scale_rotation_translation();
        Some(InstanceInfo {
            index,
            offset: block_offset(index),
            coord: grid::grid_coord(index, side_count),
            position,
            rotation,
            scale,
        })
    }

    /// Look up the instance at a 1-indexed grid coordinate.
    pub fn inspect_coord(
        buffer: &TransformBuffer,
        side_count: u32,
        coord: GridCoord,
    ) -> Option<InstanceInfo> {
        if !coord.in_grid(side_count) {
            return None;
        }
        Self::inspect(buffer, side_count, grid::instance_index(coord, side_count))
    }
}

/// Summary of the field for the inspector.
#[derive(Debug, Clone)]
pub struct FieldSummary {
    pub side_count: u32,
    pub instances: usize,
    pub floats: usize,
    pub bytes: usize,
    pub culling_distance: f32,
    pub last_updated: usize,
    pub last_skipped: usize,
}

impl std::fmt::Display for FieldSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Field: side={} instances={} floats={} bytes={} cull={:.1} updated={} skipped={}",
            self.side_count,
            self.instances,
            self.floats,
            self.bytes,
            self.culling_distance,
            self.last_updated,
            self.last_skipped,
        )
    }
}

/// Detailed info about a single instance.
#[derive(Debug, Clone)]
pub struct InstanceInfo {
    pub index: usize,
    /// Float offset of the instance block.
    pub offset: usize,
    pub coord: GridCoord,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl std::fmt::Display for InstanceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (axis, angle) = self.rotation.to_axis_angle();
        write!(
            f,
            "Instance #{} @({}, {}, {}) offset={} pos=({:.2}, {:.2}, {:.2}) rot={:.1}deg about ({:.2}, {:.2}, {:.2})",
            self.index,
            self.coord.x,
            self.coord.y,
            self.coord.z,
            self.offset,
            self.position.x,
            self.position.y,
            self.position.z,
            angle.to_degrees(),
            axis.x,
            axis.y,
            axis.z,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;

    fn field() -> (FieldConfig, TransformBuffer) {
        let config = FieldConfig {
            side_count: 3,
            spacing: 1.0,
            box_size: 1.0,
            ..FieldConfig::default()
        };
        let buffer = cubefield_layout::generate_field(&config, &Mat4::IDENTITY);
        (config, buffer)
    }

    #[test]
    fn summary_counts() {
        let (config, buffer) = field();
        let summary = InstanceInspector::summary(&config, &buffer, &UpdateStats::idle(27));
        assert_eq!(summary.instances, 27);
        assert_eq!(summary.floats, 432);
        assert_eq!(summary.bytes, 432 * 4);
        assert_eq!(summary.last_skipped, 27);
    }

    #[test]
    fn inspect_centre_by_coord() {
        let (_, buffer) = field();
        let info = InstanceInspector::inspect_coord(&buffer, 3, GridCoord::new(2, 2, 2)).unwrap();
        assert_eq!(info.index, 13);
        assert_eq!(info.offset, 208);
        assert_eq!(info.position, Vec3::splat(2.0));
        assert!(info.scale.abs_diff_eq(Vec3::ONE, 1e-5));
    }

    #[test]
    fn inspect_by_index_reports_coord() {
        let (_, buffer) = field();
        let info = InstanceInspector::inspect(&buffer, 3, 0).unwrap();
        assert_eq!(info.coord, GridCoord::new(1, 1, 1));
        assert_eq!(info.position, Vec3::ONE);
    }

    #[test]
    fn inspect_out_of_range() {
        let (_, buffer) = field();
        assert!(InstanceInspector::inspect(&buffer, 3, 27).is_none());
        assert!(InstanceInspector::inspect_coord(&buffer, 3, GridCoord::new(0, 1, 1)).is_none());
        assert!(InstanceInspector::inspect_coord(&buffer, 3, GridCoord::new(4, 1, 1)).is_none());
    }

    #[test]
    fn display_formats() {
        let (config, buffer) = field();
        let summary = InstanceInspector::summary(&config, &buffer, &UpdateStats::default());
        assert!(format!("{summary}").contains("instances=27"));
        let info = InstanceInspector::inspect(&buffer, 3, 13).unwrap();
        assert!(format!("{info}").contains("@(2, 2, 2)"));
    }
}
