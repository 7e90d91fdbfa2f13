use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::grid;

/// How the layout generator picks each instance's initial rotation axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationPolicy {
    /// Uniformly among X, Y and Z.
    #[default]
    AnyCardinal,
    /// Always about Y. Gives a more uniform look under PBR lighting.
    YOnly,
}

/// Hardware class the field is sized for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// 101 per axis, a little over a million instances.
    Desktop,
    /// 29 per axis for low-end GPUs.
    Compact,
}

impl Platform {
    /// Per-axis instance count. Always odd so a camera at the field centre
    /// sits between instances rather than inside one.
    pub fn side_count(self) -> u32 {
        match self {
            Platform::Desktop => 101,
            Platform::Compact => 29,
        }
    }
}

/// Field configuration, read once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Instances per axis. Must be odd.
    pub side_count: u32,
    /// Gap between neighbouring instances, in multiples of `box_size`.
    pub spacing: f32,
    /// Edge length of the instanced mesh.
    pub box_size: f32,
    /// Culling distance as a fraction of the camera far plane.
    pub culling_fraction: f32,
    pub rotation_policy: RotationPolicy,
    /// Seed for the initial rotations.
    pub seed: u64,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self::for_platform(Platform::Desktop)
    }
}

impl FieldConfig {
    pub fn for_platform(platform: Platform) -> Self {
        Self {
            side_count: platform.side_count(),
            spacing: 5.0,
            box_size: 2.0,
            culling_fraction: 0.25,
            rotation_policy: RotationPolicy::default(),
            seed: 42,
        }
    }

    pub fn desktop() -> Self {
        Self::for_platform(Platform::Desktop)
    }

    pub fn compact() -> Self {
        Self::for_platform(Platform::Compact)
    }

    /// Check every field against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.side_count == 0 || self.side_count % 2 == 0 {
            return Err(ConfigError::InvalidSideCount(self.side_count));
        }
        if !is_positive(self.spacing) {
            return Err(ConfigError::NonPositive {
                field: "spacing",
                value: self.spacing,
            });
        }
        if !is_positive(self.box_size) {
            return Err(ConfigError::NonPositive {
                field: "box_size",
                value: self.box_size,
            });
        }
        if !is_positive(self.culling_fraction) || self.culling_fraction > 1.0 {
            return Err(ConfigError::CullingFraction(self.culling_fraction));
        }
        Ok(())
    }

    /// Load and validate a JSON config file. Missing fields take desktop defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        let config: Self = serde_json::from_reader(std::io::BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    pub fn instance_count(&self) -> usize {
        grid::instance_count(self.side_count)
    }

    /// Distance between neighbouring grid cells.
    pub fn pitch(&self) -> f32 {
        self.box_size * self.spacing
    }

    /// Edge length of the whole field.
    pub fn field_extent(&self) -> f32 {
        self.side_count as f32 * self.pitch()
    }

    /// Point the camera starts at.
    pub fn field_center(&self) -> Vec3 {
        Vec3::splat(self.field_extent() / 2.0)
    }

    /// Far plane that keeps the whole field in range from its centre.
    pub fn camera_far(&self) -> f32 {
        self.field_extent() * 2.0
    }

    /// Instances further than this from the camera are not animated.
    pub fn culling_distance(&self) -> f32 {
        self.culling_fraction * self.camera_far()
    }

    /// Radius of the sphere used for the frustum test.
    pub fn bounding_radius(&self) -> f32 {
        self.box_size * 2.0
    }
}

/// False for zero, negatives and NaN.
fn is_positive(value: f32) -> bool {
    value > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desktop_defaults() {
        let config = FieldConfig::default();
        assert_eq!(config.side_count, 101);
        assert_eq!(config.instance_count(), 1_030_301);
        assert_eq!(config.rotation_policy, RotationPolicy::AnyCardinal);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn compact_profile_is_odd() {
        let config = FieldConfig::compact();
        assert_eq!(config.side_count, 29);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn derived_camera_values() {
        let config = FieldConfig {
            side_count: 3,
            spacing: 5.0,
            box_size: 2.0,
            ..FieldConfig::default()
        };
        assert_eq!(config.field_extent(), 30.0);
        assert_eq!(config.field_center(), Vec3::splat(15.0));
        assert_eq!(config.camera_far(), 60.0);
        assert_eq!(config.culling_distance(), 15.0);
        assert_eq!(config.bounding_radius(), 4.0);
    }

    #[test]
    fn rejects_even_side_count() {
        let config = FieldConfig {
            side_count: 4,
            ..FieldConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSideCount(4))
        ));
    }

    #[test]
    fn rejects_zero_side_count() {
        let config = FieldConfig {
            side_count: 0,
            ..FieldConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_non_positive_spacing() {
        let config = FieldConfig {
            spacing: 0.0,
            ..FieldConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive { field: "spacing", .. })
        ));
    }

    #[test]
    fn rejects_nan_box_size() {
        let config = FieldConfig {
            box_size: f32::NAN,
            ..FieldConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_culling_fraction_out_of_range() {
        for fraction in [0.0, -0.5, 1.5] {
            let config = FieldConfig {
                culling_fraction: fraction,
                ..FieldConfig::default()
            };
            assert!(config.validate().is_err(), "accepted {fraction}");
        }
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("field.json");
        let config = FieldConfig {
            side_count: 9,
            rotation_policy: RotationPolicy::YOnly,
            seed: 7,
            ..FieldConfig::compact()
        };
        config.save(&path).unwrap();
        let loaded = FieldConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn load_fills_missing_fields_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(&path, r#"{ "side_count": 11, "rotation_policy": "y_only" }"#).unwrap();
        let loaded = FieldConfig::load(&path).unwrap();
        assert_eq!(loaded.side_count, 11);
        assert_eq!(loaded.rotation_policy, RotationPolicy::YOnly);
        assert_eq!(loaded.spacing, 5.0);
    }

    #[test]
    fn load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{ "side_count": 10 }"#).unwrap();
        assert!(matches!(
            FieldConfig::load(&path),
            Err(ConfigError::InvalidSideCount(10))
        ));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = FieldConfig::load(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
