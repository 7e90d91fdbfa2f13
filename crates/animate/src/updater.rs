use std::time::Instant;

use cubefield_common::buffer::{BLOCK_LEN, pack, unpack};
use cubefield_common::{FieldConfig, FrameToggles, TransformBuffer, block_offset};
use glam::{Mat4, Vec3};

use crate::camera::CullCamera;
use crate::sink::MeshSink;
use crate::stats::{FrameTimer, UpdateStats};

/// Default angular speed of animated instances.
pub const DEGREES_PER_SECOND: f32 = 45.0;

/// Gating and animation parameters for [`FrameUpdater`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdaterConfig {
    /// Instances further than this from the camera are skipped even if visible.
    pub culling_distance: f32,
    /// Radius of the sphere tested against the frustum.
    pub bounding_radius: f32,
    pub degrees_per_second: f32,
}

impl UpdaterConfig {
    pub fn from_field(config: &FieldConfig) -> Self {
        Self {
            culling_distance: config.culling_distance(),
            bounding_radius: config.bounding_radius(),
            degrees_per_second: DEGREES_PER_SECOND,
        }
    }
}

/// Whether an instance at `position` is animated this frame: within
/// `max_distance` of the camera and with its bounding sphere in the frustum.
/// A negative `max_distance` culls everything.
#[inline]
pub fn is_active<C: CullCamera + ?Sized>(
    camera: &C,
    position: Vec3,
    radius: f32,
    max_distance: f32,
) -> bool {
    max_distance >= 0.0
        && position.distance_squared(camera.position()) <= max_distance * max_distance
        && camera.sphere_intersects(position, radius)
}

/// Rotates the active subset of the field once per frame.
///
/// Owns the scratch block every rewritten instance passes through, so the pass
/// allocates nothing per instance.
#[derive(Debug)]
pub struct FrameUpdater {
    config: UpdaterConfig,
    scratch: [f32; BLOCK_LEN],
    timer: FrameTimer,
    last: UpdateStats,
}

impl FrameUpdater {
    pub fn new(config: UpdaterConfig) -> Self {
        Self {
            config,
            scratch: [0.0; BLOCK_LEN],
            timer: FrameTimer::default(),
            last: UpdateStats::default(),
        }
    }

    pub fn config(&self) -> &UpdaterConfig {
        &self.config
    }

    pub fn set_culling_distance(&mut self, distance: f32) {
        self.config.culling_distance = distance;
    }

    /// Stats from the most recent call to [`update`](Self::update).
    pub fn last_stats(&self) -> UpdateStats {
        self.last
    }

    /// Durations of recent passes that actually ran.
    pub fn timer(&self) -> &FrameTimer {
        &self.timer
    }

    /// Run one update pass.
    ///
    /// With rotation disabled this returns at once without touching `buffer`
    /// or `sink`. Otherwise every instance is gated by [`is_active`]; each
    /// active one is turned by `degrees_per_second * delta_time` about X (even
    /// index) or Z (odd index), in its local frame, and its new block is
    /// written back to `buffer` and forwarded to `sink`. Translation is
    /// preserved exactly. `sink.flush()` is called once at the end.
    pub fn update<C, S>(
        &mut self,
        buffer: &mut TransformBuffer,
        camera: &C,
        toggles: &FrameToggles,
        delta_time: f32,
        sink: &mut S,
    ) -> UpdateStats
    where
        C: CullCamera + ?Sized,
        S: MeshSink + ?Sized,
    {
        let count = buffer.instance_count();
        if !toggles.rotation_enabled {
            self.last = UpdateStats::idle(count);
            return self.last;
        }

        let _span = tracing::info_span!("frame_update", instances = count).entered();
        let start = Instant::now();

        let angle = self.config.degrees_per_second.to_radians() * delta_time;
        let about_x = Mat4::from_rotation_x(angle);
        let about_z = Mat4::from_rotation_z(angle);
        let radius = self.config.bounding_radius;
        let max_distance = self.config.culling_distance;

        let mut updated = 0;
        for i in 0..count {
            let position = buffer.position(i);
            if !is_active(camera, position, radius, max_distance) {
                continue;
            }

            let increment = if i % 2 == 0 { &about_x } else { &about_z };
            let block = buffer.block_mut(i);
            let mut matrix = unpack(block) * *increment;
            matrix.w_axis = position.extend(1.0);
            pack(&matrix, &mut self.scratch);
            block.copy_from_slice(&self.scratch);
            sink.update_partial(block_offset(i), &self.scratch);
            updated += 1;
        }
        sink.flush();

        let elapsed = start.elapsed();
        self.timer.record(elapsed);
        self.last = UpdateStats {
            updated,
            skipped: count - updated,
            elapsed,
        };

        tracing::trace!(
            updated,
            skipped = count - updated,
            elapsed = ?elapsed,
            "frame update complete"
        );

        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraView;
    use crate::sink::{NullSink, RecordingSink};
    use cubefield_common::{GridCoord, RotationPolicy, grid::instance_index};

    const ROTATING: FrameToggles = FrameToggles {
        rotation_enabled: true,
        stats_visible: true,
    };

    /// 3x3x3 field with unit spacing and size: positions span 1..=3 on each axis.
    fn three_cube() -> TransformBuffer {
        let config = FieldConfig {
            side_count: 3,
            spacing: 1.0,
            box_size: 1.0,
            seed: 11,
            rotation_policy: RotationPolicy::AnyCardinal,
            ..FieldConfig::default()
        };
        cubefield_layout::generate_field(&config, &Mat4::IDENTITY)
    }

    fn updater(culling_distance: f32) -> FrameUpdater {
        FrameUpdater::new(UpdaterConfig {
            culling_distance,
            bounding_radius: 2.0,
            degrees_per_second: DEGREES_PER_SECOND,
        })
    }

    /// In front of the field, looking along +Z through its middle.
    fn facing_field() -> CameraView {
        CameraView::look_at(
            Vec3::new(2.0, 2.0, -5.0),
            Vec3::new(2.0, 2.0, 2.0),
            90.0_f32.to_radians(),
            1.0,
            0.1,
            100.0,
        )
    }

    /// Same spot, looking away from the field.
    fn facing_away() -> CameraView {
        CameraView::look_at(
            Vec3::new(2.0, 2.0, -5.0),
            Vec3::new(2.0, 2.0, -10.0),
            90.0_f32.to_radians(),
            1.0,
            0.1,
            100.0,
        )
    }

    #[test]
    fn disabled_rotation_is_a_no_op() {
        let mut buf = three_cube();
        let before = buf.clone();
        let mut sink = RecordingSink::new();
        let mut up = updater(100.0);

        let stats = up.update(&mut buf, &facing_field(), &FrameToggles::default(), 1.0, &mut sink);

        assert_eq!(stats.updated, 0);
        assert_eq!(stats.skipped, 27);
        assert_eq!(buf.as_bytes(), before.as_bytes());
        assert!(sink.patches().is_empty());
        assert_eq!(sink.flushes(), 0);
        assert_eq!(up.timer().count(), 0);
    }

    #[test]
    fn camera_facing_away_updates_nothing() {
        let mut buf = three_cube();
        let before = buf.clone();
        let mut sink = RecordingSink::new();

        let stats = updater(100.0).update(&mut buf, &facing_away(), &ROTATING, 1.0, &mut sink);

        assert_eq!(stats.updated, 0);
        assert_eq!(stats.skipped, 27);
        assert_eq!(buf, before);
        assert!(sink.patches().is_empty());
        assert_eq!(sink.flushes(), 1);
    }

    #[test]
    fn whole_field_in_view_updates_everything() {
        let mut buf = three_cube();
        let mut sink = RecordingSink::new();

        let stats = updater(100.0).update(&mut buf, &facing_field(), &ROTATING, 0.1, &mut sink);

        assert_eq!(stats.updated, 27);
        assert_eq!(stats.skipped, 0);
        assert_eq!(sink.patches().len(), 27);
    }

    /// Sees every point; only the distance gate decides.
    struct Omniscient(Vec3);

    impl CullCamera for Omniscient {
        fn position(&self) -> Vec3 {
            self.0
        }

        fn sphere_intersects(&self, _center: Vec3, _radius: f32) -> bool {
            true
        }
    }

    #[test]
    fn negative_culling_distance_culls_everything() {
        let cam = Omniscient(Vec3::ZERO);
        assert!(!is_active(&cam, Vec3::new(3.0, 0.0, 0.0), 1.0, -5.0));
        assert!(!is_active(&cam, Vec3::ZERO, 1.0, -0.5));
        assert!(is_active(&cam, Vec3::new(3.0, 0.0, 0.0), 1.0, 5.0));
        assert!(is_active(&cam, Vec3::ZERO, 1.0, 0.0));

        let mut buf = three_cube();
        let before = buf.clone();
        let mut up = updater(100.0);
        up.set_culling_distance(-100.0);
        let stats = up.update(&mut buf, &cam, &ROTATING, 1.0, &mut NullSink);
        assert_eq!(stats.updated, 0);
        assert_eq!(stats.skipped, 27);
        assert_eq!(buf, before);
    }

    #[test]
    fn huge_distances_do_not_overflow_the_gate() {
        let cam = Omniscient(Vec3::ZERO);
        assert!(!is_active(&cam, Vec3::new(1e20, 0.0, 0.0), 1.0, 1e19));
    }

    #[test]
    fn culling_distance_limits_updates() {
        // From (2,2,-5) the z=1 and z=2 layers are within 7.5, the z=3 layer is not.
        let mut buf = three_cube();
        let mut sink = RecordingSink::new();

        let stats = updater(7.5).update(&mut buf, &facing_field(), &ROTATING, 0.1, &mut sink);

        assert_eq!(stats.updated, 18);
        assert_eq!(stats.skipped, 9);
        for &offset in sink.patches() {
            let p = buf.position(offset / BLOCK_LEN);
            assert!(p.z < 3.0, "far layer instance at {p} was updated");
        }
    }

    #[test]
    fn positions_survive_rotation_exactly() {
        let mut buf = three_cube();
        let before = buf.clone();
        let mut up = updater(100.0);

        for _ in 0..10 {
            up.update(&mut buf, &facing_field(), &ROTATING, 0.37, &mut NullSink);
        }

        for i in 0..buf.instance_count() {
            assert_eq!(buf.position(i), before.position(i), "instance {i}");
            assert_ne!(buf.block(i), before.block(i), "instance {i} did not rotate");
        }
    }

    #[test]
    fn culled_blocks_are_untouched() {
        let mut buf = three_cube();
        let before = buf.clone();
        let mut sink = RecordingSink::new();

        updater(7.5).update(&mut buf, &facing_field(), &ROTATING, 0.5, &mut sink);

        let touched: Vec<usize> = sink.patches().iter().map(|o| o / BLOCK_LEN).collect();
        for i in 0..buf.instance_count() {
            if touched.contains(&i) {
                assert_ne!(buf.block(i), before.block(i));
            } else {
                assert_eq!(buf.block(i), before.block(i));
            }
        }
    }

    #[test]
    fn even_rotates_about_x_and_odd_about_z() {
        let mut buf = three_cube();
        let before = buf.clone();

        updater(100.0).update(&mut buf, &facing_field(), &ROTATING, 1.0, &mut NullSink);

        let angle = 45.0_f32.to_radians();
        for i in 0..buf.instance_count() {
            let axis = if i % 2 == 0 {
                Mat4::from_rotation_x(angle)
            } else {
                Mat4::from_rotation_z(angle)
            };
            let expected = before.transform(i) * axis;
            assert!(
                buf.transform(i).abs_diff_eq(expected, 1e-5),
                "instance {i}"
            );
        }
    }

    #[test]
    fn rotation_keeps_scale() {
        let mut buf = three_cube();
        let mut up = updater(100.0);
        for _ in 0..50 {
            up.update(&mut buf, &facing_field(), &ROTATING, 0.25, &mut NullSink);
        }
        for i in 0..buf.instance_count() {
            let m = buf.transform(i);
            for axis in [m.x_axis, m.y_axis, m.z_axis] {
                assert!((axis.truncate().length() - 1.0).abs() < 1e-4, "instance {i}");
            }
        }
    }

    #[test]
    fn increments_accumulate() {
        let mut halves = three_cube();
        let mut whole = halves.clone();
        let mut up = updater(100.0);

        up.update(&mut halves, &facing_field(), &ROTATING, 0.5, &mut NullSink);
        up.update(&mut halves, &facing_field(), &ROTATING, 0.5, &mut NullSink);
        up.update(&mut whole, &facing_field(), &ROTATING, 1.0, &mut NullSink);

        for i in 0..whole.instance_count() {
            assert!(halves.transform(i).abs_diff_eq(whole.transform(i), 1e-5));
        }
    }

    #[test]
    fn sink_mirror_tracks_buffer() {
        let mut buf = three_cube();
        let mut sink = RecordingSink::new();
        sink.upload_all(buf.as_slice());

        let mut up = updater(7.5);
        up.update(&mut buf, &facing_field(), &ROTATING, 0.2, &mut sink);
        up.update(&mut buf, &facing_field(), &ROTATING, 0.2, &mut sink);

        assert_eq!(sink.mirror(), buf.as_slice());
        assert_eq!(sink.flushes(), 2);
    }

    #[test]
    fn patches_are_block_aligned_and_increasing() {
        let mut buf = three_cube();
        let mut sink = RecordingSink::new();

        updater(100.0).update(&mut buf, &facing_field(), &ROTATING, 0.2, &mut sink);

        let patches = sink.patches();
        assert!(patches.iter().all(|o| o % BLOCK_LEN == 0));
        assert!(patches.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn updated_plus_skipped_is_instance_count() {
        let mut buf = three_cube();
        let mut up = updater(6.5);
        let cameras = [facing_field(), facing_away()];
        for cam in &cameras {
            for toggles in [ROTATING, FrameToggles::default()] {
                let stats = up.update(&mut buf, cam, &toggles, 0.1, &mut NullSink);
                assert_eq!(stats.total(), 27);
                assert_eq!(up.last_stats(), stats);
            }
        }
    }

    #[test]
    fn culled_instances_never_reported() {
        let config = FieldConfig {
            side_count: 7,
            spacing: 3.0,
            box_size: 1.0,
            seed: 3,
            ..FieldConfig::default()
        };
        let base = cubefield_layout::generate_field(&config, &Mat4::IDENTITY);
        let centre = config.field_center();
        let eyes = [
            centre,
            Vec3::ZERO,
            Vec3::new(-10.0, 12.0, 30.0),
            Vec3::new(40.0, 5.0, 5.0),
        ];
        let targets = [Vec3::ZERO, centre + Vec3::Z, Vec3::new(30.0, 30.0, 0.0)];

        for eye in eyes {
            for target in targets {
                if eye == target {
                    continue;
                }
                let cam = CameraView::look_at(eye, target, 45.0_f32.to_radians(), 1.6, 0.1, 200.0);
                for distance in [5.0, 20.0, 1000.0] {
                    let mut buf = base.clone();
                    let mut sink = RecordingSink::new();
                    let mut up = FrameUpdater::new(UpdaterConfig {
                        culling_distance: distance,
                        bounding_radius: config.bounding_radius(),
                        degrees_per_second: DEGREES_PER_SECOND,
                    });
                    let stats = up.update(&mut buf, &cam, &ROTATING, 0.1, &mut sink);

                    assert_eq!(stats.updated, sink.patches().len());
                    for &offset in sink.patches() {
                        let p = buf.position(offset / BLOCK_LEN);
                        assert!(p.distance(eye) <= distance + 1e-3);
                        assert!(cam.frustum.intersects_sphere(p, config.bounding_radius()));
                    }
                    let expected = base
                        .positions()
                        .filter(|p| is_active(&cam, *p, config.bounding_radius(), distance))
                        .count();
                    assert_eq!(stats.updated, expected);
                }
            }
        }
    }

    #[test]
    fn centre_instance_lookup_after_update() {
        let mut buf = three_cube();
        let centre = instance_index(GridCoord::new(2, 2, 2), 3);
        updater(100.0).update(&mut buf, &facing_field(), &ROTATING, 1.0, &mut NullSink);
        assert_eq!(buf.position(centre), Vec3::splat(2.0));
    }

    #[test]
    fn empty_buffer_is_fine() {
        let mut buf = TransformBuffer::with_instance_capacity(0);
        let stats = updater(10.0).update(&mut buf, &facing_field(), &ROTATING, 1.0, &mut NullSink);
        assert_eq!(stats.total(), 0);
    }

    #[test]
    fn timer_records_enabled_passes() {
        let mut buf = three_cube();
        let mut up = updater(100.0);
        up.update(&mut buf, &facing_field(), &ROTATING, 0.1, &mut NullSink);
        up.update(&mut buf, &facing_field(), &ROTATING, 0.1, &mut NullSink);
        assert_eq!(up.timer().count(), 2);
    }

    #[test]
    fn config_from_field() {
        let field = FieldConfig::compact();
        let config = UpdaterConfig::from_field(&field);
        assert_eq!(config.culling_distance, field.culling_distance());
        assert_eq!(config.bounding_radius, 4.0);
        assert_eq!(config.degrees_per_second, 45.0);
    }
}
