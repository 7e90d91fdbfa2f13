use std::f32::consts::TAU;
use std::time::Instant;

use cubefield_common::{FieldConfig, RotationPolicy, TransformBuffer, grid};
use glam::{Mat4, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Lay out a `side_count`³ grid of instances and pack their transforms.
///
/// Each instance starts from `base` (the mesh's rest transform), is turned by
/// [`random_rotation`], and is then moved to `(x, y, z) * box_size * spacing`
/// for its 1-indexed grid coordinate. Any translation in `base` is replaced.
///
/// Panics if `side_count` is zero or `spacing`/`box_size` are not positive.
pub fn generate<R: Rng + ?Sized>(
    side_count: u32,
    spacing: f32,
    box_size: f32,
    base: &Mat4,
    policy: RotationPolicy,
    rng: &mut R,
) -> TransformBuffer {
    assert!(side_count >= 1, "side_count must be at least 1");
    assert!(spacing > 0.0, "spacing must be positive");
    assert!(box_size > 0.0, "box_size must be positive");

    let _span = tracing::info_span!("generate_layout", side_count).entered();
    let start = Instant::now();

    let pitch = box_size * spacing;
    let mut buffer = TransformBuffer::with_instance_capacity(grid::instance_count(side_count));
    for coord in grid::coords(side_count) {
        let mut matrix = *base * random_rotation(policy, rng);
        matrix.w_axis = coord.to_world(pitch).extend(1.0);
        buffer.push(&matrix);
    }

    tracing::debug!(
        instances = buffer.instance_count(),
        floats = buffer.len(),
        elapsed = ?start.elapsed(),
        "layout generated"
    );
    buffer
}

/// Generate the field described by `config`, seeding the RNG from `config.seed`.
pub fn generate_field(config: &FieldConfig, base: &Mat4) -> TransformBuffer {
    let mut rng = StdRng::seed_from_u64(config.seed);
    generate(
        config.side_count,
        config.spacing,
        config.box_size,
        base,
        config.rotation_policy,
        &mut rng,
    )
}

/// A rotation by a uniform angle in `[0, 2π)` about a cardinal axis chosen by `policy`.
pub fn random_rotation<R: Rng + ?Sized>(policy: RotationPolicy, rng: &mut R) -> Mat4 {
    let axis = match policy {
        RotationPolicy::AnyCardinal => match rng.random_range(0..3) {
            0 => Vec3::X,
            1 => Vec3::Y,
            _ => Vec3::Z,
        },
        RotationPolicy::YOnly => Vec3::Y,
    };
    let angle = rng.random_range(0.0..TAU);
    Mat4::from_axis_angle(axis, angle)
}
