use glam::{Mat4, Vec3};

use crate::frustum::Frustum;

/// What the updater needs from a camera: where it is and what it can see.
pub trait CullCamera {
    fn position(&self) -> Vec3;

    /// True if a sphere at `center` with `radius` may be visible.
    fn sphere_intersects(&self, center: Vec3, radius: f32) -> bool;
}

/// A frozen camera for one frame: eye position plus view frustum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    pub position: Vec3,
    pub frustum: Frustum,
}

impl CameraView {
    pub fn new(position: Vec3, view_projection: &Mat4) -> Self {
        Self {
            position,
            frustum: Frustum::from_view_projection(view_projection),
        }
    }

    /// Perspective view from `eye` towards `target`. `fov_y` is in radians.
    ///
    /// `eye` and `target` must differ; with no view direction the frustum
    /// planes are NaN and every visibility test fails.
    pub fn look_at(eye: Vec3, target: Vec3, fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        debug_assert!(eye != target, "look_at needs distinct eye and target, got {eye}");
        let forward = (target - eye).normalize_or_zero();
        let up = if forward.cross(Vec3::Y).length_squared() < 1e-6 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        let view = Mat4::look_at_rh(eye, target, up);
        let proj = Mat4::perspective_rh(fov_y, aspect, near, far);
        Self::new(eye, &(proj * view))
    }
}

impl CullCamera for CameraView {
    #[inline]
    fn position(&self) -> Vec3 {
        self.position
    }

    #[inline]
    fn sphere_intersects(&self, center: Vec3, radius: f32) -> bool {
        self.frustum.intersects_sphere(center, radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn look_at_sees_its_target() {
        let cam = CameraView::look_at(
            Vec3::new(5.0, 5.0, 5.0),
            Vec3::ZERO,
            45.0_f32.to_radians(),
            16.0 / 9.0,
            0.1,
            100.0,
        );
        assert_eq!(cam.position(), Vec3::new(5.0, 5.0, 5.0));
        assert!(cam.sphere_intersects(Vec3::ZERO, 0.0));
        assert!(!cam.sphere_intersects(Vec3::new(10.0, 10.0, 10.0), 0.0));
    }

    #[test]
    fn look_straight_down_is_valid() {
        let cam = CameraView::look_at(
            Vec3::new(0.0, 10.0, 0.0),
            Vec3::ZERO,
            45.0_f32.to_radians(),
            1.0,
            0.1,
            100.0,
        );
        assert!(cam.sphere_intersects(Vec3::ZERO, 0.0));
        for plane in &cam.frustum.planes {
            assert!(!plane.is_nan());
        }
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "distinct eye and target")]
    fn eye_on_target_is_rejected() {
        CameraView::look_at(Vec3::ONE, Vec3::ONE, 1.0, 1.0, 0.1, 100.0);
    }
}
