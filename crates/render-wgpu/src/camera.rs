use cubefield_animate::CameraView;
use cubefield_common::FieldConfig;
use cubefield_input::Action;
use glam::{Mat4, Vec3};

/// Fly camera with position, yaw, pitch, and projection parameters.
pub struct FlyCamera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub speed: f32,
    pub sensitivity: f32,
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            yaw: 90.0_f32.to_radians(),
            pitch: 0.0,
            fov: 45.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
            speed: 10.0,
            sensitivity: 0.003,
        }
    }
}

impl FlyCamera {
    /// Camera at the centre of the field looking along +Z, with the far plane
    /// and speed scaled to the field.
    pub fn for_field(config: &FieldConfig, aspect: f32) -> Self {
        Self {
            position: config.field_center(),
            aspect,
            far: config.camera_far(),
            speed: config.box_size * 16.0,
            ..Self::default()
        }
    }

    pub fn forward(&self) -> Vec3 {
        Vec3::new(
            self.yaw.cos() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.sin() * self.pitch.cos(),
        )
        .normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y).normalize()
    }

    /// Move by a local direction (x right, y up, z forward) for `dt` seconds.
    pub fn translate_local(&mut self, direction: Vec3, dt: f32) {
        let world = self.right() * direction.x + Vec3::Y * direction.y + self.forward() * direction.z;
        self.position += world * self.speed * dt;
    }

    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.sensitivity;
        self.pitch -= dy * self.sensitivity;
        self.pitch = self.pitch.clamp(-89.0_f32.to_radians(), 89.0_f32.to_radians());
    }

    /// Apply a camera action. Toggles and unbound input are ignored.
    pub fn apply(&mut self, action: &Action, dt: f32) {
        match action {
            Action::Move(direction) => self.translate_local(*direction, dt),
            Action::Look { dx, dy } => self.rotate(*dx, *dy),
            Action::ToggleRotation | Action::ToggleStats | Action::Noop => {}
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward(), Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Freeze the camera for this frame's update pass.
    pub fn cull_view(&self) -> CameraView {
        CameraView::new(self.position, &self.view_projection())
    }
}
