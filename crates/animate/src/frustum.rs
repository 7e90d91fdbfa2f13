use glam::{Mat4, Vec3, Vec4};

/// Six clipping planes for visibility tests.
///
/// Each plane is `(a, b, c, d)` with a unit inward normal `(a, b, c)`; a point
/// `p` is on the visible side when `dot(n, p) + d >= 0`. Plane order is left,
/// right, bottom, top, near, far. Assumes a `[0, 1]` clip depth range, which is
/// what `Mat4::perspective_rh` and wgpu use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    pub planes: [Vec4; 6],
}

impl Frustum {
    /// Extract the planes from a view-projection matrix (Gribb & Hartmann).
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let (r0, r1, r2, r3) = (vp.row(0), vp.row(1), vp.row(2), vp.row(3));
        let mut planes = [r3 + r0, r3 - r0, r3 + r1, r3 - r1, r2, r3 - r2];
        for plane in &mut planes {
            let len = plane.truncate().length();
            if len > 0.0 {
                *plane /= len;
            }
        }
        Self { planes }
    }

    /// True if any part of the sphere may be visible.
    ///
    /// Conservative near the frustum corners: a sphere just outside two planes
    /// at once can still report `true`.
    #[inline]
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.truncate().dot(center) + plane.w >= -radius)
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        self.intersects_sphere(point, 0.0)
    }
}
