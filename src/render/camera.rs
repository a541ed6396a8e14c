use crate::render::pick::Ray;
use crate::scene::CameraData;
use glam::{Mat4, Vec2, Vec3};

/// Perspective camera looking at a fixed target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub fov_y_deg: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(position: Vec3, target: Vec3, fov_y_deg: f32) -> Self {
        Self {
            position,
            target,
            fov_y_deg,
            near: 0.1,
            far: 1000.0,
        }
    }

    pub fn from_data(data: &CameraData) -> Self {
        Self {
            near: data.near,
            far: data.far,
            ..Self::new(
                Vec3::from_array(data.position),
                Vec3::from_array(data.target),
                data.fov_deg,
            )
        }
    }

    /// (forward, right, up), all unit length.
    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        let forward = (self.target - self.position).try_normalize().unwrap_or(Vec3::NEG_Z);
        let right = forward
            .cross(Vec3::Y)
            .try_normalize()
            .unwrap_or(Vec3::X);
        let up = right.cross(forward).normalize();
        (forward, right, up)
    }

    pub fn view_matrix(&self) -> Mat4 {
        let (_, _, up) = self.basis();
        Mat4::look_at_rh(self.position, self.target, up)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh_gl(
            self.fov_y_deg.to_radians(),
            aspect.max(1e-6),
            self.near,
            self.far,
        )
    }

    /// World point to normalized device coordinates, `None` behind the eye.
    pub fn project(&self, point: Vec3, aspect: f32) -> Option<Vec2> {
        let clip = self.projection_matrix(aspect) * self.view_matrix() * point.extend(1.0);
        if clip.w <= f32::EPSILON {
            return None;
        }
        Some(Vec2::new(clip.x / clip.w, clip.y / clip.w))
    }

    /// Ray from the eye through a point given in normalized device coordinates.
    pub fn ray_through(&self, ndc: Vec2, aspect: f32) -> Ray {
        let (forward, right, up) = self.basis();
        let half_height = (self.fov_y_deg.to_radians() * 0.5).tan();
        let half_width = half_height * aspect.max(1e-6);
        let direction = forward + right * (ndc.x * half_width) + up * (ndc.y * half_height);
        Ray::new(self.position, direction)
    }
}

#[cfg(test)]
mod tests {
    use super::Camera;
    use crate::scene::CameraData;
    use glam::{Vec2, Vec3};

    #[test]
    fn center_ray_points_at_target() {
        let camera = Camera::from_data(&CameraData::default());
        let ray = camera.ray_through(Vec2::ZERO, 16.0 / 9.0);
        let expected = (camera.target - camera.position).normalize();
        assert!((ray.direction - expected).length() < 1e-5);
        assert_eq!(ray.origin, camera.position);
    }

    #[test]
    fn basis_is_orthonormal() {
        let camera = Camera::new(Vec3::new(3.0, 4.0, 5.0), Vec3::ZERO, 60.0);
        let (forward, right, up) = camera.basis();
        assert!(forward.dot(right).abs() < 1e-5);
        assert!(forward.dot(up).abs() < 1e-5);
        assert!(right.dot(up).abs() < 1e-5);
        assert!(up.y > 0.0);
    }

    #[test]
    fn corner_ray_projects_back_to_corner() {
        let camera = Camera::from_data(&CameraData::default());
        let aspect = 4.0 / 3.0;
        let ndc = Vec2::new(0.75, -0.5);
        let ray = camera.ray_through(ndc, aspect);
        let point = ray.at(10.0);

        let projected = camera.project(point, aspect).unwrap();
        assert!((projected - ndc).length() < 1e-4);
    }

    #[test]
    fn points_behind_the_eye_do_not_project() {
        let camera = Camera::new(Vec3::ZERO, Vec3::NEG_Z, 50.0);
        assert!(camera.project(Vec3::new(0.0, 0.0, 5.0), 1.0).is_none());
        let ahead = camera.project(Vec3::new(0.0, 0.0, -5.0), 1.0).unwrap();
        assert!(ahead.length() < 1e-6);
    }

    #[test]
    fn looking_straight_down_stays_finite() {
        let camera = Camera::new(Vec3::new(0.0, 10.0, 0.0), Vec3::ZERO, 50.0);
        let ray = camera.ray_through(Vec2::new(0.5, 0.5), 1.0);
        assert!(ray.direction.is_finite());
    }
}
