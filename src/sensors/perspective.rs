// Copyright @yucwang 2026

use crate::core::computation_node::ComputationNode;
use crate::core::sensor::{CameraSample, Sensor};
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::ray::Ray3f;

/// Pinhole camera. Normalized device coordinates cover
/// `[-aspect, aspect] x [-1, 1]`; anything outside is rejected.
pub struct PerspectiveCamera {
    origin: Vector3f,
    forward: Vector3f,
    right: Vector3f,
    up: Vector3f,
    tan_half_fov_y: Float,
    aspect: Float,
    near_clip: Float,
    far_clip: Float,
    width: usize,
    height: usize,
}

impl PerspectiveCamera {
    pub fn new(origin: Vector3f,
               target: Vector3f,
               up: Vector3f,
               fov_y_radians: Float,
               width: usize,
               height: usize,
               near_clip: Float,
               far_clip: Float) -> Self {
        let forward = (target - origin).normalize();
        let right = forward.cross(&up).normalize();
        let up = right.cross(&forward).normalize();
        let aspect = if height > 0 { width as Float / height as Float } else { 1.0 };

        Self {
            origin,
            forward,
            right,
            up,
            tan_half_fov_y: (0.5 * fov_y_radians).tan(),
            aspect,
            near_clip,
            far_clip,
            width,
            height,
        }
    }
}

impl ComputationNode for PerspectiveCamera {
    fn to_string(&self) -> String {
        format!("PerspectiveCamera: {{ origin: {:?}, forward: {:?}, fov_y: {}, aspect: {}, film: {}x{} }}",
                self.origin.as_slice(), self.forward.as_slice(),
                2.0 * self.tan_half_fov_y.atan(), self.aspect, self.width, self.height)
    }
}

impl Sensor for PerspectiveCamera {
    fn sample_ray(&self, ndc: &Vector2f) -> Option<CameraSample> {
        if !ndc.x.is_finite() || !ndc.y.is_finite()
            || ndc.x.abs() > self.aspect || ndc.y.abs() > 1.0 {
            return None;
        }

        // NDC y grows downwards, camera up grows upwards.
        let d_camera = Vector3f::new(ndc.x * self.tan_half_fov_y,
                                     -ndc.y * self.tan_half_fov_y,
                                     1.0).normalize();
        let dir = (self.right * d_camera.x + self.up * d_camera.y + self.forward * d_camera.z).normalize();

        let inv_z = 1.0 / d_camera.z;
        let near_t = self.near_clip * inv_z;
        let far_t = if self.far_clip == Float::MAX { Float::MAX } else { self.far_clip * inv_z };
        let ray = Ray3f::new(self.origin + dir * near_t, dir, Some(0.0), Some(far_t - near_t));
        Some(CameraSample { ray, pdf: 1.0 })
    }

    fn resolution(&self) -> (usize, usize) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> PerspectiveCamera {
        let origin = Vector3f::new(0.0, 0.0, 0.0);
        let target = Vector3f::new(0.0, 0.0, -1.0);
        let up = Vector3f::new(0.0, 1.0, 0.0);
        PerspectiveCamera::new(origin, target, up, std::f32::consts::FRAC_PI_2, 8, 4, 0.0, Float::MAX)
    }

    #[test]
    fn test_perspective_camera_center_ray() {
        let cam = camera();
        let sample = cam.sample_ray(&Vector2f::new(0.0, 0.0)).expect("center must be inside");
        let dir = sample.ray.dir();

        assert!((dir.x - 0.0).abs() < 1e-6);
        assert!((dir.y - 0.0).abs() < 1e-6);
        assert!((dir.z + 1.0).abs() < 1e-6);
        assert_eq!(sample.pdf, 1.0);
        assert_eq!(cam.resolution(), (8, 4));
    }

    #[test]
    fn test_perspective_camera_orientation() {
        let cam = camera();
        // Top of the image looks up, left of the image looks left.
        let top = cam.sample_ray(&Vector2f::new(0.0, -1.0)).expect("inside").ray.dir();
        assert!(top.y > 0.0);
        let left = cam.sample_ray(&Vector2f::new(-1.0, 0.0)).expect("inside").ray.dir();
        assert!(left.x < 0.0);
        // 90 degree vertical fov: edge of the film is 45 degrees off axis.
        assert!((top.y - top.z.abs()).abs() < 1e-5);
    }

    #[test]
    fn test_perspective_camera_rejects_outside_domain() {
        let cam = camera();
        assert!(cam.sample_ray(&Vector2f::new(2.0, 0.0)).is_some());
        assert!(cam.sample_ray(&Vector2f::new(2.01, 0.0)).is_none());
        assert!(cam.sample_ray(&Vector2f::new(0.0, 1.5)).is_none());

        let square = PerspectiveCamera::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0),
                                            Vector3f::new(0.0, 1.0, 0.0), 1.0, 4, 4, 0.0, 10.0);
        assert!(square.sample_ray(&Vector2f::new(1.5, 0.0)).is_none());
    }

    #[test]
    fn test_near_clip_moves_origin() {
        let origin = Vector3f::new(0.0, 0.0, 0.0);
        let cam = PerspectiveCamera::new(origin, Vector3f::new(0.0, 0.0, 1.0), Vector3f::new(0.0, 1.0, 0.0),
                                         1.0, 4, 4, 0.5, 10.0);
        let ray = cam.sample_ray(&Vector2f::new(0.0, 0.0)).expect("inside").ray;
        assert!((ray.origin().z - 0.5).abs() < 1e-6);
        assert!((ray.max_t - 9.5).abs() < 1e-5);
    }
}
