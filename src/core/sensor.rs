// Copyright @yucwang 2026

use crate::core::computation_node::ComputationNode;
use crate::math::constants::{Float, Vector2f};
use crate::math::ray::Ray3f;

pub struct CameraSample {
    pub ray: Ray3f,
    pub pdf: Float,
}

pub trait Sensor: ComputationNode + Sync {
    /// Ray through normalized device coordinates `ndc`, where `y` spans
    /// [-1, 1] top to bottom and `x` is scaled by the film aspect ratio.
    /// Returns `None` when `ndc` falls outside the sensor's domain.
    fn sample_ray(&self, ndc: &Vector2f) -> Option<CameraSample>;
    fn resolution(&self) -> (usize, usize);
}

/// Normalized device coordinates of the pixel at `(row, col)`.
pub fn pixel_to_ndc(row: usize, col: usize, width: usize, height: usize) -> Vector2f {
    let h = height as Float;
    Vector2f::new((2.0 * col as Float - width as Float) / h,
                  (2.0 * row as Float - h) / h)
}
