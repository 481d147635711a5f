// Copyright @yucwang 2026

use crate::core::computation_node::ComputationNode;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::spectrum::RGBSpectrum;

/// A sampled emission event: a point on the light and a leaving direction.
pub struct EmitterSample {
    pub position: Vector3f,
    pub normal: Vector3f,
    pub direction: Vector3f,
    pub radiance: RGBSpectrum,
    pub pdf_position: Float,
    pub pdf_direction: Float,
}

pub trait Emitter: ComputationNode + Send + Sync {
    /// Scalar emitted power, used to pick lights proportionally.
    fn power(&self) -> Float;
    fn sample_emission(&self, u_pos: &Vector2f, u_dir: &Vector2f) -> Option<EmitterSample>;
}
