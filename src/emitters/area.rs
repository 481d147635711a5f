// Copyright @yucwang 2026

use crate::core::computation_node::ComputationNode;
use crate::core::emitter::{Emitter, EmitterSample};
use crate::core::shape::Shape;
use crate::math::constants::{Float, Vector2f, PI};
use crate::math::frame::Frame;
use crate::math::spectrum::RGBSpectrum;
use crate::math::warp::{sample_cosine_hemisphere, sample_cosine_hemisphere_pdf};
use std::sync::Arc;

/// One-sided diffuse emitter over a shape, radiating along the geometric normal.
pub struct AreaEmitter {
    shape: Arc<dyn Shape>,
    radiance: RGBSpectrum,
}

impl AreaEmitter {
    pub fn from_shape(shape: Arc<dyn Shape>, radiance: RGBSpectrum) -> Self {
        Self { shape, radiance }
    }
}

impl ComputationNode for AreaEmitter {
    fn to_string(&self) -> String {
        format!("AreaEmitter: {{ radiance: ({}, {}, {}), area: {} }}",
                self.radiance[0], self.radiance[1], self.radiance[2], self.shape.surface_area())
    }
}

impl Emitter for AreaEmitter {
    fn power(&self) -> Float {
        self.radiance.luminance() * self.shape.surface_area() * PI
    }

    fn sample_emission(&self, u_pos: &Vector2f, u_dir: &Vector2f) -> Option<EmitterSample> {
        let position = self.shape.sample(u_pos);
        if position.pdf() <= 0.0 {
            return None;
        }

        let local_dir = sample_cosine_hemisphere(u_dir);
        let pdf_direction = sample_cosine_hemisphere_pdf(local_dir.z);
        if pdf_direction <= 0.0 {
            return None;
        }

        let n = position.intersection().geo_normal();
        let direction = Frame::from_normal(&n).from_local(&local_dir);
        Some(EmitterSample {
            position: position.intersection().p(),
            normal: n,
            direction,
            radiance: self.radiance,
            pdf_position: position.pdf(),
            pdf_direction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::constants::Vector3f;
    use crate::shapes::triangle::Triangle;

    #[test]
    fn test_area_emitter_emits_into_normal_hemisphere() {
        let tri = Triangle::new(Vector3f::new(0.0, 0.0, 0.0),
                                Vector3f::new(0.0, 0.0, 1.0),
                                Vector3f::new(1.0, 0.0, 0.0));
        let emitter = AreaEmitter::from_shape(Arc::new(tri), RGBSpectrum::splat(2.0));
        assert!((emitter.power() - 2.0 * 0.5 * PI).abs() < 1e-4);

        let sample = emitter.sample_emission(&Vector2f::new(0.4, 0.4), &Vector2f::new(0.7, 0.1))
            .expect("expected emission sample");
        assert!(sample.normal.y > 0.99);
        assert!(sample.direction.dot(&sample.normal) >= 0.0);
        assert!((sample.pdf_position - 2.0).abs() < 1e-5);
        assert_eq!(sample.radiance, RGBSpectrum::splat(2.0));
    }
}
