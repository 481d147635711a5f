// Copyright @yucwang 2023

use crate::core::bsdf::{BSDFSampleRecord, BSDFEvalResult, BSDF};
use crate::core::computation_node::ComputationNode;
use crate::math::constants::{ INV_PI, Vector2f, Vector3f };
use crate::math::spectrum::RGBSpectrum;
use crate::math::warp::{ sample_cosine_hemisphere, sample_cosine_hemisphere_pdf };

pub struct LambertianDiffuseBSDF {
    color: RGBSpectrum
}

impl ComputationNode for LambertianDiffuseBSDF {
    fn to_string(&self) -> String {
        format!("LambertianDiffuseBSDF: {{ reflectance: ({}, {}, {}) }}",
                self.color[0], self.color[1], self.color[2])
    }
}

impl BSDF for LambertianDiffuseBSDF {
    fn eval(&self, sample_record: &BSDFSampleRecord) -> BSDFEvalResult {
        let mut eval_result = BSDFEvalResult::default();
        // Reflection only: both directions must sit on the same side.
        if sample_record.wi.z * sample_record.wo.z <= 0.0 {
            return eval_result;
        }
        eval_result.value = self.color * INV_PI;
        eval_result.pdf = sample_cosine_hemisphere_pdf(sample_record.wi.z.abs());

        eval_result
    }

    fn sample(&self, u: &Vector2f, wo: &Vector3f) -> BSDFSampleRecord {
        let mut wi = sample_cosine_hemisphere(u);
        if wo.z < 0.0 {
            wi.z *= -1.0;
        }
        let pdf = sample_cosine_hemisphere_pdf(wi.z.abs());

        BSDFSampleRecord::new(wi, *wo, pdf)
    }
}

impl LambertianDiffuseBSDF {
    pub fn new(rgb: RGBSpectrum) -> Self {
        Self {
            color: rgb,
        }
    }

    pub fn reflectance(&self) -> RGBSpectrum {
        self.color
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lambertian_sample_follows_wo_hemisphere() {
        let bsdf = LambertianDiffuseBSDF::new(RGBSpectrum::splat(0.5));
        let below = Vector3f::new(0.0, 0.0, -1.0);
        let record = bsdf.sample(&Vector2f::new(0.3, 0.6), &below);
        assert!(record.wi.z < 0.0);
        assert!(record.pdf > 0.0);
    }

    #[test]
    fn test_lambertian_eval() {
        let bsdf = LambertianDiffuseBSDF::new(RGBSpectrum::splat(0.5));
        let wo = Vector3f::new(0.0, 0.0, 1.0);
        let (record, eval) = bsdf.sample_and_eval(&Vector2f::new(0.2, 0.9), &wo);
        assert!((eval.value[0] - 0.5 * INV_PI).abs() < 1e-6);
        assert!((eval.pdf - record.pdf).abs() < 1e-6);

        let opposite = BSDFSampleRecord::new(Vector3f::new(0.0, 0.0, -1.0), wo, 1.0);
        assert!(bsdf.eval(&opposite).value.is_black());
    }
}
