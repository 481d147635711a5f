// Copyright @yucwang 2026

use crate::math::constants::Vector3f;
use crate::math::spectrum::RGBSpectrum;

/// A stored light-transport sample: where it landed, what it carried and
/// the direction it arrived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Photon {
    pub position: Vector3f,
    pub throughput: RGBSpectrum,
    pub wi: Vector3f,
}

impl Photon {
    pub fn new(position: Vector3f, throughput: RGBSpectrum, wi: Vector3f) -> Self {
        Self { position, throughput, wi }
    }
}
