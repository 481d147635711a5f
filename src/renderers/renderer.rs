// Copyright @yucwang 2021

use crate::core::photon_map::PhotonIndex;
use crate::core::scene::RayIntersector;
use crate::core::sensor::Sensor;
use crate::math::bitmap::Bitmap;

/// A full-frame pass over a finished photon map.
pub trait Renderer {
    fn render(&self,
              sensor: &dyn Sensor,
              scene: &dyn RayIntersector,
              photon_map: &dyn PhotonIndex,
              image: &mut Bitmap);
}
