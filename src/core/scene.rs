// Copyright @yucwang 2026

use crate::core::bsdf::BSDF;
use crate::core::bvh::BVH;
use crate::core::emitter::Emitter;
use crate::core::interaction::SurfaceIntersection;
use crate::core::sensor::Sensor;
use crate::core::shape::Shape;
use crate::emitters::area::AreaEmitter;
use crate::math::aabb::AABB;
use crate::math::ray::Ray3f;
use crate::math::spectrum::RGBSpectrum;
use std::sync::Arc;

/// Anything a camera ray can be traced against.
pub trait RayIntersector: Sync {
    fn ray_intersection(&self, ray: &Ray3f) -> Option<SurfaceIntersection>;
}

pub struct SceneObject {
    pub shape: Arc<dyn Shape>,
    pub material: Arc<dyn BSDF>,
    pub emission: RGBSpectrum,
    pub name: Option<String>,
}

impl SceneObject {
    pub fn new(shape: Arc<dyn Shape>, material: Arc<dyn BSDF>) -> Self {
        Self { shape, material, emission: RGBSpectrum::default(), name: None }
    }

    pub fn with_emission(mut self, emission: RGBSpectrum) -> Self {
        self.emission = emission;
        self
    }

    pub fn with_name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    pub fn shape(&self) -> &Arc<dyn Shape> {
        &self.shape
    }
}

pub struct Scene {
    objects: Vec<SceneObject>,
    sensors: Vec<Box<dyn Sensor>>,
    emitters: Vec<Box<dyn Emitter>>,
    bvh: BVH,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            sensors: Vec::new(),
            emitters: Vec::new(),
            bvh: BVH::new(Vec::new()),
        }
    }

    pub fn with_objects(objects: Vec<SceneObject>) -> Self {
        let mut scene = Self::new();
        for object in objects {
            scene.push_object(object);
        }
        scene.rebuild_bvh();
        scene
    }

    /// Adds an object; emissive objects also register an area emitter.
    /// The object-level BVH is rebuilt so the scene is always ready to trace.
    pub fn add_object(&mut self, object: SceneObject) {
        self.push_object(object);
        self.rebuild_bvh();
    }

    fn push_object(&mut self, object: SceneObject) {
        if !object.emission.is_black() {
            self.emitters.push(Box::new(AreaEmitter::from_shape(object.shape.clone(), object.emission)));
        }
        self.objects.push(object);
    }

    fn rebuild_bvh(&mut self) {
        let prim_bounds: Vec<AABB> = self.objects.iter().map(|o| o.shape.bounding_box()).collect();
        self.bvh = BVH::new(prim_bounds);
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn add_sensor(&mut self, sensor: Box<dyn Sensor>) {
        self.sensors.push(sensor);
    }

    pub fn sensors(&self) -> &[Box<dyn Sensor>] {
        &self.sensors
    }

    pub fn camera(&self, camera_id: usize) -> Option<&dyn Sensor> {
        self.sensors.get(camera_id).map(|s| s.as_ref())
    }

    pub fn emitters(&self) -> &[Box<dyn Emitter>] {
        &self.emitters
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn ray_intersection(&self, ray: &Ray3f) -> Option<SurfaceIntersection> {
        let closest = self.bvh.ray_intersection(ray, |prim_idx, ray| {
            self.objects[prim_idx].shape.ray_intersection(ray).map(|h| {
                let t = h.t();
                (h, t)
            })
        });

        closest.map(|(idx, hit)| {
            let object = &self.objects[idx];
            hit.with_le(object.emission)
                .with_material(object.material.clone())
                .with_object_index(Some(idx))
        })
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl RayIntersector for Scene {
    fn ray_intersection(&self, ray: &Ray3f) -> Option<SurfaceIntersection> {
        Scene::ray_intersection(self, ray)
    }
}
