// Copyright @yucwang 2023

use super::triangle::Triangle;

use crate::core::bvh::BVH;
use crate::core::computation_node::ComputationNode;
use crate::core::interaction::{SurfaceIntersection, SurfaceSampleRecord};
use crate::core::shape::Shape;
use crate::io::obj_utils;
use crate::io::obj_utils::ObjLoadError;
use crate::math::aabb::AABB;
use crate::math::constants::{ Float, Vector2f, Vector3f };
use crate::math::ray::Ray3f;

use std::path::Path;
use std::vec::Vec;

pub struct TriangleMesh {
    triangles: Vec<Triangle>,
    // Running sum of triangle areas, used for area-proportional sampling.
    area_cdf: Vec<Float>,
    total_area: Float,
    bvh: BVH,
}

impl ComputationNode for TriangleMesh {
    fn to_string(&self) -> String {
        format!("TriangleMesh: {{ triangles: {}, area: {} }}", self.triangles.len(), self.total_area)
    }
}

impl TriangleMesh {
    pub fn new(triangles: Vec<Triangle>) -> Self {
        let mut area_cdf = Vec::with_capacity(triangles.len());
        let mut total_area = 0.0;
        for tri in &triangles {
            total_area += tri.surface_area();
            area_cdf.push(total_area);
        }
        let bvh = BVH::new(triangles.iter().map(|t| t.bounding_box()).collect());

        Self { triangles, area_cdf, total_area, bvh }
    }

    pub fn from_obj<P: AsRef<Path>>(path: P) -> Result<Self, ObjLoadError> {
        let obj_set = obj_utils::load_obj_from_file(path)?;
        let mut triangles = Vec::new();

        for object in obj_set.objects {
            let vertices: Vec<Vector3f> = object.vertices.iter()
                .map(|v| Vector3f::new(v.x as Float, v.y as Float, v.z as Float))
                .collect();
            for geom in object.geometry {
                for shape in geom.shapes {
                    if let wavefront_obj::obj::Primitive::Triangle(a, b, c) = shape.primitive {
                        let fetch = |idx: usize| vertices.get(idx).copied()
                            .ok_or(ObjLoadError::IndexOutOfRange(idx));
                        triangles.push(Triangle::new(fetch(a.0)?, fetch(b.0)?, fetch(c.0)?));
                    }
                }
            }
        }

        log::debug!("Loaded {} triangles from obj.", triangles.len());
        Ok(Self::new(triangles))
    }

    /// Scales then translates every vertex and rebuilds the acceleration data.
    pub fn transformed(self, scale: &Vector3f, translate: &Vector3f) -> Self {
        let mut triangles = self.triangles;
        for tri in &mut triangles {
            tri.apply_transform(scale, translate);
        }
        Self::new(triangles)
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }
}

impl Shape for TriangleMesh {
    fn bounding_box(&self) -> AABB {
        let mut bound = AABB::default();
        for tri in &self.triangles {
            bound.expand_by_aabb(&tri.bounding_box());
        }
        bound
    }

    fn ray_intersection(&self, ray: &Ray3f) -> Option<SurfaceIntersection> {
        self.bvh.ray_intersection(ray, |prim_idx, ray| {
            self.triangles[prim_idx].ray_intersection(ray).map(|h| {
                let t = h.t();
                (h, t)
            })
        }).map(|(_, hit)| hit)
    }

    fn sample(&self, u: &Vector2f) -> SurfaceSampleRecord {
        if self.triangles.is_empty() || self.total_area <= 0.0 {
            let n = Vector3f::new(0.0, 0.0, 1.0);
            return SurfaceSampleRecord::new(SurfaceIntersection::new(Vector3f::zeros(), n, 0.0), 0.0);
        }

        let target = u.x * self.total_area;
        let idx = self.area_cdf.partition_point(|c| *c < target).min(self.triangles.len() - 1);
        let start = if idx == 0 { 0.0 } else { self.area_cdf[idx - 1] };
        let tri_area = (self.area_cdf[idx] - start).max(1e-6);
        // Reuse the leftover of u.x inside the chosen triangle.
        let local_u = Vector2f::new(((target - start) / tri_area).min(0.999999).max(0.0), u.y);

        let record = self.triangles[idx].sample(&local_u);
        SurfaceSampleRecord::new(record.intersection().clone(), 1.0 / self.total_area)
    }

    fn surface_area(&self) -> Float {
        self.total_area
    }
}
