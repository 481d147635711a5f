// Copyright @yucwang 2026

use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector3f};
use crate::math::ray::Ray3f;

const SAH_BUCKETS: usize = 12;

#[derive(Clone)]
enum BVHNode {
    Leaf { bounds: AABB, start: usize, count: usize },
    Interior { bounds: AABB, left: usize, right: usize },
}

impl BVHNode {
    fn bounds(&self) -> &AABB {
        match self {
            BVHNode::Leaf { bounds, .. } => bounds,
            BVHNode::Interior { bounds, .. } => bounds,
        }
    }
}

/// Bounding volume hierarchy over opaque primitives. Only bounds and
/// centroids are stored; primitive tests are supplied by the caller.
pub struct BVH {
    nodes: Vec<BVHNode>,
    indices: Vec<usize>,
    prim_bounds: Vec<AABB>,
    prim_centroids: Vec<Vector3f>,
    max_leaf_size: usize,
}

impl BVH {
    pub fn new(prim_bounds: Vec<AABB>) -> Self {
        Self::with_max_leaf_size(prim_bounds, 4)
    }

    pub fn with_max_leaf_size(prim_bounds: Vec<AABB>, max_leaf_size: usize) -> Self {
        let prim_centroids = prim_bounds.iter().map(|b| b.center()).collect();
        let mut bvh = Self {
            indices: (0..prim_bounds.len()).collect(),
            nodes: Vec::new(),
            prim_bounds,
            prim_centroids,
            max_leaf_size: max_leaf_size.max(1),
        };

        if !bvh.indices.is_empty() {
            bvh.build(0, bvh.indices.len());
        }

        bvh
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Closest hit reported by `hit_fn`, which returns the hit payload and
    /// its ray parameter.
    pub fn ray_intersection<F, T>(&self, ray: &Ray3f, mut hit_fn: F) -> Option<(usize, T)>
    where
        F: FnMut(usize, &Ray3f) -> Option<(T, Float)>,
    {
        if self.nodes.is_empty() {
            return None;
        }

        let mut ray = *ray;
        let mut closest: Option<(usize, T)> = None;
        let mut stack = vec![0usize];

        while let Some(node_idx) = stack.pop() {
            match &self.nodes[node_idx] {
                node if !node.bounds().ray_intersect(&ray) => continue,
                BVHNode::Leaf { start, count, .. } => {
                    for &prim_idx in &self.indices[*start..*start + *count] {
                        if let Some((hit, t)) = hit_fn(prim_idx, &ray) {
                            // Shrinking the segment prunes farther nodes.
                            if ray.update(t) {
                                closest = Some((prim_idx, hit));
                            }
                        }
                    }
                }
                BVHNode::Interior { left, right, .. } => {
                    stack.push(*right);
                    stack.push(*left);
                }
            }
        }

        closest
    }

    fn build(&mut self, start: usize, end: usize) -> usize {
        let (bounds, centroid_bounds) = self.compute_bounds(start, end);
        let count = end - start;
        let node_idx = self.nodes.len();
        self.nodes.push(BVHNode::Leaf { bounds, start, count });

        if count <= self.max_leaf_size {
            return node_idx;
        }

        let axis = centroid_bounds.max_extent();
        let axis_min = centroid_bounds.p_min[axis];
        let extent = centroid_bounds.p_max[axis] - axis_min;
        if extent.abs() < 1e-6 {
            return node_idx;
        }

        let bucket_of = |c: &Vector3f| -> usize {
            let b = ((c[axis] - axis_min) / extent * SAH_BUCKETS as Float) as usize;
            b.min(SAH_BUCKETS - 1)
        };

        let mut counts = [0usize; SAH_BUCKETS];
        let mut boxes = [AABB::default(); SAH_BUCKETS];
        for &idx in &self.indices[start..end] {
            let b = bucket_of(&self.prim_centroids[idx]);
            counts[b] += 1;
            boxes[b].expand_by_aabb(&self.prim_bounds[idx]);
        }

        // Sweep from the right once, then from the left, to price every split.
        let mut right_area = [0.0 as Float; SAH_BUCKETS];
        let mut right_count = [0usize; SAH_BUCKETS];
        let mut acc = AABB::default();
        let mut acc_count = 0usize;
        for b in (1..SAH_BUCKETS).rev() {
            acc.expand_by_aabb(&boxes[b]);
            acc_count += counts[b];
            right_area[b] = if acc_count > 0 { acc.surface_area() } else { 0.0 };
            right_count[b] = acc_count;
        }

        let inv_area = 1.0 / bounds.surface_area().max(1e-6);
        let mut best = (Float::MAX, 0usize);
        let mut acc = AABB::default();
        let mut acc_count = 0usize;
        for split in 0..(SAH_BUCKETS - 1) {
            acc.expand_by_aabb(&boxes[split]);
            acc_count += counts[split];
            let left_cost = if acc_count > 0 { acc_count as Float * acc.surface_area() } else { 0.0 };
            let right_cost = right_count[split + 1] as Float * right_area[split + 1];
            let cost = 1.0 + (left_cost + right_cost) * inv_area;
            if cost < best.0 {
                best = (cost, split);
            }
        }

        if best.0 >= count as Float {
            return node_idx;
        }

        let mut mid = start;
        for i in start..end {
            if bucket_of(&self.prim_centroids[self.indices[i]]) <= best.1 {
                self.indices.swap(i, mid);
                mid += 1;
            }
        }
        if mid == start || mid == end {
            return node_idx;
        }

        let left = self.build(start, mid);
        let right = self.build(mid, end);
        self.nodes[node_idx] = BVHNode::Interior { bounds, left, right };
        node_idx
    }

    fn compute_bounds(&self, start: usize, end: usize) -> (AABB, AABB) {
        let mut bounds = AABB::default();
        let mut centroid_bounds = AABB::default();
        for &idx in &self.indices[start..end] {
            bounds.expand_by_aabb(&self.prim_bounds[idx]);
            centroid_bounds.expand_by_point(&self.prim_centroids[idx]);
        }
        (bounds, centroid_bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::BVH;
    use crate::core::shape::Shape;
    use crate::math::constants::{Float, Vector3f};
    use crate::math::ray::Ray3f;
    use crate::shapes::triangle::Triangle;

    fn build_triangles() -> Vec<Triangle> {
        let mut tris = Vec::new();
        for i in 0..32 {
            let x = (i % 8) as Float * 2.0;
            let z = -((i / 8) as Float);
            let p0 = Vector3f::new(x, 0.0, z);
            let p1 = Vector3f::new(x + 0.5, 0.0, z);
            let p2 = Vector3f::new(x, 0.5, z);
            tris.push(Triangle::new(p0, p1, p2));
        }
        tris
    }

    fn closest_t(bvh: &BVH, triangles: &[Triangle], ray: &Ray3f) -> Option<Float> {
        bvh.ray_intersection(ray, |prim_idx, ray| {
            triangles[prim_idx].ray_intersection(ray).map(|h| (h.t(), h.t()))
        }).map(|(_, t)| t)
    }

    #[test]
    fn test_bvh_vs_naive_triangles() {
        let triangles = build_triangles();
        let bvh = BVH::with_max_leaf_size(triangles.iter().map(|t| t.bounding_box()).collect(), 2);
        assert!(bvh.node_count() > 1);

        for i in 0..8 {
            let origin = Vector3f::new(i as Float * 2.0 + 0.1, 0.1, 1.0);
            let ray = Ray3f::new(origin, Vector3f::new(0.0, 0.0, -1.0), None, None);

            let naive_t = triangles.iter()
                .filter_map(|tri| tri.ray_intersection(&ray).map(|h| h.t()))
                .fold(None, |acc: Option<Float>, t| Some(acc.map_or(t, |a| a.min(t))));

            let bvh_t = closest_t(&bvh, &triangles, &ray).expect("BVH miss");
            assert!((bvh_t - naive_t.expect("naive miss")).abs() < 1e-5);
            assert!((bvh_t - 1.0).abs() < 1e-5);
        }

        let miss_ray = Ray3f::new(Vector3f::new(100.0, 100.0, 1.0), Vector3f::new(0.0, 0.0, -1.0), None, None);
        assert!(closest_t(&bvh, &triangles, &miss_ray).is_none());
    }

    #[test]
    fn test_empty_bvh() {
        let bvh = BVH::new(Vec::new());
        let ray = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0), None, None);
        let hit: Option<(usize, ())> = bvh.ray_intersection(&ray, |_, _| Some(((), 0.0)));
        assert!(hit.is_none());
    }
}
