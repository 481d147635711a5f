// Copyright @yucwang 2026

use crate::core::photon::Photon;
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector3f};

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Result of a k-nearest query: photon indices nearest first, and the
/// squared distance to the farthest of them (`+inf` when empty).
#[derive(Debug, Clone, PartialEq)]
pub struct NearestPhotons {
    pub indices: Vec<usize>,
    pub max_distance2: Float,
}

impl NearestPhotons {
    pub fn empty() -> Self {
        Self { indices: Vec::new(), max_distance2: Float::INFINITY }
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Read-only nearest neighbour access to a finished set of photons.
pub trait PhotonIndex: Sync {
    fn query_k_nearest(&self, p: &Vector3f, k: usize) -> NearestPhotons;
    fn photon_at(&self, index: usize) -> &Photon;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone)]
enum KdNode {
    Leaf { start: usize, count: usize },
    Split { axis: usize, value: Float, left: usize, right: usize },
}

// Max-heap entry ordered by distance, then photon index.
#[derive(Clone, Copy, PartialEq)]
struct Candidate {
    distance2: Float,
    index: usize,
}

impl Eq for Candidate {}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance2.partial_cmp(&other.distance2)
            .unwrap_or(Ordering::Equal)
            .then(self.index.cmp(&other.index))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Photons in a balanced kd-tree. The structure is immutable once built,
/// so concurrent queries need no synchronisation.
pub struct PhotonMap {
    photons: Vec<Photon>,
    nodes: Vec<KdNode>,
    // Photon indices, permuted so that every leaf owns a contiguous range.
    order: Vec<usize>,
    max_leaf_size: usize,
}

impl PhotonMap {
    pub fn build(photons: Vec<Photon>) -> Self {
        Self::with_max_leaf_size(photons, 8)
    }

    pub fn with_max_leaf_size(photons: Vec<Photon>, max_leaf_size: usize) -> Self {
        let mut map = Self {
            order: (0..photons.len()).collect(),
            photons,
            nodes: Vec::new(),
            max_leaf_size: max_leaf_size.max(1),
        };

        if !map.photons.is_empty() {
            map.build_node(0, map.photons.len());
        }
        log::debug!("Photon map built: {} photons, {} nodes.", map.photons.len(), map.nodes.len());

        map
    }

    pub fn photons(&self) -> &[Photon] {
        &self.photons
    }

    fn build_node(&mut self, start: usize, end: usize) -> usize {
        let node_idx = self.nodes.len();
        let count = end - start;
        self.nodes.push(KdNode::Leaf { start, count });
        if count <= self.max_leaf_size {
            return node_idx;
        }

        let extent = AABB::from_points(self.order[start..end].iter().map(|&i| &self.photons[i].position));
        let axis = extent.max_extent();
        if extent.diagonal()[axis] <= 0.0 {
            // Every photon in this range is coincident.
            return node_idx;
        }

        let mid = start + count / 2;
        let photons = &self.photons;
        self.order[start..end].select_nth_unstable_by(mid - start, |a, b| {
            photons[*a].position[axis].partial_cmp(&photons[*b].position[axis])
                .unwrap_or(Ordering::Equal)
        });
        let value = self.photons[self.order[mid]].position[axis];

        let left = self.build_node(start, mid);
        let right = self.build_node(mid, end);
        self.nodes[node_idx] = KdNode::Split { axis, value, left, right };
        node_idx
    }

    fn search(&self, node_idx: usize, p: &Vector3f, k: usize, heap: &mut BinaryHeap<Candidate>) {
        match &self.nodes[node_idx] {
            KdNode::Leaf { start, count } => {
                for &index in &self.order[*start..*start + *count] {
                    let candidate = Candidate {
                        distance2: (self.photons[index].position - p).norm_squared(),
                        index,
                    };
                    if heap.len() < k {
                        heap.push(candidate);
                    } else if let Some(worst) = heap.peek() {
                        if candidate < *worst {
                            heap.pop();
                            heap.push(candidate);
                        }
                    }
                }
            }
            KdNode::Split { axis, value, left, right } => {
                let delta = p[*axis] - *value;
                let (near, far) = if delta < 0.0 { (*left, *right) } else { (*right, *left) };
                self.search(near, p, k, heap);

                let worst = heap.peek().map(|c| c.distance2).unwrap_or(Float::INFINITY);
                // Ties on the split plane can sit on either side, so `<=`.
                if heap.len() < k || delta * delta <= worst {
                    self.search(far, p, k, heap);
                }
            }
        }
    }
}

impl PhotonIndex for PhotonMap {
    fn query_k_nearest(&self, p: &Vector3f, k: usize) -> NearestPhotons {
        if k == 0 || self.photons.is_empty() {
            return NearestPhotons::empty();
        }

        let mut heap = BinaryHeap::with_capacity(k + 1);
        self.search(0, p, k, &mut heap);

        let sorted = heap.into_sorted_vec();
        let max_distance2 = sorted.last().map(|c| c.distance2).unwrap_or(Float::INFINITY);
        NearestPhotons {
            indices: sorted.into_iter().map(|c| c.index).collect(),
            max_distance2,
        }
    }

    fn photon_at(&self, index: usize) -> &Photon {
        &self.photons[index]
    }

    fn len(&self) -> usize {
        self.photons.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::LcgRng;
    use crate::math::spectrum::RGBSpectrum;

    fn random_photons(n: usize, seed: u64) -> Vec<Photon> {
        let mut rng = LcgRng::new(seed);
        (0..n).map(|i| {
            let p = Vector3f::new(rng.next_f32(), rng.next_f32(), rng.next_f32()) * 4.0;
            Photon::new(p, RGBSpectrum::splat(i as Float), Vector3f::new(0.0, 1.0, 0.0))
        }).collect()
    }

    fn brute_force(photons: &[Photon], p: &Vector3f, k: usize) -> Vec<(Float, usize)> {
        let mut all: Vec<(Float, usize)> = photons.iter().enumerate()
            .map(|(i, ph)| ((ph.position - p).norm_squared(), i))
            .collect();
        all.sort_by(|a, b| a.partial_cmp(b).unwrap());
        all.truncate(k);
        all
    }

    #[test]
    fn test_k_nearest_matches_brute_force() {
        let photons = random_photons(500, 11);
        let map = PhotonMap::with_max_leaf_size(photons.clone(), 4);
        let mut rng = LcgRng::new(99);

        for _ in 0..50 {
            let q = Vector3f::new(rng.next_f32(), rng.next_f32(), rng.next_f32()) * 5.0 - Vector3f::new(0.5, 0.5, 0.5);
            for &k in &[1usize, 3, 10] {
                let result = map.query_k_nearest(&q, k);
                let expected = brute_force(&photons, &q, k);
                assert_eq!(result.indices, expected.iter().map(|e| e.1).collect::<Vec<_>>());
                assert_eq!(result.max_distance2, expected[k - 1].0);
            }
        }
    }

    #[test]
    fn test_nearest_is_exact_for_coincident_point() {
        let photons = random_photons(64, 3);
        let target = photons[17].position;
        let map = PhotonMap::build(photons);
        let result = map.query_k_nearest(&target, 1);
        assert_eq!(result.indices, vec![17]);
        assert_eq!(result.max_distance2, 0.0);
        assert_eq!(map.photon_at(17).throughput, RGBSpectrum::splat(17.0));
    }

    #[test]
    fn test_duplicate_positions_break_ties_by_index() {
        let p = Vector3f::new(1.0, 1.0, 1.0);
        let photons: Vec<Photon> = (0..20)
            .map(|i| Photon::new(p, RGBSpectrum::splat(i as Float), Vector3f::zeros()))
            .collect();
        let map = PhotonMap::with_max_leaf_size(photons, 2);
        let result = map.query_k_nearest(&Vector3f::zeros(), 3);
        assert_eq!(result.indices, vec![0, 1, 2]);
        assert!((result.max_distance2 - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_k_larger_than_map() {
        let map = PhotonMap::build(random_photons(5, 1));
        let result = map.query_k_nearest(&Vector3f::zeros(), 10);
        assert_eq!(result.indices.len(), 5);
    }

    #[test]
    fn test_empty_map_query() {
        let map = PhotonMap::build(Vec::new());
        assert!(map.is_empty());
        let result = map.query_k_nearest(&Vector3f::zeros(), 1);
        assert!(result.is_empty());
        assert_eq!(result.max_distance2, Float::INFINITY);
        assert!(map.query_k_nearest(&Vector3f::zeros(), 0).is_empty());
    }
}
