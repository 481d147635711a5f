// Copyright @yucwang 2026

use crate::core::parallel::for_each_block;
use crate::core::photon::Photon;
use crate::core::photon_map::PhotonMap;
use crate::core::rng::LcgRng;
use crate::core::scene::Scene;
use crate::math::constants::Float;
use crate::math::frame::Frame;
use crate::math::ray::Ray3f;

const PHOTON_BLOCK_SIZE: usize = 4096;

/// Shoots photons from the scene's emitters and records every diffuse hit.
/// Photon `i` draws from its own random stream, so the resulting map does
/// not depend on the number of worker threads.
pub struct PhotonTracer {
    pub photon_count: usize,
    pub max_depth: u32,
    pub thread_count: usize,
    pub seed: u64,
}

impl PhotonTracer {
    pub fn new(photon_count: usize, max_depth: u32) -> Self {
        Self { photon_count, max_depth, thread_count: 0, seed: 0 }
    }

    pub fn with_thread_count(mut self, thread_count: usize) -> Self {
        self.thread_count = thread_count;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn trace(&self, scene: &Scene) -> PhotonMap {
        let light_cdf = match LightDistribution::new(scene) {
            Some(d) => d,
            None => {
                log::warn!("Scene has no emitters with positive power, photon map stays empty.");
                return PhotonMap::build(Vec::new());
            }
        };

        log::info!("Tracing {} photons (max depth {}).", self.photon_count, self.max_depth);

        let total_blocks = (self.photon_count + PHOTON_BLOCK_SIZE - 1) / PHOTON_BLOCK_SIZE;
        let mut blocks: Vec<Vec<Photon>> = vec![Vec::new(); total_blocks];
        for_each_block(self.photon_count, PHOTON_BLOCK_SIZE, self.thread_count, "photons",
            |range| {
                let mut stored = Vec::new();
                for photon_index in range {
                    let mut rng = LcgRng::for_index(self.seed, photon_index as u64);
                    self.trace_photon(scene, &light_cdf, &mut rng, &mut stored);
                }
                stored
            },
            |range, stored| blocks[range.start / PHOTON_BLOCK_SIZE] = stored);

        // Concatenate in block order to keep photon indices stable.
        let photons: Vec<Photon> = blocks.into_iter().flatten().collect();
        log::info!("Stored {} photons.", photons.len());
        PhotonMap::build(photons)
    }

    fn trace_photon(&self, scene: &Scene, lights: &LightDistribution, rng: &mut LcgRng, stored: &mut Vec<Photon>) {
        let (light_index, light_pdf) = lights.sample(rng.next_f32());
        let emitter = &scene.emitters()[light_index];
        let u_pos = rng.next_2d();
        let u_dir = rng.next_2d();
        let emission = match emitter.sample_emission(&u_pos, &u_dir) {
            Some(e) => e,
            None => return,
        };

        let cos_theta = emission.direction.dot(&emission.normal).abs();
        let pdf = light_pdf * emission.pdf_position * emission.pdf_direction;
        if pdf <= 0.0 || cos_theta <= 0.0 {
            return;
        }

        let mut throughput = emission.radiance * (cos_theta / pdf);
        let mut ray = Ray3f::spawn(emission.position, emission.normal, emission.direction);

        for depth in 0..self.max_depth {
            let intersection = match scene.ray_intersection(&ray) {
                Some(h) => h,
                None => break,
            };
            let material = match intersection.material() {
                Some(m) => m,
                None => break,
            };

            stored.push(Photon::new(intersection.p(), throughput, -ray.dir()));

            if depth > 0 {
                let survival = throughput.max_component().min(1.0);
                if survival <= 0.0 || rng.next_f32() >= survival {
                    break;
                }
                throughput = throughput / survival;
            }

            let n = intersection.geo_normal();
            let frame = Frame::from_normal(&n);
            let wo_local = frame.to_local(&-ray.dir());
            let (sample, eval) = material.sample_and_eval(&rng.next_2d(), &wo_local);
            if sample.pdf <= 0.0 || eval.value.is_black() {
                break;
            }

            throughput = throughput * eval.value * (sample.wi.z.abs() / sample.pdf);
            ray = Ray3f::spawn(intersection.p(), n, frame.from_local(&sample.wi));
        }
    }
}

/// Discrete distribution over emitters proportional to their power.
struct LightDistribution {
    cdf: Vec<Float>,
    total: Float,
}

impl LightDistribution {
    fn new(scene: &Scene) -> Option<Self> {
        let mut cdf = Vec::with_capacity(scene.emitters().len());
        let mut total = 0.0;
        for emitter in scene.emitters() {
            total += emitter.power().max(0.0);
            cdf.push(total);
        }
        if total > 0.0 { Some(Self { cdf, total }) } else { None }
    }

    fn sample(&self, u: Float) -> (usize, Float) {
        let target = u * self.total;
        let idx = self.cdf.partition_point(|c| *c <= target).min(self.cdf.len() - 1);
        let start = if idx == 0 { 0.0 } else { self.cdf[idx - 1] };
        (idx, (self.cdf[idx] - start) / self.total)
    }
}
