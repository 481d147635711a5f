// Copyright @yucwang 2021

use crate::core::computation_node::ComputationNode;
use crate::core::parallel::for_each_block;
use crate::core::photon_map::PhotonIndex;
use crate::core::scene::RayIntersector;
use crate::core::sensor::{pixel_to_ndc, Sensor};
use crate::math::bitmap::Bitmap;
use crate::math::constants::Float;
use crate::math::spectrum::RGBSpectrum;

pub use super::renderer::Renderer;

/// Squared acceptance radius used when a scene does not configure one.
pub const DEFAULT_DISTANCE_THRESHOLD2: Float = 0.001;

const NEAREST_PHOTON_COUNT: usize = 1;
const PIXEL_BLOCK_SIZE: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualizerSettings {
    /// A photon is shown when its squared distance to the visible point is
    /// strictly below this value.
    pub distance_threshold2: Float,
    pub background: RGBSpectrum,
    /// Worker threads, `0` for one per core.
    pub thread_count: usize,
}

impl Default for VisualizerSettings {
    fn default() -> Self {
        Self {
            distance_threshold2: DEFAULT_DISTANCE_THRESHOLD2,
            background: RGBSpectrum::default(),
            thread_count: 0,
        }
    }
}

/// Debug view of a photon map: every pixel shows the throughput of the
/// photon nearest to its visible surface point when that photon lies within
/// the acceptance radius, and the background otherwise. No density
/// estimation or blending takes place.
pub struct PhotonMapVisualizer {
    settings: VisualizerSettings,
}

impl PhotonMapVisualizer {
    pub fn new(settings: VisualizerSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &VisualizerSettings {
        &self.settings
    }

    /// Color of a single pixel. Pure in its inputs.
    pub fn shade_pixel(&self,
                       row: usize,
                       col: usize,
                       width: usize,
                       height: usize,
                       sensor: &dyn Sensor,
                       scene: &dyn RayIntersector,
                       photon_map: &dyn PhotonIndex) -> RGBSpectrum {
        let background = self.settings.background;

        let ndc = pixel_to_ndc(row, col, width, height);
        let sample = match sensor.sample_ray(&ndc) {
            Some(s) => s,
            None => return background,
        };

        let hit = match scene.ray_intersection(&sample.ray) {
            Some(h) => h,
            None => return background,
        };

        let nearest = photon_map.query_k_nearest(&hit.p(), NEAREST_PHOTON_COUNT);
        match nearest.indices.first() {
            Some(&index) if nearest.max_distance2 < self.settings.distance_threshold2 => {
                photon_map.photon_at(index).throughput
            }
            _ => background,
        }
    }
}

impl ComputationNode for PhotonMapVisualizer {
    fn to_string(&self) -> String {
        format!("PhotonMapVisualizer: {{ distance_threshold2: {}, threads: {} }}",
                self.settings.distance_threshold2, self.settings.thread_count)
    }
}

impl Renderer for PhotonMapVisualizer {
    fn render(&self,
              sensor: &dyn Sensor,
              scene: &dyn RayIntersector,
              photon_map: &dyn PhotonIndex,
              image: &mut Bitmap) {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return;
        }

        if photon_map.is_empty() {
            log::warn!("Photon map is empty, writing background only.");
            image.fill(self.settings.background);
            return;
        }

        log::info!("Visualizing {} photons on a {}x{} image.", photon_map.len(), width, height);

        let pixels = image.pixels_mut();
        for_each_block(width * height, PIXEL_BLOCK_SIZE, self.settings.thread_count, "pixels",
            |range| {
                range.map(|index| {
                    self.shade_pixel(index / width, index % width, width, height, sensor, scene, photon_map)
                }).collect::<Vec<RGBSpectrum>>()
            },
            |range, colors| pixels[range].copy_from_slice(&colors));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::computation_node::ComputationNode;
    use crate::core::interaction::SurfaceIntersection;
    use crate::core::photon::Photon;
    use crate::core::photon_map::PhotonMap;
    use crate::core::scene::{Scene, SceneObject};
    use crate::core::sensor::CameraSample;
    use crate::materials::lambertian_diffuse::LambertianDiffuseBSDF;
    use crate::math::constants::{Vector2f, Vector3f};
    use crate::math::ray::Ray3f;
    use crate::sensors::perspective::PerspectiveCamera;
    use crate::shapes::triangle::Triangle;
    use crate::shapes::triangle_mesh::TriangleMesh;
    use std::sync::Arc;

    const WIDTH: usize = 24;
    const HEIGHT: usize = 16;

    fn background() -> RGBSpectrum {
        RGBSpectrum::new(0.1, 0.2, 0.3)
    }

    fn visualizer(distance_threshold2: Float, thread_count: usize) -> PhotonMapVisualizer {
        PhotonMapVisualizer::new(VisualizerSettings {
            distance_threshold2,
            background: background(),
            thread_count,
        })
    }

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(Vector3f::new(0.0, 0.0, 3.0),
                               Vector3f::new(0.0, 0.0, 0.0),
                               Vector3f::new(0.0, 1.0, 0.0),
                               std::f32::consts::FRAC_PI_2,
                               WIDTH, HEIGHT, 0.0, Float::MAX)
    }

    // A 4x4 wall in the z = 0 plane facing the camera.
    fn wall_object() -> SceneObject {
        let a = Vector3f::new(-2.0, -2.0, 0.0);
        let b = Vector3f::new(2.0, -2.0, 0.0);
        let c = Vector3f::new(2.0, 2.0, 0.0);
        let d = Vector3f::new(-2.0, 2.0, 0.0);
        let mesh = TriangleMesh::new(vec![Triangle::new(a, b, c), Triangle::new(a, c, d)]);
        let diffuse = Arc::new(LambertianDiffuseBSDF::new(RGBSpectrum::splat(0.5)));
        SceneObject::new(Arc::new(mesh), diffuse)
    }

    fn wall_scene() -> Scene {
        Scene::with_objects(vec![wall_object()])
    }

    fn grid_photons() -> PhotonMap {
        let mut photons = Vec::new();
        for i in 0..9 {
            for j in 0..9 {
                let p = Vector3f::new(-2.0 + 0.5 * i as Float, -2.0 + 0.5 * j as Float, 0.0);
                let color = RGBSpectrum::new(i as Float, j as Float, 1.0);
                photons.push(Photon::new(p, color, Vector3f::new(0.0, 0.0, 1.0)));
            }
        }
        PhotonMap::build(photons)
    }

    fn render(v: &PhotonMapVisualizer, sensor: &dyn Sensor, scene: &dyn RayIntersector, map: &dyn PhotonIndex) -> Bitmap {
        let mut image = Bitmap::filled(WIDTH, HEIGHT, RGBSpectrum::splat(-1.0));
        v.render(sensor, scene, map, &mut image);
        image
    }

    // Replays one pixel without the renderer to obtain the expected color.
    fn expected(row: usize, col: usize, threshold2: Float, scene: &Scene, map: &PhotonMap) -> RGBSpectrum {
        let ndc = pixel_to_ndc(row, col, WIDTH, HEIGHT);
        let ray = match camera().sample_ray(&ndc) {
            Some(s) => s.ray,
            None => return background(),
        };
        let hit = match scene.ray_intersection(&ray) {
            Some(h) => h,
            None => return background(),
        };
        let (index, d2) = map.photons().iter().enumerate()
            .map(|(i, p)| (i, (p.position - hit.p()).norm_squared()))
            .fold((usize::MAX, Float::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best });
        if d2 < threshold2 { map.photons()[index].throughput } else { background() }
    }

    struct EmptyScene;

    impl RayIntersector for EmptyScene {
        fn ray_intersection(&self, _ray: &Ray3f) -> Option<SurfaceIntersection> {
            None
        }
    }

    /// Every ray hits the same world-space point.
    struct PointScene {
        p: Vector3f,
    }

    impl RayIntersector for PointScene {
        fn ray_intersection(&self, _ray: &Ray3f) -> Option<SurfaceIntersection> {
            Some(SurfaceIntersection::new(self.p, Vector3f::new(0.0, 0.0, 1.0), 1.0))
        }
    }

    /// Accepts only the left half of the image.
    struct HalfSensor;

    impl ComputationNode for HalfSensor {
        fn to_string(&self) -> String {
            String::from("HalfSensor")
        }
    }

    impl Sensor for HalfSensor {
        fn sample_ray(&self, ndc: &Vector2f) -> Option<CameraSample> {
            if ndc.x >= 0.0 {
                return None;
            }
            let ray = Ray3f::new(Vector3f::new(ndc.x, ndc.y, 1.0), Vector3f::new(0.0, 0.0, -1.0), None, None);
            Some(CameraSample { ray, pdf: 1.0 })
        }

        fn resolution(&self) -> (usize, usize) {
            (WIDTH, HEIGHT)
        }
    }

    fn single_photon_map(p: Vector3f, color: RGBSpectrum) -> PhotonMap {
        PhotonMap::build(vec![Photon::new(p, color, Vector3f::new(0.0, 0.0, 1.0))])
    }

    #[test]
    fn test_every_pixel_matches_reference() {
        let scene = wall_scene();
        let map = grid_photons();
        let threshold2 = 0.02;
        let image = render(&visualizer(threshold2, 4), &camera(), &scene, &map);

        let mut accepted = 0;
        let mut rejected = 0;
        for row in 0..HEIGHT {
            for col in 0..WIDTH {
                let want = expected(row, col, threshold2, &scene, &map);
                assert_eq!(image.pixel(row, col), want, "pixel ({}, {})", row, col);
                if want == background() { rejected += 1; } else { accepted += 1; }
            }
        }
        // The grid must exercise both sides of the cutoff.
        assert!(accepted > 0);
        assert!(rejected > 0);
    }

    #[test]
    fn test_miss_writes_background() {
        let map = grid_photons();
        let image = render(&visualizer(1.0e6, 2), &camera(), &EmptyScene, &map);
        assert!(image.pixels().iter().all(|c| *c == background()));
    }

    #[test]
    fn test_sample_failure_writes_background() {
        let p = Vector3f::new(0.0, 0.0, 0.0);
        let color = RGBSpectrum::new(5.0, 6.0, 7.0);
        let map = single_photon_map(p, color);
        let image = render(&visualizer(1.0, 3), &HalfSensor, &PointScene { p }, &map);
        for row in 0..HEIGHT {
            for col in 0..WIDTH {
                let want = if col < WIDTH / 2 { color } else { background() };
                assert_eq!(image.pixel(row, col), want);
            }
        }
    }

    #[test]
    fn test_coincident_photon_shows_for_any_positive_threshold() {
        let p = Vector3f::new(0.5, -0.25, 2.0);
        let color = RGBSpectrum::new(0.7, 0.0, 0.3);
        let map = single_photon_map(p, color);
        for &threshold2 in &[1e-12, 1e-3, 1.0, 1e9] {
            let image = render(&visualizer(threshold2, 2), &camera(), &PointScene { p }, &map);
            assert!(image.pixels().iter().all(|c| *c == color));
        }
    }

    #[test]
    fn test_zero_threshold_never_accepts() {
        let p = Vector3f::new(0.5, -0.25, 2.0);
        let map = single_photon_map(p, RGBSpectrum::new(0.7, 0.0, 0.3));
        let image = render(&visualizer(0.0, 2), &camera(), &PointScene { p }, &map);
        assert!(image.pixels().iter().all(|c| *c == background()));
    }

    #[test]
    fn test_distance_equal_to_threshold_is_rejected() {
        let p = Vector3f::new(0.0, 0.0, 0.0);
        let color = RGBSpectrum::splat(2.0);
        let map = single_photon_map(Vector3f::new(0.5, 0.0, 0.0), color);
        let scene = PointScene { p };

        let at = render(&visualizer(0.25, 1), &camera(), &scene, &map);
        assert!(at.pixels().iter().all(|c| *c == background()));
        let above = render(&visualizer(0.2500001, 1), &camera(), &scene, &map);
        assert!(above.pixels().iter().all(|c| *c == color));
    }

    #[test]
    fn test_empty_photon_map_writes_background() {
        let scene = wall_scene();
        let map = PhotonMap::build(Vec::new());
        let image = render(&visualizer(1.0e6, 2), &camera(), &scene, &map);
        assert!(image.pixels().iter().all(|c| *c == background()));
    }

    #[test]
    fn test_render_is_idempotent_and_thread_independent() {
        let scene = wall_scene();
        let map = grid_photons();
        let first = render(&visualizer(0.05, 4), &camera(), &scene, &map);
        let second = render(&visualizer(0.05, 4), &camera(), &scene, &map);
        let single = render(&visualizer(0.05, 1), &camera(), &scene, &map);
        let many = render(&visualizer(0.05, 7), &camera(), &scene, &map);
        assert_eq!(first, second);
        assert_eq!(first, single);
        assert_eq!(first, many);
    }

    #[test]
    fn test_incrementally_built_scene_renders_like_batch_built() {
        let mut scene = Scene::new();
        scene.add_object(wall_object());
        let map = grid_photons();

        let incremental = render(&visualizer(0.05, 3), &camera(), &scene, &map);
        let batch = render(&visualizer(0.05, 3), &camera(), &wall_scene(), &map);
        assert_eq!(incremental, batch);
        assert!(incremental.pixels().iter().any(|c| *c != background()));
    }

    #[test]
    fn test_zero_sized_image_is_noop() {
        let map = grid_photons();
        let mut image = Bitmap::new(0, 0);
        visualizer(1.0, 1).render(&camera(), &wall_scene(), &map, &mut image);
        assert!(image.is_empty());
    }
}
