// Copyright 2020 TwoCookingMice

use photonvis::core::scene_loader::{load_scene_with_settings, SceneLoadError};
use photonvis::integrators::photon_tracer::PhotonTracer;
use photonvis::io::image_utils::{write_image, ImageWriteError};
use photonvis::math::bitmap::Bitmap;
use photonvis::math::constants::Float;
use photonvis::math::spectrum::RGBSpectrum;
use photonvis::renderers::photon_visualizer::{
    PhotonMapVisualizer, Renderer, VisualizerSettings, DEFAULT_DISTANCE_THRESHOLD2,
};

use console::style;
use std::env;
use std::fmt;
use std::time::Instant;

const DEFAULT_PHOTON_COUNT: usize = 100_000;
const DEFAULT_MAX_DEPTH: u32 = 8;

#[derive(Debug)]
enum VisualizeError {
    SceneLoad(SceneLoadError),
    ImageWrite(ImageWriteError),
    MissingCamera(usize),
    EmptyPhotonMap,
}

impl From<SceneLoadError> for VisualizeError {
    fn from(err: SceneLoadError) -> Self {
        VisualizeError::SceneLoad(err)
    }
}

impl From<ImageWriteError> for VisualizeError {
    fn from(err: ImageWriteError) -> Self {
        VisualizeError::ImageWrite(err)
    }
}

impl fmt::Display for VisualizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisualizeError::SceneLoad(err) => write!(f, "failed to load scene: {}", err),
            VisualizeError::ImageWrite(err) => write!(f, "failed to write image: {}", err),
            VisualizeError::MissingCamera(id) => write!(f, "scene has no camera with index {}", id),
            VisualizeError::EmptyPhotonMap => write!(f, "photon map is empty, nothing to visualize"),
        }
    }
}

impl std::error::Error for VisualizeError {}

#[derive(Default)]
struct Overrides {
    photon_count: Option<usize>,
    max_depth: Option<u32>,
    distance_threshold2: Option<Float>,
    thread_count: Option<usize>,
    seed: Option<u64>,
    camera_id: usize,
}

fn parse_overrides(args: &[String]) -> Overrides {
    let mut overrides = Overrides::default();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--photons" => {
                i += 1;
                overrides.photon_count = args.get(i).and_then(|v| v.parse::<usize>().ok());
            }
            "--max-depth" => {
                i += 1;
                overrides.max_depth = args.get(i).and_then(|v| v.parse::<u32>().ok());
            }
            "--threshold" => {
                i += 1;
                overrides.distance_threshold2 = args.get(i).and_then(|v| v.parse::<Float>().ok());
            }
            "--threads" => {
                i += 1;
                overrides.thread_count = args.get(i).and_then(|v| v.parse::<usize>().ok());
            }
            "--seed" => {
                i += 1;
                overrides.seed = args.get(i).and_then(|v| v.parse::<u64>().ok());
            }
            "--camera" => {
                i += 1;
                overrides.camera_id = args.get(i).and_then(|v| v.parse::<usize>().ok()).unwrap_or(0);
            }
            other => log::warn!("Ignoring unknown argument: {}.", other),
        }
        i += 1;
    }

    overrides
}

fn run(input_path: &str, output_path: &str, overrides: Overrides) -> Result<(usize, usize, usize), VisualizeError> {
    let load_result = load_scene_with_settings(input_path)?;
    let scene = load_result.scene;
    let settings = load_result.settings;

    let photon_count = overrides.photon_count.or(settings.photon_count).unwrap_or(DEFAULT_PHOTON_COUNT);
    let max_depth = overrides.max_depth.or(settings.max_depth).unwrap_or(DEFAULT_MAX_DEPTH);
    let thread_count = overrides.thread_count.or(settings.thread_count).unwrap_or(0);
    let seed = overrides.seed.or(settings.seed).unwrap_or(0);
    let distance_threshold2 = overrides.distance_threshold2
        .or(settings.distance_threshold2)
        .unwrap_or(DEFAULT_DISTANCE_THRESHOLD2);
    let background = settings.background.unwrap_or_default();

    let camera = scene.camera(overrides.camera_id)
        .ok_or(VisualizeError::MissingCamera(overrides.camera_id))?;

    let photon_map = PhotonTracer::new(photon_count, max_depth)
        .with_thread_count(thread_count)
        .with_seed(seed)
        .trace(&scene);
    if photon_map.photons().is_empty() {
        return Err(VisualizeError::EmptyPhotonMap);
    }
    log::info!("Photon map holds {} photons.", photon_map.photons().len());

    let (width, height) = camera.resolution();
    let mut image = Bitmap::filled(width, height, RGBSpectrum::default());
    let visualizer = PhotonMapVisualizer::new(VisualizerSettings {
        distance_threshold2,
        background,
        thread_count,
    });
    visualizer.render(camera, &scene, &photon_map, &mut image);

    write_image(&image, output_path)?;
    Ok((photon_map.photons().len(), width, height))
}

fn main() {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <scene.xml> <output.(ppm|exr)> [--photons N] [--max-depth N] \
                   [--threshold R2] [--threads N] [--seed N] [--camera N]", args[0]);
        std::process::exit(1);
    }

    let input_path = &args[1];
    let output_path = &args[2];
    let overrides = parse_overrides(&args[3..]);

    let start = Instant::now();
    match run(input_path, output_path, overrides) {
        Ok((photons, width, height)) => {
            println!("{} {}x{} image from {} photons written to {} in {:.2}s",
                     style("Done:").green().bold(),
                     width,
                     height,
                     photons,
                     style(output_path).cyan(),
                     start.elapsed().as_secs_f32());
        }
        Err(err) => {
            eprintln!("{} {}", style("Error:").red().bold(), err);
            std::process::exit(1);
        }
    }
}
