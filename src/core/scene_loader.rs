// Copyright @yucwang 2026

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::core::bsdf::BSDF;
use crate::core::scene::{Scene, SceneObject};
use crate::materials::lambertian_diffuse::LambertianDiffuseBSDF;
use crate::math::constants::{Float, Vector3f};
use crate::math::spectrum::RGBSpectrum;
use crate::sensors::perspective::PerspectiveCamera;
use crate::shapes::triangle_mesh::TriangleMesh;

#[derive(Debug)]
pub enum SceneLoadError {
    Io(std::io::Error),
    Parse(String),
    MissingField(&'static str),
}

impl From<std::io::Error> for SceneLoadError {
    fn from(err: std::io::Error) -> Self {
        SceneLoadError::Io(err)
    }
}

impl fmt::Display for SceneLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneLoadError::Io(err) => write!(f, "io error: {}", err),
            SceneLoadError::Parse(msg) => write!(f, "parse error: {}", msg),
            SceneLoadError::MissingField(field) => write!(f, "missing field: {}", field),
        }
    }
}

impl std::error::Error for SceneLoadError {}

/// Settings of the `<integrator type="photon_viz">` block. Unset fields are
/// left to the caller's defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhotonVizSettings {
    pub photon_count: Option<usize>,
    pub max_depth: Option<u32>,
    pub thread_count: Option<usize>,
    pub seed: Option<u64>,
    pub distance_threshold2: Option<Float>,
    pub background: Option<RGBSpectrum>,
}

pub struct SceneLoadResult {
    pub scene: Scene,
    pub settings: PhotonVizSettings,
}

pub fn load_scene_with_settings<P: AsRef<Path>>(path: P) -> Result<SceneLoadResult, SceneLoadError> {
    let path = path.as_ref();
    log::info!("Loading scene from: {}.", path.display());
    let xml = fs::read_to_string(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    parse_scene(&xml, base_dir)
}

pub fn parse_scene(xml: &str, base_dir: &Path) -> Result<SceneLoadResult, SceneLoadError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut state = ParseState::new(base_dir);

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => state.open(&e)?,
            Ok(Event::Empty(e)) => {
                state.open(&e)?;
                state.close(e.name().as_ref())?;
            }
            Ok(Event::End(e)) => state.close(e.name().as_ref())?,
            Err(e) => {
                return Err(SceneLoadError::Parse(e.to_string()));
            }
            _ => {}
        }

        buf.clear();
    }

    let scene = state.scene;
    log::info!("Scene loaded: {} objects, {} emitters, {} sensors.",
               scene.len(), scene.emitters().len(), scene.sensors().len());

    Ok(SceneLoadResult { scene, settings: state.settings })
}

#[derive(Default)]
struct SensorState {
    fov_deg: Option<Float>,
    origin: Option<Vector3f>,
    target: Option<Vector3f>,
    up: Option<Vector3f>,
    near_clip: Option<Float>,
    far_clip: Option<Float>,
    width: Option<usize>,
    height: Option<usize>,
}

struct ShapeState {
    id: Option<String>,
    filename: Option<String>,
    bsdf_ref: Option<String>,
    emission: Option<RGBSpectrum>,
    translate: Vector3f,
    scale: Vector3f,
}

struct BsdfState {
    id: Option<String>,
    reflectance: Option<RGBSpectrum>,
}

struct ParseState {
    base_dir: PathBuf,
    defaults: HashMap<String, String>,
    scene: Scene,
    settings: PhotonVizSettings,
    bsdfs: HashMap<String, Arc<dyn BSDF>>,

    in_integrator: bool,
    in_film: bool,
    in_transform: bool,
    in_emitter: bool,
    sensor: Option<SensorState>,
    bsdf: Option<BsdfState>,
    shape: Option<ShapeState>,
}

impl ParseState {
    fn new(base_dir: &Path) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            defaults: HashMap::new(),
            scene: Scene::new(),
            settings: PhotonVizSettings::default(),
            bsdfs: HashMap::new(),
            in_integrator: false,
            in_film: false,
            in_transform: false,
            in_emitter: false,
            sensor: None,
            bsdf: None,
            shape: None,
        }
    }

    fn attributes(&self, e: &BytesStart) -> HashMap<String, String> {
        let mut attrs = HashMap::new();
        for attr in e.attributes().flatten() {
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let value = attr.unescape_value().unwrap_or_default();
            attrs.insert(key, resolve_value(&value, &self.defaults));
        }
        attrs
    }

    fn open(&mut self, e: &BytesStart) -> Result<(), SceneLoadError> {
        let attrs = self.attributes(e);
        let name = attrs.get("name").map(|s| s.as_str());
        let value = attrs.get("value").map(|s| s.as_str());

        match e.name().as_ref() {
            b"default" => {
                if let (Some(k), Some(v)) = (name, value) {
                    self.defaults.insert(k.to_string(), v.to_string());
                }
            }
            b"integrator" => {
                let integrator_type = attrs.get("type").map(|s| s.as_str()).unwrap_or("photon_viz");
                if integrator_type != "photon_viz" {
                    return Err(SceneLoadError::Parse(format!("unsupported integrator: {}", integrator_type)));
                }
                self.in_integrator = true;
            }
            b"sensor" => {
                match attrs.get("type").map(|s| s.as_str()) {
                    Some("perspective") => self.sensor = Some(SensorState::default()),
                    other => log::warn!("Skipping unsupported sensor type: {:?}.", other),
                }
            }
            b"film" => self.in_film = self.sensor.is_some(),
            b"transform" => self.in_transform = name == Some("to_world"),
            b"lookat" => {
                if let (Some(sensor), true) = (self.sensor.as_mut(), self.in_transform) {
                    sensor.origin = Some(parse_vec3(attrs.get("origin").ok_or(SceneLoadError::MissingField("lookat.origin"))?)?);
                    sensor.target = Some(parse_vec3(attrs.get("target").ok_or(SceneLoadError::MissingField("lookat.target"))?)?);
                    sensor.up = Some(parse_vec3(attrs.get("up").ok_or(SceneLoadError::MissingField("lookat.up"))?)?);
                }
            }
            b"translate" => {
                if let (Some(shape), true) = (self.shape.as_mut(), self.in_transform) {
                    let mut t = Vector3f::zeros();
                    for (idx, axis) in ["x", "y", "z"].iter().enumerate() {
                        if let Some(v) = attrs.get(*axis) {
                            t[idx] = parse_float(v)?;
                        }
                    }
                    shape.translate += t;
                }
            }
            b"scale" => {
                if let (Some(shape), true) = (self.shape.as_mut(), self.in_transform) {
                    let s = match value {
                        Some(u) => {
                            let u = parse_float(u)?;
                            Vector3f::new(u, u, u)
                        }
                        None => {
                            let mut s = Vector3f::new(1.0, 1.0, 1.0);
                            for (idx, axis) in ["x", "y", "z"].iter().enumerate() {
                                if let Some(v) = attrs.get(*axis) {
                                    s[idx] = parse_float(v)?;
                                }
                            }
                            s
                        }
                    };
                    // Later scales also stretch earlier translations.
                    shape.scale = shape.scale.component_mul(&s);
                    shape.translate = shape.translate.component_mul(&s);
                }
            }
            b"bsdf" => {
                match attrs.get("type").map(|s| s.as_str()) {
                    Some("diffuse") => {
                        self.bsdf = Some(BsdfState { id: attrs.get("id").cloned(), reflectance: None });
                    }
                    other => {
                        log::warn!("Skipping unsupported bsdf type: {:?}.", other);
                        self.bsdf = None;
                    }
                }
            }
            b"shape" => {
                match attrs.get("type").map(|s| s.as_str()) {
                    Some("obj") => {
                        self.shape = Some(ShapeState {
                            id: attrs.get("id").cloned(),
                            filename: None,
                            bsdf_ref: None,
                            emission: None,
                            translate: Vector3f::zeros(),
                            scale: Vector3f::new(1.0, 1.0, 1.0),
                        });
                    }
                    other => {
                        log::warn!("Skipping unsupported shape type: {:?}.", other);
                        self.shape = None;
                    }
                }
            }
            b"ref" => {
                if let Some(shape) = self.shape.as_mut() {
                    shape.bsdf_ref = attrs.get("id").cloned();
                }
            }
            b"emitter" => {
                match (attrs.get("type").map(|s| s.as_str()), self.shape.as_mut()) {
                    (Some("area"), Some(shape)) => {
                        self.in_emitter = true;
                        shape.emission = Some(RGBSpectrum::new(1.0, 1.0, 1.0));
                    }
                    (other, _) => log::warn!("Skipping emitter {:?} outside an obj shape.", other),
                }
            }
            b"string" => {
                if let (Some("filename"), Some(v), Some(shape)) = (name, value, self.shape.as_mut()) {
                    shape.filename = Some(v.to_string());
                }
            }
            b"float" => {
                if let (Some(name), Some(value)) = (name, value) {
                    self.set_float(name, value)?;
                }
            }
            b"integer" => {
                if let (Some(name), Some(value)) = (name, value) {
                    self.set_integer(name, value)?;
                }
            }
            b"rgb" => {
                if let (Some(name), Some(value)) = (name, value) {
                    self.set_rgb(name, value)?;
                }
            }
            _ => {}
        }

        Ok(())
    }

    fn set_float(&mut self, name: &str, value: &str) -> Result<(), SceneLoadError> {
        if self.in_integrator {
            // Squared acceptance radius, compared against squared distances.
            if name == "distance_threshold2" {
                self.settings.distance_threshold2 = Some(parse_float(value)?);
            }
        } else if let Some(sensor) = self.sensor.as_mut() {
            match name {
                "fov" => sensor.fov_deg = Some(parse_float(value)?),
                "near_clip" => sensor.near_clip = Some(parse_float(value)?),
                "far_clip" => sensor.far_clip = Some(parse_float(value)?),
                _ => {}
            }
        } else if let (true, Some(shape)) = (self.in_emitter, self.shape.as_mut()) {
            if name == "radiance" {
                shape.emission = Some(RGBSpectrum::splat(parse_float(value)?));
            }
        }
        Ok(())
    }

    fn set_integer(&mut self, name: &str, value: &str) -> Result<(), SceneLoadError> {
        if self.in_integrator {
            match name {
                "photon_count" => self.settings.photon_count = Some(parse_usize(value)?),
                "max_depth" => self.settings.max_depth = Some(parse_u32(value)?),
                "thread_count" => self.settings.thread_count = Some(parse_usize(value)?),
                "seed" => self.settings.seed = Some(parse_u64(value)?),
                _ => {}
            }
        } else if let (true, Some(sensor)) = (self.in_film, self.sensor.as_mut()) {
            match name {
                "width" => sensor.width = Some(parse_usize(value)?),
                "height" => sensor.height = Some(parse_usize(value)?),
                _ => {}
            }
        }
        Ok(())
    }

    fn set_rgb(&mut self, name: &str, value: &str) -> Result<(), SceneLoadError> {
        if self.in_integrator {
            if name == "background" {
                self.settings.background = Some(parse_vec3_spectrum(value)?);
            }
        } else if let (true, Some(shape)) = (self.in_emitter, self.shape.as_mut()) {
            if name == "radiance" {
                shape.emission = Some(parse_vec3_spectrum(value)?);
            }
        } else if let Some(bsdf) = self.bsdf.as_mut() {
            if name == "reflectance" {
                bsdf.reflectance = Some(parse_vec3_spectrum(value)?);
            }
        }
        Ok(())
    }

    fn close(&mut self, tag: &[u8]) -> Result<(), SceneLoadError> {
        match tag {
            b"integrator" => self.in_integrator = false,
            b"film" => self.in_film = false,
            b"transform" => self.in_transform = false,
            b"emitter" => self.in_emitter = false,
            b"sensor" => {
                if let Some(sensor) = self.sensor.take() {
                    self.finish_sensor(sensor)?;
                }
                self.in_film = false;
            }
            b"bsdf" => {
                if let Some(BsdfState { id: Some(id), reflectance }) = self.bsdf.take() {
                    let reflectance = reflectance.unwrap_or(RGBSpectrum::new(0.5, 0.5, 0.5));
                    let bsdf = Arc::new(LambertianDiffuseBSDF::new(reflectance)) as Arc<dyn BSDF>;
                    self.bsdfs.insert(id, bsdf);
                }
            }
            b"shape" => {
                if let Some(shape) = self.shape.take() {
                    self.finish_shape(shape)?;
                }
                self.in_emitter = false;
            }
            _ => {}
        }
        Ok(())
    }

    fn finish_sensor(&mut self, sensor: SensorState) -> Result<(), SceneLoadError> {
        let fov_deg = sensor.fov_deg.ok_or(SceneLoadError::MissingField("sensor.fov"))?;
        let origin = sensor.origin.ok_or(SceneLoadError::MissingField("sensor.origin"))?;
        let target = sensor.target.ok_or(SceneLoadError::MissingField("sensor.target"))?;
        let up = sensor.up.ok_or(SceneLoadError::MissingField("sensor.up"))?;
        let width = sensor.width.ok_or(SceneLoadError::MissingField("film.width"))?;
        let height = sensor.height.ok_or(SceneLoadError::MissingField("film.height"))?;

        let fov_rad = fov_deg * std::f32::consts::PI / 180.0;
        let camera = PerspectiveCamera::new(
            origin,
            target,
            up,
            fov_rad,
            width,
            height,
            sensor.near_clip.unwrap_or(0.0),
            sensor.far_clip.unwrap_or(std::f32::MAX),
        );
        self.scene.add_sensor(Box::new(camera));
        Ok(())
    }

    fn finish_shape(&mut self, shape: ShapeState) -> Result<(), SceneLoadError> {
        let filename = shape.filename.ok_or(SceneLoadError::MissingField("shape.filename"))?;
        let bsdf_id = shape.bsdf_ref.ok_or(SceneLoadError::MissingField("shape.bsdf_ref"))?;
        let material = self.bsdfs.get(&bsdf_id)
            .ok_or_else(|| SceneLoadError::Parse(format!("missing bsdf ref: {}", bsdf_id)))?
            .clone();

        let path = if Path::new(&filename).is_absolute() {
            PathBuf::from(&filename)
        } else {
            self.base_dir.join(&filename)
        };

        let mut mesh = TriangleMesh::from_obj(&path)
            .map_err(|e| SceneLoadError::Parse(format!("obj load failed ({}): {}", path.display(), e)))?;
        if shape.scale != Vector3f::new(1.0, 1.0, 1.0) || shape.translate != Vector3f::zeros() {
            mesh = mesh.transformed(&shape.scale, &shape.translate);
        }
        log::debug!("Loaded shape {} with {} triangles.", filename, mesh.triangles().len());

        let mut object = SceneObject::new(Arc::new(mesh), material);
        if let Some(id) = shape.id {
            object = object.with_name(id);
        }
        if let Some(emission) = shape.emission {
            object = object.with_emission(emission);
        }
        self.scene.add_object(object);
        Ok(())
    }
}

fn resolve_value(raw: &str, defaults: &HashMap<String, String>) -> String {
    let mut out = raw.to_string();
    for (k, v) in defaults {
        out = out.replace(&format!("${}", k), v);
    }
    out
}

fn parse_float(value: &str) -> Result<Float, SceneLoadError> {
    value.trim().parse::<Float>().map_err(|_| SceneLoadError::Parse(format!("invalid float: {}", value)))
}

fn parse_u32(value: &str) -> Result<u32, SceneLoadError> {
    value.trim().parse::<u32>().map_err(|_| SceneLoadError::Parse(format!("invalid integer: {}", value)))
}

fn parse_u64(value: &str) -> Result<u64, SceneLoadError> {
    value.trim().parse::<u64>().map_err(|_| SceneLoadError::Parse(format!("invalid integer: {}", value)))
}

fn parse_usize(value: &str) -> Result<usize, SceneLoadError> {
    value.trim().parse::<usize>().map_err(|_| SceneLoadError::Parse(format!("invalid integer: {}", value)))
}

fn parse_vec3(value: &str) -> Result<Vector3f, SceneLoadError> {
    let parts: Vec<&str> = value.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect();
    if parts.len() != 3 {
        return Err(SceneLoadError::Parse(format!("invalid vec3: {}", value)));
    }
    Ok(Vector3f::new(parse_float(parts[0])?, parse_float(parts[1])?, parse_float(parts[2])?))
}

fn parse_vec3_spectrum(value: &str) -> Result<RGBSpectrum, SceneLoadError> {
    Ok(RGBSpectrum::from_vec(parse_vec3(value)?))
}
