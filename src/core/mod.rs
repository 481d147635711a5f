// Copyright @yucwang 2021

pub mod bsdf;
pub mod bvh;
pub mod computation_node;
pub mod emitter;
pub mod interaction;
pub mod parallel;
pub mod photon;
pub mod photon_map;
pub mod rng;
pub mod sensor;
pub mod scene;
pub mod scene_loader;
pub mod shape;
