// Copyright @yucwang 2021

pub mod photon_visualizer;
pub mod renderer;
