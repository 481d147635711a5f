// Copyright @yucwang 2021

pub mod photon_tracer;
