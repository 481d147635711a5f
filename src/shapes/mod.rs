// Copyright @yucwang 2021

pub mod triangle;
pub mod triangle_mesh;
