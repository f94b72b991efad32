//! Rendering system and GPU interfaces

pub mod context;
pub mod buffer;
pub mod geometry;
pub mod shader;
pub mod raytracer;
