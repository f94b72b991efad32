//! voxray - a real-time voxel raytracer for `.vox` scenes

pub mod core;
pub mod scene;
pub mod render;
pub mod app;
