//! Voxel scene loading and GPU packing

pub mod layout;
pub mod model;
pub mod loader;

pub use layout::{SceneMetadata, PALETTE_SIZE};
pub use loader::{load_scene, Scene};
pub use model::{Rgba8, VoxModel};
