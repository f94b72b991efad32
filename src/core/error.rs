//! Error types for the voxel raytracer

use thiserror::Error;

/// Main error type for the viewer
#[derive(Debug, Error)]
pub enum Error {
    #[error("GPU error: {0}")]
    Gpu(String),

    #[error("Window error: {0}")]
    Window(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scene error: {0}")]
    Scene(String),

    #[error("Shader error: {0}")]
    Shader(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Uniform not found: {0}")]
    UniformNotFound(String),

    #[error("Uniform {name} has type {actual}, cannot assign {expected}")]
    UniformMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },
}
