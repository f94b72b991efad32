//! Core types and utilities

pub mod types;
pub mod error;
pub mod logging;
pub mod config;
pub mod time;
pub mod input;
pub mod camera;
pub mod camera_controller;
pub mod byte_buffer;
pub mod file;

pub use types::*;
pub use error::Error;
