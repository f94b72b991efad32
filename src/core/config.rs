//! Viewer configuration.
//!
//! Every field has a default, so a config file only needs to name what it
//! overrides. Without a config file the viewer runs with the defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::camera::FpsCamera;
use crate::core::error::Error;
use crate::core::file;
use crate::core::types::Result;

/// Config file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "voxray.json";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    /// `.vox` file to render
    pub scene_path: PathBuf,
    /// Directory holding `raytrace.vert.wgsl` / `raytrace.frag.wgsl`.
    /// `None` uses the shaders built into the binary.
    pub shader_dir: Option<PathBuf>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            camera: CameraConfig::default(),
            scene_path: PathBuf::from("res/spellbook.vox"),
            shader_dir: None,
        }
    }
}

impl ViewerConfig {
    /// Parse a config from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load a config file; a missing or malformed file is an error
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = file::read_text_file(path)?;
        serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load a config file if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            log::info!("Loading config from {}", path.display());
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Width over height of the window
    pub fn aspect_ratio(&self) -> f32 {
        self.window.width as f32 / self.window.height as f32
    }
}

// ---------------------------------------------------------------------------
// Window config
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Block presentation on the display refresh
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Voxel raytracer".to_string(),
            width: 1024,
            height: 768,
            vsync: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Camera config
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    pub position: [f32; 3],
    /// Units per second
    pub speed: f32,
    /// Degrees per pixel
    pub sensitivity: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 80.0,
            position: [60.0, 60.0, 60.0],
            speed: FpsCamera::DEFAULT_SPEED * 3.0,
            sensitivity: FpsCamera::DEFAULT_SENSITIVITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ViewerConfig::default();
        assert_eq!(config.window.width, 1024);
        assert_eq!(config.window.height, 768);
        assert_eq!(config.scene_path, PathBuf::from("res/spellbook.vox"));
        assert!((config.aspect_ratio() - 1024.0 / 768.0).abs() < 1e-6);
        assert_eq!(config.camera.speed, 30.0);
    }

    #[test]
    fn test_partial_override() {
        let config = ViewerConfig::from_json(
            r#"{ "window": { "title": "castle" }, "camera": { "fov_degrees": 60.0 } }"#,
        )
        .expect("parse");
        assert_eq!(config.window.title, "castle");
        assert_eq!(config.window.width, 1024);
        assert_eq!(config.camera.fov_degrees, 60.0);
        assert_eq!(config.camera.position, [60.0, 60.0, 60.0]);
        assert!(config.shader_dir.is_none());
    }

    #[test]
    fn test_malformed() {
        let result = ViewerConfig::from_json(r#"{ "window": { "width": "wide" } }"#);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_load_malformed_file() {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, r#"{ "window": { "width": "wide" } }"#).expect("write config");

        let err = ViewerConfig::load_or_default(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        let message = err.to_string();
        assert_eq!(message.matches("Config error").count(), 1, "{}", message);
        assert!(message.contains(CONFIG_FILE_NAME), "{}", message);
    }

    #[test]
    fn test_load_or_default() {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let path = temp_dir.path().join(CONFIG_FILE_NAME);

        let config = ViewerConfig::load_or_default(&path).expect("missing file is fine");
        assert_eq!(config, ViewerConfig::default());

        let mut custom = ViewerConfig::default();
        custom.scene_path = PathBuf::from("res/monu1.vox");
        custom.shader_dir = Some(PathBuf::from("shaders"));
        std::fs::write(&path, serde_json::to_string_pretty(&custom).expect("serialize"))
            .expect("write config");

        let loaded = ViewerConfig::load_or_default(&path).expect("load");
        assert_eq!(loaded, custom);
    }
}
