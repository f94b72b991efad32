//! Scene loading and packing for GPU upload

use std::path::Path;

use crate::core::byte_buffer::ByteBuffer;
use crate::core::error::Error;
use crate::core::file;
use crate::core::types::{IVec3, Result};
use crate::scene::layout::{normalize_channel, SceneMetadata, PALETTE_SIZE};
use crate::scene::model::VoxModel;

/// A voxel grid with its palette, owned independently of the parser
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    metadata: SceneMetadata,
    /// One palette index per cell, `size.x * size.y * size.z` long
    voxels: Vec<u8>,
}

impl Scene {
    /// Copy dimensions, normalized palette and voxel indices out of a model
    pub fn from_model(model: &VoxModel) -> Result<Self> {
        let size = IVec3::new(
            dim_to_i32(model.size[0])?,
            dim_to_i32(model.size[1])?,
            dim_to_i32(model.size[2])?,
        );

        let mut palette = [[0.0f32; 4]; PALETTE_SIZE];
        for (dst, c) in palette.iter_mut().zip(model.palette.iter()) {
            *dst = [
                normalize_channel(c.r),
                normalize_channel(c.g),
                normalize_channel(c.b),
                normalize_channel(c.a),
            ];
        }

        let metadata = SceneMetadata::new(size, palette);
        let count = metadata.voxel_count();
        if count == 0 {
            return Err(Error::Scene(format!(
                "Model is {}x{}x{} and holds no voxels",
                size.x, size.y, size.z
            )));
        }
        if model.voxel_data.len() < count {
            return Err(Error::Scene(format!(
                "Model is {}x{}x{} but carries only {} voxels",
                size.x, size.y, size.z, model.voxel_data.len()
            )));
        }

        Ok(Self {
            metadata,
            voxels: model.voxel_data[..count].to_vec(),
        })
    }

    /// Parse an in-memory `.vox` image
    pub fn from_vox_bytes(bytes: &[u8]) -> Result<Self> {
        let model = VoxModel::from_vox_bytes(bytes)?;
        Self::from_model(&model)
    }

    pub fn metadata(&self) -> &SceneMetadata {
        &self.metadata
    }

    pub fn size(&self) -> IVec3 {
        self.metadata.size()
    }

    pub fn voxels(&self) -> &[u8] {
        &self.voxels
    }

    /// Header followed by the voxel bytes, ready for a storage buffer
    pub fn pack(&self) -> Vec<u8> {
        let mut buffer = ByteBuffer::with_capacity(self.packed_len());
        buffer.add(&self.metadata);
        buffer.extend(&self.voxels);
        buffer.into_vec()
    }

    pub fn packed_len(&self) -> usize {
        std::mem::size_of::<SceneMetadata>() + self.voxels.len()
    }
}

fn dim_to_i32(dim: u32) -> Result<i32> {
    i32::try_from(dim).map_err(|_| Error::Scene(format!("Model dimension {} out of range", dim)))
}

/// Read and parse a `.vox` file, keeping its first model
pub fn load_scene(path: impl AsRef<Path>) -> Result<Scene> {
    let path = path.as_ref();
    let bytes = file::read_file(path)
        .map_err(|e| Error::Scene(format!("Could not open {}: {}", path.display(), e)))?;

    let scene = Scene::from_vox_bytes(&bytes)?;
    let size = scene.size();
    log::info!(
        "Loaded scene {}: {}x{}x{} ({} bytes packed)",
        path.display(), size.x, size.y, size.z, scene.packed_len()
    );
    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::model::tests::vox_file;
    use crate::scene::model::Rgba8;
    use glam::Vec4;
    use tempfile::TempDir;

    const HEADER: usize = std::mem::size_of::<SceneMetadata>();

    #[test]
    fn test_red_cube() {
        let mut model = VoxModel::empty([2, 2, 2]);
        model.palette = [Rgba8::new(255, 0, 0, 255); PALETTE_SIZE];

        let scene = Scene::from_model(&model).expect("scene");
        let packed = scene.pack();

        assert_eq!(packed.len(), HEADER + 8);
        assert_eq!(scene.metadata().color(0), Vec4::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(&packed[HEADER..], &[0u8; 8]);
    }

    #[test]
    fn test_pack_layout() {
        let mut model = VoxModel::empty([3, 1, 2]);
        model.palette[7] = Rgba8::new(0, 51, 102, 255);
        model.voxel_data = vec![0, 7, 0, 7, 7, 1];

        let scene = Scene::from_model(&model).expect("scene");
        let packed = scene.pack();

        assert_eq!(packed.len(), scene.packed_len());
        assert_eq!(&packed[..HEADER], bytemuck::bytes_of(scene.metadata()));
        assert_eq!(&packed[HEADER..], scene.voxels());
        assert_eq!(&packed[0..4], &3i32.to_ne_bytes());
        assert_eq!(scene.metadata().color(7), Vec4::new(0.0, 0.2, 0.4, 1.0));
    }

    #[test]
    fn test_voxel_length_matches_size() {
        for size in [[1, 1, 1], [4, 3, 2], [16, 1, 9]] {
            let scene = Scene::from_model(&VoxModel::empty(size)).expect("scene");
            let s = scene.size();
            assert_eq!(scene.voxels().len(), (s.x * s.y * s.z) as usize);
        }
    }

    #[test]
    fn test_empty_grid_is_rejected() {
        for size in [[0, 5, 5], [3, 0, 1], [0, 0, 0]] {
            let result = Scene::from_model(&VoxModel::empty(size));
            assert!(matches!(result, Err(Error::Scene(_))), "{:?}", size);
        }
    }

    #[test]
    fn test_smallest_scene_fills_a_voxel_word() {
        // the shader's runtime voxel array needs at least one u32 after the header
        let scene = Scene::from_model(&VoxModel::empty([1, 1, 1])).expect("scene");
        assert!(scene.packed_len() > HEADER);
    }

    #[test]
    fn test_short_voxel_data() {
        let mut model = VoxModel::empty([2, 2, 2]);
        model.voxel_data.truncate(5);
        assert!(matches!(Scene::from_model(&model), Err(Error::Scene(_))));
    }

    #[test]
    fn test_load_scene_from_disk() {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let path = temp_dir.path().join("tiny.vox");
        let mut palette = [[0u8; 4]; 256];
        palette[0] = [255, 255, 255, 255];
        std::fs::write(&path, vox_file([2, 2, 2], &[[1, 1, 1, 1]], &palette)).expect("write vox");

        let scene = load_scene(&path).expect("load");
        assert_eq!(scene.size(), IVec3::new(2, 2, 2));
        assert_eq!(scene.voxels().len(), 8);
        assert_eq!(scene.voxels()[7], 1);
        assert_eq!(scene.metadata().color(1), Vec4::ONE);
        assert_eq!(scene.pack().len(), HEADER + 8);
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let result = load_scene(temp_dir.path().join("nope.vox"));
        assert!(matches!(result, Err(Error::Scene(_))));
    }
}
