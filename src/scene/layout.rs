//! GPU-side layout of the scene header

use bytemuck::{Pod, Zeroable};

use crate::core::types::{IVec3, Vec4};

/// Number of palette entries, fixed by the `.vox` format
pub const PALETTE_SIZE: usize = 256;

/// Scene header uploaded ahead of the voxel bytes (4112 bytes).
///
/// Must match `Scene` in raytrace.frag.wgsl:
///
/// | offset | size | field                           |
/// |-------:|-----:|---------------------------------|
/// | 0      | 12   | `size` (vec3<i32>)              |
/// | 12     | 4    | `_pad`, aligns palette to 16    |
/// | 16     | 4096 | `palette` (array<vec4<f32>, 256>) |
///
/// The voxel array (`array<u32>` on the GPU, four indices per word,
/// little-endian) starts at offset 4112.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SceneMetadata {
    /// Grid dimensions (x, y, z)
    pub size: [i32; 3],
    pub _pad: i32,
    /// RGBA colors normalized to 0..1; index 0 is the empty voxel
    pub palette: [[f32; 4]; PALETTE_SIZE],
}

impl SceneMetadata {
    pub fn new(size: IVec3, palette: [[f32; 4]; PALETTE_SIZE]) -> Self {
        Self {
            size: size.to_array(),
            _pad: 0,
            palette,
        }
    }

    pub fn size(&self) -> IVec3 {
        IVec3::from_array(self.size)
    }

    /// Number of cells in the grid
    pub fn voxel_count(&self) -> usize {
        self.size.iter().map(|&s| s.max(0) as usize).product()
    }

    pub fn color(&self, index: u8) -> Vec4 {
        Vec4::from_array(self.palette[index as usize])
    }
}

impl Default for SceneMetadata {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// Convert an 8-bit channel to 0..1
pub fn normalize_channel(c: u8) -> f32 {
    c as f32 / 255.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    #[test]
    fn test_layout() {
        assert_eq!(size_of::<SceneMetadata>(), 4112);
        assert_eq!(offset_of!(SceneMetadata, size), 0);
        assert_eq!(offset_of!(SceneMetadata, _pad), 12);
        assert_eq!(offset_of!(SceneMetadata, palette), 16);
    }

    #[test]
    fn test_bytes_are_little_endian_fields() {
        let mut palette = [[0.0; 4]; PALETTE_SIZE];
        palette[1] = [0.25, 0.5, 0.75, 1.0];
        let metadata = SceneMetadata::new(IVec3::new(3, 4, 5), palette);

        let bytes = bytemuck::bytes_of(&metadata);
        assert_eq!(&bytes[0..4], &3i32.to_ne_bytes());
        assert_eq!(&bytes[8..12], &5i32.to_ne_bytes());
        assert_eq!(&bytes[12..16], &[0, 0, 0, 0]);
        // palette[1].g
        assert_eq!(&bytes[16 + 16 + 4..16 + 16 + 8], &0.5f32.to_ne_bytes());
    }

    #[test]
    fn test_palette_conversion_invertible() {
        for c in 0..=255u8 {
            let normalized = normalize_channel(c);
            assert_eq!(normalized, c as f32 / 255.0);
            assert!((0.0..=1.0).contains(&normalized));
            assert_eq!((normalized * 255.0).round() as u8, c);
        }
    }

    #[test]
    fn test_voxel_count() {
        let metadata = SceneMetadata::new(IVec3::new(2, 3, 4), [[0.0; 4]; PALETTE_SIZE]);
        assert_eq!(metadata.voxel_count(), 24);
        assert_eq!(metadata.size(), IVec3::new(2, 3, 4));
        assert_eq!(SceneMetadata::default().voxel_count(), 0);
    }
}
