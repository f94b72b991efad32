//! Voxel model as produced by the `.vox` parser

use crate::core::error::Error;
use crate::core::types::Result;
use crate::scene::layout::PALETTE_SIZE;

/// 8-bit RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// A single dense voxel model with its palette.
///
/// `voxel_data[x + y * size[0] + z * size[0] * size[1]]` is a palette
/// index, 0 meaning empty.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxModel {
    pub size: [u32; 3],
    pub palette: [Rgba8; PALETTE_SIZE],
    pub voxel_data: Vec<u8>,
}

impl VoxModel {
    /// Empty model of the given size with an all-black palette
    pub fn empty(size: [u32; 3]) -> Self {
        let count = size.iter().map(|&s| s as usize).product();
        Self {
            size,
            palette: [Rgba8::default(); PALETTE_SIZE],
            voxel_data: vec![0; count],
        }
    }

    /// Number of cells described by `size`
    pub fn cell_count(&self) -> usize {
        self.size.iter().map(|&s| s as usize).product()
    }

    /// Parse a `.vox` file image and keep its first model
    pub fn from_vox_bytes(bytes: &[u8]) -> Result<Self> {
        let data = dot_vox::load_bytes(bytes)
            .map_err(|e| Error::Scene(format!("Could not parse vox data: {}", e)))?;
        Self::from_dot_vox(&data)
    }

    /// Densify the first model of a parsed file.
    ///
    /// dot_vox stores voxels sparsely with `i` = file color index - 1 and the
    /// palette in file order. The dense grid stores the file color index
    /// itself (1..=255, 0 = empty), so the palette is rotated by one: entry
    /// `k` is file entry `k - 1` and entry 0 is file entry 255.
    pub fn from_dot_vox(data: &dot_vox::DotVoxData) -> Result<Self> {
        let model = data
            .models
            .first()
            .ok_or_else(|| Error::Scene("File has no models".to_string()))?;
        if data.models.len() > 1 {
            log::warn!("Vox file has {} models, only the first is used", data.models.len());
        }

        let size = [model.size.x, model.size.y, model.size.z];
        let mut out = Self::empty(size);

        for (k, color) in out.palette.iter_mut().enumerate() {
            let src = (k + PALETTE_SIZE - 1) % PALETTE_SIZE;
            if let Some(c) = data.palette.get(src) {
                *color = Rgba8::new(c.r, c.g, c.b, c.a);
            }
        }

        let (sx, sy) = (size[0] as usize, size[1] as usize);
        for voxel in &model.voxels {
            let (x, y, z) = (voxel.x as usize, voxel.y as usize, voxel.z as usize);
            if voxel.x as u32 >= size[0] || voxel.y as u32 >= size[1] || voxel.z as u32 >= size[2] {
                continue;
            }
            out.voxel_data[x + y * sx + z * sx * sy] = voxel.i.wrapping_add(1);
        }

        Ok(out)
    }
}
