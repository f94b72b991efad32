//! Typed wrapper over a single wgpu buffer

use std::marker::PhantomData;

use bytemuck::Pod;
use wgpu::util::DeviceExt;

/// What a [`GpuBuffer`] is bound as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    /// Per-vertex attributes
    Vertex,
    /// Element indices
    Index,
    /// Read-only shader storage
    Storage,
    /// Uniform block
    Uniform,
}

impl BufferKind {
    pub fn usage(self) -> wgpu::BufferUsages {
        let usage = match self {
            BufferKind::Vertex => wgpu::BufferUsages::VERTEX,
            BufferKind::Index => wgpu::BufferUsages::INDEX,
            BufferKind::Storage => wgpu::BufferUsages::STORAGE,
            BufferKind::Uniform => wgpu::BufferUsages::UNIFORM,
        };
        usage | wgpu::BufferUsages::COPY_DST
    }
}

/// GPU buffer holding elements of type `T`.
///
/// [`source`](Self::source) replaces the whole allocation and records the
/// element count used by draw calls. [`sub_source`](Self::sub_source)
/// overwrites a byte range in place. A buffer that has never been sourced
/// (or was sourced with no data) owns no wgpu object.
pub struct GpuBuffer<T: Pod> {
    kind: BufferKind,
    label: &'static str,
    buffer: Option<wgpu::Buffer>,
    len: u32,
    _marker: PhantomData<T>,
}

impl<T: Pod> GpuBuffer<T> {
    pub fn new(kind: BufferKind, label: &'static str) -> Self {
        Self {
            kind,
            label,
            buffer: None,
            len: 0,
            _marker: PhantomData,
        }
    }

    pub fn vertex(label: &'static str) -> Self {
        Self::new(BufferKind::Vertex, label)
    }

    pub fn index(label: &'static str) -> Self {
        Self::new(BufferKind::Index, label)
    }

    pub fn storage(label: &'static str) -> Self {
        Self::new(BufferKind::Storage, label)
    }

    pub fn uniform(label: &'static str) -> Self {
        Self::new(BufferKind::Uniform, label)
    }

    /// Create and source in one step
    pub fn with_data(device: &wgpu::Device, kind: BufferKind, label: &'static str, data: &[T]) -> Self {
        let mut buffer = Self::new(kind, label);
        buffer.source(device, data);
        buffer
    }

    /// Replace the buffer contents. The allocation is padded to wgpu's copy
    /// alignment; the padding is zeroed.
    pub fn source(&mut self, device: &wgpu::Device, data: &[T]) {
        self.len = data.len() as u32;
        self.buffer = if data.is_empty() {
            None
        } else {
            Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(self.label),
                contents: bytemuck::cast_slice(data),
                usage: self.kind.usage(),
            }))
        };
    }

    /// Overwrite `data.len()` elements starting at byte `offset`.
    ///
    /// The range must lie within the sourced allocation and both offset and
    /// byte length must be multiples of 4; this is not checked in release
    /// builds.
    pub fn sub_source(&self, queue: &wgpu::Queue, offset: u64, data: &[T]) {
        let Some(buffer) = &self.buffer else {
            log::warn!("sub_source on unsourced buffer {}", self.label);
            return;
        };
        let bytes: &[u8] = bytemuck::cast_slice(data);
        debug_assert!(offset + bytes.len() as u64 <= buffer.size());
        queue.write_buffer(buffer, offset, bytes);
    }

    /// Element count recorded by the last `source`
    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size of the sourced data in bytes (without alignment padding)
    pub fn byte_len(&self) -> u64 {
        self.len as u64 * std::mem::size_of::<T>() as u64
    }

    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Underlying wgpu buffer, if sourced
    pub fn raw(&self) -> Option<&wgpu::Buffer> {
        self.buffer.as_ref()
    }

    /// Whole-buffer binding for bind groups
    pub fn as_binding(&self) -> Option<wgpu::BindingResource<'_>> {
        self.buffer.as_ref().map(|b| b.as_entire_binding())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_flags() {
        assert!(BufferKind::Vertex.usage().contains(wgpu::BufferUsages::VERTEX));
        assert!(BufferKind::Index.usage().contains(wgpu::BufferUsages::INDEX));
        assert!(BufferKind::Storage.usage().contains(wgpu::BufferUsages::STORAGE));
        assert!(BufferKind::Uniform.usage().contains(wgpu::BufferUsages::UNIFORM));
        for kind in [BufferKind::Vertex, BufferKind::Index, BufferKind::Storage, BufferKind::Uniform] {
            assert!(kind.usage().contains(wgpu::BufferUsages::COPY_DST));
        }
    }

    #[test]
    fn test_unsourced_buffer() {
        let buffer = GpuBuffer::<[f32; 2]>::vertex("quad_vertices");
        assert!(buffer.is_empty());
        assert_eq!(buffer.byte_len(), 0);
        assert!(buffer.raw().is_none());
        assert!(buffer.as_binding().is_none());
        assert_eq!(buffer.kind(), BufferKind::Vertex);
        assert_eq!(buffer.label(), "quad_vertices");
    }
}
