//! Vertex array: one vertex buffer, an optional index buffer and an attribute layout

use bytemuck::Pod;

use crate::core::error::Error;
use crate::core::types::Result;
use crate::render::buffer::GpuBuffer;

/// Scalar type of a vertex attribute component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttribType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
}

impl AttribType {
    pub fn byte_size(self) -> u32 {
        match self {
            AttribType::I8 | AttribType::U8 => 1,
            AttribType::I16 | AttribType::U16 => 2,
            AttribType::I32 | AttribType::U32 | AttribType::F32 => 4,
        }
    }
}

/// One attribute: `components` values of `ty`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub ty: AttribType,
    pub components: u32,
}

impl VertexAttribute {
    pub const fn new(ty: AttribType, components: u32) -> Self {
        Self { ty, components }
    }

    pub fn byte_size(&self) -> u32 {
        self.components * self.ty.byte_size()
    }

    /// Matching wgpu format; 8/16-bit types have no 3-component form
    pub fn format(&self) -> Option<wgpu::VertexFormat> {
        use wgpu::VertexFormat as F;
        let format = match (self.ty, self.components) {
            (AttribType::F32, 1) => F::Float32,
            (AttribType::F32, 2) => F::Float32x2,
            (AttribType::F32, 3) => F::Float32x3,
            (AttribType::F32, 4) => F::Float32x4,
            (AttribType::U32, 1) => F::Uint32,
            (AttribType::U32, 2) => F::Uint32x2,
            (AttribType::U32, 3) => F::Uint32x3,
            (AttribType::U32, 4) => F::Uint32x4,
            (AttribType::I32, 1) => F::Sint32,
            (AttribType::I32, 2) => F::Sint32x2,
            (AttribType::I32, 3) => F::Sint32x3,
            (AttribType::I32, 4) => F::Sint32x4,
            (AttribType::U16, 1) => F::Uint16,
            (AttribType::U16, 2) => F::Uint16x2,
            (AttribType::U16, 4) => F::Uint16x4,
            (AttribType::I16, 1) => F::Sint16,
            (AttribType::I16, 2) => F::Sint16x2,
            (AttribType::I16, 4) => F::Sint16x4,
            (AttribType::U8, 1) => F::Uint8,
            (AttribType::U8, 2) => F::Uint8x2,
            (AttribType::U8, 4) => F::Uint8x4,
            (AttribType::I8, 1) => F::Sint8,
            (AttribType::I8, 2) => F::Sint8x2,
            (AttribType::I8, 4) => F::Sint8x4,
            _ => return None,
        };
        Some(format)
    }
}

/// Attribute offsets and stride for one vertex buffer slot
#[derive(Debug, Clone, PartialEq)]
pub struct VertexLayout {
    stride: u64,
    attributes: Vec<wgpu::VertexAttribute>,
}

impl VertexLayout {
    /// Lay attributes out back to back in declaration order; stride is
    /// `size_of::<V>()` and shader locations count up from 0.
    pub fn new<V: Pod>(attributes: &[VertexAttribute]) -> Result<Self> {
        let stride = std::mem::size_of::<V>() as u64;
        let mut offset = 0u64;
        let mut out = Vec::with_capacity(attributes.len());

        for (location, attribute) in attributes.iter().enumerate() {
            let format = attribute.format().ok_or_else(|| {
                Error::Gpu(format!(
                    "Unsupported vertex attribute {:?} x{}",
                    attribute.ty, attribute.components
                ))
            })?;
            out.push(wgpu::VertexAttribute {
                format,
                offset,
                shader_location: location as u32,
            });
            offset += attribute.byte_size() as u64;
        }

        debug_assert!(
            offset <= stride,
            "vertex attributes span {} bytes but the vertex is {} bytes",
            offset, stride
        );
        if offset != stride {
            log::warn!("Vertex attributes cover {} of {} bytes per vertex", offset, stride);
        }

        Ok(Self {
            stride,
            attributes: out,
        })
    }

    pub fn stride(&self) -> u64 {
        self.stride
    }

    pub fn attributes(&self) -> &[wgpu::VertexAttribute] {
        &self.attributes
    }

    pub fn buffer_layout(&self) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: self.stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &self.attributes,
        }
    }
}

/// Element type usable in an index buffer
pub trait IndexElement: Pod {
    const FORMAT: wgpu::IndexFormat;
}

impl IndexElement for u16 {
    const FORMAT: wgpu::IndexFormat = wgpu::IndexFormat::Uint16;
}

impl IndexElement for u32 {
    const FORMAT: wgpu::IndexFormat = wgpu::IndexFormat::Uint32;
}

/// What [`VertexArray::draw`] will issue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawCall {
    Indexed { count: u32, format: wgpu::IndexFormat },
    Arrays { count: u32 },
}

/// Binds one vertex buffer and an optional index buffer under a fixed layout
pub struct VertexArray<V: Pod, I: IndexElement = u32> {
    vertices: GpuBuffer<V>,
    indices: Option<GpuBuffer<I>>,
    layout: VertexLayout,
}

impl<V: Pod, I: IndexElement> VertexArray<V, I> {
    pub fn new(
        vertices: GpuBuffer<V>,
        indices: Option<GpuBuffer<I>>,
        attributes: &[VertexAttribute],
    ) -> Result<Self> {
        Ok(Self {
            vertices,
            indices,
            layout: VertexLayout::new::<V>(attributes)?,
        })
    }

    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    pub fn vertices(&self) -> &GpuBuffer<V> {
        &self.vertices
    }

    pub fn vertices_mut(&mut self) -> &mut GpuBuffer<V> {
        &mut self.vertices
    }

    pub fn indices(&self) -> Option<&GpuBuffer<I>> {
        self.indices.as_ref()
    }

    pub fn indices_mut(&mut self) -> Option<&mut GpuBuffer<I>> {
        self.indices.as_mut()
    }

    /// Indexed when an index buffer is attached, otherwise one vertex per element
    pub fn draw_call(&self) -> DrawCall {
        match &self.indices {
            Some(indices) => DrawCall::Indexed {
                count: indices.len(),
                format: I::FORMAT,
            },
            None => DrawCall::Arrays {
                count: self.vertices.len(),
            },
        }
    }

    /// Record the draw into a render pass whose pipeline is already set
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        let Some(vertex_buffer) = self.vertices.raw() else {
            return;
        };
        pass.set_vertex_buffer(0, vertex_buffer.slice(..));

        match self.draw_call() {
            DrawCall::Indexed { count, format } => {
                if let Some(index_buffer) = self.indices.as_ref().and_then(|i| i.raw()) {
                    pass.set_index_buffer(index_buffer.slice(..), format);
                    pass.draw_indexed(0..count, 0, 0..1);
                }
            }
            DrawCall::Arrays { count } => {
                pass.draw(0..count, 0..1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::Zeroable;

    #[repr(C)]
    #[derive(Clone, Copy, Pod, Zeroable)]
    struct ColoredVertex {
        position: [f32; 3],
        uv: [f32; 2],
        color: [u8; 4],
    }

    #[test]
    fn test_single_attribute() {
        let layout = VertexLayout::new::<[f32; 2]>(&[VertexAttribute::new(AttribType::F32, 2)])
            .expect("layout");
        assert_eq!(layout.stride(), 8);
        assert_eq!(layout.attributes().len(), 1);
        assert_eq!(layout.attributes()[0].offset, 0);
        assert_eq!(layout.attributes()[0].format, wgpu::VertexFormat::Float32x2);
    }

    #[test]
    fn test_offsets_accumulate() {
        let layout = VertexLayout::new::<ColoredVertex>(&[
            VertexAttribute::new(AttribType::F32, 3),
            VertexAttribute::new(AttribType::F32, 2),
            VertexAttribute::new(AttribType::U8, 4),
        ])
        .expect("layout");

        assert_eq!(layout.stride(), 24);
        let offsets: Vec<u64> = layout.attributes().iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 12, 20]);
        let locations: Vec<u32> = layout.attributes().iter().map(|a| a.shader_location).collect();
        assert_eq!(locations, vec![0, 1, 2]);
        assert_eq!(layout.buffer_layout().array_stride, 24);
    }

    #[test]
    fn test_trailing_padding_is_allowed() {
        // position only; uv and color left unused
        let layout = VertexLayout::new::<ColoredVertex>(&[VertexAttribute::new(AttribType::F32, 3)])
            .expect("layout");
        assert_eq!(layout.stride(), 24);
        assert_eq!(layout.attributes().len(), 1);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn test_attributes_wider_than_vertex() {
        let _ = VertexLayout::new::<[f32; 2]>(&[VertexAttribute::new(AttribType::F32, 3)]);
    }

    #[test]
    fn test_unsupported_format() {
        let result = VertexLayout::new::<[u8; 4]>(&[VertexAttribute::new(AttribType::U8, 3)]);
        assert!(matches!(result, Err(Error::Gpu(_))));
    }

    #[test]
    fn test_byte_sizes() {
        assert_eq!(VertexAttribute::new(AttribType::I16, 2).byte_size(), 4);
        assert_eq!(VertexAttribute::new(AttribType::U32, 4).byte_size(), 16);
        assert_eq!(VertexAttribute::new(AttribType::I8, 1).byte_size(), 1);
    }

    #[test]
    fn test_draw_call_selection() {
        let attributes = [VertexAttribute::new(AttribType::F32, 2)];

        let indexed = VertexArray::<[f32; 2], u32>::new(
            GpuBuffer::vertex("v"),
            Some(GpuBuffer::index("i")),
            &attributes,
        )
        .expect("vertex array");
        assert_eq!(
            indexed.draw_call(),
            DrawCall::Indexed { count: 0, format: wgpu::IndexFormat::Uint32 }
        );

        let plain = VertexArray::<[f32; 2], u16>::new(GpuBuffer::vertex("v"), None, &attributes)
            .expect("vertex array");
        assert_eq!(plain.draw_call(), DrawCall::Arrays { count: 0 });
        assert!(plain.indices().is_none());
    }
}
