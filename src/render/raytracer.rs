//! Fullscreen voxel raytracer
//!
//! The packed scene lives in one storage buffer at `@group(0) @binding(0)`;
//! camera state goes through the program's uniform block at `@group(1)`.
//! Each frame draws a single quad covering the viewport and the fragment
//! shader marches every pixel's ray through the grid.

use std::path::Path;

use crate::core::camera::FpsCamera;
use crate::core::file;
use crate::core::types::Result;
use crate::render::buffer::{BufferKind, GpuBuffer};
use crate::render::context::GpuContext;
use crate::render::geometry::{AttribType, VertexArray, VertexAttribute};
use crate::render::shader::{ProgramDescriptor, ShaderProgram, ShaderSources, UniformTarget};
use crate::scene::Scene;

pub const VERTEX_SHADER_FILE: &str = "raytrace.vert.wgsl";
pub const FRAGMENT_SHADER_FILE: &str = "raytrace.frag.wgsl";

/// Screen quad corners in NDC
pub const QUAD_VERTICES: [[f32; 2]; 4] = [[1.0, 1.0], [1.0, -1.0], [-1.0, -1.0], [-1.0, 1.0]];
/// Two triangles over [`QUAD_VERTICES`]
pub const QUAD_INDICES: [u32; 6] = [0, 1, 3, 1, 2, 3];

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.0,
    g: 0.0,
    b: 0.0,
    a: 1.0,
};

impl ShaderSources {
    /// Shaders compiled into the binary
    pub fn builtin() -> Self {
        Self {
            vertex: include_str!("../../shaders/raytrace.vert.wgsl").to_string(),
            fragment: include_str!("../../shaders/raytrace.frag.wgsl").to_string(),
        }
    }

    /// Read both stages from a directory, for live editing
    pub fn from_dir(dir: &Path) -> Result<Self> {
        Ok(Self {
            vertex: file::read_text_file(dir.join(VERTEX_SHADER_FILE))?,
            fragment: file::read_text_file(dir.join(FRAGMENT_SHADER_FILE))?,
        })
    }
}

/// Owns the GPU side of one scene and draws it from a camera
pub struct Raytracer {
    scene_buffer: GpuBuffer<u8>,
    scene_layout: wgpu::BindGroupLayout,
    scene_bind_group: Option<wgpu::BindGroup>,
    program: ShaderProgram,
    quad: VertexArray<[f32; 2], u32>,
}

impl Raytracer {
    pub fn new(gpu: &GpuContext, scene: &Scene, sources: &ShaderSources, aspect_ratio: f32) -> Result<Self> {
        let device = &gpu.device;

        let mut vertices = GpuBuffer::vertex("quad_vertices");
        vertices.source(device, &QUAD_VERTICES);
        let mut indices = GpuBuffer::index("quad_indices");
        indices.source(device, &QUAD_INDICES);
        let quad = VertexArray::new(vertices, Some(indices), &[VertexAttribute::new(AttribType::F32, 2)])?;

        let scene_buffer = GpuBuffer::with_data(device, BufferKind::Storage, "scene_buffer", &scene.pack());
        log::info!(
            "Uploaded scene {}x{}x{} ({} KB)",
            scene.size().x, scene.size().y, scene.size().z,
            scene_buffer.byte_len() / 1024
        );

        let scene_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: true },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let scene_bind_group = scene_buffer.as_binding().map(|resource| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("scene_bind_group"),
                layout: &scene_layout,
                entries: &[wgpu::BindGroupEntry { binding: 0, resource }],
            })
        });

        let desc = ProgramDescriptor {
            label: "raytrace_pipeline",
            vertex_layouts: vec![quad.layout().clone()],
            target_format: gpu.format(),
        };
        let program = ShaderProgram::compile(device, desc, &[&scene_layout], sources);

        let mut raytracer = Self {
            scene_buffer,
            scene_layout,
            scene_bind_group,
            program,
            quad,
        };
        raytracer.set_aspect_ratio(aspect_ratio);
        Ok(raytracer)
    }

    /// Rebuild the program from new sources; a failed build leaves the
    /// screen cleared until the next successful one
    pub fn reload_shaders(&mut self, device: &wgpu::Device, sources: &ShaderSources, aspect_ratio: f32) {
        self.program.recompile(device, &[&self.scene_layout], sources);
        if self.program.is_valid() {
            log::info!("Shaders reloaded");
        }
        self.set_aspect_ratio(aspect_ratio);
    }

    fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        let _ = self.program.set_float("uRatio", aspect_ratio);
    }

    /// Push camera matrices; names the program does not declare are skipped
    pub fn update_camera(&mut self, camera: &FpsCamera) {
        let _ = self.program.set_vec3("uCamPos", camera.position());
        let _ = self.program.set_mat4("uInvProj", camera.projection_matrix().inverse());
        let _ = self.program.set_mat4("uInvView", camera.view_matrix().inverse());
    }

    /// Clear, trace the scene and present one frame
    pub fn render(&mut self, gpu: &mut GpuContext, camera: &FpsCamera) {
        self.update_camera(camera);
        self.program.flush(&gpu.queue);

        let output = match gpu.get_current_texture() {
            Ok(t) => t,
            Err(e) => {
                log::warn!("Failed to get surface texture: {}", e);
                gpu.reconfigure();
                return;
            }
        };
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("raytrace_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("raytrace_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            if self.program.bind(&mut pass) {
                if let Some(bind_group) = &self.scene_bind_group {
                    pass.set_bind_group(0, bind_group, &[]);
                    self.quad.draw(&mut pass);
                }
            }
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}
