//! Shader program: a validated WGSL vertex/fragment pair plus its uniform block.
//!
//! Compile failures never abort. They are logged and leave the program
//! without a pipeline; binding such a program is a no-op and nothing is
//! drawn until a successful [`ShaderProgram::recompile`].
//!
//! Uniforms are addressed by struct member name. The `var<uniform>` struct
//! is reflected from the WGSL source with naga; setters look the name up on
//! every call, write into a CPU copy of the block and mark it dirty, and
//! [`ShaderProgram::flush`] uploads it once per frame.

use crate::core::error::Error;
use crate::core::types::{Mat4, Result, Vec2, Vec3, Vec4};
use crate::render::buffer::GpuBuffer;
use crate::render::geometry::VertexLayout;

/// Vertex stage entry point
pub const VERTEX_ENTRY: &str = "vs_main";
/// Fragment stage entry point
pub const FRAGMENT_ENTRY: &str = "fs_main";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    fn entry_point(self) -> &'static str {
        match self {
            ShaderStage::Vertex => VERTEX_ENTRY,
            ShaderStage::Fragment => FRAGMENT_ENTRY,
        }
    }

    fn naga_stage(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

/// Parse and validate one WGSL stage, returning rendered diagnostics on failure
pub fn validate_wgsl(stage: ShaderStage, source: &str) -> std::result::Result<naga::Module, String> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| e.emit_to_string(source))?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::default(),
    );
    validator.validate(&module).map_err(|e| e.emit_to_string(source))?;

    if entry_point(&module, stage).is_none() {
        return Err(format!("missing {:?} entry point `{}`", stage, stage.entry_point()));
    }

    Ok(module)
}

/// Check that every fragment input is written by the vertex stage at the
/// same `@location` with the same type
pub fn check_stage_interface(vertex: &naga::Module, fragment: &naga::Module) -> std::result::Result<(), String> {
    let mut outputs = Vec::new();
    if let Some(result) = entry_point(vertex, ShaderStage::Vertex).and_then(|ep| ep.function.result.as_ref()) {
        collect_locations(vertex, result.ty, result.binding.as_ref(), &mut outputs);
    }

    let mut inputs = Vec::new();
    if let Some(ep) = entry_point(fragment, ShaderStage::Fragment) {
        for arg in &ep.function.arguments {
            collect_locations(fragment, arg.ty, arg.binding.as_ref(), &mut inputs);
        }
    }

    for (location, input) in &inputs {
        match outputs.iter().find(|(l, _)| l == location) {
            None => {
                return Err(format!(
                    "fragment input @location({}) is not written by the vertex stage",
                    location
                ));
            }
            Some((_, output)) if output != input => {
                return Err(format!(
                    "@location({}) is {:?} in the vertex stage but {:?} in the fragment stage",
                    location, output, input
                ));
            }
            Some(_) => {}
        }
    }
    Ok(())
}

fn entry_point(module: &naga::Module, stage: ShaderStage) -> Option<&naga::EntryPoint> {
    module
        .entry_points
        .iter()
        .find(|ep| ep.name == stage.entry_point() && ep.stage == stage.naga_stage())
}

fn collect_locations(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
    out: &mut Vec<(u32, naga::TypeInner)>,
) {
    match binding {
        Some(naga::Binding::Location { location, .. }) => {
            out.push((*location, module.types[ty].inner.clone()));
        }
        Some(_) => {}
        None => {
            if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_locations(module, member.ty, member.binding.as_ref(), out);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Uniform reflection
// ---------------------------------------------------------------------------

/// Type of a reflected uniform member (or of one array element)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    Int,
    UInt,
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
}

impl UniformKind {
    pub fn name(self) -> &'static str {
        match self {
            UniformKind::Int => "i32",
            UniformKind::UInt => "u32",
            UniformKind::Float => "f32",
            UniformKind::Vec2 => "vec2<f32>",
            UniformKind::Vec3 => "vec3<f32>",
            UniformKind::Vec4 => "vec4<f32>",
            UniformKind::Mat4 => "mat4x4<f32>",
        }
    }

    fn from_naga(inner: &naga::TypeInner) -> Option<Self> {
        use naga::{ScalarKind, TypeInner, VectorSize};
        match *inner {
            TypeInner::Scalar(scalar) if scalar.width == 4 => match scalar.kind {
                ScalarKind::Sint => Some(UniformKind::Int),
                ScalarKind::Uint => Some(UniformKind::UInt),
                ScalarKind::Float => Some(UniformKind::Float),
                _ => None,
            },
            TypeInner::Vector { size, scalar }
                if scalar.kind == ScalarKind::Float && scalar.width == 4 =>
            {
                Some(match size {
                    VectorSize::Bi => UniformKind::Vec2,
                    VectorSize::Tri => UniformKind::Vec3,
                    VectorSize::Quad => UniformKind::Vec4,
                })
            }
            TypeInner::Matrix {
                columns: VectorSize::Quad,
                rows: VectorSize::Quad,
                scalar,
            } if scalar.width == 4 => Some(UniformKind::Mat4),
            _ => None,
        }
    }
}

/// One named member of a uniform block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformField {
    pub name: String,
    pub kind: UniformKind,
    /// Byte offset within the block
    pub offset: u32,
    /// Element count for fixed-size arrays
    pub array_len: Option<u32>,
    /// Byte distance between array elements
    pub stride: u32,
}

/// Value accepted by the uniform setters
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue<'a> {
    Int(i32),
    UInt(u32),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
    Ints(&'a [i32]),
    Floats(&'a [f32]),
    Vec3s(&'a [Vec3]),
    Vec4s(&'a [Vec4]),
}

impl UniformValue<'_> {
    fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Int(_) | UniformValue::Ints(_) => UniformKind::Int,
            UniformValue::UInt(_) => UniformKind::UInt,
            UniformValue::Float(_) | UniformValue::Floats(_) => UniformKind::Float,
            UniformValue::Vec2(_) => UniformKind::Vec2,
            UniformValue::Vec3(_) | UniformValue::Vec3s(_) => UniformKind::Vec3,
            UniformValue::Vec4(_) | UniformValue::Vec4s(_) => UniformKind::Vec4,
            UniformValue::Mat4(_) => UniformKind::Mat4,
        }
    }

    fn is_array(&self) -> bool {
        matches!(
            self,
            UniformValue::Ints(_) | UniformValue::Floats(_) | UniformValue::Vec3s(_) | UniformValue::Vec4s(_)
        )
    }

    fn type_name(&self) -> &'static str {
        match self {
            UniformValue::Ints(_) => "array<i32>",
            UniformValue::Floats(_) => "array<f32>",
            UniformValue::Vec3s(_) => "array<vec3<f32>>",
            UniformValue::Vec4s(_) => "array<vec4<f32>>",
            other => other.kind().name(),
        }
    }
}

fn field_type_name(field: &UniformField) -> &'static str {
    match (field.array_len, field.kind) {
        (None, kind) => kind.name(),
        (Some(_), UniformKind::Int) => "array<i32>",
        (Some(_), UniformKind::Float) => "array<f32>",
        (Some(_), UniformKind::Vec3) => "array<vec3<f32>>",
        (Some(_), UniformKind::Vec4) => "array<vec4<f32>>",
        (Some(_), _) => "array",
    }
}

/// CPU copy of a `var<uniform>` struct with name-addressed members
#[derive(Debug, Clone, PartialEq)]
pub struct UniformBlock {
    group: u32,
    binding: u32,
    fields: Vec<UniformField>,
    data: Vec<u8>,
    dirty: bool,
}

impl UniformBlock {
    /// Reflect the first struct-typed `var<uniform>` of a module
    pub fn reflect(module: &naga::Module) -> Option<Self> {
        for (_, var) in module.global_variables.iter() {
            if var.space != naga::AddressSpace::Uniform {
                continue;
            }
            let Some(binding) = &var.binding else {
                continue;
            };
            let naga::TypeInner::Struct { members, span } = &module.types[var.ty].inner else {
                continue;
            };

            let mut fields = Vec::with_capacity(members.len());
            for member in members {
                let Some(name) = &member.name else {
                    continue;
                };
                let inner = &module.types[member.ty].inner;
                let field = match *inner {
                    naga::TypeInner::Array {
                        base,
                        size: naga::ArraySize::Constant(len),
                        stride,
                    } => UniformKind::from_naga(&module.types[base].inner).map(|kind| UniformField {
                        name: name.clone(),
                        kind,
                        offset: member.offset,
                        array_len: Some(len.get()),
                        stride,
                    }),
                    _ => UniformKind::from_naga(inner).map(|kind| UniformField {
                        name: name.clone(),
                        kind,
                        offset: member.offset,
                        array_len: None,
                        stride: 0,
                    }),
                };
                match field {
                    Some(field) => fields.push(field),
                    None => log::debug!("Uniform member {} has an unsupported type", name),
                }
            }

            return Some(Self {
                group: binding.group,
                binding: binding.binding,
                fields,
                data: vec![0; *span as usize],
                dirty: true,
            });
        }
        None
    }

    pub fn group(&self) -> u32 {
        self.group
    }

    pub fn binding(&self) -> u32 {
        self.binding
    }

    pub fn fields(&self) -> &[UniformField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&UniformField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Current block contents in GPU layout
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns whether the block changed since the last call
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    fn write(&mut self, offset: u32, bytes: &[u8]) {
        let start = offset as usize;
        self.data[start..start + bytes.len()].copy_from_slice(bytes);
    }
}

/// Something that accepts named uniform values.
///
/// A name the program does not declare yields [`Error::UniformNotFound`];
/// render code is free to ignore it.
pub trait UniformTarget {
    fn set_uniform(&mut self, name: &str, value: UniformValue<'_>) -> Result<()>;

    fn set_int(&mut self, name: &str, value: i32) -> Result<()> {
        self.set_uniform(name, UniformValue::Int(value))
    }

    fn set_uint(&mut self, name: &str, value: u32) -> Result<()> {
        self.set_uniform(name, UniformValue::UInt(value))
    }

    fn set_float(&mut self, name: &str, value: f32) -> Result<()> {
        self.set_uniform(name, UniformValue::Float(value))
    }

    fn set_vec2(&mut self, name: &str, value: Vec2) -> Result<()> {
        self.set_uniform(name, UniformValue::Vec2(value))
    }

    fn set_vec3(&mut self, name: &str, value: Vec3) -> Result<()> {
        self.set_uniform(name, UniformValue::Vec3(value))
    }

    fn set_vec4(&mut self, name: &str, value: Vec4) -> Result<()> {
        self.set_uniform(name, UniformValue::Vec4(value))
    }

    /// Column-major, as glam stores it
    fn set_mat4(&mut self, name: &str, value: Mat4) -> Result<()> {
        self.set_uniform(name, UniformValue::Mat4(value))
    }

    fn set_ints(&mut self, name: &str, values: &[i32]) -> Result<()> {
        self.set_uniform(name, UniformValue::Ints(values))
    }

    fn set_floats(&mut self, name: &str, values: &[f32]) -> Result<()> {
        self.set_uniform(name, UniformValue::Floats(values))
    }

    fn set_vec3s(&mut self, name: &str, values: &[Vec3]) -> Result<()> {
        self.set_uniform(name, UniformValue::Vec3s(values))
    }

    fn set_vec4s(&mut self, name: &str, values: &[Vec4]) -> Result<()> {
        self.set_uniform(name, UniformValue::Vec4s(values))
    }
}

impl UniformTarget for UniformBlock {
    fn set_uniform(&mut self, name: &str, value: UniformValue<'_>) -> Result<()> {
        let field = self
            .field(name)
            .ok_or_else(|| Error::UniformNotFound(name.to_string()))?;

        if field.kind != value.kind() || field.array_len.is_some() != value.is_array() {
            return Err(Error::UniformMismatch {
                name: name.to_string(),
                expected: value.type_name(),
                actual: field_type_name(field),
            });
        }

        let (offset, stride) = (field.offset, field.stride);
        let len = field.array_len.unwrap_or(1) as usize;

        match value {
            UniformValue::Int(v) => self.write(offset, bytemuck::bytes_of(&v)),
            UniformValue::UInt(v) => self.write(offset, bytemuck::bytes_of(&v)),
            UniformValue::Float(v) => self.write(offset, bytemuck::bytes_of(&v)),
            UniformValue::Vec2(v) => self.write(offset, bytemuck::cast_slice(&v.to_array())),
            UniformValue::Vec3(v) => self.write(offset, bytemuck::cast_slice(&v.to_array())),
            UniformValue::Vec4(v) => self.write(offset, bytemuck::cast_slice(&v.to_array())),
            UniformValue::Mat4(m) => self.write(offset, bytemuck::cast_slice(&m.to_cols_array())),
            UniformValue::Ints(values) => {
                for (i, v) in values.iter().take(len).enumerate() {
                    self.write(offset + i as u32 * stride, bytemuck::bytes_of(v));
                }
            }
            UniformValue::Floats(values) => {
                for (i, v) in values.iter().take(len).enumerate() {
                    self.write(offset + i as u32 * stride, bytemuck::bytes_of(v));
                }
            }
            UniformValue::Vec3s(values) => {
                for (i, v) in values.iter().take(len).enumerate() {
                    self.write(offset + i as u32 * stride, bytemuck::cast_slice(&v.to_array()));
                }
            }
            UniformValue::Vec4s(values) => {
                for (i, v) in values.iter().take(len).enumerate() {
                    self.write(offset + i as u32 * stride, bytemuck::cast_slice(&v.to_array()));
                }
            }
        }

        self.dirty = true;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Program
// ---------------------------------------------------------------------------

/// WGSL text for both stages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

/// Fixed inputs of a program that survive recompilation
#[derive(Debug, Clone)]
pub struct ProgramDescriptor {
    pub label: &'static str,
    pub vertex_layouts: Vec<VertexLayout>,
    pub target_format: wgpu::TextureFormat,
}

struct Linked {
    pipeline: wgpu::RenderPipeline,
    uniforms: Option<UniformBlock>,
    uniform_buffer: GpuBuffer<u8>,
    uniform_bind_group: Option<wgpu::BindGroup>,
}

/// Render pipeline built from a vertex/fragment pair
pub struct ShaderProgram {
    desc: ProgramDescriptor,
    linked: Option<Linked>,
}

impl ShaderProgram {
    /// Compile and link. `bind_group_layouts` occupy groups 0..n; the
    /// program's own uniform block, if any, must be declared at `@group(n)
    /// @binding(0)`.
    pub fn compile(
        device: &wgpu::Device,
        desc: ProgramDescriptor,
        bind_group_layouts: &[&wgpu::BindGroupLayout],
        sources: &ShaderSources,
    ) -> Self {
        let linked = link(device, &desc, bind_group_layouts, sources);
        Self { desc, linked }
    }

    /// Replace the program with one built from new sources
    pub fn recompile(
        &mut self,
        device: &wgpu::Device,
        bind_group_layouts: &[&wgpu::BindGroupLayout],
        sources: &ShaderSources,
    ) {
        self.linked = link(device, &self.desc, bind_group_layouts, sources);
    }

    /// Whether the last compile produced a usable pipeline
    pub fn is_valid(&self) -> bool {
        self.linked.is_some()
    }

    pub fn uniforms(&self) -> Option<&UniformBlock> {
        self.linked.as_ref().and_then(|l| l.uniforms.as_ref())
    }

    /// Upload uniform values changed since the last flush
    pub fn flush(&mut self, queue: &wgpu::Queue) {
        let Some(linked) = &mut self.linked else {
            return;
        };
        if let Some(block) = &mut linked.uniforms {
            if block.take_dirty() {
                linked.uniform_buffer.sub_source(queue, 0, block.bytes());
            }
        }
    }

    /// Set the pipeline and uniform bind group; returns false for a failed program
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) -> bool {
        let Some(linked) = &self.linked else {
            return false;
        };
        pass.set_pipeline(&linked.pipeline);
        if let (Some(block), Some(bind_group)) = (&linked.uniforms, &linked.uniform_bind_group) {
            pass.set_bind_group(block.group(), bind_group, &[]);
        }
        true
    }
}

impl UniformTarget for ShaderProgram {
    fn set_uniform(&mut self, name: &str, value: UniformValue<'_>) -> Result<()> {
        let result = match self.linked.as_mut().and_then(|l| l.uniforms.as_mut()) {
            Some(block) => block.set_uniform(name, value),
            None => Err(Error::UniformNotFound(name.to_string())),
        };
        if let Err(e) = &result {
            log::debug!("{}: {}", self.desc.label, e);
        }
        result
    }
}

fn validate_logged(label: &str, stage: ShaderStage, source: &str) -> Option<naga::Module> {
    match validate_wgsl(stage, source) {
        Ok(module) => Some(module),
        Err(message) => {
            log::error!("Error in {:?} shader of {}:\n{}", stage, label, message);
            None
        }
    }
}

fn link(
    device: &wgpu::Device,
    desc: &ProgramDescriptor,
    bind_group_layouts: &[&wgpu::BindGroupLayout],
    sources: &ShaderSources,
) -> Option<Linked> {
    let vertex = validate_logged(desc.label, ShaderStage::Vertex, &sources.vertex);
    let fragment = validate_logged(desc.label, ShaderStage::Fragment, &sources.fragment);
    let (vertex, fragment) = (vertex?, fragment?);

    if let Err(message) = check_stage_interface(&vertex, &fragment) {
        log::error!("Stage interface mismatch in {}: {}", desc.label, message);
        return None;
    }

    let uniforms = UniformBlock::reflect(&fragment).or_else(|| UniformBlock::reflect(&vertex));
    if let Some(block) = &uniforms {
        if block.group() as usize != bind_group_layouts.len() || block.binding() != 0 {
            log::error!(
                "{}: uniform block must be @group({}) @binding(0), found @group({}) @binding({})",
                desc.label, bind_group_layouts.len(), block.group(), block.binding()
            );
            return None;
        }
    }

    // binding-layout and device errors that per-module validation misses
    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);

    let mut uniform_buffer = GpuBuffer::uniform("program_uniforms");
    let uniform_layout = uniforms.as_ref().map(|_| {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("program_uniform_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        })
    });

    let mut uniform_bind_group = None;
    if let (Some(block), Some(layout)) = (&uniforms, &uniform_layout) {
        uniform_buffer.source(device, block.bytes());
        if let Some(resource) = uniform_buffer.as_binding() {
            uniform_bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("program_uniform_bind_group"),
                layout,
                entries: &[wgpu::BindGroupEntry { binding: 0, resource }],
            }));
        }
    }

    let mut layouts: Vec<&wgpu::BindGroupLayout> = bind_group_layouts.to_vec();
    if let Some(layout) = &uniform_layout {
        layouts.push(layout);
    }

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(desc.label),
        bind_group_layouts: &layouts,
        immediate_size: 0,
    });

    let vertex_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("vertex_shader"),
        source: wgpu::ShaderSource::Wgsl(sources.vertex.as_str().into()),
    });
    let fragment_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("fragment_shader"),
        source: wgpu::ShaderSource::Wgsl(sources.fragment.as_str().into()),
    });

    let buffers: Vec<wgpu::VertexBufferLayout<'_>> =
        desc.vertex_layouts.iter().map(|l| l.buffer_layout()).collect();

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(desc.label),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &vertex_module,
            entry_point: Some(VERTEX_ENTRY),
            buffers: &buffers,
            compilation_options: Default::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: &fragment_module,
            entry_point: Some(FRAGMENT_ENTRY),
            targets: &[Some(wgpu::ColorTargetState {
                format: desc.target_format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        multiview_mask: None,
        cache: None,
    });

    if let Some(e) = pollster::block_on(scope.pop()) {
        log::error!("Failed to link {}: {}", desc.label, e);
        return None;
    }

    log::info!(
        "Linked {} ({} uniforms)",
        desc.label,
        uniforms.as_ref().map_or(0, |u| u.fields().len())
    );

    Some(Linked {
        pipeline,
        uniforms,
        uniform_buffer,
        uniform_bind_group,
    })
}
