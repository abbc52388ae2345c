//! Mesh rendering for loaded content
//!
//! The content tree is flattened once per replacement into a non-indexed
//! triangle list with per-vertex material colour and flat normals. Placement
//! (translation and spin) is applied on the GPU through the model matrix, so
//! animation never re-uploads geometry.

use crate::device::GpuContext;
use crate::surface::DEPTH_FORMAT;
use bytemuck::{Pod, Zeroable};
use log::debug;
use meshview_core::{Content, MeshNode, Vector3f};
use nalgebra::Matrix4;

/// Ambient share of the final shade; the rest comes from the headlight
pub const AMBIENT: f32 = 0.25;

/// Viewport clear colour (alice blue)
pub fn background_color() -> wgpu::Color {
    let [r, g, b] = [240u8, 248, 255].map(|c| srgb_to_linear(c as f32 / 255.0) as f64);
    wgpu::Color { r, g, b, a: 1.0 }
}

/// Convert an sRGB-encoded channel to linear for an sRGB render target
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Vertex data for mesh rendering
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
}

impl MeshVertex {
    /// Vertex buffer layout descriptor
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // Position
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // Normal
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // Color
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Per-frame uniform data
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct MeshUniform {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub lighting: [f32; 4],
}

impl Default for MeshUniform {
    fn default() -> Self {
        Self {
            view_proj: Matrix4::identity().into(),
            model: Matrix4::identity().into(),
            view: Matrix4::identity().into(),
            lighting: [AMBIENT, 0.0, 0.0, 0.0],
        }
    }
}

/// Flatten every mesh leaf of the content into a triangle list in content space
pub fn flatten_content(content: &Content) -> Vec<MeshVertex> {
    let nodes = content.root().mesh_nodes();
    let triangles: usize = nodes.iter().map(|n| n.mesh.face_count()).sum();
    let mut vertices = Vec::with_capacity(triangles * 3);
    for node in nodes {
        append_node(node, &mut vertices);
    }
    vertices
}

fn append_node(node: &MeshNode, out: &mut Vec<MeshVertex>) {
    let mesh = &node.mesh;
    let [r, g, b] = node.material.diffuse.map(srgb_to_linear);
    let color = [r, g, b, node.material.opacity];
    let face_normals = mesh.calculate_face_normals();
    let vertex_normals = mesh
        .normals
        .as_ref()
        .filter(|normals| normals.len() == mesh.vertices.len());

    for (face, face_normal) in mesh.faces.iter().zip(&face_normals) {
        let Some(corners) = face.iter().map(|&i| mesh.vertices.get(i)).collect::<Option<Vec<_>>>() else {
            continue;
        };
        for (&index, position) in face.iter().zip(corners) {
            let normal: Vector3f = vertex_normals
                .map(|normals| normals[index])
                .filter(|n| n.norm_squared() > 0.0)
                .unwrap_or(*face_normal);
            out.push(MeshVertex {
                position: [position.x, position.y, position.z],
                normal: [normal.x, normal.y, normal.z],
                color,
            });
        }
    }
}

/// Renders the current content into an existing render pass
pub struct MeshRenderer {
    pipeline: wgpu::RenderPipeline,
    uniform: MeshUniform,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    vertex_buffer: Option<wgpu::Buffer>,
    vertex_count: u32,
}

impl MeshRenderer {
    pub fn new(context: &GpuContext, color_format: wgpu::TextureFormat) -> Self {
        let device = &context.device;
        let uniform = MeshUniform::default();
        let uniform_buffer = context.create_buffer_init(
            "Mesh Uniform Buffer",
            &[uniform],
            wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        );

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
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
            label: Some("mesh_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some("mesh_bind_group"),
        });

        let shader = context.create_shader_module("Mesh Shader", include_str!("shaders/mesh.wgsl"));

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mesh Render Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Mesh Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[MeshVertex::desc()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // model files mix windings, draw both sides
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });

        Self {
            pipeline,
            uniform,
            uniform_buffer,
            bind_group,
            vertex_buffer: None,
            vertex_count: 0,
        }
    }

    /// Replace the uploaded geometry; `None` leaves the viewport empty
    pub fn upload(&mut self, context: &GpuContext, content: Option<&Content>) {
        let vertices = content.map(flatten_content).unwrap_or_default();
        if vertices.is_empty() {
            self.vertex_buffer = None;
            self.vertex_count = 0;
            return;
        }
        debug!("Uploading {} triangles", vertices.len() / 3);
        self.vertex_count = vertices.len() as u32;
        self.vertex_buffer = Some(context.create_buffer_init(
            "Mesh Vertex Buffer",
            &vertices,
            wgpu::BufferUsages::VERTEX,
        ));
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Update camera and model matrices
    pub fn update_uniforms(&mut self, queue: &wgpu::Queue, view: Matrix4<f32>, proj: Matrix4<f32>, model: Matrix4<f32>) {
        self.uniform.view_proj = (proj * view).into();
        self.uniform.view = view.into();
        self.uniform.model = model.into();
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&self.uniform));
    }

    /// Record the draw into a pass that has a colour and depth attachment
    pub fn render<'rp>(&'rp self, pass: &mut wgpu::RenderPass<'rp>) {
        let Some(vertex_buffer) = &self.vertex_buffer else {
            return;
        };
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, vertex_buffer.slice(..));
        pass.draw(0..self.vertex_count, 0..1);
    }
}
