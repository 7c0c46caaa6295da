//! Render pipeline for the min/max band.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use std::ops::Range;

use crate::error::{PlotError, Result};
use crate::vertex_builder::FLOATS_PER_VERTEX;

/// Band program shipped with the crate.
pub const BAND_SHADER: &str = include_str!("band.wgsl");

/// Matches `BandUniforms` in band.wgsl.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct BandUniforms {
    pub matrix: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub mean_width: f32,
    // Pads the struct to WGSL's 16-byte struct alignment (96 bytes)
    _padding: [f32; 3],
}

impl BandUniforms {
    pub fn new(matrix: &Mat4, color: [f32; 4], mean_width: f32) -> Self {
        Self {
            matrix: matrix.to_cols_array_2d(),
            color,
            mean_width,
            _padding: [0.0; 3],
        }
    }
}

/// Layout of one band vertex: `stats` (time, min, mean, max) then the top flag.
pub fn vertex_layout<'a>() -> wgpu::VertexBufferLayout<'a> {
    wgpu::VertexBufferLayout {
        array_stride: (FLOATS_PER_VERTEX * std::mem::size_of::<f32>()) as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x4,
            },
            wgpu::VertexAttribute {
                offset: 16, // [f32; 4] is 16 bytes
                shader_location: 1,
                format: wgpu::VertexFormat::Float32,
            },
        ],
    }
}

/// `SrcAlpha, OneMinusSrcAlpha` on both color and alpha.
const BAND_BLEND: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    },
};

/// Compiled band program plus the uniform buffer it reads.
pub struct BandPipeline {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    format: wgpu::TextureFormat,
}

impl BandPipeline {
    /// Compile `source` and build the pipeline for targets of `format`.
    ///
    /// Compilation runs inside a validation error scope, so a bad program is
    /// returned as [`PlotError::ShaderCompilation`] with wgpu's diagnostics
    /// instead of reaching the device's uncaptured error handler.
    pub fn compile(device: &wgpu::Device, format: wgpu::TextureFormat, source: &str) -> Result<Self> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Band Shader"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

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
            label: Some("band_bind_group_layout"),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Band Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Band Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[vertex_layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(BAND_BLEND),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(PlotError::ShaderCompilation {
                log: err.to_string(),
            });
        }

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Band Uniform Buffer"),
            size: std::mem::size_of::<BandUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some("band_bind_group"),
        });

        Ok(Self {
            pipeline,
            uniform_buffer,
            bind_group,
            format,
        })
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn write_uniforms(&self, queue: &wgpu::Queue, uniforms: &BandUniforms) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[*uniforms]));
    }

    /// Record the strip draw into `render_pass`.
    pub fn render(
        &self,
        render_pass: &mut wgpu::RenderPass<'_>,
        vertex_buffer: &wgpu::Buffer,
        vertices: Range<u32>,
    ) {
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));
        render_pass.draw(vertices, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniforms_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<BandUniforms>(), 96);
    }

    #[test]
    fn test_uniforms_store_column_major_matrix() {
        let m = Mat4::from_translation(glam::Vec3::new(3.0, 4.0, 0.0));
        let u = BandUniforms::new(&m, [1.0, 1.0, 0.0, 1.0], 0.01);
        assert_eq!(u.matrix[3], [3.0, 4.0, 0.0, 1.0]);
        assert_eq!(u.color, [1.0, 1.0, 0.0, 1.0]);
        assert_eq!(u.mean_width, 0.01);
    }

    #[test]
    fn test_vertex_layout_matches_record() {
        let layout = vertex_layout();
        assert_eq!(layout.array_stride, 20);
        assert_eq!(layout.attributes.len(), 2);
        assert_eq!(layout.attributes[0].format, wgpu::VertexFormat::Float32x4);
        assert_eq!(layout.attributes[1].offset, 16);
        assert_eq!(layout.attributes[1].format, wgpu::VertexFormat::Float32);
    }

    #[test]
    fn test_shader_declares_entry_points() {
        assert!(BAND_SHADER.contains("fn vs_main"));
        assert!(BAND_SHADER.contains("fn fs_main"));
        assert!(BAND_SHADER.contains("DIM_FACTOR: f32 = 0.6"));
    }
}
