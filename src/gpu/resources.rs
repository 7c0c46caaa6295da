//! GPU-side state owned by a plotter: the compiled band program and the
//! uploaded vertex buffer.

use wgpu::util::DeviceExt;

use crate::error::{GpuPhase, PlotError, Result};
use crate::gpu::band_pipeline::{BandPipeline, BandUniforms};

/// Everything the host hands the plotter for one frame.
pub struct FrameContext<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub target: &'a wgpu::TextureView,
    pub format: wgpu::TextureFormat,
}

/// Band vertices resident on the GPU.
struct VertexBuffer {
    buffer: wgpu::Buffer,
    vertex_count: u32,
}

#[derive(Default)]
pub struct GpuResources {
    /// Set once on first successful compilation and kept for the plotter's lifetime.
    pipeline: Option<BandPipeline>,
    vertices: Option<VertexBuffer>,
}

impl GpuResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_compiled(&self) -> bool {
        self.pipeline.is_some()
    }

    /// Vertices in the currently uploaded buffer, 0 if none.
    pub fn uploaded_vertex_count(&self) -> u32 {
        self.vertices.as_ref().map(|v| v.vertex_count).unwrap_or(0)
    }

    /// Compile the band program unless it already is. A failure leaves the
    /// resources uncompiled, so the next call tries again.
    pub fn ensure_compiled(&mut self, ctx: &FrameContext<'_>, source: &str) -> Result<()> {
        if self.pipeline.is_some() {
            return Ok(());
        }
        let pipeline = BandPipeline::compile(ctx.device, ctx.format, source)?;
        log::info!("Compiled band pipeline for {:?}", ctx.format);
        self.pipeline = Some(pipeline);
        Ok(())
    }

    /// Replace the vertex buffer with `vertices`, destroying the previous one.
    pub fn upload(&mut self, device: &wgpu::Device, vertices: &[f32], vertex_count: u32) -> Result<()> {
        if let Some(old) = self.vertices.take() {
            old.buffer.destroy();
        }

        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Band Vertex Buffer"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            buffer.destroy();
            return Err(PlotError::gpu(GpuPhase::BufferUpload, err.to_string()));
        }

        log::info!("Uploaded {} band vertices ({} bytes)", vertex_count, vertices.len() * 4);
        self.vertices = Some(VertexBuffer {
            buffer,
            vertex_count,
        });
        Ok(())
    }

    /// Write the uniforms and submit one strip draw into the frame's target.
    pub fn draw(
        &self,
        ctx: &FrameContext<'_>,
        uniforms: &BandUniforms,
        clear_color: Option<[f64; 4]>,
    ) -> Result<()> {
        let pipeline = self
            .pipeline
            .as_ref()
            .ok_or_else(|| PlotError::gpu(GpuPhase::Draw, "band pipeline is not compiled"))?;
        let vertices = self
            .vertices
            .as_ref()
            .ok_or_else(|| PlotError::gpu(GpuPhase::Draw, "no vertex buffer uploaded"))?;
        if pipeline.format() != ctx.format {
            return Err(PlotError::gpu(
                GpuPhase::Draw,
                format!(
                    "pipeline was compiled for {:?} but the target is {:?}",
                    pipeline.format(),
                    ctx.format
                ),
            ));
        }

        ctx.device.push_error_scope(wgpu::ErrorFilter::Validation);

        pipeline.write_uniforms(ctx.queue, uniforms);

        let load = match clear_color {
            Some([r, g, b, a]) => wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
            None => wgpu::LoadOp::Load,
        };

        let mut encoder = ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Band Encoder"),
        });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Band Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: ctx.target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pipeline.render(&mut render_pass, &vertices.buffer, 0..vertices.vertex_count);
        }
        ctx.queue.submit(std::iter::once(encoder.finish()));

        if let Some(err) = pollster::block_on(ctx.device.pop_error_scope()) {
            return Err(PlotError::gpu(GpuPhase::Draw, err.to_string()));
        }
        Ok(())
    }
}
