//! Per-stream plotter: holds the band's vertex data and view state and draws
//! it once per frame on behalf of the host.
//!
//! The host calls [`Plotter::set_data`] whenever new samples arrive and
//! [`Plotter::on_frame`] whenever the surface needs repainting. Both run on
//! the rendering thread; hosts fetching data elsewhere must hand samples over
//! themselves (a mutex or a swap-on-next-frame slot).

use glam::Mat4;
use std::borrow::Cow;

use crate::config::PlotterConfig;
use crate::error::{GpuPhase, PlotError, Result};
use crate::gpu::band_pipeline::{BandUniforms, BAND_SHADER};
use crate::gpu::resources::{FrameContext, GpuResources};
use crate::projection::{self, LocalWindow};
use crate::sample::{ScaleEpoch, StatisticalSample, ViewWindow};
use crate::vertex_builder::{self, FLOATS_PER_VERTEX};

pub struct Plotter {
    scale: ScaleEpoch,
    view: ViewWindow,
    stream_color: [f32; 4],
    mean_width: f32,
    clear_color: Option<[f64; 4]>,
    shader_source: Cow<'static, str>,

    vertices: Vec<f32>,
    /// Vertices changed since the last upload.
    buffer_dirty: bool,
    gpu: GpuResources,
}

impl Plotter {
    pub fn new(config: PlotterConfig) -> Result<Self> {
        Self::with_shader_source(config, BAND_SHADER)
    }

    /// Plotter drawing with a host-supplied WGSL program. It must expose
    /// `vs_main`/`fs_main` and the same vertex and uniform layout as the
    /// built-in band program.
    pub fn with_shader_source(
        config: PlotterConfig,
        shader_source: impl Into<Cow<'static, str>>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            scale: config.scale_epoch(),
            view: config.view,
            stream_color: config.stream_color,
            mean_width: config.mean_width,
            clear_color: config.clear_color,
            shader_source: shader_source.into(),
            vertices: Vec::new(),
            buffer_dirty: false,
            gpu: GpuResources::new(),
        })
    }

    /// Rebuild the band from `samples` and schedule a re-upload.
    ///
    /// On error the previous band stays in place.
    pub fn set_data(&mut self, samples: &[StatisticalSample]) -> Result<()> {
        self.vertices = vertex_builder::build(samples, &self.scale)?;
        self.buffer_dirty = true;
        log::debug!("Built band for {} samples", samples.len());
        Ok(())
    }

    pub fn view(&self) -> &ViewWindow {
        &self.view
    }

    pub fn set_view(&mut self, view: ViewWindow) {
        self.view = view;
    }

    pub fn set_stream_color(&mut self, color: [f32; 4]) {
        self.stream_color = color;
    }

    pub fn set_mean_width(&mut self, mean_width: f32) {
        self.mean_width = mean_width;
    }

    pub fn scale_epoch(&self) -> &ScaleEpoch {
        &self.scale
    }

    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    /// Vertices in the current band, as a draw range length.
    pub fn vertex_count(&self) -> Result<u32> {
        let count = self.vertices.len() / FLOATS_PER_VERTEX;
        u32::try_from(count).map_err(|_| {
            PlotError::gpu(
                GpuPhase::BufferUpload,
                format!("{} vertices exceed the u32 draw range", count),
            )
        })
    }

    /// Vertices in the buffer last uploaded to the GPU, 0 before the first upload.
    pub fn uploaded_vertex_count(&self) -> u32 {
        self.gpu.uploaded_vertex_count()
    }

    pub fn is_compiled(&self) -> bool {
        self.gpu.is_compiled()
    }

    pub fn is_buffer_dirty(&self) -> bool {
        self.buffer_dirty
    }

    /// Clip-space matrix for the current view.
    pub fn projection(&self) -> Mat4 {
        projection::project(&self.view, &self.scale)
    }

    /// Draw the band into `ctx.target`.
    ///
    /// Compiles the program on first use and re-uploads the vertices when
    /// they changed. A [`ShaderCompilation`](crate::error::PlotError::ShaderCompilation)
    /// error leaves the plotter uncompiled; the next frame compiles again.
    /// Buffer or draw failures skip this frame and leave the upload pending.
    pub fn on_frame(&mut self, ctx: &FrameContext<'_>) -> Result<()> {
        if let Err(e) = self.gpu.ensure_compiled(ctx, &self.shader_source) {
            log::error!("{}", e);
            return Err(e);
        }

        if self.vertices.is_empty() {
            return Ok(());
        }

        if self.buffer_dirty {
            let uploaded = self
                .vertex_count()
                .and_then(|count| self.gpu.upload(ctx.device, &self.vertices, count));
            if let Err(e) = uploaded {
                log::warn!("Skipping frame: {}", e);
                return Err(e);
            }
            self.buffer_dirty = false;
        }

        let matrix = self.projection();
        if log::log_enabled!(log::Level::Debug) {
            let w = LocalWindow::from_view(&self.view, &self.scale);
            log::debug!("left={} right={} top={} bottom={}", w.left, w.right, w.top, w.bottom);
        }
        if log::log_enabled!(log::Level::Trace) {
            for (i, [x, y]) in vertex_builder::screen_positions(&self.vertices, &matrix)
                .into_iter()
                .enumerate()
            {
                log::trace!("v {} {},{}", i, x, y);
            }
        }

        let uniforms = BandUniforms::new(&matrix, self.stream_color, self.mean_width);
        self.gpu.draw(ctx, &uniforms, self.clear_color).inspect_err(|e| {
            log::warn!("Skipping frame: {}", e);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlotError;
    use glam::Vec2;

    fn config() -> PlotterConfig {
        PlotterConfig {
            time_epoch: 0,
            time_scale: 1.0,
            view: ViewWindow::new(0, 40, -1.0, 1.0),
            ..PlotterConfig::default()
        }
    }

    fn samples() -> Vec<StatisticalSample> {
        vec![
            StatisticalSample::new(0, -1.0, 0.0, 1.0),
            StatisticalSample::new(10, -0.5, 0.2, 0.8),
            StatisticalSample::new(20, 0.0, 0.3, 0.6),
        ]
    }

    #[test]
    fn test_new_plotter_is_clean_and_uncompiled() {
        let plotter = Plotter::new(config()).unwrap();
        assert!(!plotter.is_compiled());
        assert!(!plotter.is_buffer_dirty());
        assert_eq!(plotter.vertex_count().unwrap(), 0);
        assert_eq!(plotter.uploaded_vertex_count(), 0);
    }

    #[test]
    fn test_set_data_marks_buffer_dirty() {
        let mut plotter = Plotter::new(config()).unwrap();
        plotter.set_data(&samples()).unwrap();
        assert!(plotter.is_buffer_dirty());
        assert_eq!(plotter.vertex_count().unwrap(), 8);
        assert_eq!(plotter.vertices().len(), 40);
        // nothing reaches the GPU until the next frame
        assert_eq!(plotter.uploaded_vertex_count(), 0);
    }

    #[test]
    fn test_insufficient_data_keeps_previous_band() {
        let mut plotter = Plotter::new(config()).unwrap();
        plotter.set_data(&samples()).unwrap();
        let before = plotter.vertices().to_vec();

        let err = plotter.set_data(&samples()[..1]).unwrap_err();
        assert_eq!(err, PlotError::InsufficientData { count: 1 });
        assert_eq!(plotter.vertices(), &before[..]);
    }

    #[test]
    fn test_projection_follows_view() {
        let mut plotter = Plotter::new(config()).unwrap();
        let m = plotter.projection();
        let p = projection::project_point(&m, 40.0, 1.0);
        assert!((p - Vec2::new(0.2, 0.5)).abs().max_element() < 1e-5);

        plotter.set_view(ViewWindow::new(0, 80, -1.0, 1.0));
        let p = projection::project_point(&plotter.projection(), 40.0, 1.0);
        assert!((p - Vec2::new(0.0, 0.5)).abs().max_element() < 1e-5);
        assert_eq!(plotter.view().time_width, 80);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let bad = PlotterConfig {
            time_scale: 0.0,
            ..config()
        };
        assert!(matches!(Plotter::new(bad), Err(PlotError::Config(_))));
    }
}
