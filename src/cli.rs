use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::PlotterConfig;
use crate::gpu::headless::{self, OffscreenTarget};
use crate::gpu::resources::FrameContext;
use crate::plotter::Plotter;
use crate::projection;
use crate::sample::{demo_samples, StatisticalSample, ViewWindow};
use crate::vertex_builder::{self, FLOATS_PER_VERTEX};

/// Samples generated when no input file is given.
const DEMO_SAMPLE_COUNT: usize = 10;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one frame of the band to a PNG
    Render {
        /// Input JSON file (array of {time, min, mean, max}); demo data if omitted
        #[arg(long)]
        input: Option<PathBuf>,

        /// Plotter config JSON; the view is fitted to the data if omitted
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output PNG path
        #[arg(long)]
        out: PathBuf,

        /// Output width
        #[arg(long, default_value_t = 800, value_parser = clap::value_parser!(u32).range(1..))]
        width: u32,

        /// Output height
        #[arg(long, default_value_t = 600, value_parser = clap::value_parser!(u32).range(1..))]
        height: u32,
    },
    /// Print the vertex array and its projected positions
    Inspect {
        #[arg(long)]
        input: Option<PathBuf>,

        #[arg(long)]
        config: Option<PathBuf>,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Render { input, config, out, width, height } => {
            let (config, samples) = load(input.as_deref(), config.as_deref())?;
            pollster::block_on(render_offline(config, &samples, &out, width, height))?;
        }
        Commands::Inspect { input, config } => {
            let (config, samples) = load(input.as_deref(), config.as_deref())?;
            inspect(&config, &samples)?;
        }
    }
    Ok(())
}

fn load(input: Option<&Path>, config_path: Option<&Path>) -> Result<(PlotterConfig, Vec<StatisticalSample>)> {
    let mut config = match config_path {
        Some(path) => PlotterConfig::from_json_file(path)?,
        None => PlotterConfig::default(),
    };

    let samples = match input {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read input {:?}", path))?;
            serde_json::from_str::<Vec<StatisticalSample>>(&contents)
                .with_context(|| format!("Failed to parse {:?} as a JSON list of samples", path))?
        }
        None => demo_samples(config.time_epoch, DEMO_SAMPLE_COUNT),
    };

    if config_path.is_none() {
        if let Some(view) = ViewWindow::fit(&samples, config.view.value_min, config.view.value_max) {
            if view.time_width > 0 {
                config.view = view;
            }
        }
    }

    Ok((config, samples))
}

async fn render_offline(
    mut config: PlotterConfig,
    samples: &[StatisticalSample],
    out: &Path,
    width: u32,
    height: u32,
) -> Result<()> {
    let (device, queue) = headless::request_device()
        .await
        .ok_or_else(|| anyhow::anyhow!("No adapter found"))?;

    if config.clear_color.is_none() {
        config.clear_color = Some([0.0, 0.0, 0.0, 1.0]);
    }
    let mut plotter = Plotter::new(config)?;
    plotter.set_data(samples)?;

    let target = OffscreenTarget::new(&device, width, height);
    let ctx = FrameContext {
        device: &device,
        queue: &queue,
        target: target.view(),
        format: OffscreenTarget::FORMAT,
    };
    plotter.on_frame(&ctx)?;

    let pixels = target.read_rgba(&device, &queue)?;
    image::save_buffer(out, &pixels, width, height, image::ColorType::Rgba8)
        .with_context(|| format!("Failed to save {:?}", out))?;

    println!("Rendered {} samples to {:?}", samples.len(), out);
    Ok(())
}

fn inspect(config: &PlotterConfig, samples: &[StatisticalSample]) -> Result<()> {
    let scale = config.scale_epoch();
    let vertices = vertex_builder::build(samples, &scale)?;
    let matrix = projection::project(&config.view, &scale);
    let positions = vertex_builder::screen_positions(&vertices, &matrix);

    println!("{:>5} {:>14} {:>10} {:>10} {:>10} {:>4} {:>10} {:>10}", "vtx", "time", "min", "mean", "max", "top", "x", "y");
    for (i, (v, [x, y])) in vertices.chunks_exact(FLOATS_PER_VERTEX).zip(positions).enumerate() {
        println!(
            "{:>5} {:>14.3} {:>10.4} {:>10.4} {:>10.4} {:>4} {:>10.4} {:>10.4}",
            i, v[0], v[1], v[2], v[3], v[4], x, y
        );
    }
    Ok(())
}
