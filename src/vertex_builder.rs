//! Converts statistical samples into the band's triangle-strip vertex array.
//!
//! Each vertex is five f32 attributes `(time, min, mean, max, top)`. Every
//! sample yields a bottom vertex (`top = 0`) followed by a top vertex
//! (`top = 1`); the vertex program picks `min` or `max` from the flag. A
//! trailing fencepost pair one sample-width past the last sample gives the
//! final bucket its width.

use glam::Mat4;

use crate::error::{PlotError, Result};
use crate::projection::project_point;
use crate::sample::{ScaleEpoch, StatisticalSample};

/// f32 attributes per vertex: four stats plus the top flag.
pub const FLOATS_PER_VERTEX: usize = 5;

/// Bottom and top vertex for every sample.
pub const VERTICES_PER_SAMPLE: usize = 2;

/// Vertices emitted for `sample_count` samples, fencepost included.
pub fn vertex_count(sample_count: usize) -> usize {
    (sample_count + 1) * VERTICES_PER_SAMPLE
}

/// Build the flat vertex array for `samples`.
///
/// Samples must already be ordered by time. The fencepost width is taken from
/// the gap between the first two samples, so at least two are required.
pub fn build(samples: &[StatisticalSample], scale: &ScaleEpoch) -> Result<Vec<f32>> {
    if samples.len() < 2 {
        return Err(PlotError::InsufficientData {
            count: samples.len(),
        });
    }

    let mut out = Vec::with_capacity(vertex_count(samples.len()) * FLOATS_PER_VERTEX);
    let mut last_time = 0.0;
    let mut last_stats = [0.0f32; 3];

    for sample in samples {
        let time = scale.local_time(sample.time);
        let stats = [
            scale.local_value(sample.min) as f32,
            scale.local_value(sample.mean) as f32,
            scale.local_value(sample.max) as f32,
        ];
        push_pair(&mut out, time as f32, stats);
        last_time = time;
        last_stats = stats;
    }

    // TODO: infer the width per sample instead of from the first gap; uneven buckets
    // currently get a fencepost of the wrong size.
    let width = scale.local_span(samples[0].time, samples[1].time);
    push_pair(&mut out, (last_time + width) as f32, last_stats);

    Ok(out)
}

fn push_pair(out: &mut Vec<f32>, time: f32, [min, mean, max]: [f32; 3]) {
    out.extend_from_slice(&[time, min, mean, max, 0.0]);
    out.extend_from_slice(&[time, min, mean, max, 1.0]);
}

/// Clip-space `(x, y)` of every vertex under `matrix`, picking max for top
/// vertices and min otherwise. Mirrors the vertex program on the CPU.
pub fn screen_positions(vertices: &[f32], matrix: &Mat4) -> Vec<[f32; 2]> {
    vertices
        .chunks_exact(FLOATS_PER_VERTEX)
        .map(|v| {
            let value = if v[4] > 0.5 { v[3] } else { v[1] };
            project_point(matrix, v[0], value).to_array()
        })
        .collect()
}
