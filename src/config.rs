//! Plotter configuration.
//!
//! Loaded from camelCase JSON; every field has a default so a partial file
//! (or none at all) is valid.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{PlotError, Result};
use crate::sample::{ScaleEpoch, ViewWindow};

const NANOS_PER_MILLI: f64 = 1_000_000.0;
const NANOS_PER_HOUR: i64 = 3_600 * 1_000_000_000;

/// One year past 1970, in nanoseconds.
fn default_time_epoch() -> i64 {
    365 * 24 * NANOS_PER_HOUR
}

/// Milliseconds as the local time unit.
fn default_time_scale() -> f64 {
    NANOS_PER_MILLI
}

fn default_val_scale() -> f64 {
    1.0
}

/// Opaque yellow.
fn default_stream_color() -> [f32; 4] {
    [1.0, 1.0, 0.0, 1.0]
}

/// Half-height of the highlighted mean band, in clip units.
fn default_mean_width() -> f32 {
    0.01
}

fn default_view() -> ViewWindow {
    ViewWindow::new(default_time_epoch(), NANOS_PER_HOUR, -2.0, 2.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotterConfig {
    #[serde(default = "default_time_epoch")]
    pub time_epoch: i64,

    #[serde(default = "default_time_scale")]
    pub time_scale: f64,

    #[serde(default)]
    pub val_epoch: f64,

    #[serde(default = "default_val_scale")]
    pub val_scale: f64,

    /// RGBA.
    #[serde(default = "default_stream_color")]
    pub stream_color: [f32; 4],

    #[serde(default = "default_mean_width")]
    pub mean_width: f32,

    /// Initial visible region.
    #[serde(default = "default_view")]
    pub view: ViewWindow,

    /// Clear the target before drawing. None composes over the host's content.
    #[serde(default)]
    pub clear_color: Option<[f64; 4]>,
}

impl Default for PlotterConfig {
    fn default() -> Self {
        Self {
            time_epoch: default_time_epoch(),
            time_scale: default_time_scale(),
            val_epoch: 0.0,
            val_scale: default_val_scale(),
            stream_color: default_stream_color(),
            mean_width: default_mean_width(),
            view: default_view(),
            clear_color: None,
        }
    }
}

impl PlotterConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| PlotError::Config(format!("failed to read {:?}: {}", path, e)))?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(contents).map_err(|e| PlotError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn scale_epoch(&self) -> ScaleEpoch {
        ScaleEpoch::new(self.time_epoch, self.time_scale, self.val_epoch, self.val_scale)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.time_scale.is_finite() && self.time_scale > 0.0) {
            return Err(PlotError::Config("timeScale must be positive".to_string()));
        }
        if !(self.val_scale.is_finite() && self.val_scale > 0.0) {
            return Err(PlotError::Config("valScale must be positive".to_string()));
        }
        if self.view.time_width <= 0 {
            return Err(PlotError::Config("view timeWidth must be positive".to_string()));
        }
        if !(self.view.value_max > self.view.value_min) {
            return Err(PlotError::Config(
                "view valueMax must be greater than valueMin".to_string(),
            ));
        }
        if !(self.mean_width >= 0.0) {
            return Err(PlotError::Config("meanWidth must not be negative".to_string()));
        }
        Ok(())
    }
}
