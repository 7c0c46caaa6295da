//! Statistical samples and the coordinate state they are drawn against.
//!
//! Raw sample times are wide integer ticks (typically nanoseconds) and raw
//! values are f64. Both are shifted by an epoch and divided by a scale before
//! they reach the GPU so that f32 vertex math keeps its precision.

use serde::{Deserialize, Serialize};

/// Nanoseconds per minute, spacing of the demo samples.
const NANOS_PER_MINUTE: i64 = 60 * 1_000_000_000;

/// One time-bucketed aggregate of an underlying time series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatisticalSample {
    /// Bucket start in raw time ticks.
    pub time: i64,
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

impl StatisticalSample {
    pub fn new(time: i64, min: f64, mean: f64, max: f64) -> Self {
        Self { time, min, mean, max }
    }
}

/// Affine transform from raw sample units to local rendering units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleEpoch {
    /// Raw time that maps to local time zero.
    pub time_epoch: i64,
    /// Raw time ticks per local time unit.
    pub time_scale: f64,
    /// Raw value that maps to local value zero.
    pub val_epoch: f64,
    /// Raw value units per local value unit.
    pub val_scale: f64,
}

impl ScaleEpoch {
    pub fn new(time_epoch: i64, time_scale: f64, val_epoch: f64, val_scale: f64) -> Self {
        Self {
            time_epoch,
            time_scale,
            val_epoch,
            val_scale,
        }
    }

    /// Local time of a raw timestamp. The subtraction happens in integer
    /// space so large epochs don't lose precision; i128 keeps it exact for
    /// any pair of i64 timestamps.
    pub fn local_time(&self, time: i64) -> f64 {
        (time as i128 - self.time_epoch as i128) as f64 / self.time_scale
    }

    /// Local length of the span from `start` to `end`.
    pub fn local_span(&self, start: i64, end: i64) -> f64 {
        (end as i128 - start as i128) as f64 / self.time_scale
    }

    /// Local length of a raw time span.
    pub fn local_duration(&self, span: i64) -> f64 {
        span as f64 / self.time_scale
    }

    pub fn local_value(&self, value: f64) -> f64 {
        (value - self.val_epoch) / self.val_scale
    }
}

impl Default for ScaleEpoch {
    fn default() -> Self {
        Self::new(0, 1.0, 0.0, 1.0)
    }
}

/// Currently visible region, in raw units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewWindow {
    pub time_start: i64,
    pub time_width: i64,
    pub value_min: f64,
    pub value_max: f64,
}

impl ViewWindow {
    pub fn new(time_start: i64, time_width: i64, value_min: f64, value_max: f64) -> Self {
        Self {
            time_start,
            time_width,
            value_min,
            value_max,
        }
    }

    /// Window starting at the first sample and spanning to the last one.
    ///
    /// Returns `None` for an empty slice, or when the span between the
    /// first and last sample does not fit in an `i64` width.
    pub fn fit(samples: &[StatisticalSample], value_min: f64, value_max: f64) -> Option<Self> {
        let first = samples.first()?;
        let last = samples.last()?;
        let width = last.time.checked_sub(first.time)?;
        Some(Self::new(first.time, width, value_min, value_max))
    }

    /// End of the window. Widened so a window near `i64::MAX` can't overflow.
    pub fn time_end(&self) -> i128 {
        self.time_start as i128 + self.time_width as i128
    }
}

/// Slow sine wave with a fixed-width envelope, one sample per minute from `time_epoch`.
pub fn demo_samples(time_epoch: i64, count: usize) -> Vec<StatisticalSample> {
    (0..count)
        .map(|i| {
            let wave = (i as f64 / 100.0).sin();
            StatisticalSample {
                time: time_epoch + i as i64 * NANOS_PER_MINUTE,
                min: wave - 0.5,
                mean: wave * 0.7,
                max: wave + 0.5,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_time_subtracts_epoch_before_scaling() {
        let scale = ScaleEpoch::new(1_000_000_000_000_000_000, 1_000_000.0, 0.0, 1.0);
        let t = scale.local_time(1_000_000_000_000_000_000 + 5_000_000);
        assert!((t - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_time_math_survives_gaps_wider_than_i64() {
        let scale = ScaleEpoch::default();
        let span = scale.local_span(-5_000_000_000_000_000_000, 5_000_000_000_000_000_000);
        assert!((span - 1e19).abs() / 1e19 < 1e-12);

        let scale = ScaleEpoch::new(i64::MIN, 1e9, 0.0, 1.0);
        let t = scale.local_time(i64::MAX);
        assert!(t.is_finite());
        assert!((t - u64::MAX as f64 / 1e9).abs() < 1.0);
    }

    #[test]
    fn test_view_fit_rejects_span_wider_than_i64() {
        let samples = vec![
            StatisticalSample::new(-5_000_000_000_000_000_000, 0.0, 0.0, 0.0),
            StatisticalSample::new(5_000_000_000_000_000_000, 0.0, 0.0, 0.0),
        ];
        assert!(ViewWindow::fit(&samples, -1.0, 1.0).is_none());

        let view = ViewWindow::new(i64::MAX - 10, 100, -1.0, 1.0);
        assert_eq!(view.time_end(), i64::MAX as i128 + 90);
    }

    #[test]
    fn test_local_value() {
        let scale = ScaleEpoch::new(0, 1.0, 10.0, 2.0);
        assert!((scale.local_value(14.0) - 2.0).abs() < 1e-12);
        assert!((scale.local_value(10.0)).abs() < 1e-12);
    }

    #[test]
    fn test_view_fit_spans_samples() {
        let samples = vec![
            StatisticalSample::new(100, 0.0, 0.0, 0.0),
            StatisticalSample::new(150, 0.0, 0.0, 0.0),
            StatisticalSample::new(400, 0.0, 0.0, 0.0),
        ];
        let view = ViewWindow::fit(&samples, -2.0, 2.0).unwrap();
        assert_eq!(view.time_start, 100);
        assert_eq!(view.time_width, 300);
        assert_eq!(view.time_end(), 400);
        assert!(ViewWindow::fit(&[], -1.0, 1.0).is_none());
    }

    #[test]
    fn test_demo_samples_shape() {
        let samples = demo_samples(7, 10);
        assert_eq!(samples.len(), 10);
        assert_eq!(samples[0].time, 7);
        assert_eq!(samples[1].time - samples[0].time, NANOS_PER_MINUTE);
        for s in &samples {
            assert!(s.min <= s.mean && s.mean <= s.max);
            assert!((s.max - s.min - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_sample_deserializes_from_json() {
        let samples: Vec<StatisticalSample> =
            serde_json::from_str(r#"[{"time": 3, "min": -1.0, "mean": 0.0, "max": 1.5}]"#).unwrap();
        assert_eq!(samples, vec![StatisticalSample::new(3, -1.0, 0.0, 1.5)]);
    }
}
