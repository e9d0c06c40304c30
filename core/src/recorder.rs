//! Adaptive sampling policies for live recording.
//!
//! A reading is kept when it is the first one of the dive, when enough time has
//! passed since the last kept reading, or when the value moved far enough from
//! it. Everything in between is dropped to bound stream size.

use serde::{Deserialize, Serialize};

/// Tolerance so a change of exactly the delta (or exactly the interval)
/// survives float noise and still triggers an append.
const THRESHOLD_EPSILON: f64 = 1e-9;

/// Sampling thresholds for the three live streams.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Max seconds between kept depth samples
    pub depth_interval_seconds: f64,
    /// Depth change (m) that forces a new sample
    pub depth_delta_meters: f64,
    /// Max seconds between kept heart-rate samples
    pub heart_rate_interval_seconds: f64,
    /// Heart-rate change (bpm) that forces a new sample
    pub heart_rate_delta_bpm: f64,
    /// Fixed period for water temperature samples; `None` keeps only the
    /// current value
    pub water_temp_interval_seconds: Option<f64>,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            depth_interval_seconds: 1.5,
            depth_delta_meters: 0.4,
            heart_rate_interval_seconds: 5.0,
            heart_rate_delta_bpm: 3.0,
            water_temp_interval_seconds: None,
        }
    }
}

impl RecorderConfig {
    pub fn depth_sampler(&self) -> AdaptiveSampler {
        AdaptiveSampler::new(self.depth_interval_seconds, self.depth_delta_meters)
    }

    pub fn heart_rate_sampler(&self) -> AdaptiveSampler {
        AdaptiveSampler::new(self.heart_rate_interval_seconds, self.heart_rate_delta_bpm)
    }

    /// Period-only sampler, or `None` when temperature sampling is disabled.
    pub fn water_temp_sampler(&self) -> Option<AdaptiveSampler> {
        self.water_temp_interval_seconds
            .map(|interval| AdaptiveSampler::new(interval, f64::INFINITY))
    }
}

/// Time/delta threshold policy for one stream.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdaptiveSampler {
    interval_seconds: f64,
    delta: f64,
    last: Option<(f64, f64)>,
}

impl AdaptiveSampler {
    pub fn new(interval_seconds: f64, delta: f64) -> Self {
        Self {
            interval_seconds,
            delta,
            last: None,
        }
    }

    /// Whether a reading at `seconds` with `value` crosses a threshold.
    pub fn should_append(&self, seconds: f64, value: f64) -> bool {
        match self.last {
            None => true,
            Some((last_seconds, last_value)) => {
                seconds - last_seconds >= self.interval_seconds - THRESHOLD_EPSILON
                    || (value - last_value).abs() >= self.delta - THRESHOLD_EPSILON
            }
        }
    }

    /// Record the reading as kept if it qualifies (or if `force` is set).
    /// Returns whether it was kept.
    pub fn offer(&mut self, seconds: f64, value: f64, force: bool) -> bool {
        if force || self.should_append(seconds, value) {
            self.last = Some((seconds, value));
            true
        } else {
            false
        }
    }

    /// Time and value of the last kept reading.
    pub fn last_appended(&self) -> Option<(f64, f64)> {
        self.last
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}
