//! Tunables for recording, history and rendering, loaded from JSON.

use std::fs;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::DiveError;
use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::recorder::RecorderConfig;
use crate::timeline::DEFAULT_RENDER_STEP_SECONDS;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub recorder: RecorderConfig,
    /// Dives kept by the viewer before the oldest is evicted
    pub history_capacity: usize,
    /// Default grid step for rendered traces
    pub render_step_seconds: f64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            recorder: RecorderConfig::default(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            render_step_seconds: DEFAULT_RENDER_STEP_SECONDS,
        }
    }
}

impl CoreConfig {
    /// Read a config file. A missing file yields the defaults; a present but
    /// invalid one is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DiveError> {
        let path = path.as_ref();
        if !path.exists() {
            info!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .map_err(|e| DiveError::Config(format!("{}: {e}", path.display())))?;
        let config = Self::from_json(&contents)?;
        debug!("config loaded from {}", path.display());
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, DiveError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| DiveError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DiveError> {
        let recorder = &self.recorder;
        let thresholds = [
            ("depth_interval_seconds", recorder.depth_interval_seconds),
            ("depth_delta_meters", recorder.depth_delta_meters),
            ("heart_rate_interval_seconds", recorder.heart_rate_interval_seconds),
            ("heart_rate_delta_bpm", recorder.heart_rate_delta_bpm),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() || value < 0.0 {
                return Err(DiveError::Config(format!("{name} must be non-negative, got {value}")));
            }
        }
        if let Some(interval) = recorder.water_temp_interval_seconds {
            if !interval.is_finite() || interval < 0.0 {
                return Err(DiveError::Config(format!(
                    "water_temp_interval_seconds must be non-negative, got {interval}"
                )));
            }
        }
        if self.history_capacity == 0 {
            return Err(DiveError::Config("history_capacity must be at least 1".to_string()));
        }
        if !self.render_step_seconds.is_finite() || self.render_step_seconds <= 0.0 {
            return Err(DiveError::Config(format!(
                "render_step_seconds must be positive, got {}",
                self.render_step_seconds
            )));
        }
        Ok(())
    }
}
