//! One scrubbable timeline built from a summary's three streams.
//!
//! A [`DiveTimeline`] is an immutable snapshot: sorted copies of the depth,
//! heart-rate and temperature streams with late samples clamped onto the
//! recorded duration. It can be shared across threads and queried from a
//! redraw loop without further synchronization.

use crate::densify::{densify, densify_depth, time_grid, TracePoint};
use crate::error::DiveError;
use crate::models::DiveSummary;
use crate::stream::SortedStream;

/// Grid step used for rendering when none is configured.
pub const DEFAULT_RENDER_STEP_SECONDS: f64 = 1.0;

/// All three quantities at one instant. `None` means no data, not zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimelinePoint {
    pub seconds: f64,
    pub depth_meters: Option<f64>,
    pub heart_rate_bpm: Option<i32>,
    pub water_temp_celsius: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DiveTimeline {
    duration_seconds: f64,
    depth: SortedStream<f64>,
    heart_rate: SortedStream<i32>,
    water_temp: SortedStream<f64>,
    ending_heart_rate: Option<i32>,
    water_temperature_celsius: Option<f64>,
    render_step_seconds: f64,
}

impl DiveTimeline {
    pub fn from_summary(summary: &DiveSummary) -> Self {
        let duration_seconds = summary.duration_seconds.max(0.0);
        Self {
            duration_seconds,
            depth: SortedStream::from_samples(&summary.profile).clamped_to(duration_seconds),
            heart_rate: SortedStream::from_samples(&summary.heart_rate_samples)
                .clamped_to(duration_seconds),
            water_temp: SortedStream::from_samples(&summary.water_temp_samples)
                .clamped_to(duration_seconds),
            ending_heart_rate: summary.ending_heart_rate,
            water_temperature_celsius: summary.water_temperature_celsius,
            render_step_seconds: DEFAULT_RENDER_STEP_SECONDS,
        }
    }

    /// Grid step for [`DiveTimeline::render_points`] and
    /// [`DiveTimeline::render_depth_trace`].
    pub fn with_render_step(mut self, step_seconds: f64) -> Self {
        self.render_step_seconds = step_seconds;
        self
    }

    pub fn render_step_seconds(&self) -> f64 {
        self.render_step_seconds
    }

    pub fn render_points(&self) -> Result<Vec<TimelinePoint>, DiveError> {
        self.points(self.render_step_seconds)
    }

    pub fn render_depth_trace(&self) -> Result<Vec<TracePoint<f64>>, DiveError> {
        self.depth_trace(self.render_step_seconds)
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    pub fn depth_stream(&self) -> &SortedStream<f64> {
        &self.depth
    }

    pub fn heart_rate_stream(&self) -> &SortedStream<i32> {
        &self.heart_rate
    }

    pub fn water_temp_stream(&self) -> &SortedStream<f64> {
        &self.water_temp
    }

    pub fn depth_at(&self, seconds: f64) -> Option<f64> {
        self.depth.value_at(seconds).ok()
    }

    /// Falls back to the ending heart rate when no stream was recorded.
    pub fn heart_rate_at(&self, seconds: f64) -> Option<i32> {
        if self.heart_rate.is_empty() {
            return self.ending_heart_rate;
        }
        self.heart_rate.value_at(seconds).ok()
    }

    /// Falls back to the snapshot temperature when no stream was recorded.
    pub fn water_temp_at(&self, seconds: f64) -> Option<f64> {
        if self.water_temp.is_empty() {
            return self.water_temperature_celsius;
        }
        self.water_temp.value_at(seconds).ok()
    }

    /// Every quantity at `seconds`, clamped into the dive.
    pub fn point_at(&self, seconds: f64) -> TimelinePoint {
        let seconds = if seconds.is_nan() {
            0.0
        } else {
            seconds.clamp(0.0, self.duration_seconds)
        };
        TimelinePoint {
            seconds,
            depth_meters: self.depth_at(seconds),
            heart_rate_bpm: self.heart_rate_at(seconds),
            water_temp_celsius: self.water_temp_at(seconds),
        }
    }

    /// Joined points on a regular grid over the whole dive.
    pub fn points(&self, step_seconds: f64) -> Result<Vec<TimelinePoint>, DiveError> {
        Ok(time_grid(step_seconds, self.duration_seconds)?
            .into_iter()
            .map(|seconds| self.point_at(seconds))
            .collect())
    }

    pub fn depth_trace(&self, step_seconds: f64) -> Result<Vec<TracePoint<f64>>, DiveError> {
        densify_depth(&self.depth, step_seconds, self.duration_seconds)
    }

    pub fn heart_rate_trace(&self, step_seconds: f64) -> Result<Vec<TracePoint<i32>>, DiveError> {
        densify(&self.heart_rate, step_seconds, self.duration_seconds)
    }

    pub fn water_temp_trace(&self, step_seconds: f64) -> Result<Vec<TracePoint<f64>>, DiveError> {
        densify(&self.water_temp, step_seconds, self.duration_seconds)
    }
}

impl From<&DiveSummary> for DiveTimeline {
    fn from(summary: &DiveSummary) -> Self {
        Self::from_summary(summary)
    }
}
