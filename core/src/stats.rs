//! Statistics over a finalized dive.
//!
//! Pure functions over [`DiveSummary`] data: no storage, no clock. The
//! recorded `max_depth_meters` stays authoritative; the profile's own maximum
//! is reported alongside it and only used as a display fallback.

use crate::models::DiveSummary;
use crate::stream::SortedStream;

/// Computed statistics for a dive.
#[derive(Debug, Clone, PartialEq)]
pub struct DiveStats {
    /// Recorded duration in seconds
    pub duration_seconds: f64,
    /// Live running maximum carried on the summary
    pub max_depth_meters: f64,
    /// Deepest point of the stored profile, if any
    pub profile_max_depth_meters: Option<f64>,
    /// Time-weighted average depth over the profile
    pub average_depth_meters: Option<f64>,
    /// Descent rate (m/min) from the first sample to the deepest one
    pub descent_rate_m_min: f64,
    /// Ascent rate (m/min) from the deepest sample to the last one
    pub ascent_rate_m_min: f64,
    pub min_heart_rate_bpm: Option<i32>,
    pub max_heart_rate_bpm: Option<i32>,
    pub average_heart_rate_bpm: Option<f64>,
    pub min_water_temp_celsius: Option<f64>,
    pub max_water_temp_celsius: Option<f64>,
}

impl DiveStats {
    pub fn compute(summary: &DiveSummary) -> Self {
        let duration = summary.duration_seconds.max(0.0);
        let depth = SortedStream::from_samples(&summary.profile).clamped_to(duration);
        let heart_rate = SortedStream::from_samples(&summary.heart_rate_samples);
        let water_temp = SortedStream::from_samples(&summary.water_temp_samples);

        let (descent_rate_m_min, ascent_rate_m_min) = compute_rates(&depth);

        let average_heart_rate_bpm = if heart_rate.is_empty() {
            None
        } else {
            let sum: i64 = heart_rate.samples().iter().map(|s| i64::from(s.value)).sum();
            Some(sum as f64 / heart_rate.len() as f64)
        };

        DiveStats {
            duration_seconds: duration,
            max_depth_meters: summary.max_depth_meters,
            profile_max_depth_meters: depth.max_value(),
            average_depth_meters: time_weighted_average(&depth),
            descent_rate_m_min,
            ascent_rate_m_min,
            min_heart_rate_bpm: heart_rate.min_value(),
            max_heart_rate_bpm: heart_rate.max_value(),
            average_heart_rate_bpm,
            min_water_temp_celsius: water_temp.min_value(),
            max_water_temp_celsius: water_temp.max_value(),
        }
    }

    /// Max depth to show: the recorded value, or the profile's maximum when
    /// the recorded value is missing (zero or below).
    pub fn display_max_depth(&self) -> f64 {
        if self.max_depth_meters > 0.0 {
            return self.max_depth_meters;
        }
        self.profile_max_depth_meters
            .unwrap_or(0.0)
            .max(self.max_depth_meters)
    }
}

// Trapezoid rule over the sample times; a single sample is its own average.
fn time_weighted_average(depth: &SortedStream<f64>) -> Option<f64> {
    let samples = depth.samples();
    let (first, last) = depth.span_seconds()?;
    let span = last - first;
    if span <= 0.0 {
        let sum: f64 = samples.iter().map(|s| s.value).sum();
        return Some(sum / samples.len() as f64);
    }
    let area: f64 = samples
        .windows(2)
        .map(|pair| (pair[1].seconds - pair[0].seconds) * (pair[0].value + pair[1].value) / 2.0)
        .sum();
    Some(area / span)
}

fn compute_rates(depth: &SortedStream<f64>) -> (f64, f64) {
    let samples = depth.samples();
    if samples.len() < 2 {
        return (0.0, 0.0);
    }

    // first deepest sample
    let max_idx = samples
        .iter()
        .enumerate()
        .fold(0, |best, (i, s)| if s.value > samples[best].value { i } else { best });
    let first = &samples[0];
    let deepest = &samples[max_idx];
    let last = &samples[samples.len() - 1];

    let descent_rate = {
        let dt_min = (deepest.seconds - first.seconds) / 60.0;
        if dt_min > 0.0 {
            (deepest.value - first.value) / dt_min
        } else {
            0.0
        }
    };

    let ascent_rate = {
        let dt_min = (last.seconds - deepest.seconds) / 60.0;
        if dt_min > 0.0 {
            (deepest.value - last.value) / dt_min
        } else {
            0.0
        }
    };

    (descent_rate, ascent_rate)
}
