//! Foreign-language surface for the watch and phone apps.
//!
//! Summaries and histories cross the boundary as their wire JSON, so the
//! apps keep a single persisted representation and this crate owns every
//! rule applied to it.

use crate::densify::TracePoint;
use crate::error::DiveError;
use crate::history::{deduped_sorted, HistoryReconciler, SortMode};
use crate::models::DiveSummary;
use crate::stats::DiveStats;
use crate::timeline::{DiveTimeline, TimelinePoint};
use crate::wire::{decode_history, decode_summary, encode_history, encode_summary};

#[derive(Clone, Debug, PartialEq, uniffi::Record)]
pub struct TracePointRecord {
    pub seconds: f64,
    pub value: f64,
}

#[derive(Clone, Debug, PartialEq, uniffi::Record)]
pub struct TimelinePointRecord {
    pub seconds: f64,
    pub depth_meters: Option<f64>,
    pub heart_rate_bpm: Option<i32>,
    pub water_temp_celsius: Option<f64>,
}

impl From<TimelinePoint> for TimelinePointRecord {
    fn from(point: TimelinePoint) -> Self {
        Self {
            seconds: point.seconds,
            depth_meters: point.depth_meters,
            heart_rate_bpm: point.heart_rate_bpm,
            water_temp_celsius: point.water_temp_celsius,
        }
    }
}

fn records<V: Into<f64>>(trace: Vec<TracePoint<V>>) -> Vec<TracePointRecord> {
    trace
        .into_iter()
        .map(|p| TracePointRecord {
            seconds: p.seconds,
            value: p.value.into(),
        })
        .collect()
}

fn load_history(history_json: &str) -> Result<Vec<DiveSummary>, DiveError> {
    if history_json.trim().is_empty() {
        return Ok(Vec::new());
    }
    decode_history(history_json)
}

fn timeline(summary_json: &str) -> Result<DiveTimeline, DiveError> {
    Ok(DiveTimeline::from_summary(&decode_summary(summary_json)?))
}

/// Decode a payload and re-encode it canonically, filling in missing ids and
/// dropping malformed samples.
#[uniffi::export]
pub fn normalize_summary_json(payload: String) -> Result<String, DiveError> {
    encode_summary(&decode_summary(&payload)?)
}

/// Merge one received payload into a history blob and return the new blob.
/// An empty blob is an empty history.
#[uniffi::export]
pub fn merge_summary_into_history(
    history_json: String,
    payload: String,
    capacity: u32,
) -> Result<String, DiveError> {
    let summary = decode_summary(&payload)?;
    let mut history = HistoryReconciler::from_entries(load_history(&history_json)?, capacity as usize);
    history.insert(summary);
    encode_history(history.entries())
}

#[uniffi::export]
pub fn sorted_history_json(history_json: String, mode: SortMode) -> Result<String, DiveError> {
    encode_history(&deduped_sorted(&load_history(&history_json)?, mode))
}

#[uniffi::export]
pub fn depth_trace(summary_json: String, step_seconds: f64) -> Result<Vec<TracePointRecord>, DiveError> {
    Ok(records(timeline(&summary_json)?.depth_trace(step_seconds)?))
}

#[uniffi::export]
pub fn heart_rate_trace(
    summary_json: String,
    step_seconds: f64,
) -> Result<Vec<TracePointRecord>, DiveError> {
    Ok(records(timeline(&summary_json)?.heart_rate_trace(step_seconds)?))
}

#[uniffi::export]
pub fn water_temp_trace(
    summary_json: String,
    step_seconds: f64,
) -> Result<Vec<TracePointRecord>, DiveError> {
    Ok(records(timeline(&summary_json)?.water_temp_trace(step_seconds)?))
}

#[uniffi::export]
pub fn timeline_point(summary_json: String, seconds: f64) -> Result<TimelinePointRecord, DiveError> {
    Ok(timeline(&summary_json)?.point_at(seconds).into())
}

/// Recorded max depth, or the profile's deepest sample when none was recorded.
#[uniffi::export]
pub fn display_max_depth(summary_json: String) -> Result<f64, DiveError> {
    Ok(DiveStats::compute(&decode_summary(&summary_json)?).display_max_depth())
}
