//! Regularly spaced traces from sparse streams.
//!
//! Points are produced at `0, step, 2·step, …` and always end with an exact
//! point at the target end time, even when it is not a multiple of the step.
//! A stream that stops early is held flat to the target end so a rendered
//! trace spans the whole dive.

use crate::error::DiveError;
use crate::interpolation::interpolate;
use crate::stream::{SampleValue, SortedStream};

/// Grid points closer than this to the end time are replaced by the end time.
const BOUNDARY_EPSILON: f64 = 1e-9;

/// Largest number of intervals a grid may have.
pub const MAX_GRID_INTERVALS: usize = 10_000_000;

/// A synthetic point on a dense trace.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TracePoint<V> {
    pub seconds: f64,
    pub value: V,
}

/// Query times from 0 to `end_seconds` inclusive.
///
/// Multiples are computed as `i * step` rather than accumulated. The grid
/// always starts at 0 and the final point is exactly `end_seconds`. A step so
/// small that the grid would exceed [`MAX_GRID_INTERVALS`] is rejected.
pub fn time_grid(step_seconds: f64, end_seconds: f64) -> Result<Vec<f64>, DiveError> {
    if !step_seconds.is_finite() || step_seconds <= 0.0 {
        return Err(DiveError::InvalidStep(step_seconds));
    }
    if !end_seconds.is_finite() {
        return Err(DiveError::InvalidTargetEnd(end_seconds));
    }
    let end = end_seconds.max(0.0);

    let intervals = (end / step_seconds).ceil();
    if intervals > MAX_GRID_INTERVALS as f64 {
        return Err(DiveError::InvalidStep(step_seconds));
    }

    let mut times = Vec::with_capacity((intervals as usize).saturating_add(2));
    if end > 0.0 {
        times.push(0.0);
    }
    let mut i: u64 = 1;
    loop {
        let t = i as f64 * step_seconds;
        if t >= end - BOUNDARY_EPSILON {
            break;
        }
        times.push(t);
        i += 1;
    }
    times.push(end);
    Ok(times)
}

/// Dense trace of `stream` covering `[0, target_end_seconds]`.
///
/// An empty stream yields an empty trace; callers decide how to show
/// "no data". See [`densify_depth`] for the depth-specific fallback.
pub fn densify<V: SampleValue>(
    stream: &SortedStream<V>,
    step_seconds: f64,
    target_end_seconds: f64,
) -> Result<Vec<TracePoint<V>>, DiveError> {
    let times = time_grid(step_seconds, target_end_seconds)?;
    if stream.is_empty() {
        return Ok(Vec::new());
    }

    let mut extended = stream.clone();
    extended.extend_flat_to(target_end_seconds);

    times
        .into_iter()
        .map(|seconds| {
            Ok(TracePoint {
                seconds,
                value: interpolate(&extended, seconds)?,
            })
        })
        .collect()
}

/// Like [`densify`], but a dive without any depth samples is drawn as a flat
/// line at the surface from 0 to `target_end_seconds`.
pub fn densify_depth(
    stream: &SortedStream<f64>,
    step_seconds: f64,
    target_end_seconds: f64,
) -> Result<Vec<TracePoint<f64>>, DiveError> {
    if stream.is_empty() {
        time_grid(step_seconds, target_end_seconds)?;
        if target_end_seconds > 0.0 {
            return Ok(vec![
                TracePoint {
                    seconds: 0.0,
                    value: 0.0,
                },
                TracePoint {
                    seconds: target_end_seconds,
                    value: 0.0,
                },
            ]);
        }
        return Ok(Vec::new());
    }
    densify(stream, step_seconds, target_end_seconds)
}
