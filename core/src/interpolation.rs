//! Value of a stream at an arbitrary time.
//!
//! Linear blending between the two samples bracketing the query time. Queries
//! before the first sample or after the last one clamp to that sample's value;
//! the engine never extrapolates. An empty stream is a caller bug and is
//! reported as [`DiveError::EmptyStream`] rather than answered with zero, since
//! 0 m is a real depth.

use crate::error::DiveError;
use crate::models::Sample;
use crate::stream::{SampleValue, SortedStream};

/// Interpolated value of `stream` at `seconds`.
pub fn interpolate<V: SampleValue>(stream: &SortedStream<V>, seconds: f64) -> Result<V, DiveError> {
    if seconds.is_nan() {
        return Err(DiveError::InvalidQueryTime(seconds));
    }

    let samples = stream.samples();
    let (first, last) = match (samples.first(), samples.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(DiveError::EmptyStream),
    };

    if seconds <= first.seconds {
        return Ok(first.value);
    }
    if seconds >= last.seconds {
        return Ok(last.value);
    }

    // first.seconds < seconds < last.seconds, so 1 <= upper < len
    let upper = samples.partition_point(|s| s.seconds <= seconds);
    Ok(blend(&samples[upper - 1], &samples[upper], seconds))
}

fn blend<V: SampleValue>(lower: &Sample<V>, upper: &Sample<V>, seconds: f64) -> V {
    let span = upper.seconds - lower.seconds;
    let ratio = if span > 0.0 {
        (seconds - lower.seconds) / span
    } else {
        0.0
    };
    let low = lower.value.to_f64();
    let high = upper.value.to_f64();
    V::from_f64(low + (high - low) * ratio)
}

impl<V: SampleValue> SortedStream<V> {
    /// Shorthand for [`interpolate`].
    pub fn value_at(&self, seconds: f64) -> Result<V, DiveError> {
        interpolate(self, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(points: &[(f64, f64)]) -> SortedStream<f64> {
        let samples: Vec<Sample<f64>> = points.iter().map(|&(t, v)| Sample::new(t, v)).collect();
        SortedStream::from_vec(samples)
    }

    #[test]
    fn test_boundary_clamp() {
        let s = stream(&[(0.0, 10.0), (10.0, 20.0)]);
        assert_eq!(interpolate(&s, -5.0).unwrap(), 10.0);
        assert_eq!(interpolate(&s, 15.0).unwrap(), 20.0);
        assert_eq!(interpolate(&s, 5.0).unwrap(), 15.0);
    }

    #[test]
    fn test_exact_at_knots() {
        let s = stream(&[(0.0, 0.1), (1.3, 2.7), (4.9, 13.37), (7.25, 0.3)]);
        for sample in s.samples() {
            assert_eq!(interpolate(&s, sample.seconds).unwrap(), sample.value);
        }
    }

    #[test]
    fn test_unsorted_input_is_sorted_first() {
        let raw = vec![Sample::new(10.0, 20.0), Sample::new(0.0, 10.0)];
        let s = SortedStream::from_samples(&raw);
        assert_eq!(s.value_at(2.5).unwrap(), 12.5);
    }

    #[test]
    fn test_integer_stream_rounds() {
        let samples = vec![Sample::new(0.0, 60), Sample::new(10.0, 65)];
        let s = SortedStream::from_vec(samples);
        // 60 + 5 * 0.5 = 62.5
        assert_eq!(interpolate(&s, 5.0).unwrap(), 63);
        // 60 + 5 * 0.3 = 61.5
        assert_eq!(interpolate(&s, 3.0).unwrap(), 62);
        assert_eq!(interpolate(&s, 1.0).unwrap(), 61);
    }

    #[test]
    fn test_duplicate_timestamps() {
        let s = stream(&[(0.0, 1.0), (5.0, 2.0), (5.0, 4.0), (10.0, 4.0)]);
        assert_eq!(interpolate(&s, 5.0).unwrap(), 4.0);
        assert_eq!(interpolate(&s, 2.5).unwrap(), 1.5);
        assert_eq!(interpolate(&s, 7.5).unwrap(), 4.0);
    }

    #[test]
    fn test_single_sample_stream() {
        let s = stream(&[(12.0, 3.3)]);
        assert_eq!(interpolate(&s, 0.0).unwrap(), 3.3);
        assert_eq!(interpolate(&s, 100.0).unwrap(), 3.3);
    }

    #[test]
    fn test_empty_stream_is_error() {
        let s = SortedStream::<f64>::empty();
        assert_eq!(interpolate(&s, 1.0), Err(DiveError::EmptyStream));
    }

    #[test]
    fn test_nan_query_is_error() {
        let s = stream(&[(0.0, 1.0)]);
        assert!(matches!(
            interpolate(&s, f64::NAN),
            Err(DiveError::InvalidQueryTime(_))
        ));
    }
}
