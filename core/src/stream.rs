//! Time-sorted views over raw sample streams.
//!
//! Raw streams are stored in arrival order. Every query goes through a
//! [`SortedStream`], which owns a sorted copy of the samples, so a snapshot can
//! be read from any thread while the source keeps changing.

use std::fmt;

use crate::models::Sample;

/// Scalar carried by a stream, convertible to and from `f64` for blending.
pub trait SampleValue: Copy + PartialEq + fmt::Debug {
    fn to_f64(self) -> f64;

    /// Convert an interpolated value back to the stream's value type.
    fn from_f64(value: f64) -> Self;
}

impl SampleValue for f64 {
    fn to_f64(self) -> f64 {
        self
    }

    fn from_f64(value: f64) -> Self {
        value
    }
}

impl SampleValue for i32 {
    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    /// Rounds half away from zero.
    fn from_f64(value: f64) -> Self {
        value.round() as i32
    }
}

/// Samples sorted ascending by `seconds`.
#[derive(Clone, Debug, PartialEq)]
pub struct SortedStream<V> {
    samples: Vec<Sample<V>>,
}

impl<V: SampleValue> SortedStream<V> {
    pub fn empty() -> Self {
        Self {
            samples: Vec::new(),
        }
    }

    /// Copy and sort. Samples sharing a timestamp keep their arrival order.
    pub fn from_samples(samples: &[Sample<V>]) -> Self {
        Self::from_vec(samples.to_vec())
    }

    pub fn from_vec(mut samples: Vec<Sample<V>>) -> Self {
        samples.sort_by(|a, b| a.seconds.total_cmp(&b.seconds));
        Self { samples }
    }

    /// Copy with every timestamp clamped into `[0, duration_seconds]`.
    ///
    /// Samples that arrived after the recorded duration are folded onto the
    /// end of the dive instead of being discarded.
    pub fn clamped_to(&self, duration_seconds: f64) -> Self {
        let upper = duration_seconds.max(0.0);
        let samples = self
            .samples
            .iter()
            .map(|s| Sample {
                id: s.id.clone(),
                seconds: s.seconds.clamp(0.0, upper),
                value: s.value,
            })
            .collect();
        Self { samples }
    }

    pub fn samples(&self) -> &[Sample<V>] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<Sample<V>> {
        self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> Option<&Sample<V>> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&Sample<V>> {
        self.samples.last()
    }

    /// First and last sample times.
    pub fn span_seconds(&self) -> Option<(f64, f64)> {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => Some((first.seconds, last.seconds)),
            _ => None,
        }
    }

    pub fn max_value(&self) -> Option<V> {
        self.samples
            .iter()
            .map(|s| s.value)
            .reduce(|a, b| if b.to_f64() > a.to_f64() { b } else { a })
    }

    pub fn min_value(&self) -> Option<V> {
        self.samples
            .iter()
            .map(|s| s.value)
            .reduce(|a, b| if b.to_f64() < a.to_f64() { b } else { a })
    }

    /// Hold the last value flat out to `seconds` when the stream ends earlier.
    pub(crate) fn extend_flat_to(&mut self, seconds: f64) {
        if let Some(last) = self.samples.last() {
            if last.seconds < seconds {
                let value = last.value;
                self.samples.push(Sample::new(seconds, value));
            }
        }
    }
}

impl<V: SampleValue> Default for SortedStream<V> {
    fn default() -> Self {
        Self::empty()
    }
}
