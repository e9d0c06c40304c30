//! Live dive session: the `Idle → Recording → Idle` state machine.
//!
//! Sensor callbacks may arrive from any thread. All three streams live behind a
//! single lock so appends are serialized per session, and `stop` sees one
//! consistent snapshot of depth, heart rate and temperature together.

use chrono::{DateTime, Utc};
use log::debug;
use parking_lot::Mutex;

use crate::config::CoreConfig;
use crate::error::DiveError;
use crate::models::{DepthSample, DiveRecording, DiveSummary, HeartRateSample, Sample, WaterTempSample};
use crate::recorder::{AdaptiveSampler, RecorderConfig};
use crate::stream::SortedStream;
use crate::wire::wire_precision;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Recording,
}

/// Copy of the in-progress streams, safe to query from another thread.
#[derive(Clone, Debug, PartialEq)]
pub struct LiveSnapshot {
    pub start_date: DateTime<Utc>,
    pub max_depth_meters: f64,
    pub current_depth_meters: Option<f64>,
    pub current_heart_rate: Option<i32>,
    pub water_temperature_celsius: Option<f64>,
    pub profile: Vec<DepthSample>,
    pub heart_rate_samples: Vec<HeartRateSample>,
    pub water_temp_samples: Vec<WaterTempSample>,
}

impl LiveSnapshot {
    pub fn depth_stream(&self) -> SortedStream<f64> {
        SortedStream::from_samples(&self.profile)
    }

    pub fn heart_rate_stream(&self) -> SortedStream<i32> {
        SortedStream::from_samples(&self.heart_rate_samples)
    }

    pub fn water_temp_stream(&self) -> SortedStream<f64> {
        SortedStream::from_samples(&self.water_temp_samples)
    }
}

#[derive(Debug)]
struct LiveDive {
    start_date: DateTime<Utc>,
    depth: AdaptiveSampler,
    heart_rate: AdaptiveSampler,
    water_temp: Option<AdaptiveSampler>,
    max_depth_meters: f64,
    last_depth_meters: Option<f64>,
    last_heart_rate: Option<i32>,
    water_temperature_celsius: Option<f64>,
    profile: Vec<DepthSample>,
    heart_rate_samples: Vec<HeartRateSample>,
    water_temp_samples: Vec<WaterTempSample>,
}

impl LiveDive {
    fn begin(start_date: DateTime<Utc>, config: &RecorderConfig) -> Self {
        Self {
            start_date,
            depth: config.depth_sampler(),
            heart_rate: config.heart_rate_sampler(),
            water_temp: config.water_temp_sampler(),
            max_depth_meters: 0.0,
            last_depth_meters: None,
            last_heart_rate: None,
            water_temperature_celsius: None,
            profile: Vec::new(),
            heart_rate_samples: Vec::new(),
            water_temp_samples: Vec::new(),
        }
    }

    fn elapsed_seconds(&self, at: DateTime<Utc>) -> f64 {
        (at - self.start_date)
            .to_std()
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }

    fn append_depth(&mut self, seconds: f64, depth_meters: f64, force: bool) -> bool {
        if self.depth.offer(seconds, depth_meters, force) {
            self.profile.push(Sample::new(seconds, depth_meters));
            true
        } else {
            false
        }
    }

    fn snapshot(&self) -> LiveSnapshot {
        LiveSnapshot {
            start_date: self.start_date,
            max_depth_meters: self.max_depth_meters,
            current_depth_meters: self.last_depth_meters,
            current_heart_rate: self.last_heart_rate,
            water_temperature_celsius: self.water_temperature_celsius,
            profile: self.profile.clone(),
            heart_rate_samples: self.heart_rate_samples.clone(),
            water_temp_samples: self.water_temp_samples.clone(),
        }
    }
}

#[derive(Debug)]
enum SessionState {
    Idle,
    Recording(Box<LiveDive>),
}

/// One recorder; share it behind an `Arc` across sensor callbacks.
#[derive(Debug)]
pub struct DiveSession {
    config: RecorderConfig,
    state: Mutex<SessionState>,
}

impl DiveSession {
    pub fn new(config: RecorderConfig) -> Self {
        Self {
            config,
            state: Mutex::new(SessionState::Idle),
        }
    }

    /// A session using the recorder thresholds of a loaded config.
    pub fn from_config(config: &CoreConfig) -> Self {
        Self::new(config.recorder)
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    pub fn status(&self) -> SessionStatus {
        match *self.state.lock() {
            SessionState::Idle => SessionStatus::Idle,
            SessionState::Recording(_) => SessionStatus::Recording,
        }
    }

    /// Begin a new dive with empty streams.
    pub fn start(&self, at: DateTime<Utc>) -> Result<(), DiveError> {
        let mut state = self.state.lock();
        if let SessionState::Recording(_) = *state {
            return Err(DiveError::AlreadyRecording);
        }
        *state = SessionState::Recording(Box::new(LiveDive::begin(wire_precision(at), &self.config)));
        debug!("dive recording started at {at}");
        Ok(())
    }

    /// Offer a depth reading. Returns whether a sample was appended.
    pub fn record_depth(&self, at: DateTime<Utc>, depth_meters: f64) -> bool {
        if !depth_meters.is_finite() {
            return false;
        }
        let mut state = self.state.lock();
        let SessionState::Recording(dive) = &mut *state else {
            return false;
        };
        let depth_meters = depth_meters.max(0.0);
        dive.max_depth_meters = dive.max_depth_meters.max(depth_meters);
        dive.last_depth_meters = Some(depth_meters);
        let seconds = dive.elapsed_seconds(at);
        dive.append_depth(seconds, depth_meters, false)
    }

    /// Offer a heart-rate reading. Zero and negative readings are dropped.
    pub fn record_heart_rate(&self, at: DateTime<Utc>, bpm: i32) -> bool {
        if bpm <= 0 {
            return false;
        }
        let mut state = self.state.lock();
        let SessionState::Recording(dive) = &mut *state else {
            return false;
        };
        dive.last_heart_rate = Some(bpm);
        let seconds = dive.elapsed_seconds(at);
        if dive.heart_rate.offer(seconds, f64::from(bpm), false) {
            dive.heart_rate_samples.push(Sample::new(seconds, bpm));
            true
        } else {
            false
        }
    }

    /// Update the current water temperature. A sample is appended only when
    /// periodic temperature sampling is configured.
    pub fn record_water_temperature(&self, at: DateTime<Utc>, celsius: f64) -> bool {
        if !celsius.is_finite() {
            return false;
        }
        let mut state = self.state.lock();
        let SessionState::Recording(dive) = &mut *state else {
            return false;
        };
        dive.water_temperature_celsius = Some(celsius);
        let seconds = dive.elapsed_seconds(at);
        let keep = match dive.water_temp.as_mut() {
            Some(sampler) => sampler.offer(seconds, celsius, false),
            None => false,
        };
        if keep {
            dive.water_temp_samples.push(Sample::new(seconds, celsius));
        }
        keep
    }

    /// Copy of the live streams, or `None` when idle.
    pub fn snapshot(&self) -> Option<LiveSnapshot> {
        match &*self.state.lock() {
            SessionState::Idle => None,
            SessionState::Recording(dive) => Some(dive.snapshot()),
        }
    }

    /// End the dive and return its finalized summary.
    ///
    /// The last known depth is appended at the stop time regardless of the
    /// thresholds, so the profile always reaches the end of the dive.
    pub fn stop(&self, at: DateTime<Utc>) -> Result<DiveSummary, DiveError> {
        let mut state = self.state.lock();
        let SessionState::Recording(mut dive) = std::mem::replace(&mut *state, SessionState::Idle)
        else {
            return Err(DiveError::NotRecording);
        };

        let end_date = wire_precision(at).max(dive.start_date);
        let duration_seconds = dive.elapsed_seconds(end_date);

        if let Some(depth) = dive.last_depth_meters {
            let already_there = dive
                .depth
                .last_appended()
                .is_some_and(|(seconds, _)| seconds >= duration_seconds);
            if !already_there {
                dive.append_depth(duration_seconds, depth, true);
            }
        }

        let summary = DiveSummary::finalize(DiveRecording {
            start_date: dive.start_date,
            end_date,
            max_depth_meters: dive.max_depth_meters,
            duration_seconds,
            ending_heart_rate: dive.last_heart_rate,
            water_temperature_celsius: dive.water_temperature_celsius,
            profile: dive.profile,
            heart_rate_samples: dive.heart_rate_samples,
            water_temp_samples: dive.water_temp_samples,
        });
        debug!(
            "dive {} finalized: {:.1}s, max {:.1} m, {} depth / {} hr / {} temp samples",
            summary.id,
            summary.duration_seconds,
            summary.max_depth_meters,
            summary.profile.len(),
            summary.heart_rate_samples.len(),
            summary.water_temp_samples.len()
        );
        Ok(summary)
    }
}

impl Default for DiveSession {
    fn default() -> Self {
        Self::new(RecorderConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{decode_summary, encode_summary};
    use chrono::Duration;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn at(ms: i64) -> DateTime<Utc> {
        t0() + Duration::milliseconds(ms)
    }

    #[test]
    fn test_status_transitions() {
        let session = DiveSession::default();
        assert_eq!(session.status(), SessionStatus::Idle);

        session.start(t0()).unwrap();
        assert_eq!(session.status(), SessionStatus::Recording);
        assert_eq!(session.start(t0()), Err(DiveError::AlreadyRecording));

        session.stop(at(1_000)).unwrap();
        assert_eq!(session.status(), SessionStatus::Idle);
        assert_eq!(session.stop(at(2_000)), Err(DiveError::NotRecording));
    }

    #[test]
    fn test_readings_while_idle_are_ignored() {
        let session = DiveSession::default();
        assert!(!session.record_depth(t0(), 3.0));
        assert!(!session.record_heart_rate(t0(), 70));
        assert!(!session.record_water_temperature(t0(), 19.0));
        assert!(session.snapshot().is_none());
    }

    #[test]
    fn test_depth_sequence_and_forced_final() {
        let session = DiveSession::default();
        session.start(t0()).unwrap();

        assert!(session.record_depth(at(0), 0.0));
        assert!(!session.record_depth(at(300), 0.1));
        assert!(session.record_depth(at(1_000), 0.5));
        assert!(!session.record_depth(at(1_600), 0.6));
        assert!(session.record_depth(at(3_200), 5.0));
        assert!(!session.record_depth(at(3_400), 5.1));

        let summary = session.stop(at(4_000)).unwrap();
        let kept: Vec<(f64, f64)> = summary.profile.iter().map(|s| (s.seconds, s.value)).collect();
        assert_eq!(kept, vec![(0.0, 0.0), (1.0, 0.5), (3.2, 5.0), (4.0, 5.1)]);
        assert_eq!(summary.max_depth_meters, 5.1);
        assert_eq!(summary.duration_seconds, 4.0);
        assert_eq!(summary.end_date, at(4_000));
    }

    #[test]
    fn test_heart_rate_policy() {
        let session = DiveSession::default();
        session.start(t0()).unwrap();

        assert!(!session.record_heart_rate(at(0), 0));
        assert!(session.record_heart_rate(at(500), 72));
        assert!(!session.record_heart_rate(at(1_500), 73));
        assert!(session.record_heart_rate(at(2_000), 69));
        assert!(!session.record_heart_rate(at(3_000), -5));
        assert!(session.record_heart_rate(at(7_000), 68));

        let summary = session.stop(at(8_000)).unwrap();
        let bpm: Vec<i32> = summary.heart_rate_samples.iter().map(|s| s.value).collect();
        assert_eq!(bpm, vec![72, 69, 68]);
        assert_eq!(summary.ending_heart_rate, Some(68));
        assert!(summary.profile.is_empty());
    }

    #[test]
    fn test_water_temperature_snapshot_only_by_default() {
        let session = DiveSession::default();
        session.start(t0()).unwrap();
        assert!(!session.record_water_temperature(at(0), 21.0));
        assert!(!session.record_water_temperature(at(60_000), 17.5));

        let summary = session.stop(at(61_000)).unwrap();
        assert!(summary.water_temp_samples.is_empty());
        assert_eq!(summary.water_temperature_celsius, Some(17.5));
    }

    #[test]
    fn test_water_temperature_periodic_sampling() {
        let session = DiveSession::new(RecorderConfig {
            water_temp_interval_seconds: Some(30.0),
            ..Default::default()
        });
        session.start(t0()).unwrap();
        assert!(session.record_water_temperature(at(0), 21.0));
        assert!(!session.record_water_temperature(at(10_000), 19.0));
        assert!(session.record_water_temperature(at(30_000), 18.0));

        let summary = session.stop(at(31_000)).unwrap();
        assert_eq!(summary.water_temp_samples.len(), 2);
    }

    #[test]
    fn test_restart_clears_streams() {
        let session = DiveSession::default();
        session.start(t0()).unwrap();
        session.record_depth(at(0), 2.0);
        session.record_heart_rate(at(0), 80);
        let first = session.stop(at(5_000)).unwrap();

        session.start(at(60_000)).unwrap();
        let snapshot = session.snapshot().unwrap();
        assert!(snapshot.profile.is_empty());
        assert!(snapshot.heart_rate_samples.is_empty());
        assert_eq!(snapshot.max_depth_meters, 0.0);

        let second = session.stop(at(61_000)).unwrap();
        assert_ne!(first.id, second.id);
        assert!(second.profile.is_empty());
        assert_eq!(second.ending_heart_rate, None);
    }

    #[test]
    fn test_stop_before_start_time_clamps() {
        let session = DiveSession::default();
        session.start(at(10_000)).unwrap();
        session.record_depth(at(9_000), 1.0);
        let summary = session.stop(at(5_000)).unwrap();
        assert_eq!(summary.duration_seconds, 0.0);
        assert_eq!(summary.end_date, summary.start_date);
        assert_eq!(summary.profile.len(), 1);
        assert_eq!(summary.profile[0].seconds, 0.0);
    }

    #[test]
    fn test_concurrent_callbacks() {
        let session = Arc::new(DiveSession::new(RecorderConfig {
            depth_interval_seconds: 0.0,
            depth_delta_meters: 0.0,
            heart_rate_interval_seconds: 0.0,
            heart_rate_delta_bpm: 0.0,
            ..Default::default()
        }));
        session.start(t0()).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let session = Arc::clone(&session);
                thread::spawn(move || {
                    for i in 0..250 {
                        let ms = (worker * 250 + i) as i64;
                        session.record_depth(at(ms), 1.0);
                        session.record_heart_rate(at(ms), 70);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let summary = session.stop(at(10_000)).unwrap();
        // zero thresholds keep every reading, plus the forced final depth
        assert_eq!(summary.profile.len(), 1_001);
        assert_eq!(summary.heart_rate_samples.len(), 1_000);
    }

    #[test]
    fn test_stop_while_appends_in_flight() {
        let session = Arc::new(DiveSession::new(RecorderConfig {
            depth_interval_seconds: 0.0,
            depth_delta_meters: 0.0,
            ..Default::default()
        }));
        session.start(t0()).unwrap();
        let stopped = Arc::new(AtomicBool::new(false));
        let appended = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let session = Arc::clone(&session);
                let stopped = Arc::clone(&stopped);
                let appended = Arc::clone(&appended);
                thread::spawn(move || {
                    let mut i: i64 = 0;
                    loop {
                        let after_stop = stopped.load(Ordering::SeqCst);
                        let ms = (i * 4 + worker) % 900_000;
                        let kept = session.record_depth(at(ms), 2.0);
                        if after_stop {
                            assert!(!kept, "append accepted after stop");
                            assert!(!session.record_heart_rate(at(ms), 70));
                            break;
                        }
                        if kept {
                            appended.fetch_add(1, Ordering::SeqCst);
                        }
                        i += 1;
                    }
                })
            })
            .collect();

        while session.snapshot().map_or(0, |s| s.profile.len()) < 200 {
            thread::yield_now();
        }
        let summary = session.stop(at(1_000_000)).unwrap();
        stopped.store(true, Ordering::SeqCst);
        for handle in handles {
            handle.join().unwrap();
        }

        // every accepted reading is in the summary, plus the forced final sample
        assert_eq!(summary.profile.len(), appended.load(Ordering::SeqCst) + 1);
        assert_eq!(summary.profile.last().unwrap().seconds, 1_000.0);
        assert!(summary.profile.iter().all(|s| s.value == 2.0));
        assert_eq!(session.status(), SessionStatus::Idle);
        assert!(session.snapshot().is_none());
    }

    #[test]
    fn test_clock_readings_survive_encoding() {
        let session = DiveSession::default();
        let start = DateTime::from_timestamp(1_700_000_020, 123_456_789).unwrap();
        let stop = DateTime::from_timestamp(1_700_000_080, 987_654_321).unwrap();
        session.start(start).unwrap();
        session.record_depth(start + Duration::milliseconds(1_500), 4.0);
        let summary = session.stop(stop).unwrap();

        assert_eq!(summary.start_date.timestamp_subsec_nanos(), 123_457_000);
        let decoded = decode_summary(&encode_summary(&summary).unwrap()).unwrap();
        assert_eq!(decoded, summary);
    }

    #[test]
    fn test_from_config_uses_recorder_thresholds() {
        let config = CoreConfig::from_json(r#"{"recorder": {"depth_delta_meters": 2.0}}"#).unwrap();
        let session = DiveSession::from_config(&config);
        assert_eq!(session.config().depth_delta_meters, 2.0);

        session.start(t0()).unwrap();
        assert!(session.record_depth(at(0), 0.0));
        assert!(!session.record_depth(at(500), 1.0));
        assert!(session.record_depth(at(1_000), 2.0));
    }
}
