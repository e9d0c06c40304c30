use chrono::{DateTime, Duration, Utc};

use freedive_core::{
    deliver, densify, encode_summary, interpolate, DeliveryStatus, DiveSession, DiveStats,
    DiveSummary, DiveTimeline, HistoryStore, JsonFileStore, LoopbackTransport, MemoryStore,
    RecorderConfig, Sample, SessionStatus, SortMode, SortedStream, ViewerLog,
};

fn at(start: DateTime<Utc>, seconds: f64) -> DateTime<Utc> {
    start + Duration::milliseconds((seconds * 1000.0).round() as i64)
}

fn start_time(offset_minutes: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap() + Duration::minutes(offset_minutes)
}

/// A short V-shaped dive fed through a live session.
fn record_dive(session: &DiveSession, start: DateTime<Utc>) -> DiveSummary {
    session.start(start).unwrap();
    for tenth in 0..=400 {
        let t = tenth as f64 / 10.0;
        let depth = if t <= 20.0 { t } else { 40.0 - t };
        session.record_depth(at(start, t), depth);
        if tenth % 10 == 0 {
            session.record_heart_rate(at(start, t), 80 - (tenth / 20) as i32);
            session.record_water_temperature(at(start, t), 24.0 - t / 10.0);
        }
    }
    session.stop(at(start, 41.0)).unwrap()
}

#[test]
fn test_session_to_viewer_collapses_duplicates() {
    let session = DiveSession::default();
    let summary = record_dive(&session, start_time(0));
    assert_eq!(session.status(), SessionStatus::Idle);

    // forced final sample at the stop time holds the last depth
    let last = summary.profile.last().unwrap();
    assert!((last.seconds - 41.0).abs() < 1e-6);
    assert!((last.value - 0.0).abs() < 1e-6);
    assert!((summary.max_depth_meters - 20.0).abs() < 1e-6);

    let (transport, inbox) = LoopbackTransport::channel();
    let mut transport = transport.with_duplicates(3);
    assert_eq!(deliver(&mut transport, &summary), DeliveryStatus::Sent);

    let mut viewer = ViewerLog::open(MemoryStore::new(), 50).unwrap();
    assert_eq!(viewer.drain(&inbox), 3);
    assert_eq!(viewer.history().len(), 1);

    let received = viewer.history().get(&summary.id).unwrap();
    assert_eq!(received.profile.len(), summary.profile.len());
    assert_eq!(received.ending_heart_rate, summary.ending_heart_rate);
}

#[test]
fn test_malformed_payload_between_valid_ones() {
    let session = DiveSession::default();
    let first = record_dive(&session, start_time(0));
    let second = record_dive(&session, start_time(10));

    let (sender, inbox) = crossbeam_channel::unbounded();
    sender.send(encode_summary(&first).unwrap()).unwrap();
    sender.send(r#"{"startDate": 1700000000.0, "profile": []}"#.to_string()).unwrap();
    sender.send(encode_summary(&second).unwrap()).unwrap();

    let mut viewer = ViewerLog::open(MemoryStore::new(), 50).unwrap();
    assert_eq!(viewer.drain(&inbox), 2);
    assert!(viewer.history().contains(&first.id));
    assert!(viewer.history().contains(&second.id));
    assert!(viewer.status().is_some());

    let newest_first = viewer.dives(SortMode::EndDateDescending);
    assert_eq!(newest_first[0].id, second.id);
}

#[test]
fn test_enrichment_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.json");
    let summary = record_dive(&DiveSession::default(), start_time(0));

    {
        let mut viewer = ViewerLog::open(JsonFileStore::new(&path), 50).unwrap();
        viewer.receive_summary(summary.clone());
        assert!(viewer.apply_weather(&summary.id, "Calm", Some(26.0)));
        assert!(viewer.apply_location(&summary.id, "Dean's Blue Hole"));
    }

    let reopened = ViewerLog::open(JsonFileStore::new(&path), 50).unwrap();
    let stored = reopened.history().get(&summary.id).unwrap();
    assert_eq!(stored.location_label(), "Dean's Blue Hole");
    assert_eq!(stored.weather_summary.as_deref(), Some("Calm"));
    assert_eq!(stored.weather_air_temp_celsius, Some(26.0));
    assert_eq!(stored.profile, summary.profile);
}

#[test]
fn test_bounded_history_keeps_most_recent() {
    let session = DiveSession::default();
    let mut viewer = ViewerLog::open(MemoryStore::new(), 3).unwrap();
    for minutes in [40, 0, 30, 10, 20] {
        viewer.receive_summary(record_dive(&session, start_time(minutes)));
    }

    let history = viewer.store().load().unwrap();
    assert_eq!(history.len(), 3);
    let starts: Vec<DateTime<Utc>> = history.iter().map(|s| s.start_date).collect();
    assert_eq!(starts, vec![start_time(40), start_time(30), start_time(20)]);
}

#[test]
fn test_interpolation_clamps_at_boundaries() {
    let stream = SortedStream::from_samples(&[Sample::new(10.0, 20.0), Sample::new(0.0, 10.0)]);
    assert_eq!(interpolate(&stream, -5.0).unwrap(), 10.0);
    assert_eq!(interpolate(&stream, 15.0).unwrap(), 20.0);
    assert_eq!(interpolate(&stream, 5.0).unwrap(), 15.0);
    assert_eq!(interpolate(&stream, 0.0).unwrap(), 10.0);
    assert_eq!(interpolate(&stream, 10.0).unwrap(), 20.0);
}

#[test]
fn test_densify_extends_to_target_end() {
    let stream = SortedStream::from_samples(&[
        Sample::new(0.0, 0.0),
        Sample::new(100.0, 15.0),
        Sample::new(200.0, 3.0),
    ]);
    let trace = densify(&stream, 5.0, 317.0).unwrap();

    let last = trace.last().unwrap();
    assert_eq!(last.seconds, 317.0);
    assert_eq!(last.value, 3.0);
    assert_eq!(trace[trace.len() - 2].seconds, 315.0);
    assert!(trace.windows(2).all(|w| w[0].seconds < w[1].seconds));
}

#[test]
fn test_recorder_thresholds_through_session() {
    let session = DiveSession::new(RecorderConfig::default());
    let start = start_time(0);
    session.start(start).unwrap();
    for (t, depth) in [(0.0, 0.0), (0.3, 0.1), (1.0, 0.5), (1.6, 0.6), (3.2, 5.0)] {
        session.record_depth(at(start, t), depth);
    }

    let live = session.snapshot().unwrap();
    let kept: Vec<(f64, f64)> = live
        .profile
        .iter()
        .map(|s| (s.seconds, s.value))
        .collect();
    assert_eq!(kept, vec![(0.0, 0.0), (1.0, 0.5), (3.2, 5.0)]);
}

#[test]
fn test_timeline_and_stats_of_received_dive() {
    let summary = record_dive(&DiveSession::default(), start_time(0));
    let timeline = DiveTimeline::from_summary(&summary);

    let bottom = timeline.point_at(20.0);
    assert!((bottom.depth_meters.unwrap() - 20.0).abs() < 0.5);
    assert!(bottom.heart_rate_bpm.is_some());
    assert!(bottom.water_temp_celsius.is_some());

    let stats = DiveStats::compute(&summary);
    assert_eq!(stats.display_max_depth(), summary.max_depth_meters);
    assert!(stats.descent_rate_m_min > 50.0);
    assert!(stats.ascent_rate_m_min > 50.0);
}
