//! JSON transport and storage encoding of [`DiveSummary`].
//!
//! The schema is strict at the top level: a record missing `startDate`,
//! `endDate`, `maxDepthMeters` or `durationSeconds` is rejected as a whole.
//! Sample arrays are tolerant: an entry missing its time or value is dropped
//! and the rest of the record still decodes, and an optional field of the
//! wrong type decodes as absent. Absent optional fields and empty
//! sample arrays are omitted on encode, never written as `null`.

use chrono::{DateTime, SubsecRound, Utc};
use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::DiveError;
use crate::models::{DiveSummary, Sample, SampleId, SummaryId};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSummary {
    #[serde(
        default,
        deserialize_with = "lenient_optional",
        skip_serializing_if = "Option::is_none"
    )]
    id: Option<String>,
    start_date: f64,
    end_date: f64,
    max_depth_meters: f64,
    duration_seconds: f64,
    #[serde(
        default,
        deserialize_with = "lenient_optional",
        skip_serializing_if = "Option::is_none"
    )]
    ending_heart_rate: Option<i32>,
    #[serde(
        default,
        deserialize_with = "lenient_optional",
        skip_serializing_if = "Option::is_none"
    )]
    water_temperature_celsius: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_optional",
        skip_serializing_if = "Option::is_none"
    )]
    location_description: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_optional",
        skip_serializing_if = "Option::is_none"
    )]
    weather_summary: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_optional",
        skip_serializing_if = "Option::is_none"
    )]
    weather_air_temp_celsius: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_optional",
        skip_serializing_if = "Option::is_none"
    )]
    location_latitude: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_optional",
        skip_serializing_if = "Option::is_none"
    )]
    location_longitude: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_entries",
        skip_serializing_if = "Vec::is_empty"
    )]
    profile: Vec<WireDepthSample>,
    #[serde(
        default,
        deserialize_with = "lenient_entries",
        skip_serializing_if = "Vec::is_empty"
    )]
    heart_rate_samples: Vec<WireHeartRateSample>,
    #[serde(
        default,
        deserialize_with = "lenient_entries",
        skip_serializing_if = "Vec::is_empty"
    )]
    water_temp_samples: Vec<WireWaterTempSample>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireDepthSample {
    #[serde(
        default,
        deserialize_with = "lenient_optional",
        skip_serializing_if = "Option::is_none"
    )]
    id: Option<String>,
    seconds: f64,
    depth_meters: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireHeartRateSample {
    #[serde(
        default,
        deserialize_with = "lenient_optional",
        skip_serializing_if = "Option::is_none"
    )]
    id: Option<String>,
    seconds: f64,
    bpm: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireWaterTempSample {
    #[serde(
        default,
        deserialize_with = "lenient_optional",
        skip_serializing_if = "Option::is_none"
    )]
    id: Option<String>,
    seconds: f64,
    celsius: f64,
}

/// Decode an optional array entry by entry, dropping entries that do not fit
/// the sample schema. A value that is not an array at all yields no samples.
fn lenient_entries<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    let entries = match raw {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            warn!("expected a sample array, found {other}; ignoring");
            return Ok(Vec::new());
        }
    };

    let total = entries.len();
    let decoded: Vec<T> = entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect();
    if decoded.len() < total {
        warn!("dropped {} malformed sample entries", total - decoded.len());
    }
    Ok(decoded)
}

/// Decode an optional field, treating a value of the wrong type as absent.
fn lenient_optional<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => match serde_json::from_value(value) {
            Ok(decoded) => Ok(Some(decoded)),
            Err(err) => {
                warn!("ignoring mistyped optional field: {err}");
                Ok(None)
            }
        },
    }
}

fn sample_id(id: Option<String>) -> SampleId {
    id.map(SampleId).unwrap_or_default()
}

/// Unix epoch seconds to a UTC timestamp, rounded to whole microseconds.
///
/// Epoch seconds in an `f64` carry well under a microsecond of precision for
/// current dates, so microsecond timestamps survive encode then decode.
pub fn timestamp_from_secs(secs: f64) -> Result<DateTime<Utc>, DiveError> {
    if !secs.is_finite() || secs.abs() > i64::MAX as f64 / 2.0 {
        return Err(DiveError::InvalidTimestamp(secs));
    }
    let mut whole = secs.floor();
    let mut micros = ((secs - whole) * 1e6).round();
    if micros >= 1e6 {
        whole += 1.0;
        micros = 0.0;
    }
    DateTime::from_timestamp(whole as i64, micros as u32 * 1_000)
        .ok_or(DiveError::InvalidTimestamp(secs))
}

/// Round a clock reading to the precision the wire encoding keeps.
pub fn wire_precision(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    timestamp.round_subsecs(6)
}

pub fn timestamp_to_secs(timestamp: &DateTime<Utc>) -> f64 {
    timestamp.timestamp() as f64 + f64::from(timestamp.timestamp_subsec_nanos()) / 1e9
}

impl From<&DiveSummary> for WireSummary {
    fn from(summary: &DiveSummary) -> Self {
        Self {
            id: Some(summary.id.0.clone()),
            start_date: timestamp_to_secs(&summary.start_date),
            end_date: timestamp_to_secs(&summary.end_date),
            max_depth_meters: summary.max_depth_meters,
            duration_seconds: summary.duration_seconds,
            ending_heart_rate: summary.ending_heart_rate,
            water_temperature_celsius: summary.water_temperature_celsius,
            location_description: summary.location_description.clone(),
            weather_summary: summary.weather_summary.clone(),
            weather_air_temp_celsius: summary.weather_air_temp_celsius,
            location_latitude: summary.latitude,
            location_longitude: summary.longitude,
            profile: summary
                .profile
                .iter()
                .map(|s| WireDepthSample {
                    id: Some(s.id.0.clone()),
                    seconds: s.seconds,
                    depth_meters: s.value,
                })
                .collect(),
            heart_rate_samples: summary
                .heart_rate_samples
                .iter()
                .map(|s| WireHeartRateSample {
                    id: Some(s.id.0.clone()),
                    seconds: s.seconds,
                    bpm: s.value,
                })
                .collect(),
            water_temp_samples: summary
                .water_temp_samples
                .iter()
                .map(|s| WireWaterTempSample {
                    id: Some(s.id.0.clone()),
                    seconds: s.seconds,
                    celsius: s.value,
                })
                .collect(),
        }
    }
}

impl TryFrom<WireSummary> for DiveSummary {
    type Error = DiveError;

    fn try_from(wire: WireSummary) -> Result<Self, Self::Error> {
        Ok(Self {
            id: wire.id.map(SummaryId).unwrap_or_default(),
            start_date: timestamp_from_secs(wire.start_date)?,
            end_date: timestamp_from_secs(wire.end_date)?,
            max_depth_meters: wire.max_depth_meters,
            duration_seconds: wire.duration_seconds,
            ending_heart_rate: wire.ending_heart_rate,
            water_temperature_celsius: wire.water_temperature_celsius,
            location_description: wire.location_description,
            weather_summary: wire.weather_summary,
            weather_air_temp_celsius: wire.weather_air_temp_celsius,
            latitude: wire.location_latitude,
            longitude: wire.location_longitude,
            profile: wire
                .profile
                .into_iter()
                .map(|s| Sample {
                    id: sample_id(s.id),
                    seconds: s.seconds,
                    value: s.depth_meters,
                })
                .collect(),
            heart_rate_samples: wire
                .heart_rate_samples
                .into_iter()
                .map(|s| Sample {
                    id: sample_id(s.id),
                    seconds: s.seconds,
                    value: s.bpm,
                })
                .collect(),
            water_temp_samples: wire
                .water_temp_samples
                .into_iter()
                .map(|s| Sample {
                    id: sample_id(s.id),
                    seconds: s.seconds,
                    value: s.celsius,
                })
                .collect(),
        })
    }
}

pub fn summary_to_value(summary: &DiveSummary) -> Result<Value, DiveError> {
    serde_json::to_value(WireSummary::from(summary)).map_err(|e| DiveError::Encode(e.to_string()))
}

pub fn summary_from_value(value: Value) -> Result<DiveSummary, DiveError> {
    let wire: WireSummary =
        serde_json::from_value(value).map_err(|e| DiveError::Decode(e.to_string()))?;
    DiveSummary::try_from(wire)
}

/// Encode one summary as a JSON object.
pub fn encode_summary(summary: &DiveSummary) -> Result<String, DiveError> {
    serde_json::to_string(&WireSummary::from(summary)).map_err(|e| DiveError::Encode(e.to_string()))
}

/// Decode one summary. Fails only when a required field is missing or
/// unusable; malformed samples are dropped.
pub fn decode_summary(payload: &str) -> Result<DiveSummary, DiveError> {
    let wire: WireSummary =
        serde_json::from_str(payload).map_err(|e| DiveError::Decode(e.to_string()))?;
    DiveSummary::try_from(wire)
}

/// Encode a history as a pretty-printed JSON array.
pub fn encode_history(history: &[DiveSummary]) -> Result<String, DiveError> {
    let records: Vec<WireSummary> = history.iter().map(WireSummary::from).collect();
    serde_json::to_string_pretty(&records).map_err(|e| DiveError::Encode(e.to_string()))
}

/// Decode a history blob. Records that fail to decode are skipped so one bad
/// entry never hides the rest.
pub fn decode_history(payload: &str) -> Result<Vec<DiveSummary>, DiveError> {
    let records: Vec<Value> =
        serde_json::from_str(payload).map_err(|e| DiveError::Decode(e.to_string()))?;
    let mut history = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        match summary_from_value(record) {
            Ok(summary) => history.push(summary),
            Err(err) => warn!("skipping history record {index}: {err}"),
        }
    }
    Ok(history)
}
