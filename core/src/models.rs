use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Label used when a dive has neither a place name nor coordinates.
pub const UNKNOWN_LOCATION: &str = "Unknown location";

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SummaryId(pub String);

impl SummaryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SummaryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SummaryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SampleId(pub String);

impl SampleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SampleId {
    fn default() -> Self {
        Self::new()
    }
}

/// One timestamped observation of a sensor stream.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample<V> {
    pub id: SampleId,
    /// Offset from dive start in seconds
    pub seconds: f64,
    pub value: V,
}

impl<V> Sample<V> {
    pub fn new(seconds: f64, value: V) -> Self {
        Self {
            id: SampleId::new(),
            seconds,
            value,
        }
    }
}

/// Depth in meters.
pub type DepthSample = Sample<f64>;
/// Heart rate in beats per minute.
pub type HeartRateSample = Sample<i32>;
/// Water temperature in Celsius.
pub type WaterTempSample = Sample<f64>;

/// Everything known about a dive at the moment recording stops.
#[derive(Clone, Debug, PartialEq)]
pub struct DiveRecording {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub max_depth_meters: f64,
    pub duration_seconds: f64,
    pub ending_heart_rate: Option<i32>,
    pub water_temperature_celsius: Option<f64>,
    pub profile: Vec<DepthSample>,
    pub heart_rate_samples: Vec<HeartRateSample>,
    pub water_temp_samples: Vec<WaterTempSample>,
}

/// Finalized record of one dive; the unit of transmission and storage.
///
/// Enrichment (place name, coordinates, weather) arrives after creation and is
/// applied through the `with_*` constructors, which keep `id` unchanged.
#[derive(Clone, Debug, PartialEq)]
pub struct DiveSummary {
    pub id: SummaryId,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Running maximum observed live; authoritative over the profile's own max
    pub max_depth_meters: f64,
    pub duration_seconds: f64,
    /// Last known heart rate, used when no heart-rate stream is present
    pub ending_heart_rate: Option<i32>,
    /// Snapshot temperature, used when no temperature stream is present
    pub water_temperature_celsius: Option<f64>,
    pub location_description: Option<String>,
    pub weather_summary: Option<String>,
    pub weather_air_temp_celsius: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub profile: Vec<DepthSample>,
    pub heart_rate_samples: Vec<HeartRateSample>,
    pub water_temp_samples: Vec<WaterTempSample>,
}

impl DiveSummary {
    /// Build a summary with a fresh id; inputs are copied verbatim.
    pub fn finalize(recording: DiveRecording) -> Self {
        Self {
            id: SummaryId::new(),
            start_date: recording.start_date,
            end_date: recording.end_date,
            max_depth_meters: recording.max_depth_meters,
            duration_seconds: recording.duration_seconds,
            ending_heart_rate: recording.ending_heart_rate,
            water_temperature_celsius: recording.water_temperature_celsius,
            location_description: None,
            weather_summary: None,
            weather_air_temp_celsius: None,
            latitude: None,
            longitude: None,
            profile: recording.profile,
            heart_rate_samples: recording.heart_rate_samples,
            water_temp_samples: recording.water_temp_samples,
        }
    }

    pub fn with_location_description(self, description: impl Into<String>) -> Self {
        Self {
            location_description: Some(description.into()),
            ..self
        }
    }

    pub fn with_weather(self, summary: impl Into<String>, air_temp_celsius: Option<f64>) -> Self {
        Self {
            weather_summary: Some(summary.into()),
            weather_air_temp_celsius: air_temp_celsius,
            ..self
        }
    }

    pub fn with_coordinates(self, latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
            ..self
        }
    }

    /// Name used for display and for sorting by location.
    pub fn location_label(&self) -> String {
        let description = self
            .location_description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty());
        if let Some(description) = description {
            return description.to_string();
        }
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => format!("{lat:.4}, {lon:.4}"),
            _ => UNKNOWN_LOCATION.to_string(),
        }
    }
}
