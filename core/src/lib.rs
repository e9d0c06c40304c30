pub mod config;
pub mod densify;
pub mod error;
pub mod ffi;
pub mod history;
pub mod interpolation;
pub mod loopback;
pub mod models;
pub mod recorder;
pub mod session;
pub mod stats;
pub mod storage;
pub mod stream;
pub mod timeline;
pub mod transport;
pub mod viewer;
pub mod wire;

uniffi::setup_scaffolding!();

pub use config::CoreConfig;
pub use densify::{densify, densify_depth, time_grid, TracePoint};
pub use error::DiveError;
pub use history::{deduped_sorted, HistoryReconciler, InsertOutcome, SortMode};
pub use interpolation::interpolate;
pub use loopback::LoopbackTransport;
pub use models::{
    DepthSample, DiveRecording, DiveSummary, HeartRateSample, Sample, SampleId, SummaryId,
    WaterTempSample,
};
pub use recorder::{AdaptiveSampler, RecorderConfig};
pub use session::{DiveSession, LiveSnapshot, SessionStatus};
pub use stats::DiveStats;
pub use storage::{HistoryStore, JsonFileStore, MemoryStore};
pub use stream::{SampleValue, SortedStream};
pub use timeline::{DiveTimeline, TimelinePoint};
pub use transport::{deliver, DeliveryStatus, SummaryTransport, TransportError};
pub use viewer::ViewerLog;
pub use wire::{decode_history, decode_summary, encode_history, encode_summary};
