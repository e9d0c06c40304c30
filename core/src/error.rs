use thiserror::Error;

/// Error type for stream queries, the wire codec, storage and live sessions.
#[derive(Error, Debug, Clone, PartialEq, uniffi::Error)]
#[uniffi(flat_error)]
pub enum DiveError {
    #[error("stream has no samples")]
    EmptyStream,

    #[error("invalid query time: {0}")]
    InvalidQueryTime(f64),

    #[error("invalid step: {0} seconds")]
    InvalidStep(f64),

    #[error("invalid target end: {0} seconds")]
    InvalidTargetEnd(f64),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(f64),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("no dive is being recorded")]
    NotRecording,

    #[error("a dive is already being recorded")]
    AlreadyRecording,
}
