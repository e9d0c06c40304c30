use log::{info, warn};
use thiserror::Error;

use crate::models::DiveSummary;

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum TransportError {
    #[error("companion device is not reachable")]
    PeerUnreachable,
    #[error("timed out waiting for the companion device")]
    Timeout,
    #[error("transfer cancelled")]
    Cancelled,
    #[error("could not encode summary: {0}")]
    Encoding(String),
    #[error("unknown transport error")]
    Unknown,
}

/// Carries finalized summaries from the recorder to a viewer.
///
/// Delivery is best effort and at-least-once: a summary may arrive more than
/// once and out of order relative to other summaries. Retries and backoff
/// belong to the implementation, not to callers.
pub trait SummaryTransport {
    fn send(&mut self, summary: &DiveSummary) -> Result<(), TransportError>;
}

/// Outcome of handing a summary to the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeliveryStatus {
    Sent,
    Failed(TransportError),
}

impl DeliveryStatus {
    pub fn is_sent(&self) -> bool {
        matches!(self, DeliveryStatus::Sent)
    }

    /// Human-readable status line.
    pub fn message(&self) -> String {
        match self {
            DeliveryStatus::Sent => "Dive sent to companion".to_string(),
            DeliveryStatus::Failed(err) => format!("Dive saved locally; send failed: {err}"),
        }
    }
}

/// Send `summary` and report the outcome. The summary is only borrowed, so a
/// failed send never loses the recorded dive.
pub fn deliver<T>(transport: &mut T, summary: &DiveSummary) -> DeliveryStatus
where
    T: SummaryTransport + ?Sized,
{
    match transport.send(summary) {
        Ok(()) => {
            info!("dive {} sent", summary.id);
            DeliveryStatus::Sent
        }
        Err(err) => {
            warn!("dive {} not sent: {err}", summary.id);
            DeliveryStatus::Failed(err)
        }
    }
}
