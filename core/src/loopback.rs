use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::models::DiveSummary;
use crate::transport::{SummaryTransport, TransportError};
use crate::wire::encode_summary;

/// In-process transport that delivers encoded payloads into a channel.
///
/// Each send can be delivered several times to reproduce at-least-once
/// behaviour, and the peer can be marked unreachable.
#[derive(Clone, Debug)]
pub struct LoopbackTransport {
    sender: Sender<String>,
    copies_per_send: usize,
    reachable: bool,
    delivered: usize,
}

impl LoopbackTransport {
    /// A transport and the receiving end of its queue.
    pub fn channel() -> (Self, Receiver<String>) {
        let (sender, receiver) = unbounded();
        let transport = Self {
            sender,
            copies_per_send: 1,
            reachable: true,
            delivered: 0,
        };
        (transport, receiver)
    }

    /// Deliver every send `copies` times.
    pub fn with_duplicates(mut self, copies: usize) -> Self {
        self.copies_per_send = copies.max(1);
        self
    }

    pub fn set_reachable(&mut self, reachable: bool) {
        self.reachable = reachable;
    }

    /// Payloads pushed into the queue so far.
    pub fn delivered(&self) -> usize {
        self.delivered
    }
}

impl SummaryTransport for LoopbackTransport {
    fn send(&mut self, summary: &DiveSummary) -> Result<(), TransportError> {
        if !self.reachable {
            return Err(TransportError::PeerUnreachable);
        }
        let payload = encode_summary(summary).map_err(|e| TransportError::Encoding(e.to_string()))?;
        for _ in 0..self.copies_per_send {
            self.sender
                .send(payload.clone())
                .map_err(|_| TransportError::PeerUnreachable)?;
            self.delivered += 1;
        }
        Ok(())
    }
}
