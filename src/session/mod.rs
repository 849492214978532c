//! Session-layer contract.
//!
//! The watch subsystem never interprets a client connection beyond two
//! capabilities: a stable session id and a single reply transmission.
//! [`PendingRequest`] is the production shape: the receiver half of its
//! oneshot channel lives in the RPC handler that admitted the watch and
//! is mapped into the outer protocol response there.

#[cfg(test)]
use mockall::automock;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tonic::Status;

use crate::WatchError;
use crate::WatchResponse;

#[cfg(test)]
mod session_test;

/// Reply handed to the session layer: a watch response, or a
/// protocol-level status such as the cancellation sentinel.
pub type WatchReply = std::result::Result<WatchResponse, Status>;

#[cfg_attr(test, automock)]
pub trait RequestContext: Send + Sync + 'static {
    fn session_id(&self) -> u64;

    /// Hands `reply` to the session layer for transmission.
    ///
    /// Consumes the pending slot: a second call fails with
    /// [`WatchError::ReplyAlreadyTransmitted`]. A gone connection fails
    /// with [`WatchError::SessionGone`]; retrying is the session layer's
    /// concern, not the caller's.
    fn transmit(
        &self,
        reply: WatchReply,
    ) -> std::result::Result<(), WatchError>;
}

pub struct PendingRequest {
    session_id: u64,
    reply_tx: Mutex<Option<oneshot::Sender<WatchReply>>>,
}

impl PendingRequest {
    /// Returns the request handle plus the receiver the RPC handler awaits.
    pub fn new(session_id: u64) -> (Self, oneshot::Receiver<WatchReply>) {
        let (reply_tx, reply_rx) = oneshot::channel();
        (
            Self {
                session_id,
                reply_tx: Mutex::new(Some(reply_tx)),
            },
            reply_rx,
        )
    }
}

impl RequestContext for PendingRequest {
    fn session_id(&self) -> u64 {
        self.session_id
    }

    fn transmit(
        &self,
        reply: WatchReply,
    ) -> std::result::Result<(), WatchError> {
        let reply_tx = self.reply_tx.lock().take().ok_or(WatchError::ReplyAlreadyTransmitted)?;
        reply_tx.send(reply).map_err(|_| WatchError::SessionGone {
            session_id: self.session_id,
        })
    }
}
