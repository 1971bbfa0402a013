//! Individual participant connection handle.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use uuid::Uuid;

use crate::message::frame::{CloseNotice, Frame};

/// Unique connection identifier
pub type ConnectionId = Uuid;

/// Why a frame could not be handed to a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendError {
    /// The connection has been closed or its writer is gone.
    #[error("connection closed")]
    Closed,
    /// The outbound queue is full; the peer is not keeping up.
    #[error("outbound queue full")]
    QueueFull,
}

/// A handle to a single participant connection.
///
/// Holds the sender side of the connection's outbound queue plus a
/// cancellation token that tears down both the receive loop and the
/// writer. The close frame lives in its own slot outside the queue, so a
/// full queue cannot crowd it out. Handles are compared by identity
/// (`Arc::ptr_eq`), never by value.
pub struct ConnectionHandle {
    /// Unique connection ID
    pub id: ConnectionId,
    /// When the connection was established
    pub connected_at: DateTime<Utc>,
    sender: mpsc::Sender<Frame>,
    cancel: CancellationToken,
    alive: AtomicBool,
    closing: Mutex<Option<Frame>>,
}

impl ConnectionHandle {
    /// Create a handle around an outbound queue sender.
    pub fn new(sender: mpsc::Sender<Frame>) -> Self {
        Self {
            id: Uuid::new_v4(),
            connected_at: Utc::now(),
            sender,
            cancel: CancellationToken::new(),
            alive: AtomicBool::new(true),
            closing: Mutex::new(None),
        }
    }

    /// Create a handle with a fresh bounded outbound queue.
    ///
    /// Returns the handle and the receiver the writer task drains.
    pub fn with_capacity(capacity: usize) -> (Self, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }

    /// Queue a frame for delivery without waiting.
    pub fn send(&self, frame: Frame) -> Result<(), SendError> {
        if !self.is_alive() {
            return Err(SendError::Closed);
        }
        match self.sender.try_send(frame) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => Err(SendError::QueueFull),
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.abort();
                Err(SendError::Closed)
            }
        }
    }

    /// Close the connection, leaving a close frame for the writer.
    ///
    /// Idempotent: only the first call sets the close frame. Frames already
    /// queued are still flushed ahead of it.
    pub fn close(&self, notice: Option<CloseNotice>) {
        if self.alive.swap(false, Ordering::SeqCst) {
            *self.close_slot() = Some(Frame::Close(notice));
            self.cancel.cancel();
        }
    }

    /// Take the pending close frame, if `close` set one.
    pub fn take_close_frame(&self) -> Option<Frame> {
        self.close_slot().take()
    }

    fn close_slot(&self) -> MutexGuard<'_, Option<Frame>> {
        self.closing.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Tear the connection down without a closing handshake.
    pub fn abort(&self) {
        self.alive.store(false, Ordering::SeqCst);
        self.cancel.cancel();
    }

    /// Check if connection is alive
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Resolves once the connection has been closed or aborted.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }

    /// Whether teardown has started.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.id)
            .field("connected_at", &self.connected_at)
            .field("alive", &self.is_alive())
            .finish()
    }
}
