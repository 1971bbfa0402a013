//! Transport-neutral WebSocket frames.
//!
//! The relay never looks inside `Text` or `Binary` payloads: a frame read
//! from one participant is cloned unchanged to every recipient.

use bytes::Bytes;

/// Close status for a normal, intentional closure.
pub const CLOSE_NORMAL: u16 = 1000;
/// Close status sent when the server is going away.
pub const CLOSE_GOING_AWAY: u16 = 1001;

/// Reason sent to every member when a session is closed on request.
pub const GAME_CLOSED_REASON: &str = "Game closed";
/// Reason sent to every member when the server shuts down.
pub const SHUTDOWN_REASON: &str = "Server shutting down";

/// A single WebSocket message as seen by the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// UTF-8 payload.
    Text(String),
    /// Raw byte payload.
    Binary(Bytes),
    /// Keepalive ping.
    Ping(Bytes),
    /// Keepalive answer.
    Pong(Bytes),
    /// Closing handshake, optionally with a status and reason.
    Close(Option<CloseNotice>),
}

impl Frame {
    /// Whether the frame carries application data that should be relayed.
    pub fn is_payload(&self) -> bool {
        matches!(self, Self::Text(_) | Self::Binary(_))
    }

    /// Payload size in bytes (0 for control frames).
    pub fn payload_len(&self) -> usize {
        match self {
            Self::Text(text) => text.len(),
            Self::Binary(data) => data.len(),
            _ => 0,
        }
    }
}

/// Status code and human-readable reason carried by a close frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseNotice {
    /// WebSocket close status code.
    pub code: u16,
    /// Reason text shown to the peer.
    pub reason: String,
}

impl CloseNotice {
    /// Create a close notice.
    pub fn new(code: u16, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    /// Notice sent when a session is closed on request.
    pub fn game_closed() -> Self {
        Self::new(CLOSE_NORMAL, GAME_CLOSED_REASON)
    }

    /// Notice sent when the server shuts down.
    pub fn server_shutdown() -> Self {
        Self::new(CLOSE_GOING_AWAY, SHUTDOWN_REASON)
    }
}
