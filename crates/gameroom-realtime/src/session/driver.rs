//! Per-connection session lifecycle: join, relay, leave.

use std::fmt::{self, Display};
use std::sync::Arc;

use futures::{Stream, StreamExt};
use tracing::{debug, info, warn};

use gameroom_core::types::SessionId;

use crate::connection::handle::ConnectionHandle;
use crate::connection::heartbeat::{Beat, Heartbeat};
use crate::message::frame::Frame;
use crate::metrics::EngineMetrics;

use super::registry::SessionRegistry;

/// How a participant entered the session. Only used for logging; hosts and
/// players are relayed identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinRole {
    /// Participant that opened the session.
    Host,
    /// Participant that joined an existing session.
    Player,
}

impl fmt::Display for JoinRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host => write!(f, "host"),
            Self::Player => write!(f, "player"),
        }
    }
}

/// Why a driver stopped relaying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// The peer sent a close frame or ended the stream.
    RemoteClosed,
    /// Reading from the transport failed.
    ReceiveError(String),
    /// The connection was closed from the server side (session close,
    /// shutdown, or a failed write).
    Closed,
    /// The peer stopped answering pings.
    HeartbeatTimeout,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RemoteClosed => write!(f, "remote closed"),
            Self::ReceiveError(e) => write!(f, "receive error: {e}"),
            Self::Closed => write!(f, "closed by server"),
            Self::HeartbeatTimeout => write!(f, "heartbeat timeout"),
        }
    }
}

/// Drives one connection through its session membership.
///
/// Constructing the driver joins the connection to the session; [`run`]
/// relays every inbound data frame to the whole session until receiving
/// fails, then closes the connection and leaves the session.
///
/// [`run`]: SessionDriver::run
#[derive(Debug)]
pub struct SessionDriver {
    registry: Arc<SessionRegistry>,
    metrics: Arc<EngineMetrics>,
    session_id: SessionId,
    role: JoinRole,
    handle: Arc<ConnectionHandle>,
    heartbeat: Heartbeat,
}

impl SessionDriver {
    /// Joins `handle` to `session_id` and returns the driver owning it.
    pub fn join(
        registry: Arc<SessionRegistry>,
        metrics: Arc<EngineMetrics>,
        session_id: SessionId,
        role: JoinRole,
        handle: Arc<ConnectionHandle>,
        heartbeat: Heartbeat,
    ) -> Self {
        registry.join(&session_id, handle.clone());
        metrics.connection_opened();

        match role {
            JoinRole::Host => info!(
                session_id = %session_id,
                conn_id = %handle.id,
                "Host connected to session"
            ),
            JoinRole::Player => info!(
                session_id = %session_id,
                conn_id = %handle.id,
                "Player joined session"
            ),
        }

        Self {
            registry,
            metrics,
            session_id,
            role,
            handle,
            heartbeat,
        }
    }

    /// Session this driver relays for.
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Connection owned by this driver.
    pub fn handle(&self) -> &Arc<ConnectionHandle> {
        &self.handle
    }

    /// Relay inbound frames until the connection ends.
    pub async fn run<S, E>(mut self, mut inbound: S) -> Termination
    where
        S: Stream<Item = Result<Frame, E>> + Unpin,
        E: Display,
    {
        let termination = loop {
            tokio::select! {
                _ = self.handle.cancelled() => break Termination::Closed,
                beat = self.heartbeat.tick() => match beat {
                    Beat::Ping => {
                        let _ = self.handle.send(Frame::Ping(bytes::Bytes::new()));
                    }
                    Beat::Expired => break Termination::HeartbeatTimeout,
                },
                next = inbound.next() => match next {
                    Some(Ok(frame)) => {
                        self.heartbeat.record_activity();
                        match frame {
                            Frame::Close(_) => break Termination::RemoteClosed,
                            frame if frame.is_payload() => self.relay(frame),
                            _ => {}
                        }
                    }
                    Some(Err(e)) => break Termination::ReceiveError(e.to_string()),
                    None => break Termination::RemoteClosed,
                },
            }
        };

        self.terminate(&termination);
        termination
    }

    fn relay(&self, frame: Frame) {
        self.metrics.message_received();
        let outcome = self.registry.broadcast(&self.session_id, &frame);
        self.metrics.record_broadcast(&outcome);

        debug!(
            session_id = %self.session_id,
            conn_id = %self.handle.id,
            bytes = frame.payload_len(),
            delivered = outcome.delivered,
            failed = outcome.failed,
            "Relayed message"
        );
    }

    fn terminate(&self, termination: &Termination) {
        self.handle.close(None);
        self.registry.leave(&self.session_id, &self.handle);
        self.metrics.connection_closed();

        let connected_secs = (chrono::Utc::now() - self.handle.connected_at).num_seconds();

        match termination {
            Termination::ReceiveError(_) | Termination::HeartbeatTimeout => warn!(
                session_id = %self.session_id,
                conn_id = %self.handle.id,
                role = %self.role,
                reason = %termination,
                connected_secs,
                "Connection dropped"
            ),
            _ => info!(
                session_id = %self.session_id,
                conn_id = %self.handle.id,
                role = %self.role,
                reason = %termination,
                connected_secs,
                "Connection left session"
            ),
        }
    }
}
