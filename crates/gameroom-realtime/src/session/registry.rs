//! Session registry: maps session IDs to the connections joined to them.

use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, info, warn};

use gameroom_core::types::SessionId;

use crate::connection::handle::{ConnectionHandle, SendError};
use crate::message::frame::{CloseNotice, Frame};

/// Result of one broadcast call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BroadcastOutcome {
    /// Recipients whose queue accepted the frame.
    pub delivered: usize,
    /// Recipients whose queue rejected the frame.
    pub failed: usize,
}

/// Thread-safe registry of live game sessions.
///
/// Each session is an insertion-ordered list of connection handles. Every
/// operation runs under the map's per-session lock, so a concurrent
/// broadcast sees a join or leave either completely or not at all. None of
/// the operations await while holding that lock.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    /// Session ID → members in join order.
    sessions: DashMap<SessionId, Vec<Arc<ConnectionHandle>>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a connection to a session, creating the session if needed.
    pub fn join(&self, session_id: &SessionId, conn: Arc<ConnectionHandle>) {
        let mut members = self.sessions.entry(session_id.clone()).or_default();
        members.push(conn);
        debug!(session_id = %session_id, members = members.len(), "Connection joined session");
    }

    /// Removes the first occurrence of `conn` from a session.
    ///
    /// Unknown sessions and absent connections are ignored. The session
    /// entry stays in place even when it becomes empty. Returns whether
    /// something was removed.
    pub fn leave(&self, session_id: &SessionId, conn: &Arc<ConnectionHandle>) -> bool {
        let Some(mut members) = self.sessions.get_mut(session_id) else {
            return false;
        };
        match members.iter().position(|c| Arc::ptr_eq(c, conn)) {
            Some(index) => {
                members.remove(index);
                debug!(
                    session_id = %session_id,
                    conn_id = %conn.id,
                    remaining = members.len(),
                    "Connection left session"
                );
                true
            }
            None => false,
        }
    }

    /// Queues `frame` for every member of a session, the sender included.
    ///
    /// A failing recipient is logged and skipped; it stays in the session
    /// until its own receive loop ends. Broadcasting to an unknown session
    /// does nothing.
    pub fn broadcast(&self, session_id: &SessionId, frame: &Frame) -> BroadcastOutcome {
        let mut outcome = BroadcastOutcome::default();
        let Some(members) = self.sessions.get(session_id) else {
            return outcome;
        };

        for conn in members.iter() {
            match conn.send(frame.clone()) {
                Ok(()) => outcome.delivered += 1,
                Err(e) => {
                    outcome.failed += 1;
                    match e {
                        SendError::QueueFull => warn!(
                            session_id = %session_id,
                            conn_id = %conn.id,
                            error = %e,
                            "Dropping message for slow connection"
                        ),
                        SendError::Closed => debug!(
                            session_id = %session_id,
                            conn_id = %conn.id,
                            error = %e,
                            "Skipping closed connection"
                        ),
                    }
                }
            }
        }

        outcome
    }

    /// Closes a session: notifies and closes every member, then forgets it.
    ///
    /// Returns `false` when the session does not exist.
    pub fn close_session(&self, session_id: &SessionId, notice: &CloseNotice) -> bool {
        let Some((_, members)) = self.sessions.remove(session_id) else {
            return false;
        };

        for conn in &members {
            conn.close(Some(notice.clone()));
        }

        info!(
            session_id = %session_id,
            members = members.len(),
            reason = %notice.reason,
            "Game session closed"
        );
        true
    }

    /// Closes every session. Returns how many were closed.
    pub fn close_all(&self, notice: &CloseNotice) -> usize {
        let ids: Vec<SessionId> = self.sessions.iter().map(|e| e.key().clone()).collect();
        ids.iter()
            .filter(|id| self.close_session(id, notice))
            .count()
    }

    /// Drops session entries that currently have no members.
    ///
    /// The emptiness check and the removal are atomic per session, so a
    /// session that gains a member concurrently is kept.
    pub fn purge_empty_sessions(&self) -> usize {
        let empty: Vec<SessionId> = self
            .sessions
            .iter()
            .filter(|e| e.value().is_empty())
            .map(|e| e.key().clone())
            .collect();

        empty
            .iter()
            .filter(|id| {
                self.sessions
                    .remove_if(*id, |_, members| members.is_empty())
                    .is_some()
            })
            .count()
    }

    /// Snapshot of a session's members in join order.
    pub fn members(&self, session_id: &SessionId) -> Vec<Arc<ConnectionHandle>> {
        self.sessions
            .get(session_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Number of members in a session (0 if unknown).
    pub fn member_count(&self, session_id: &SessionId) -> usize {
        self.sessions
            .get(session_id)
            .map(|entry| entry.len())
            .unwrap_or(0)
    }

    /// Whether a session entry exists, empty or not.
    pub fn contains_session(&self, session_id: &SessionId) -> bool {
        self.sessions.contains_key(session_id)
    }

    /// Number of session entries, including empty ones.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Total number of joined connections across all sessions.
    pub fn connection_count(&self) -> usize {
        self.sessions.iter().map(|entry| entry.len()).sum()
    }
}
