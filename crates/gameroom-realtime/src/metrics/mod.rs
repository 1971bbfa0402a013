//! Relay engine metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::session::registry::BroadcastOutcome;

/// Engine-level metrics counters.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    /// Total connections established
    pub connections_total: AtomicU64,
    /// Connections currently joined to a session
    pub connections_active: AtomicU64,
    /// Data frames received from participants
    pub messages_received: AtomicU64,
    /// Frames queued for recipients by broadcasts
    pub messages_relayed: AtomicU64,
    /// Recipients that could not take a broadcast frame
    pub send_failures: AtomicU64,
    /// Sessions closed on request
    pub sessions_closed: AtomicU64,
    /// Empty sessions removed by the sweeper
    pub sessions_swept: AtomicU64,
}

impl EngineMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new connection
    pub fn connection_opened(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
        self.connections_active.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a disconnection
    pub fn connection_closed(&self) {
        let _ = self
            .connections_active
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    /// Record a data frame received from a participant
    pub fn message_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the result of one broadcast
    pub fn record_broadcast(&self, outcome: &BroadcastOutcome) {
        self.messages_relayed
            .fetch_add(outcome.delivered as u64, Ordering::Relaxed);
        self.send_failures
            .fetch_add(outcome.failed as u64, Ordering::Relaxed);
    }

    /// Record a session closed on request
    pub fn session_closed(&self) {
        self.sessions_closed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record empty sessions removed by a sweep
    pub fn sessions_swept(&self, count: usize) {
        self.sessions_swept.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_total: self.connections_total.load(Ordering::Relaxed),
            connections_active: self.connections_active.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_relayed: self.messages_relayed.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            sessions_closed: self.sessions_closed.load(Ordering::Relaxed),
            sessions_swept: self.sessions_swept.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Total connections ever established
    pub connections_total: u64,
    /// Currently active connections
    pub connections_active: u64,
    /// Data frames received
    pub messages_received: u64,
    /// Frames queued for recipients
    pub messages_relayed: u64,
    /// Failed per-recipient sends
    pub send_failures: u64,
    /// Sessions closed on request
    pub sessions_closed: u64,
    /// Empty sessions swept
    pub sessions_swept: u64,
}
