//! Ping schedule and liveness tracking for one connection.

use std::time::Duration;

use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use gameroom_core::config::RealtimeConfig;

/// What the heartbeat decided on a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Beat {
    /// Peer is within its allowance; send a ping.
    Ping,
    /// Nothing heard from the peer for longer than the idle limit.
    Expired,
}

/// Heartbeat state owned by a connection's receive loop.
///
/// Any inbound frame counts as activity. When the heartbeat is disabled
/// [`Heartbeat::tick`] never resolves.
#[derive(Debug)]
pub struct Heartbeat {
    interval: Option<Interval>,
    idle_limit: Duration,
    last_seen: Instant,
}

impl Heartbeat {
    /// Build a heartbeat from the relay configuration.
    pub fn from_config(config: &RealtimeConfig) -> Self {
        match (config.ping_interval(), config.idle_limit()) {
            (Some(period), Some(idle_limit)) => Self::new(period, idle_limit),
            _ => Self::disabled(),
        }
    }

    /// Heartbeat that pings every `period` and expires after `idle_limit` of silence.
    pub fn new(period: Duration, idle_limit: Duration) -> Self {
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            interval: Some(interval),
            idle_limit,
            last_seen: Instant::now(),
        }
    }

    /// Heartbeat that never fires.
    pub fn disabled() -> Self {
        Self {
            interval: None,
            idle_limit: Duration::MAX,
            last_seen: Instant::now(),
        }
    }

    /// Record that something arrived from the peer.
    pub fn record_activity(&mut self) {
        self.last_seen = Instant::now();
    }

    /// Wait for the next beat.
    pub async fn tick(&mut self) -> Beat {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
                if self.last_seen.elapsed() > self.idle_limit {
                    Beat::Expired
                } else {
                    Beat::Ping
                }
            }
            None => std::future::pending().await,
        }
    }
}
