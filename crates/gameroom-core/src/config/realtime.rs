//! Session relay configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Relay (WebSocket) engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Capacity of each connection's outbound queue. A full queue counts as
    /// a failed send for that recipient.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer_size: usize,
    /// Deadline for a single socket write, in milliseconds.
    #[serde(default = "default_send_timeout")]
    pub send_timeout_ms: u64,
    /// WebSocket ping interval in seconds (0 disables the heartbeat).
    #[serde(default = "default_ping_interval")]
    pub ping_interval_seconds: u64,
    /// Extra grace after a missed ping before the peer is considered gone.
    #[serde(default = "default_ping_timeout")]
    pub ping_timeout_seconds: u64,
    /// Largest accepted inbound message, in bytes.
    #[serde(default = "default_max_message_size")]
    pub max_message_size_bytes: usize,
    /// Interval of the empty-session sweeper in seconds (0 keeps empty
    /// sessions forever).
    #[serde(default)]
    pub empty_session_sweep_seconds: u64,
}

impl RealtimeConfig {
    /// Socket write deadline.
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    /// Heartbeat interval, or `None` when disabled.
    pub fn ping_interval(&self) -> Option<Duration> {
        (self.ping_interval_seconds > 0).then(|| Duration::from_secs(self.ping_interval_seconds))
    }

    /// Silence allowed before a connection is treated as dead.
    pub fn idle_limit(&self) -> Option<Duration> {
        self.ping_interval()
            .map(|interval| interval + Duration::from_secs(self.ping_timeout_seconds))
    }

    /// Sweeper interval, or `None` when disabled.
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.empty_session_sweep_seconds > 0)
            .then(|| Duration::from_secs(self.empty_session_sweep_seconds))
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            outbound_buffer_size: default_outbound_buffer(),
            send_timeout_ms: default_send_timeout(),
            ping_interval_seconds: default_ping_interval(),
            ping_timeout_seconds: default_ping_timeout(),
            max_message_size_bytes: default_max_message_size(),
            empty_session_sweep_seconds: 0,
        }
    }
}

fn default_outbound_buffer() -> usize {
    256
}

fn default_send_timeout() -> u64 {
    5000
}

fn default_ping_interval() -> u64 {
    30
}

fn default_ping_timeout() -> u64 {
    10
}

fn default_max_message_size() -> usize {
    1024 * 1024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_disables_heartbeat_and_sweeper() {
        let config = RealtimeConfig {
            ping_interval_seconds: 0,
            ..RealtimeConfig::default()
        };
        assert!(config.ping_interval().is_none());
        assert!(config.idle_limit().is_none());
        assert!(config.sweep_interval().is_none());
    }

    #[test]
    fn test_idle_limit_adds_timeout() {
        let config = RealtimeConfig::default();
        assert_eq!(config.idle_limit(), Some(Duration::from_secs(40)));
        assert_eq!(config.send_timeout(), Duration::from_secs(5));
    }
}
