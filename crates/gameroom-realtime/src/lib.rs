//! # gameroom-realtime
//!
//! Session relay engine for GameRoom. Provides:
//!
//! - A concurrent registry of game sessions and their member connections
//! - Fan-out broadcast of every inbound message to all session members
//! - Per-connection drivers with heartbeat and bounded outbound queues
//! - Session close and shutdown handling with WebSocket close notices
//! - Optional purging of sessions left empty

pub mod connection;
pub mod message;
pub mod metrics;
pub mod server;
pub mod session;

pub use connection::handle::{ConnectionHandle, ConnectionId, SendError};
pub use message::frame::{CloseNotice, Frame};
pub use metrics::{EngineMetrics, MetricsSnapshot};
pub use server::{EngineSnapshot, RelayEngine};
pub use session::driver::{JoinRole, SessionDriver, Termination};
pub use session::registry::{BroadcastOutcome, SessionRegistry};
