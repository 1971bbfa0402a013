//! Per-connection plumbing: the shared handle, the outbound writer, and
//! the heartbeat schedule.

pub mod handle;
pub mod heartbeat;
pub mod writer;

pub use handle::{ConnectionHandle, ConnectionId, SendError};
pub use heartbeat::Heartbeat;
pub use writer::run_writer;
