//! Session registry, per-connection lifecycle driver, and the empty-session sweeper.

pub mod driver;
pub mod registry;
pub mod sweeper;

pub use driver::{JoinRole, SessionDriver, Termination};
pub use registry::{BroadcastOutcome, SessionRegistry};
pub use sweeper::EmptySessionSweeper;
