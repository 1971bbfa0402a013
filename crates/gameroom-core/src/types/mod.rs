//! Core type definitions used across the GameRoom workspace.

pub mod id;

pub use id::SessionId;
