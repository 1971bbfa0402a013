//! Frames exchanged between participants and the relay.

pub mod frame;

pub use frame::{CloseNotice, Frame};
