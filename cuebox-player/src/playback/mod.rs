//! Playback orchestration
//!
//! The manager owns the group hierarchy and at most one playback session;
//! the session task runs the track-sequencing state machine against one
//! (group, track list) pair.

pub mod checker;
pub mod manager;
pub mod session;
pub mod shuffle;
pub mod volume;

pub use manager::{Manager, SessionInfo, SetVolumeOptions};
