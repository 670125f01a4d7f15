//! # Cuebox Common Library
//!
//! Shared code for the cuebox playback controller:
//! - Event types (PlaybackEvent enum)
//! - Clock-time parsing utilities

pub mod events;
pub mod time;

pub use events::{EndReason, PlaybackEvent};
