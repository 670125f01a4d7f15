//! # Cuebox Player Library (cuebox-player)
//!
//! Configuration-driven playback controller.
//!
//! **Purpose:** Load a TOML description of groups and track lists, run at
//! most one playback session at a time, and control volume with smooth
//! fades.
//!
//! **Architecture:** Tokio task per session with cooperative cancellation;
//! audio output through a pluggable engine (rodio by default).

pub mod config;
pub mod engine;
pub mod error;
pub mod library;
pub mod playback;

pub use error::{Error, Result};
pub use playback::{Manager, SessionInfo, SetVolumeOptions};
