//! Shared test support: a scripted in-memory media engine and event
//! collection helpers.

use cuebox_common::events::PlaybackEvent;
use cuebox_player::config::Config;
use cuebox_player::engine::{MediaEngine, PlayerHandle};
use cuebox_player::{Error, Result};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

/// Engine interaction log entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Created(String),
    Played(String),
    Stopped(String),
    Seeked(String, u64),
    SetVolume(String, u8),
}

/// Shared observation state for one mock engine
#[derive(Default)]
pub struct EngineState {
    pub calls: Mutex<Vec<EngineCall>>,
    /// Handles currently alive (created, not yet dropped)
    alive: AtomicUsize,
    /// High-water mark of simultaneously alive handles
    pub max_alive: AtomicUsize,
}

impl EngineState {
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Volume values written to the given file, in order
    pub fn volume_writes(&self, file: &str) -> Vec<u8> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                EngineCall::SetVolume(f, v) if f == file => Some(v),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().unwrap().push(call);
    }
}

/// Scripted media engine: every handle plays for a fixed number of
/// `is_playing` polls, advancing its reported position each poll.
pub struct MockEngine {
    pub state: Arc<EngineState>,
    /// How many `is_playing` polls a track lasts before finishing
    pub polls_per_track: i64,
    /// Reported position advance per poll, in milliseconds
    pub ms_per_poll: u64,
    /// Files whose `create_player` fails
    pub fail_files: Vec<String>,
}

impl MockEngine {
    pub fn new(polls_per_track: i64) -> Self {
        Self {
            state: Arc::new(EngineState::default()),
            polls_per_track,
            ms_per_poll: 1000,
            fail_files: Vec::new(),
        }
    }
}

impl MediaEngine for MockEngine {
    fn create_player(&self, path: &Path) -> Result<Box<dyn PlayerHandle>> {
        let file = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.fail_files.contains(&file) {
            return Err(Error::EngineStart(format!("mock engine refuses {}", file)));
        }

        let alive = self.state.alive.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.max_alive.fetch_max(alive, Ordering::SeqCst);
        self.state.record(EngineCall::Created(file.clone()));

        Ok(Box::new(MockPlayer {
            state: Arc::clone(&self.state),
            file,
            playing: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            polls_left: AtomicI64::new(self.polls_per_track),
            position_ms: AtomicU64::new(0),
            ms_per_poll: self.ms_per_poll,
            volume: 0,
        }))
    }
}

pub struct MockPlayer {
    state: Arc<EngineState>,
    file: String,
    playing: AtomicBool,
    stopped: AtomicBool,
    polls_left: AtomicI64,
    position_ms: AtomicU64,
    ms_per_poll: u64,
    volume: u8,
}

impl PlayerHandle for MockPlayer {
    fn play(&mut self) -> Result<()> {
        self.playing.store(true, Ordering::SeqCst);
        self.state.record(EngineCall::Played(self.file.clone()));
        Ok(())
    }

    fn stop(&mut self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            self.state.record(EngineCall::Stopped(self.file.clone()));
        }
    }

    fn is_playing(&self) -> bool {
        if !self.playing.load(Ordering::SeqCst) || self.stopped.load(Ordering::SeqCst) {
            return false;
        }
        if self.polls_left.fetch_sub(1, Ordering::SeqCst) <= 0 {
            return false;
        }
        self.position_ms.fetch_add(self.ms_per_poll, Ordering::SeqCst);
        true
    }

    fn position_ms(&self) -> u64 {
        self.position_ms.load(Ordering::SeqCst)
    }

    fn seek_ms(&mut self, position_ms: u64) {
        self.position_ms.store(position_ms, Ordering::SeqCst);
        self.state.record(EngineCall::Seeked(self.file.clone(), position_ms));
    }

    fn volume(&self) -> u8 {
        self.volume
    }

    fn set_volume(&mut self, volume: u8) {
        self.volume = volume;
        self.state.record(EngineCall::SetVolume(self.file.clone(), volume));
    }
}

impl Drop for MockPlayer {
    fn drop(&mut self) {
        self.state.alive.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Parse a TOML config, panicking on errors
pub fn config_from(toml: &str) -> Config {
    Config::from_toml(toml).unwrap()
}

/// Receive events until the first `SessionEnded`, inclusive
pub async fn collect_until_ended(
    events: &mut broadcast::Receiver<PlaybackEvent>,
) -> Vec<PlaybackEvent> {
    let mut collected = Vec::new();
    loop {
        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("timed out waiting for session events")
            .expect("event channel closed");
        let ended = matches!(event, PlaybackEvent::SessionEnded { .. });
        collected.push(event);
        if ended {
            return collected;
        }
    }
}
