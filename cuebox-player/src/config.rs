//! Configuration schema for cuebox-player
//!
//! The whole playback hierarchy is described by one TOML file, loaded once
//! at startup and converted into the immutable library model. Optional
//! fields carry documented defaults (`loop = true`, `shuffle = true`,
//! `sort = true`) applied through serde.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Global playback volume, 0 (mute) to 100 (max)
    pub volume: u8,

    /// Default directory used when neither group nor track list has one
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// Whether to sort groups alphabetically by name
    #[serde(default = "default_true")]
    pub sort: bool,

    /// Volume fade behavior for smooth transitions
    #[serde(default)]
    pub fade: FadeSettings,

    /// Group definitions
    pub groups: Vec<GroupConfig>,
}

/// Smooth volume fade parameters
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FadeSettings {
    /// Number of interpolation steps per fade
    #[serde(default = "default_fade_steps")]
    pub steps: u32,

    /// Wall-clock duration of a full fade in seconds
    #[serde(default = "default_fade_seconds")]
    pub seconds: f64,
}

impl Default for FadeSettings {
    fn default() -> Self {
        Self {
            steps: default_fade_steps(),
            seconds: default_fade_seconds(),
        }
    }
}

/// Group of track lists
#[derive(Debug, Clone, Deserialize)]
pub struct GroupConfig {
    /// Descriptive group name
    pub name: String,

    /// Directory override for all track lists in this group
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// Whether to sort track lists alphabetically by name
    #[serde(default = "default_true")]
    pub sort: bool,

    /// Track list definitions
    pub track_lists: Vec<TrackListConfig>,
}

/// Ordered list of tracks plus playback policy
#[derive(Debug, Clone, Deserialize)]
pub struct TrackListConfig {
    /// Track list name (also the lookup key for `next` chaining)
    pub name: String,

    /// Directory override for this track list
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// Whether to start over once all tracks have been played
    #[serde(default = "default_true", rename = "loop")]
    pub loop_playback: bool,

    /// Whether to randomize track order on every pass
    #[serde(default = "default_true")]
    pub shuffle: bool,

    /// Name of a track list to play after this one completes naturally
    #[serde(default)]
    pub next: Option<String>,

    /// Track definitions
    pub tracks: Vec<TrackConfig>,
}

/// A single track: either a bare filename or a record with trim points
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TrackConfig {
    /// Just the filename
    File(String),

    /// Filename plus optional "H:M:S" trim points
    Timed {
        file: String,
        #[serde(default)]
        start_at: Option<String>,
        #[serde(default)]
        end_at: Option<String>,
    },
}

fn default_true() -> bool {
    true
}

fn default_fade_steps() -> u32 {
    20
}

fn default_fade_seconds() -> f64 {
    2.0
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// Fails with [`Error::Config`] if the file cannot be read, does not
    /// parse, or declares a volume above 100.
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;
        Self::from_toml(&raw)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(raw).map_err(|e| Error::Config(format!("failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.volume > 100 {
            return Err(Error::Config(format!(
                "volume must be between 0 and 100, got {}",
                self.volume
            )));
        }
        if self.fade.steps == 0 {
            return Err(Error::Config("fade steps must be at least 1".to_string()));
        }
        if self.fade.seconds < 0.0 {
            return Err(Error::Config("fade seconds must not be negative".to_string()));
        }
        // An empty track list with `loop = true` would replay nothing
        // forever; reject it outright.
        for group in &self.groups {
            for track_list in &group.track_lists {
                if track_list.tracks.is_empty() {
                    return Err(Error::Config(format!(
                        "track list '{}' in group '{}' has no tracks",
                        track_list.name, group.name
                    )));
                }
            }
        }
        Ok(())
    }
}
