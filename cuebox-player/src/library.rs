//! Immutable playback library model
//!
//! `Track`, `TrackList`, and `Group` are plain value objects built once
//! from the configuration and never mutated afterwards. Directory
//! resolution walks the three-level override chain (track list > group >
//! manager default).

use crate::config::{GroupConfig, TrackConfig, TrackListConfig};
use crate::error::{Error, Result};
use cuebox_common::time::parse_hms;
use std::path::{Path, PathBuf};

/// A single playable item: file reference plus optional trim points
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// Filename relative to the resolved track-list directory
    pub file: String,

    /// Playback start offset in milliseconds
    pub start_at: Option<u64>,

    /// Playback stop position in milliseconds
    pub end_at: Option<u64>,
}

impl Track {
    /// Build a track from its configuration.
    ///
    /// Trim points are converted from "H:M:S" strings to milliseconds
    /// here, once; a malformed string fails with [`Error::TimeFormat`].
    /// Trim values beyond the actual file duration are legal and left to
    /// the engine.
    pub fn from_config(config: &TrackConfig) -> Result<Self> {
        match config {
            TrackConfig::File(file) => Ok(Self {
                file: file.clone(),
                start_at: None,
                end_at: None,
            }),
            TrackConfig::Timed {
                file,
                start_at,
                end_at,
            } => Ok(Self {
                file: file.clone(),
                start_at: start_at.as_deref().map(parse_hms).transpose()?,
                end_at: end_at.as_deref().map(parse_hms).transpose()?,
            }),
        }
    }
}

/// Ordered, immutable collection of tracks plus playback policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackList {
    pub name: String,
    pub directory: Option<PathBuf>,
    pub loop_playback: bool,
    pub shuffle: bool,
    /// Track list to chain into after natural completion
    pub next: Option<String>,
    /// Tracks in configured order; shuffling only ever copies this
    pub tracks: Vec<Track>,
}

impl TrackList {
    pub fn from_config(config: &TrackListConfig) -> Result<Self> {
        let tracks = config
            .tracks
            .iter()
            .map(Track::from_config)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            name: config.name.clone(),
            directory: config.directory.clone(),
            loop_playback: config.loop_playback,
            shuffle: config.shuffle,
            next: config.next.clone(),
            tracks,
        })
    }
}

/// Named, ordered collection of track lists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub directory: Option<PathBuf>,
    pub track_lists: Vec<TrackList>,
}

impl Group {
    /// Build a group from its configuration, sorting track lists
    /// lexicographically by name unless sorting is disabled.
    pub fn from_config(config: &GroupConfig) -> Result<Self> {
        let mut track_lists = config
            .track_lists
            .iter()
            .map(TrackList::from_config)
            .collect::<Result<Vec<_>>>()?;
        if config.sort {
            track_lists.sort_by(|a, b| a.name.cmp(&b.name));
        }
        Ok(Self {
            name: config.name.clone(),
            directory: config.directory.clone(),
            track_lists,
        })
    }
}

/// Resolve the root directory for a track list.
///
/// Lookup order: the track list's own directory, then the group's, then
/// the manager default. Fails with [`Error::NoDirectory`] when none is
/// set. Re-evaluated at every point of use even though the configuration
/// is static.
pub fn resolve_directory<'a>(
    default_dir: Option<&'a Path>,
    group: &'a Group,
    track_list: &'a TrackList,
) -> Result<&'a Path> {
    track_list
        .directory
        .as_deref()
        .or(group.directory.as_deref())
        .or(default_dir)
        .ok_or_else(|| Error::NoDirectory {
            group: group.name.clone(),
            track_list: track_list.name.clone(),
        })
}
