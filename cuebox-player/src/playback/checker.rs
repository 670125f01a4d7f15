//! Startup library check
//!
//! Walks every (group, track list, track) triple once at manager
//! construction, resolving directories and probing files. Problems are
//! logged as warnings and counted but never fatal: playback still fails
//! at the point of use, this pass just surfaces configuration mistakes
//! before anything is requested.

use crate::library::{resolve_directory, Group};
use std::path::Path;
use tracing::warn;

/// Check every configured track for a resolvable directory and an
/// existing file. Returns the number of problems found.
pub fn check_library(default_dir: Option<&Path>, groups: &[Group]) -> usize {
    let mut problems = 0;

    for group in groups {
        for track_list in &group.track_lists {
            let directory = match resolve_directory(default_dir, group, track_list) {
                Ok(directory) => directory,
                Err(e) => {
                    warn!("{}", e);
                    problems += track_list.tracks.len().max(1);
                    continue;
                }
            };
            for track in &track_list.tracks {
                let path = directory.join(&track.file);
                if !path.is_file() {
                    warn!(
                        "Track '{}' in track list '{}' not found at {:?}",
                        track.file, track_list.name, path
                    );
                    problems += 1;
                }
            }
        }
    }

    problems
}
