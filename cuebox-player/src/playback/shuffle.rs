//! Playback-order shuffling
//!
//! Shuffling always works on a copy; the stored track order of a
//! `TrackList` never changes across passes. The random source is an
//! argument so tests can inject a seeded generator.

use crate::library::Track;
use rand::seq::SliceRandom;
use rand::Rng;

/// Return a shuffled copy of `tracks`, leaving the input untouched.
pub fn shuffled<R: Rng>(tracks: &[Track], rng: &mut R) -> Vec<Track> {
    let mut copy = tracks.to_vec();
    copy.shuffle(rng);
    copy
}
