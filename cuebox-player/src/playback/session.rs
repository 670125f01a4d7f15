//! Playback session task
//!
//! One session plays one track list: shuffle (or keep) the order, play
//! each track through the engine, loop if configured, and finally tear
//! down. Cancellation is cooperative; the stop flag is observed at every
//! suspension point, and the session itself performs all cleanup so a
//! cancelled session is guaranteed to leave the engine silent before its
//! join handle resolves.

use crate::error::{Error, Result};
use crate::library::{resolve_directory, Group, Track, TrackList};
use crate::playback::manager::Manager;
use crate::playback::{shuffle, volume};
use cuebox_common::events::{EndReason, PlaybackEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Interval between polls of the engine and the stop flag
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Everything a session task needs from its manager
pub(crate) struct SessionContext {
    pub(crate) manager: Manager,
    pub(crate) id: Uuid,
    pub(crate) group_index: usize,
    pub(crate) track_list_index: usize,
    pub(crate) stop: Arc<AtomicBool>,
}

impl SessionContext {
    fn check_cancelled(&self) -> Result<()> {
        if self.stop.load(Ordering::SeqCst) {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Session task body: play the track list, then tear down.
///
/// The teardown tail runs on every exit path, so completion,
/// cancellation, and failure all leave the engine stopped and the
/// session slot cleared before the task finishes.
pub(crate) async fn run(ctx: SessionContext) {
    let group = &ctx.manager.inner.groups[ctx.group_index];
    let track_list = &group.track_lists[ctx.track_list_index];

    info!("Loading '{}'", track_list.name);
    ctx.manager.emit(PlaybackEvent::SessionStarted {
        session_id: ctx.id,
        group: group.name.clone(),
        track_list: track_list.name.clone(),
        timestamp: chrono::Utc::now(),
    });

    let outcome = play_track_list(&ctx, group, track_list).await;

    if let Some(mut handle) = ctx.manager.inner.player.lock().await.take() {
        handle.set_volume(0);
        handle.stop();
    }
    ctx.manager.clear_session(ctx.id);

    let reason = match &outcome {
        Ok(()) => {
            info!("Finished '{}'", track_list.name);
            EndReason::Completed
        }
        Err(Error::Cancelled) => {
            info!("Cancelled '{}'", track_list.name);
            EndReason::Cancelled
        }
        Err(e) => {
            error!("Playback of '{}' aborted: {}", track_list.name, e);
            EndReason::Failed
        }
    };
    ctx.manager.emit(PlaybackEvent::SessionEnded {
        session_id: ctx.id,
        track_list: track_list.name.clone(),
        reason,
        timestamp: chrono::Utc::now(),
    });

    // Chaining happens only after a natural completion, never after a
    // cancellation or failure.
    if reason == EndReason::Completed {
        chain_next(&ctx, track_list).await;
    }
}

async fn chain_next(ctx: &SessionContext, track_list: &TrackList) {
    let Some(next) = track_list.next.as_deref() else { return };
    // A displacer raises this flag while it holds the session slot and
    // then awaits this task's join handle; chaining from here would have
    // the two waiting on each other.
    if ctx.stop.load(Ordering::SeqCst) {
        debug!("Skipping chain into '{}', session was stopped", next);
        return;
    }
    match ctx.manager.find_track_list(next) {
        Some((group_index, track_list_index)) => {
            info!("Chaining into track list '{}'", next);
            if let Err(e) = ctx.manager.request_play(group_index, track_list_index).await {
                error!("Failed to chain into '{}': {}", next, e);
            }
        }
        None => error!("No track list named '{}' to chain into", next),
    }
}

/// Play every track once per pass, repeating passes while `loop` is set.
/// Shuffled lists get a fresh order on every pass.
async fn play_track_list(ctx: &SessionContext, group: &Group, track_list: &TrackList) -> Result<()> {
    loop {
        let order = if track_list.shuffle {
            shuffle::shuffled(&track_list.tracks, &mut rand::thread_rng())
        } else {
            track_list.tracks.clone()
        };
        for track in &order {
            play_track(ctx, group, track_list, track).await?;
        }
        if !track_list.loop_playback {
            return Ok(());
        }
    }
}

/// Play a single track start to finish.
///
/// The handle is created muted, started, seeked to `start_at`, published
/// through the player slot, ramped up to the global volume, and then
/// polled until the engine reports it is done. `end_at` is enforced by
/// stopping the engine once the position passes the trim point.
async fn play_track(
    ctx: &SessionContext,
    group: &Group,
    track_list: &TrackList,
    track: &Track,
) -> Result<()> {
    let inner = &*ctx.manager.inner;

    // A session stopped before it ever ran must not open a file or touch
    // the engine
    ctx.check_cancelled()?;

    // Directory resolution is re-checked per track
    let directory = resolve_directory(inner.directory.as_deref(), group, track_list)?;
    let path = directory.join(&track.file);
    if !path.is_file() {
        return Err(Error::FileNotFound(path));
    }

    let mut handle = inner.engine.create_player(&path)?;
    // Start muted so the ramp-in is inaudible from the first sample
    handle.set_volume(0);
    handle.play()?;
    if let Some(start_at) = track.start_at {
        handle.seek_ms(start_at);
    }
    info!("Now playing: {}", track.file);
    ctx.manager.emit(PlaybackEvent::TrackStarted {
        session_id: ctx.id,
        file: track.file.clone(),
        timestamp: chrono::Utc::now(),
    });
    *inner.player.lock().await = Some(handle);

    wait_until_playing(ctx).await?;

    // Ramp up to the global volume; the global value itself is untouched
    let target = *inner.volume.read().await;
    volume::ramp(&inner.player, target, inner.fade, Some(&ctx.stop)).await;

    loop {
        ctx.check_cancelled().map_err(|e| {
            debug!("Received cancellation request during {}", track.file);
            e
        })?;
        {
            let mut slot = inner.player.lock().await;
            match slot.as_mut() {
                None => break,
                Some(handle) if !handle.is_playing() => break,
                Some(handle) => {
                    if track.end_at.is_some_and(|end_at| handle.position_ms() >= end_at) {
                        handle.stop();
                    }
                }
            }
        }
        sleep(POLL_INTERVAL).await;
    }

    // Drop the finished handle before the next track gets one
    inner.player.lock().await.take();
    info!("Finished playing: {}", track.file);
    ctx.manager.emit(PlaybackEvent::TrackFinished {
        session_id: ctx.id,
        file: track.file.clone(),
        timestamp: chrono::Utc::now(),
    });
    Ok(())
}

/// Wait for the engine to report the freshly started track as playing.
/// Engines need a moment between `play()` and audible output; starting
/// the fade before that point would swallow its first steps.
async fn wait_until_playing(ctx: &SessionContext) -> Result<()> {
    loop {
        {
            let slot = ctx.manager.inner.player.lock().await;
            match slot.as_ref() {
                None => return Ok(()),
                Some(handle) if handle.is_playing() => return Ok(()),
                Some(_) => {}
            }
        }
        ctx.check_cancelled()?;
        sleep(POLL_INTERVAL).await;
    }
}
