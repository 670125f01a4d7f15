//! Playback manager - session lifecycle and volume control
//!
//! Owns the immutable group hierarchy, the global volume, the event
//! broadcaster, and at most one playback session. A play request
//! replaces the session slot atomically and raises the displaced
//! session's stop flag in the same critical section, then awaits its
//! join handle before releasing the new session; `cancel()` follows the
//! same take-signal-join discipline. Either way, a call returns only
//! after the outgoing session's cleanup has actually executed.

use crate::config::{Config, FadeSettings};
use crate::engine::{MediaEngine, PlayerHandle};
use crate::error::{Error, Result};
use crate::library::Group;
use crate::playback::{checker, session, volume};
use cuebox_common::events::PlaybackEvent;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, oneshot, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Slot holding the engine handle of the currently playing track.
///
/// Written by the owning session task (handle swapped per track) and read
/// by volume fades; cleared exactly once by the session's cleanup step.
pub(crate) type PlayerSlot = tokio::sync::Mutex<Option<Box<dyn PlayerHandle>>>;

/// Information about the active playback session
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub id: Uuid,
    pub group_index: usize,
    pub group_name: String,
    pub track_list_index: usize,
    pub track_list_name: String,
}

/// The active session's control handles
struct ActiveSession {
    info: SessionInfo,
    /// Cooperative stop flag, observed by the session at suspension points
    stop: Arc<AtomicBool>,
    /// Resolves when the session task has fully torn down
    handle: JoinHandle<()>,
}

/// Options for [`Manager::set_volume`]
#[derive(Debug, Clone, Copy)]
pub struct SetVolumeOptions {
    /// Store the value as the new global volume
    pub set_global: bool,
    /// Fade the live engine handle instead of jumping
    pub smooth: bool,
    /// Fade parameters; `None` uses the configured defaults
    pub fade: Option<FadeSettings>,
}

impl Default for SetVolumeOptions {
    fn default() -> Self {
        Self {
            set_global: true,
            smooth: true,
            fade: None,
        }
    }
}

/// Shared manager state, reachable from the session task
pub(crate) struct Inner {
    /// Global volume (0-100)
    pub(crate) volume: RwLock<u8>,
    /// Default directory when neither group nor track list has one
    pub(crate) directory: Option<PathBuf>,
    /// Group hierarchy, immutable after construction
    pub(crate) groups: Vec<Group>,
    /// Fade defaults from configuration
    pub(crate) fade: FadeSettings,
    /// Media engine used to create per-track players
    pub(crate) engine: Box<dyn MediaEngine>,
    /// Engine handle of the currently playing track, if any
    pub(crate) player: PlayerSlot,
    /// The active session, if any
    session: Mutex<Option<ActiveSession>>,
    /// Event broadcaster for front ends
    event_tx: broadcast::Sender<PlaybackEvent>,
}

/// Playback manager handle; cheap to clone
#[derive(Clone)]
pub struct Manager {
    pub(crate) inner: Arc<Inner>,
}

impl Manager {
    /// Build the manager from configuration.
    ///
    /// Constructs the immutable group hierarchy (groups sorted by name
    /// unless disabled), runs the startup library check, and validates
    /// the configuration. Construction errors fail fast.
    pub fn new(config: Config, engine: Box<dyn MediaEngine>) -> Result<Self> {
        // Covers hand-built configs that bypassed the TOML loader
        config.validate()?;

        let mut groups = config
            .groups
            .iter()
            .map(Group::from_config)
            .collect::<Result<Vec<_>>>()?;
        if config.sort {
            groups.sort_by(|a, b| a.name.cmp(&b.name));
        }

        let problems = checker::check_library(config.directory.as_deref(), &groups);
        if problems > 0 {
            warn!("Library check found {} problem(s)", problems);
        }

        let (event_tx, _) = broadcast::channel(64);

        Ok(Self {
            inner: Arc::new(Inner {
                volume: RwLock::new(config.volume),
                directory: config.directory,
                groups,
                fade: config.fade,
                engine,
                player: tokio::sync::Mutex::new(None),
                session: Mutex::new(None),
                event_tx,
            }),
        })
    }

    /// The configured groups, in playback order
    pub fn groups(&self) -> &[Group] {
        &self.inner.groups
    }

    /// Current global volume (0-100)
    pub async fn volume(&self) -> u8 {
        *self.inner.volume.read().await
    }

    /// Information about the active session, if any
    pub fn current_session(&self) -> Option<SessionInfo> {
        self.inner.session.lock().unwrap().as_ref().map(|s| s.info.clone())
    }

    /// Subscribe to the playback event stream
    pub fn subscribe_events(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Locate a track list by name across all groups
    pub fn find_track_list(&self, name: &str) -> Option<(usize, usize)> {
        self.inner.groups.iter().enumerate().find_map(|(group_index, group)| {
            group
                .track_lists
                .iter()
                .position(|track_list| track_list.name == name)
                .map(|track_list_index| (group_index, track_list_index))
        })
    }

    /// Start playing the track list at the given indices.
    ///
    /// Any running session is displaced and this call waits for its
    /// cleanup to finish before the new session is released, so no two
    /// sessions ever touch the engine concurrently. Fails with
    /// [`Error::IndexOutOfRange`] for invalid indices; session-time
    /// failures are never surfaced here (the session runs detached and
    /// reports through logs and events).
    ///
    /// The return type is boxed at the declaration because sessions
    /// chain back into `request_play`; an opaque future here would make
    /// the session future's `Send` proof recursive.
    pub fn request_play(
        &self,
        group_index: usize,
        track_list_index: usize,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'static>> {
        let manager = self.clone();
        Box::pin(async move { manager.start_session(group_index, track_list_index).await })
    }

    async fn start_session(&self, group_index: usize, track_list_index: usize) -> Result<()> {
        let group = self
            .inner
            .groups
            .get(group_index)
            .ok_or(Error::IndexOutOfRange {
                kind: "group",
                index: group_index,
                len: self.inner.groups.len(),
            })?;
        let track_list = group
            .track_lists
            .get(track_list_index)
            .ok_or(Error::IndexOutOfRange {
                kind: "track list",
                index: track_list_index,
                len: group.track_lists.len(),
            })?;
        debug!(
            "Received request to play track list {} ('{}') from group {} ('{}')",
            track_list_index, track_list.name, group_index, group.name
        );

        let info = SessionInfo {
            id: Uuid::new_v4(),
            group_index,
            group_name: group.name.clone(),
            track_list_index,
            track_list_name: track_list.name.clone(),
        };
        let stop = Arc::new(AtomicBool::new(false));
        let ctx = session::SessionContext {
            manager: self.clone(),
            id: info.id,
            group_index,
            track_list_index,
            stop: Arc::clone(&stop),
        };

        // The task must not outrun its own registration: it starts only
        // after the manager has recorded it as the active session and
        // the session it displaced has fully torn down.
        let (ready_tx, ready_rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
            let _ = ready_rx.await;
            session::run(ctx).await;
        });
        debug!("Created playback session {} for '{}'", info.id, info.track_list_name);

        // Publishing the new session and stopping the old one is a
        // single atomic step, so concurrent requests each displace
        // exactly one predecessor and no registered session is ever
        // dropped while still running.
        let displaced = {
            let mut slot = self.inner.session.lock().unwrap();
            let displaced = slot.replace(ActiveSession { info, stop, handle });
            if let Some(old) = &displaced {
                old.stop.store(true, Ordering::SeqCst);
            }
            displaced
        };
        if let Some(old) = displaced {
            info!(
                "Cancelling playback session {} ('{}')",
                old.info.id, old.info.track_list_name
            );
            if old.handle.await.is_err() {
                warn!("Session task {} panicked during teardown", old.info.id);
            }
        }
        let _ = ready_tx.send(());

        // Let the session task begin before returning to the caller
        tokio::task::yield_now().await;
        Ok(())
    }

    /// Cancel the active session, if any.
    ///
    /// Signals the session to stop cooperatively and waits until its
    /// cleanup step has executed (engine stopped, handles cleared). A
    /// no-op that returns immediately when nothing is playing. Loops in
    /// case the finishing session chained into a successor.
    pub async fn cancel(&self) {
        loop {
            // The stop flag is raised inside the slot's critical section;
            // a session that still finds itself registered there must
            // also see any flag its displacer set.
            let active = {
                let mut slot = self.inner.session.lock().unwrap();
                let taken = slot.take();
                if let Some(active) = &taken {
                    active.stop.store(true, Ordering::SeqCst);
                }
                taken
            };
            let Some(active) = active else { return };

            info!(
                "Cancelling playback session {} ('{}')",
                active.info.id, active.info.track_list_name
            );
            if active.handle.await.is_err() {
                warn!("Session task {} panicked during teardown", active.info.id);
            }
        }
    }

    /// Set the playback volume (0-100; larger values are clamped).
    ///
    /// With `set_global` the value is stored as the new global volume
    /// even when nothing is playing. A live engine handle is adjusted
    /// immediately or faded smoothly per `options`; an in-flight fade is
    /// abandoned cleanly if the owning session tears down mid-ramp.
    pub async fn set_volume(&self, volume: u8, options: SetVolumeOptions) {
        let volume = if volume > 100 {
            warn!("Volume {} out of range, clamping to 100", volume);
            100
        } else {
            volume
        };

        if options.set_global {
            *self.inner.volume.write().await = volume;
            debug!("Changed global volume to {}", volume);
            self.emit(PlaybackEvent::VolumeChanged {
                volume,
                timestamp: chrono::Utc::now(),
            });
        }

        if options.smooth {
            volume::ramp(
                &self.inner.player,
                volume,
                options.fade.unwrap_or(self.inner.fade),
                None,
            )
            .await;
        } else if let Some(handle) = self.inner.player.lock().await.as_mut() {
            handle.set_volume(volume);
        }
    }

    /// Broadcast an event; no receivers is fine
    pub(crate) fn emit(&self, event: PlaybackEvent) {
        let _ = self.inner.event_tx.send(event);
    }

    /// Clear the session slot, but only if `id` is still the active
    /// session (a finished session must never clobber its successor).
    pub(crate) fn clear_session(&self, id: Uuid) {
        let mut slot = self.inner.session.lock().unwrap();
        if slot.as_ref().is_some_and(|active| active.info.id == id) {
            *slot = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::time::Duration;

    /// Engine that refuses every request; enough for tests that never
    /// reach playback.
    struct RejectingEngine;

    impl MediaEngine for RejectingEngine {
        fn create_player(&self, path: &Path) -> Result<Box<dyn PlayerHandle>> {
            Err(Error::EngineStart(format!("no player for {:?}", path)))
        }
    }

    fn manager(toml: &str) -> Manager {
        let config = Config::from_toml(toml).unwrap();
        Manager::new(config, Box::new(RejectingEngine)).unwrap()
    }

    fn two_list_manager() -> Manager {
        manager(
            r#"
            volume = 50

            [[groups]]
            name = "g"

            [[groups.track_lists]]
            name = "alpha"
            tracks = ["a.mp3"]

            [[groups.track_lists]]
            name = "beta"
            tracks = ["b.mp3"]
            "#,
        )
    }

    #[tokio::test]
    async fn test_request_play_index_out_of_range() {
        let manager = two_list_manager();

        let err = manager.request_play(1, 0).await.unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { kind: "group", .. }));

        let err = manager.request_play(0, 2).await.unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { kind: "track list", .. }));

        assert!(manager.current_session().is_none());
    }

    #[tokio::test]
    async fn test_cancel_idle_is_noop() {
        let manager = two_list_manager();
        tokio::time::timeout(Duration::from_millis(100), manager.cancel())
            .await
            .expect("cancel on an idle manager must return immediately");
        assert!(manager.current_session().is_none());
    }

    #[tokio::test]
    async fn test_find_track_list() {
        let manager = two_list_manager();
        assert_eq!(manager.find_track_list("alpha"), Some((0, 0)));
        assert_eq!(manager.find_track_list("beta"), Some((0, 1)));
        assert_eq!(manager.find_track_list("missing"), None);
    }

    #[tokio::test]
    async fn test_set_volume_global_without_session() {
        let manager = two_list_manager();
        let mut events = manager.subscribe_events();

        manager.set_volume(30, SetVolumeOptions::default()).await;
        assert_eq!(manager.volume().await, 30);

        let event = events.try_recv().unwrap();
        assert!(matches!(event, PlaybackEvent::VolumeChanged { volume: 30, .. }));
    }

    #[tokio::test]
    async fn test_set_volume_clamps_to_100() {
        let manager = two_list_manager();
        manager.set_volume(150, SetVolumeOptions::default()).await;
        assert_eq!(manager.volume().await, 100);
    }

    #[tokio::test]
    async fn test_set_volume_local_only_keeps_global() {
        let manager = two_list_manager();
        manager
            .set_volume(
                10,
                SetVolumeOptions {
                    set_global: false,
                    ..Default::default()
                },
            )
            .await;
        assert_eq!(manager.volume().await, 50);
    }

    #[test]
    fn test_rejects_empty_track_list() {
        use crate::config::{GroupConfig, TrackListConfig};

        // Built by hand to bypass the TOML loader's own validation
        let config = Config {
            volume: 50,
            directory: None,
            sort: true,
            fade: FadeSettings::default(),
            groups: vec![GroupConfig {
                name: "g".to_string(),
                directory: None,
                sort: true,
                track_lists: vec![TrackListConfig {
                    name: "t".to_string(),
                    directory: None,
                    loop_playback: true,
                    shuffle: true,
                    next: None,
                    tracks: Vec::new(),
                }],
            }],
        };

        let result = Manager::new(config, Box::new(RejectingEngine));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_groups_sorted_by_name() {
        let manager = manager(
            r#"
            volume = 50

            [[groups]]
            name = "zebra"
            track_lists = []

            [[groups]]
            name = "alpha"
            track_lists = []
            "#,
        );
        assert_eq!(manager.groups()[0].name, "alpha");
        assert_eq!(manager.groups()[1].name, "zebra");
    }

    #[test]
    fn test_group_sorting_disabled() {
        let manager = manager(
            r#"
            volume = 50
            sort = false

            [[groups]]
            name = "zebra"
            track_lists = []

            [[groups]]
            name = "alpha"
            track_lists = []
            "#,
        );
        assert_eq!(manager.groups()[0].name, "zebra");
    }
}
