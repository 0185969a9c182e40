//! The per-guild player: queue ownership and the playback loop state
//! machine.
//!
//! One loop task runs per player. It waits on the queue (bounded by the idle
//! timeout), hands each track to the voice transport, suspends on a per-track
//! completion signal, then either re-queues the track (loop mode) or moves
//! on. An empty queue for the whole idle window tears the player down; an
//! explicit stop does the same from outside.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serenity::model::id::GuildId;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::playback::{ChannelNotifier, PlaybackDriver, PlaybackHandle, PlaybackState};
use super::player_registry::PlayerRegistry;
use super::track_queue::{QueueSnapshot, TrackQueue};
use crate::commands::music::audio_sources::track::Track;
use crate::commands::music::utils::music_manager::MusicError;
use crate::config::PlayerSettings;

/// Outcome of a state-guarded control operation. Invalid-state calls answer
/// with guidance, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlOutcome {
    Paused,
    Resumed,
    Skipped,
    NothingPlaying,
    AlreadyPaused,
    NotPaused,
}

pub struct GuildPlayer {
    guild_id: GuildId,
    queue: TrackQueue,
    current: Mutex<Option<Track>>,
    active: Mutex<Option<Arc<dyn PlaybackHandle>>>,
    loop_enabled: AtomicBool,
    volume: f32,
    closed: AtomicBool,
    driver: Arc<dyn PlaybackDriver>,
    notifier: Arc<dyn ChannelNotifier>,
    settings: PlayerSettings,
    loop_task: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl GuildPlayer {
    pub(crate) fn new(
        guild_id: GuildId,
        driver: Arc<dyn PlaybackDriver>,
        notifier: Arc<dyn ChannelNotifier>,
        settings: PlayerSettings,
    ) -> Self {
        let volume = settings.default_volume.clamp(0.0, 1.0);
        Self {
            guild_id,
            queue: TrackQueue::new(),
            current: Mutex::new(None),
            active: Mutex::new(None),
            loop_enabled: AtomicBool::new(false),
            volume,
            closed: AtomicBool::new(false),
            driver,
            notifier,
            settings,
            loop_task: std::sync::Mutex::new(None),
        }
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    /// Queue a track. Returns the new queue length, or `None` when the
    /// player has already been torn down — a late enqueue after stop is
    /// dropped silently.
    pub async fn enqueue(&self, track: Track) -> Option<usize> {
        if self.closed.load(Ordering::Acquire) {
            debug!(
                "Dropping enqueue of '{}' for torn-down player in guild {}",
                track.title, self.guild_id
            );
            return None;
        }
        Some(self.queue.push(track).await)
    }

    /// Queue a batch of tracks in order. Same teardown semantics as
    /// [`enqueue`](Self::enqueue).
    pub async fn enqueue_all(&self, tracks: Vec<Track>) -> Option<usize> {
        if self.closed.load(Ordering::Acquire) {
            debug!(
                "Dropping {} queued tracks for torn-down player in guild {}",
                tracks.len(),
                self.guild_id
            );
            return None;
        }
        Some(self.queue.push_all(tracks).await)
    }

    /// Bounded preview of the queue, sized by the configured preview length.
    pub async fn queue_snapshot(&self) -> QueueSnapshot {
        self.queue.snapshot(self.settings.queue_preview).await
    }

    pub async fn now_playing(&self) -> Option<Track> {
        self.current.lock().await.clone()
    }

    /// Flip loop mode and return the new state. Takes effect at the next
    /// track completion.
    pub fn toggle_loop(&self) -> bool {
        !self.loop_enabled.fetch_xor(true, Ordering::AcqRel)
    }

    pub fn loop_enabled(&self) -> bool {
        self.loop_enabled.load(Ordering::Acquire)
    }

    pub async fn pause(&self) -> Result<ControlOutcome, MusicError> {
        let Some(handle) = self.active_handle().await else {
            return Ok(ControlOutcome::NothingPlaying);
        };
        match handle.state().await {
            PlaybackState::Playing => {
                handle.pause().await?;
                Ok(ControlOutcome::Paused)
            }
            PlaybackState::Paused => Ok(ControlOutcome::AlreadyPaused),
            PlaybackState::Ended => Ok(ControlOutcome::NothingPlaying),
        }
    }

    pub async fn resume(&self) -> Result<ControlOutcome, MusicError> {
        let Some(handle) = self.active_handle().await else {
            return Ok(ControlOutcome::NothingPlaying);
        };
        match handle.state().await {
            PlaybackState::Paused => {
                handle.resume().await?;
                Ok(ControlOutcome::Resumed)
            }
            PlaybackState::Playing => Ok(ControlOutcome::NotPaused),
            PlaybackState::Ended => Ok(ControlOutcome::NothingPlaying),
        }
    }

    /// Stop the current track; the transport's completion signal then walks
    /// the loop on to the next queued track.
    pub async fn skip(&self) -> Result<ControlOutcome, MusicError> {
        let Some(handle) = self.active_handle().await else {
            return Ok(ControlOutcome::NothingPlaying);
        };
        match handle.state().await {
            PlaybackState::Playing => {
                handle.stop().await?;
                Ok(ControlOutcome::Skipped)
            }
            _ => Ok(ControlOutcome::NothingPlaying),
        }
    }

    async fn active_handle(&self) -> Option<Arc<dyn PlaybackHandle>> {
        self.active.lock().await.clone()
    }

    /// Spawn the playback loop for a freshly created player. Called exactly
    /// once, by the registry, while it holds the map entry.
    pub(crate) fn spawn_loop(self: &Arc<Self>, registry: Arc<PlayerRegistry>) {
        let player = Arc::clone(self);
        let task = tokio::spawn(async move { player.playback_loop(registry).await });
        *self.loop_task.lock().expect("loop task mutex poisoned") = Some(task);
    }

    async fn playback_loop(self: Arc<Self>, registry: Arc<PlayerRegistry>) {
        info!("Playback loop started for guild {}", self.guild_id);

        loop {
            let track = match timeout(self.settings.idle_timeout, self.queue.pop()).await {
                Ok(track) => track,
                Err(_) => {
                    info!(
                        "Queue idle for {:?} in guild {}, disconnecting",
                        self.settings.idle_timeout, self.guild_id
                    );
                    self.teardown_idle(&registry).await;
                    return;
                }
            };

            *self.current.lock().await = Some(track.clone());

            let (done_tx, done_rx) = oneshot::channel();
            match self.driver.play(&track, self.volume, done_tx).await {
                Ok(handle) => {
                    *self.active.lock().await = Some(handle);
                    self.notifier.now_playing(&track).await;

                    // Natural end, skip, stop and in-stream errors all
                    // release this wait; the loop does not care which.
                    let _ = done_rx.await;
                    self.active.lock().await.take();

                    if self.loop_enabled.load(Ordering::Acquire) {
                        if let Some(again) = self.current.lock().await.clone() {
                            debug!(
                                "Loop mode, re-queueing '{}' in guild {}",
                                again.title, self.guild_id
                            );
                            self.queue.push(again).await;
                        }
                    }
                }
                Err(err) => {
                    warn!(
                        "Failed to start '{}' in guild {}: {}",
                        track.title, self.guild_id, err
                    );
                    self.notifier.playback_error(&track, &err).await;
                    // Fall through to the next queued track.
                }
            }

            self.current.lock().await.take();
        }
    }

    /// Idle-timeout teardown, run from inside the loop task itself. The
    /// registry entry is detached (not shut down) so the task never aborts
    /// itself before the disconnect below has run.
    async fn teardown_idle(&self, registry: &PlayerRegistry) {
        self.closed.store(true, Ordering::Release);

        if registry.detach(self.guild_id).is_none() {
            // An explicit stop won the race and owns the disconnect.
            return;
        }

        self.queue.clear().await;
        if let Err(err) = self.driver.disconnect().await {
            warn!(
                "Failed to leave voice channel for guild {}: {}",
                self.guild_id, err
            );
        }
    }

    /// Explicit-stop teardown, called by the registry after the map entry
    /// has been removed. Cancels whichever wait the loop is in.
    pub(crate) async fn shutdown(&self) {
        self.closed.store(true, Ordering::Release);

        if let Some(task) = self
            .loop_task
            .lock()
            .expect("loop task mutex poisoned")
            .take()
        {
            task.abort();
        }

        if let Some(handle) = self.active.lock().await.take() {
            let _ = handle.stop().await;
        }

        self.queue.clear().await;
        self.current.lock().await.take();

        if let Err(err) = self.driver.disconnect().await {
            warn!(
                "Failed to leave voice channel for guild {}: {}",
                self.guild_id, err
            );
        }

        info!("Player for guild {} shut down", self.guild_id);
    }
}
