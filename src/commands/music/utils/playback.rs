//! Seam between the playback loop and the voice transport.
//!
//! The loop only ever talks to [`PlaybackDriver`], [`PlaybackHandle`] and
//! [`ChannelNotifier`]; the songbird/serenity implementations below are the
//! production wiring.

use std::sync::Arc;

use poise::serenity_prelude as serenity;
use serenity::all::CreateMessage;
use serenity::async_trait;
use serenity::http::Http;
use serenity::model::id::{ChannelId, GuildId};
use serenity::prelude::Mutex as SerenityMutex;
use songbird::input::HttpRequest;
use songbird::tracks::{PlayMode, TrackHandle};
use songbird::{Call, Event, EventContext, Songbird, TrackEvent};
use tokio::sync::{oneshot, Mutex};
use tracing::warn;

use crate::commands::music::audio_sources::track::Track;
use crate::commands::music::utils::embedded_messages::truncate_error;
use crate::commands::music::utils::music_manager::MusicError;
use crate::HTTP_CLIENT;

/// Fired exactly once per track, however playback ends — natural end, skip,
/// explicit stop or an in-stream error all release the same wait.
pub type CompletionSignal = oneshot::Sender<()>;

/// Coarse transport state backing the pause/resume/skip guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Playing,
    Paused,
    Ended,
}

/// Control surface for the track currently on the voice transport.
#[async_trait]
pub trait PlaybackHandle: Send + Sync {
    async fn pause(&self) -> Result<(), MusicError>;
    async fn resume(&self) -> Result<(), MusicError>;
    /// Stop the track; the transport then fires the completion signal.
    async fn stop(&self) -> Result<(), MusicError>;
    async fn state(&self) -> PlaybackState;
}

/// Hands tracks to the voice transport and owns the guild's connection.
#[async_trait]
pub trait PlaybackDriver: Send + Sync {
    /// Begin playback of `track`, wiring `on_done` to fire once when the
    /// track ends for any reason.
    async fn play(
        &self,
        track: &Track,
        volume: f32,
        on_done: CompletionSignal,
    ) -> Result<Arc<dyn PlaybackHandle>, MusicError>;

    /// Release the voice connection. Idempotent.
    async fn disconnect(&self) -> Result<(), MusicError>;
}

/// Status sink for the playback loop's chat announcements.
#[async_trait]
pub trait ChannelNotifier: Send + Sync {
    async fn now_playing(&self, track: &Track);
    async fn playback_error(&self, track: &Track, error: &MusicError);
}

/// Production driver backed by a songbird [`Call`].
pub struct SongbirdDriver {
    manager: Arc<Songbird>,
    guild_id: GuildId,
    call: Arc<SerenityMutex<Call>>,
}

impl SongbirdDriver {
    pub fn new(manager: Arc<Songbird>, guild_id: GuildId, call: Arc<SerenityMutex<Call>>) -> Self {
        Self {
            manager,
            guild_id,
            call,
        }
    }
}

#[async_trait]
impl PlaybackDriver for SongbirdDriver {
    async fn play(
        &self,
        track: &Track,
        volume: f32,
        on_done: CompletionSignal,
    ) -> Result<Arc<dyn PlaybackHandle>, MusicError> {
        let input = HttpRequest::new(HTTP_CLIENT.clone(), track.stream_locator.clone());

        let handle = {
            let mut call = self.call.lock().await;
            call.play_input(input.into())
        };

        handle
            .set_volume(volume)
            .map_err(|err| MusicError::Playback(err.to_string()))?;

        // End and Error both resolve the same one-shot; whichever fires
        // first consumes the sender.
        let slot = Arc::new(Mutex::new(Some(on_done)));
        for event in [TrackEvent::End, TrackEvent::Error] {
            handle
                .add_event(
                    Event::Track(event),
                    TrackDoneNotifier {
                        slot: Arc::clone(&slot),
                    },
                )
                .map_err(|err| MusicError::Playback(err.to_string()))?;
        }

        Ok(Arc::new(SongbirdHandle { inner: handle }))
    }

    async fn disconnect(&self) -> Result<(), MusicError> {
        if self.manager.get(self.guild_id).is_none() {
            return Ok(());
        }
        self.manager
            .remove(self.guild_id)
            .await
            .map_err(|err| MusicError::JoinError(err.to_string()))
    }
}

/// Fires the per-track completion signal from transport events.
struct TrackDoneNotifier {
    slot: Arc<Mutex<Option<CompletionSignal>>>,
}

#[async_trait]
impl songbird::EventHandler for TrackDoneNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        if let EventContext::Track(_) = ctx {
            if let Some(signal) = self.slot.lock().await.take() {
                let _ = signal.send(());
            }
        }
        None
    }
}

/// [`PlaybackHandle`] over a songbird [`TrackHandle`].
struct SongbirdHandle {
    inner: TrackHandle,
}

#[async_trait]
impl PlaybackHandle for SongbirdHandle {
    async fn pause(&self) -> Result<(), MusicError> {
        self.inner
            .pause()
            .map_err(|err| MusicError::Playback(err.to_string()))
    }

    async fn resume(&self) -> Result<(), MusicError> {
        self.inner
            .play()
            .map_err(|err| MusicError::Playback(err.to_string()))
    }

    async fn stop(&self) -> Result<(), MusicError> {
        self.inner
            .stop()
            .map_err(|err| MusicError::Playback(err.to_string()))
    }

    async fn state(&self) -> PlaybackState {
        match self.inner.get_info().await {
            Ok(info) => match info.playing {
                PlayMode::Play => PlaybackState::Playing,
                PlayMode::Pause => PlaybackState::Paused,
                _ => PlaybackState::Ended,
            },
            Err(_) => PlaybackState::Ended,
        }
    }
}

/// Posts loop announcements to the guild's text channel.
pub struct SerenityNotifier {
    http: Arc<Http>,
    channel_id: ChannelId,
}

impl SerenityNotifier {
    pub fn new(http: Arc<Http>, channel_id: ChannelId) -> Self {
        Self { http, channel_id }
    }

    async fn send(&self, content: String) {
        let message = CreateMessage::new().content(content);
        if let Err(err) = self.channel_id.send_message(&self.http, message).await {
            warn!(
                "Failed to post to channel {}: {}",
                self.channel_id, err
            );
        }
    }
}

#[async_trait]
impl ChannelNotifier for SerenityNotifier {
    async fn now_playing(&self, track: &Track) {
        self.send(format!(
            "🎵 Now playing: **{}**{}",
            track.title,
            track.duration_display()
        ))
        .await;
    }

    async fn playback_error(&self, track: &Track, error: &MusicError) {
        self.send(format!(
            "❌ Playback error for **{}**: {}",
            track.title,
            truncate_error(&error.to_string())
        ))
        .await;
    }
}
