//! Voice-connection plumbing shared by the music commands, plus the error
//! type they all speak.

use poise::serenity_prelude as serenity;
use serenity::client::Context;
use serenity::model::id::{ChannelId, GuildId};
use serenity::prelude::Mutex as SerenityMutex;
use songbird::{Call, Songbird};
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

use super::playback::{SerenityNotifier, SongbirdDriver};
use super::player::GuildPlayer;
use super::player_registry::{PlayerDeps, PLAYER_REGISTRY};
use crate::commands::music::audio_sources::ResolveError;
use crate::config::PlayerSettings;

#[derive(Error, Debug)]
pub enum MusicError {
    #[error("This command only works in a guild")]
    NotInGuild,

    #[error("Could not join the voice channel: {0}")]
    JoinError(String),

    #[error("Not connected to a voice channel")]
    NotConnected,

    #[error("The voice client is not initialized")]
    NoVoiceManager,

    #[error("User is not in a voice channel")]
    UserNotInVoiceChannel,

    #[error("Playback error: {0}")]
    Playback(String),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

pub type MusicResult<T> = Result<T, MusicError>;

pub struct MusicManager;

impl MusicManager {
    pub async fn get_songbird(ctx: &Context) -> MusicResult<Arc<Songbird>> {
        songbird::get(ctx).await.ok_or(MusicError::NoVoiceManager)
    }

    /// Join `channel_id`, or move there when connected elsewhere in the
    /// guild. Re-joining the current channel is a no-op at the gateway.
    pub async fn join_channel(
        ctx: &Context,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> MusicResult<Arc<SerenityMutex<Call>>> {
        Self::get_songbird(ctx)
            .await?
            .join(guild_id, channel_id)
            .await
            .map_err(|err| MusicError::JoinError(err.to_string()))
    }

    /// Drop the guild's voice connection, if any.
    pub async fn leave_channel(ctx: &Context, guild_id: GuildId) -> MusicResult<()> {
        let songbird = Self::get_songbird(ctx).await?;
        if songbird.get(guild_id).is_none() {
            return Err(MusicError::NotConnected);
        }

        songbird
            .remove(guild_id)
            .await
            .map_err(|err| MusicError::JoinError(err.to_string()))
    }

    /// The voice channel the invoking user currently sits in.
    pub fn get_user_voice_channel(
        ctx: &Context,
        guild_id: GuildId,
        user_id: serenity::UserId,
    ) -> MusicResult<ChannelId> {
        let guild = ctx.cache.guild(guild_id).ok_or(MusicError::NotInGuild)?;
        guild
            .voice_states
            .get(&user_id)
            .and_then(|state| state.channel_id)
            .ok_or(MusicError::UserNotInVoiceChannel)
    }

    /// Connect to the invoking user's voice channel (or stay where we are)
    /// and hand back the guild's player, creating it on first use.
    pub async fn ensure_player(ctx: &crate::Context<'_>) -> MusicResult<Arc<GuildPlayer>> {
        let guild_id = ctx.guild_id().ok_or(MusicError::NotInGuild)?;
        let serenity_ctx = ctx.serenity_context();

        let user_channel =
            Self::get_user_voice_channel(serenity_ctx, guild_id, ctx.author().id)?;

        let manager = Self::get_songbird(serenity_ctx).await?;
        let call = match manager.get(guild_id) {
            Some(call) => call,
            None => manager.join(guild_id, user_channel).await.map_err(|err| {
                error!(
                    "Failed to join voice channel {} for guild {}: {}",
                    user_channel, guild_id, err
                );
                MusicError::JoinError(err.to_string())
            })?,
        };

        let http = serenity_ctx.http.clone();
        let text_channel = ctx.channel_id();

        let player = PLAYER_REGISTRY.get_or_create(guild_id, || PlayerDeps {
            driver: Arc::new(SongbirdDriver::new(Arc::clone(&manager), guild_id, call)),
            notifier: Arc::new(SerenityNotifier::new(http, text_channel)),
            settings: PlayerSettings::from_env(),
        });

        Ok(player)
    }
}
