use super::*;
use crate::commands::music::audio_sources::RESOLVER;
use crate::commands::music::utils::{
    embedded_messages,
    music_manager::{MusicError, MusicManager},
};
use tracing::{error, info};

/// Queue every track of a playlist
#[poise::command(slash_command, category = "Music")]
pub async fn playlist(
    ctx: Context<'_>,
    #[description = "Playlist URL"] query: String,
) -> CommandResult {
    info!("Received playlist command with query: {}", query);

    let player = match MusicManager::ensure_player(&ctx).await {
        Ok(player) => player,
        Err(MusicError::UserNotInVoiceChannel) => {
            ctx.send(embedded_messages::user_not_in_voice_channel())
                .await?;
            return Ok(());
        }
        Err(err) => {
            ctx.send(embedded_messages::voice_error(&err)).await?;
            return Ok(());
        }
    };

    ctx.defer().await?;

    // Not playlist-shaped after all: queue it as a single track and say so.
    if !RESOLVER.looks_like_playlist(&query).await {
        match RESOLVER.resolve(&query).await {
            Ok(track) => {
                if player.enqueue(track.clone()).await.is_none() {
                    return Ok(());
                }
                ctx.send(embedded_messages::not_a_playlist(&track)).await?;
            }
            Err(err) => {
                error!("Failed to resolve '{}': {}", query, err);
                ctx.send(embedded_messages::resolve_failed(&err)).await?;
            }
        }
        return Ok(());
    }

    match RESOLVER.resolve_playlist(&query).await {
        Ok(resolution) if resolution.tracks.is_empty() => {
            ctx.send(embedded_messages::playlist_empty()).await?;
        }
        Ok(resolution) => {
            let count = resolution.tracks.len();
            if player.enqueue_all(resolution.tracks).await.is_none() {
                return Ok(());
            }
            info!(
                "Queued playlist '{}' with {} tracks for guild {:?}",
                resolution.title,
                count,
                ctx.guild_id()
            );
            ctx.send(embedded_messages::added_playlist(&resolution.title, count))
                .await?;
        }
        Err(err) => {
            error!("Failed to resolve playlist '{}': {}", query, err);
            ctx.send(embedded_messages::playlist_failed(&err)).await?;
        }
    }

    Ok(())
}
