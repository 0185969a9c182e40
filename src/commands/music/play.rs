use super::*;
use crate::commands::music::audio_sources::{TrackResolver, RESOLVER};
use crate::commands::music::utils::{
    embedded_messages,
    music_manager::{MusicError, MusicManager},
};
use tracing::{error, info};

/// Play a track from a URL or search query
#[poise::command(slash_command, category = "Music")]
pub async fn play(
    ctx: Context<'_>,
    #[description = "URL or search query"] query: String,
) -> CommandResult {
    info!("Received play command with query: {}", query);

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

    // Resolution can take a while; keep the interaction alive.
    ctx.defer().await?;

    // Cheap pre-check so the user learns up front that only the first track
    // of a playlist URL will be queued here.
    if TrackResolver::is_url(&query) && RESOLVER.looks_like_playlist(&query).await {
        ctx.send(embedded_messages::playlist_detected(&query)).await?;
    }

    match RESOLVER.resolve(&query).await {
        Ok(track) => {
            if player.enqueue(track.clone()).await.is_none() {
                // The player was torn down while we were resolving; the
                // result is discarded without comment.
                return Ok(());
            }
            ctx.send(embedded_messages::added_to_queue(&track)).await?;
        }
        Err(err) => {
            error!("Failed to resolve '{}': {}", query, err);
            ctx.send(embedded_messages::resolve_failed(&err)).await?;
        }
    }

    Ok(())
}
