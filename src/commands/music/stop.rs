use super::*;
use crate::commands::music::utils::{
    embedded_messages,
    music_manager::{MusicError, MusicManager},
    player_registry::PLAYER_REGISTRY,
};

/// Stop the music, clear the queue, and leave the voice channel
#[poise::command(slash_command, category = "Music")]
pub async fn stop(ctx: Context<'_>) -> CommandResult {
    let guild_id = ctx.guild_id().ok_or_else(|| {
        Box::new(MusicError::NotInGuild) as Box<dyn std::error::Error + Send + Sync>
    })?;

    // Tearing the player down cancels its loop and releases the voice
    // connection through its driver.
    let removed = PLAYER_REGISTRY.remove(guild_id).await;

    if !removed {
        // No player; drop any stray voice connection directly.
        if MusicManager::leave_channel(ctx.serenity_context(), guild_id)
            .await
            .is_err()
        {
            ctx.send(embedded_messages::not_connected()).await?;
            return Ok(());
        }
    }

    ctx.send(embedded_messages::stopped()).await?;

    Ok(())
}
