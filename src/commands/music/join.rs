use super::*;
use crate::commands::music::utils::{
    embedded_messages,
    music_manager::{MusicError, MusicManager},
};
use tracing::info;

/// Join your current voice channel
#[poise::command(slash_command, category = "Music")]
pub async fn join(ctx: Context<'_>) -> CommandResult {
    let guild_id = ctx.guild_id().ok_or_else(|| {
        Box::new(MusicError::NotInGuild) as Box<dyn std::error::Error + Send + Sync>
    })?;

    let channel_id =
        match MusicManager::get_user_voice_channel(ctx.serenity_context(), guild_id, ctx.author().id)
        {
            Ok(channel_id) => channel_id,
            Err(_) => {
                ctx.send(embedded_messages::user_not_in_voice_channel())
                    .await?;
                return Ok(());
            }
        };

    // Connect, or move if we are already in another channel. Joining the
    // channel we are in is a no-op at the gateway.
    if let Err(err) =
        MusicManager::join_channel(ctx.serenity_context(), guild_id, channel_id).await
    {
        ctx.send(embedded_messages::voice_error(&err)).await?;
        return Ok(());
    }

    // Connecting also creates the guild's player, so the idle timeout covers
    // a bot that joined and never got a track.
    if let Err(err) = MusicManager::ensure_player(&ctx).await {
        ctx.send(embedded_messages::voice_error(&err)).await?;
        return Ok(());
    }

    info!("Joined voice channel {} in guild {}", channel_id, guild_id);

    let name = channel_id
        .name(ctx)
        .await
        .unwrap_or_else(|_| "voice".to_string());
    ctx.send(embedded_messages::joined_channel(&name)).await?;

    Ok(())
}
