use super::*;
use crate::commands::music::utils::{
    embedded_messages,
    music_manager::MusicError,
    player::ControlOutcome,
    player_registry::PLAYER_REGISTRY,
};

/// Pause the current track
#[poise::command(slash_command, category = "Music")]
pub async fn pause(ctx: Context<'_>) -> CommandResult {
    let guild_id = ctx.guild_id().ok_or_else(|| {
        Box::new(MusicError::NotInGuild) as Box<dyn std::error::Error + Send + Sync>
    })?;

    let Some(player) = PLAYER_REGISTRY.get(guild_id) else {
        ctx.send(embedded_messages::nothing_playing()).await?;
        return Ok(());
    };

    let reply = match player.pause().await? {
        ControlOutcome::Paused => embedded_messages::paused(player.now_playing().await.as_ref()),
        ControlOutcome::AlreadyPaused => embedded_messages::already_paused(),
        _ => embedded_messages::nothing_playing(),
    };
    ctx.send(reply).await?;

    Ok(())
}
