use super::*;
use crate::commands::music::utils::{
    embedded_messages,
    music_manager::MusicError,
    player::ControlOutcome,
    player_registry::PLAYER_REGISTRY,
};

/// Skip the currently playing track
#[poise::command(slash_command, category = "Music")]
pub async fn skip(ctx: Context<'_>) -> CommandResult {
    let guild_id = ctx.guild_id().ok_or_else(|| {
        Box::new(MusicError::NotInGuild) as Box<dyn std::error::Error + Send + Sync>
    })?;

    let Some(player) = PLAYER_REGISTRY.get(guild_id) else {
        ctx.send(embedded_messages::nothing_playing()).await?;
        return Ok(());
    };

    let reply = match player.skip().await? {
        ControlOutcome::Skipped => embedded_messages::skipped(),
        _ => embedded_messages::nothing_playing(),
    };
    ctx.send(reply).await?;

    Ok(())
}
