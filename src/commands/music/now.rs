use super::*;
use crate::commands::music::utils::{
    embedded_messages,
    music_manager::MusicError,
    player_registry::PLAYER_REGISTRY,
};

/// Show the currently playing track
#[poise::command(slash_command, category = "Music")]
pub async fn now(ctx: Context<'_>) -> CommandResult {
    let guild_id = ctx.guild_id().ok_or_else(|| {
        Box::new(MusicError::NotInGuild) as Box<dyn std::error::Error + Send + Sync>
    })?;

    let current = match PLAYER_REGISTRY.get(guild_id) {
        Some(player) => player.now_playing().await,
        None => None,
    };

    let reply = match current {
        Some(track) => embedded_messages::now_playing(&track),
        None => embedded_messages::nothing_playing(),
    };
    ctx.send(reply).await?;

    Ok(())
}
