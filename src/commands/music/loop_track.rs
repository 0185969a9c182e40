use super::*;
use crate::commands::music::utils::{
    embedded_messages,
    music_manager::MusicError,
    player_registry::PLAYER_REGISTRY,
};

/// Toggle looping of the current track
#[poise::command(slash_command, rename = "loop", category = "Music")]
pub async fn loop_track(ctx: Context<'_>) -> CommandResult {
    let guild_id = ctx.guild_id().ok_or_else(|| {
        Box::new(MusicError::NotInGuild) as Box<dyn std::error::Error + Send + Sync>
    })?;

    let Some(player) = PLAYER_REGISTRY.get(guild_id) else {
        ctx.send(embedded_messages::not_connected()).await?;
        return Ok(());
    };

    let enabled = player.toggle_loop();
    ctx.send(embedded_messages::loop_toggled(enabled)).await?;

    Ok(())
}
