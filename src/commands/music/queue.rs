use super::*;
use crate::commands::music::utils::{
    embedded_messages,
    music_manager::MusicError,
    player_registry::PLAYER_REGISTRY,
};

/// Show the upcoming tracks
#[poise::command(slash_command, category = "Music")]
pub async fn queue(ctx: Context<'_>) -> CommandResult {
    let guild_id = ctx.guild_id().ok_or_else(|| {
        Box::new(MusicError::NotInGuild) as Box<dyn std::error::Error + Send + Sync>
    })?;

    let Some(player) = PLAYER_REGISTRY.get(guild_id) else {
        ctx.send(embedded_messages::queue_empty()).await?;
        return Ok(());
    };

    let snapshot = player.queue_snapshot().await;
    let reply = if snapshot.entries.is_empty() {
        embedded_messages::queue_empty()
    } else {
        embedded_messages::queue_list(&snapshot)
    };
    ctx.send(reply).await?;

    Ok(())
}
