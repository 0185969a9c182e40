//! Process-wide guild → player map, the only mutable state shared across
//! guilds.

use std::sync::{Arc, LazyLock};

use dashmap::DashMap;
use serenity::model::id::GuildId;
use tracing::{debug, info};

use super::playback::{ChannelNotifier, PlaybackDriver};
use super::player::GuildPlayer;
use crate::config::PlayerSettings;

/// Everything a new player needs besides its guild id.
pub struct PlayerDeps {
    pub driver: Arc<dyn PlaybackDriver>,
    pub notifier: Arc<dyn ChannelNotifier>,
    pub settings: PlayerSettings,
}

/// The registry used by the command handlers.
pub static PLAYER_REGISTRY: LazyLock<Arc<PlayerRegistry>> =
    LazyLock::new(|| Arc::new(PlayerRegistry::new()));

#[derive(Default)]
pub struct PlayerRegistry {
    players: DashMap<GuildId, Arc<GuildPlayer>>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, guild_id: GuildId) -> Option<Arc<GuildPlayer>> {
        self.players
            .get(&guild_id)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Fetch the guild's player, creating it and starting its playback loop
    /// on first access. The map's entry API serializes concurrent calls for
    /// one guild, so exactly one player and one loop task ever exist. `deps`
    /// is only invoked when a player is actually created.
    pub fn get_or_create(
        self: &Arc<Self>,
        guild_id: GuildId,
        deps: impl FnOnce() -> PlayerDeps,
    ) -> Arc<GuildPlayer> {
        let entry = self.players.entry(guild_id).or_insert_with(|| {
            let deps = deps();
            info!("Creating player for guild {}", guild_id);
            let player = Arc::new(GuildPlayer::new(
                guild_id,
                deps.driver,
                deps.notifier,
                deps.settings,
            ));
            player.spawn_loop(Arc::clone(self));
            player
        });
        Arc::clone(entry.value())
    }

    /// Remove and tear down the guild's player. Safe to call when absent.
    pub async fn remove(&self, guild_id: GuildId) -> bool {
        match self.players.remove(&guild_id) {
            Some((_, player)) => {
                player.shutdown().await;
                true
            }
            None => {
                debug!("No player to remove for guild {}", guild_id);
                false
            }
        }
    }

    /// Drop the map entry without touching the player. Used by the loop's
    /// idle-timeout path, which handles its own disconnect.
    pub(crate) fn detach(&self, guild_id: GuildId) -> Option<Arc<GuildPlayer>> {
        self.players.remove(&guild_id).map(|(_, player)| player)
    }

    pub fn contains(&self, guild_id: GuildId) -> bool {
        self.players.contains_key(&guild_id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
