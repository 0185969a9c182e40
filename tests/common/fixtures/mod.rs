//! Sample data and settings used across the integration tests.

use std::time::Duration;

use serenity::model::id::GuildId;

use chime::commands::music::audio_sources::track::Track;
use chime::config::{PlayerSettings, ResolverSettings};

pub fn guild(id: u64) -> GuildId {
    GuildId::new(id)
}

pub fn track(title: &str, duration_seconds: u64) -> Track {
    Track::new(
        Some(title.to_string()),
        format!("https://example.com/{title}"),
        format!("https://cdn.example.com/{title}"),
        duration_seconds,
    )
}

/// Player settings with a test-sized idle timeout.
pub fn player_settings(idle_timeout: Duration) -> PlayerSettings {
    PlayerSettings {
        idle_timeout,
        ..PlayerSettings::default()
    }
}

/// Resolver settings with the retry delay shrunk so retry tests finish
/// quickly.
pub fn resolver_settings() -> ResolverSettings {
    ResolverSettings {
        retry_delay: Duration::from_millis(1),
        ..ResolverSettings::default()
    }
}
