//! Runtime settings for the player and the resolver, read from the
//! environment with built-in defaults.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Settings consumed by each guild's playback loop.
#[derive(Debug, Clone)]
pub struct PlayerSettings {
    /// How long the loop waits on an empty queue before disconnecting.
    pub idle_timeout: Duration,
    /// Initial playback volume, clamped to `0.0..=1.0`.
    pub default_volume: f32,
    /// Maximum number of queue entries shown by the queue command.
    pub queue_preview: usize,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(180),
            default_volume: 0.5,
            queue_preview: 10,
        }
    }
}

impl PlayerSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base = Self::default();
        Self {
            idle_timeout: Duration::from_secs(parse_or(
                &lookup,
                "PLAYER_IDLE_TIMEOUT_SECS",
                base.idle_timeout.as_secs(),
            )),
            default_volume: parse_or(&lookup, "PLAYER_DEFAULT_VOLUME", base.default_volume)
                .clamp(0.0, 1.0),
            queue_preview: parse_or(&lookup, "PLAYER_QUEUE_PREVIEW", base.queue_preview),
        }
    }
}

/// Settings consumed by the track resolver.
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    /// Attempt budget for transient extraction failures.
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub retry_delay: Duration,
    /// Upper bound on playlist entries considered during expansion.
    pub playlist_entry_cap: usize,
    /// Concurrent per-entry fallback resolutions during playlist expansion.
    pub fallback_concurrency: usize,
    /// Whether the extractor should verify TLS certificates.
    pub verify_certificates: bool,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            retry_delay: Duration::from_secs(2),
            playlist_entry_cap: 100,
            fallback_concurrency: 4,
            verify_certificates: false,
        }
    }
}

impl ResolverSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base = Self::default();
        Self {
            max_attempts: parse_or(&lookup, "RESOLVER_MAX_ATTEMPTS", base.max_attempts).max(1),
            retry_delay: Duration::from_secs(parse_or(
                &lookup,
                "RESOLVER_RETRY_DELAY_SECS",
                base.retry_delay.as_secs(),
            )),
            playlist_entry_cap: parse_or(&lookup, "PLAYLIST_ENTRY_CAP", base.playlist_entry_cap),
            fallback_concurrency: parse_or(
                &lookup,
                "PLAYLIST_FALLBACK_CONCURRENCY",
                base.fallback_concurrency,
            )
            .max(1),
            verify_certificates: parse_or(
                &lookup,
                "YTDLP_VERIFY_CERTIFICATES",
                base.verify_certificates,
            ),
        }
    }
}

/// Parse an environment value, falling back to the default on absence or
/// garbage rather than failing startup.
fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key)
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}
