//! Track resolution: turns user queries (URLs or search terms) into playable
//! [`Track`]s through an external metadata extractor, and expands playlist
//! URLs into ordered batches of tracks.

/// Submodule defining the `Track` struct produced by resolution.
pub mod track;
/// Submodule implementing the `MetadataExtractor` trait over `yt-dlp`.
pub mod ytdl;

use std::sync::{Arc, LazyLock};

use futures::stream::{self, StreamExt};
use serenity::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::ResolverSettings;
use track::{Track, UNKNOWN_TITLE};
use ytdl::YtDlpExtractor;

/// Placeholder used when a playlist carries no title.
pub const UNKNOWN_PLAYLIST: &str = "Unknown Playlist";

/// The resolver used by the command handlers.
pub static RESOLVER: LazyLock<TrackResolver> = LazyLock::new(|| {
    TrackResolver::new(
        Arc::new(YtDlpExtractor::new()),
        ResolverSettings::from_env(),
    )
});

/// A specialized `Result` type for resolution operations.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Failures reported by the metadata extractor backend.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Transport-level failure (TLS handshake, timeout, DNS). Worth retrying.
    #[error("network failure: {0}")]
    Network(String),

    /// The backend ran but could not produce a usable result.
    #[error("extraction failed: {0}")]
    Backend(String),

    /// The backend produced output we could not interpret.
    #[error("unreadable extractor output: {0}")]
    Output(String),

    /// The backend executable could not be started at all.
    #[error("failed to launch extractor: {0}")]
    Launch(#[from] std::io::Error),
}

/// Failures surfaced to the command layer by the resolver.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Transient failures kept failing for the whole attempt budget.
    #[error("still failing after {attempts} attempts: {source}")]
    Network { attempts: u32, source: ExtractError },

    /// The backend answered, but with nothing playable.
    #[error("no playable audio found for '{0}'")]
    NoAudio(String),

    /// Any other backend failure; not retried.
    #[error(transparent)]
    Backend(ExtractError),
}

/// How much of the target the extractor should expand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractMode {
    /// One track; playlist URLs collapse to their first entry.
    Single,
    /// Shallow playlist listing without per-entry stream resolution.
    FlatPlaylist,
    /// Full playlist expansion with stream data where available.
    FullPlaylist,
}

/// Per-call extractor options. Certificate verification is explicit here so
/// concurrent resolutions never share ambient TLS state.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub mode: ExtractMode,
    pub verify_certificates: bool,
    pub entry_limit: Option<usize>,
}

/// One normalized entry out of the backend. Field presence varies by
/// extraction mode; everything dynamic is flattened into these four fields.
#[derive(Debug, Clone, Default)]
pub struct RawEntry {
    pub title: Option<String>,
    pub page_url: Option<String>,
    pub stream_url: Option<String>,
    pub duration_seconds: Option<u64>,
}

/// Shape of a backend response.
#[derive(Debug, Clone)]
pub enum Extraction {
    Single(RawEntry),
    Playlist {
        title: Option<String>,
        entries: Vec<RawEntry>,
    },
}

/// Boundary to the media resolver backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataExtractor: Send + Sync {
    async fn extract(
        &self,
        query: &str,
        options: &ExtractOptions,
    ) -> Result<Extraction, ExtractError>;
}

/// A fully expanded playlist. An empty `tracks` is a valid outcome: the
/// caller decides how to present "nothing resolved".
#[derive(Debug, Clone)]
pub struct PlaylistResolution {
    pub title: String,
    pub tracks: Vec<Track>,
}

/// Resolves queries into tracks, retrying transient backend failures and
/// disambiguating playlists from single items.
pub struct TrackResolver {
    extractor: Arc<dyn MetadataExtractor>,
    settings: ResolverSettings,
}

impl TrackResolver {
    pub fn new(extractor: Arc<dyn MetadataExtractor>, settings: ResolverSettings) -> Self {
        Self {
            extractor,
            settings,
        }
    }

    /// Check whether the input parses as an http(s) URL.
    pub fn is_url(input: &str) -> bool {
        Url::parse(input)
            .map(|url| matches!(url.scheme(), "http" | "https"))
            .unwrap_or(false)
    }

    /// Fast-path playlist detection from the `list` query parameter alone.
    pub fn has_playlist_param(input: &str) -> bool {
        Url::parse(input)
            .map(|url| {
                url.query_pairs()
                    .any(|(key, value)| key == "list" && !value.is_empty())
            })
            .unwrap_or(false)
    }

    /// Non-URL input becomes a "first search result" query.
    fn search_target(query: &str) -> String {
        if Self::is_url(query) {
            query.to_string()
        } else {
            format!("ytsearch1:{query}")
        }
    }

    fn single_options(&self) -> ExtractOptions {
        ExtractOptions {
            mode: ExtractMode::Single,
            verify_certificates: self.settings.verify_certificates,
            entry_limit: None,
        }
    }

    fn playlist_options(&self, mode: ExtractMode) -> ExtractOptions {
        ExtractOptions {
            mode,
            verify_certificates: self.settings.verify_certificates,
            entry_limit: Some(self.settings.playlist_entry_cap),
        }
    }

    /// Resolve a single track from a URL or search term.
    ///
    /// Network-class extraction failures are retried up to the configured
    /// attempt budget with a fixed delay; everything else fails immediately.
    pub async fn resolve(&self, query: &str) -> ResolveResult<Track> {
        let target = Self::search_target(query);
        let options = self.single_options();

        let mut attempt = 0;
        let extraction = loop {
            attempt += 1;
            match self.extractor.extract(&target, &options).await {
                Ok(extraction) => break extraction,
                Err(ExtractError::Network(reason)) => {
                    if attempt >= self.settings.max_attempts {
                        return Err(ResolveError::Network {
                            attempts: attempt,
                            source: ExtractError::Network(reason),
                        });
                    }
                    warn!(
                        "Network failure resolving '{}' (attempt {}/{}): {}",
                        query, attempt, self.settings.max_attempts, reason
                    );
                    tokio::time::sleep(self.settings.retry_delay).await;
                }
                Err(err) => return Err(ResolveError::Backend(err)),
            }
        };

        let entry = match extraction {
            Extraction::Single(entry) => entry,
            // A playlist-shaped answer to a single-track request collapses to
            // its first entry.
            Extraction::Playlist { entries, .. } => entries
                .into_iter()
                .next()
                .ok_or_else(|| ResolveError::NoAudio(query.to_string()))?,
        };

        self.entry_to_track(entry)
            .ok_or_else(|| ResolveError::NoAudio(query.to_string()))
    }

    /// Classify a query as a playlist.
    ///
    /// The `list` URL parameter decides without touching the network; only
    /// parameter-less URLs pay for a shallow extraction probe. Probe errors
    /// classify as "not a playlist" so an odd URL still plays as a track.
    pub async fn looks_like_playlist(&self, query: &str) -> bool {
        if !Self::is_url(query) {
            return false;
        }
        if Self::has_playlist_param(query) {
            return true;
        }

        let options = self.playlist_options(ExtractMode::FlatPlaylist);
        match self.extractor.extract(query, &options).await {
            Ok(Extraction::Playlist { entries, .. }) => !entries.is_empty(),
            Ok(Extraction::Single(_)) => false,
            Err(err) => {
                debug!(
                    "Playlist probe failed for '{}', treating as a single track: {}",
                    query, err
                );
                // The parameter fast path already said no.
                false
            }
        }
    }

    /// Expand a playlist URL into its tracks, in backend order.
    ///
    /// Entry-level failures are skipped, not fatal; entries carrying only a
    /// page URL get one follow-up resolution each, fanned out with bounded
    /// concurrency while preserving order.
    pub async fn resolve_playlist(&self, query: &str) -> ResolveResult<PlaylistResolution> {
        let options = self.playlist_options(ExtractMode::FullPlaylist);
        let extraction = self
            .extractor
            .extract(query, &options)
            .await
            .map_err(|err| match err {
                ExtractError::Network(_) => ResolveError::Network {
                    attempts: 1,
                    source: err,
                },
                other => ResolveError::Backend(other),
            })?;

        let (title, entries) = match extraction {
            Extraction::Single(entry) => {
                // Not actually a playlist; return the one track under its own
                // title and let the caller phrase it.
                let title = entry
                    .title
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_TITLE.to_string());
                let tracks = self.entry_to_track(entry).into_iter().collect();
                return Ok(PlaylistResolution { title, tracks });
            }
            Extraction::Playlist { title, entries } => (
                title.unwrap_or_else(|| UNKNOWN_PLAYLIST.to_string()),
                entries,
            ),
        };

        let total = entries.len();
        let cap = self.settings.playlist_entry_cap;
        if total > cap {
            info!(
                "Playlist '{}' has {} entries, resolving only the first {}",
                title, total, cap
            );
        }

        let resolved: Vec<Option<Track>> = stream::iter(entries.into_iter().take(cap).enumerate())
            .map(|(index, entry)| self.expand_entry(index, entry))
            .buffered(self.settings.fallback_concurrency)
            .collect()
            .await;

        let tracks: Vec<Track> = resolved.into_iter().flatten().collect();
        info!("Resolved {} of {} playlist entries for '{}'", tracks.len(), total.min(cap), title);

        Ok(PlaylistResolution { title, tracks })
    }

    /// Resolve one playlist entry, issuing a follow-up extraction when the
    /// playlist data carries only a page URL. Failures skip the entry.
    async fn expand_entry(&self, index: usize, entry: RawEntry) -> Option<Track> {
        if entry.stream_url.is_some() {
            return self.entry_to_track(entry);
        }

        let Some(page_url) = entry.page_url.clone() else {
            warn!("Playlist entry {} has no stream or page URL, skipping", index + 1);
            return None;
        };

        match self.extractor.extract(&page_url, &self.single_options()).await {
            Ok(Extraction::Single(mut full)) => {
                if full.title.is_none() {
                    full.title = entry.title;
                }
                self.entry_to_track(full)
            }
            Ok(Extraction::Playlist { entries, .. }) => entries
                .into_iter()
                .next()
                .and_then(|first| self.entry_to_track(first)),
            Err(err) => {
                warn!(
                    "Skipping playlist entry {} ({}): {}",
                    index + 1,
                    page_url,
                    err
                );
                None
            }
        }
    }

    /// An entry without a stream locator is unplayable and yields `None`.
    fn entry_to_track(&self, entry: RawEntry) -> Option<Track> {
        let stream_locator = entry.stream_url?;
        let source_url = entry.page_url.unwrap_or_else(|| stream_locator.clone());
        Some(Track::new(
            entry.title,
            source_url,
            stream_locator,
            entry.duration_seconds.unwrap_or(0),
        ))
    }
}
