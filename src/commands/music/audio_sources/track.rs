//! Defines the `Track` value object, the unit of work handed from the
//! resolver to a guild's playback loop.

/// Placeholder used when the backend reports no title.
pub const UNKNOWN_TITLE: &str = "Unknown Track";

/// A resolved, playable track. Constructed by the resolver and read-only
/// afterwards; playback and queue code never mutate it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// Display title.
    pub title: String,
    /// Canonical page URL the track was resolved from.
    pub source_url: String,
    /// Direct media URL or local path; opaque here, consumed by the decoder.
    pub stream_locator: String,
    /// Length in seconds, 0 when unknown.
    pub duration_seconds: u64,
}

impl Track {
    pub fn new(
        title: Option<String>,
        source_url: impl Into<String>,
        stream_locator: impl Into<String>,
        duration_seconds: u64,
    ) -> Self {
        let title = title
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_TITLE.to_string());

        Self {
            title,
            source_url: source_url.into(),
            stream_locator: stream_locator.into(),
            duration_seconds,
        }
    }

    /// Duration rendered for chat messages: empty when unknown, otherwise
    /// `" [M:SS]"` with zero-padded seconds.
    pub fn duration_display(&self) -> String {
        if self.duration_seconds == 0 {
            return String::new();
        }

        let minutes = self.duration_seconds / 60;
        let seconds = self.duration_seconds % 60;
        format!(" [{}:{:02}]", minutes, seconds)
    }
}
