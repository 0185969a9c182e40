//! Implements [`MetadataExtractor`] over the `yt-dlp` command-line tool.
//!
//! Each call spawns one process and parses its JSON output; failure text on
//! stderr is classified into retryable network trouble versus everything
//! else.

use serde::Deserialize;
use serenity::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{ExtractError, ExtractMode, ExtractOptions, Extraction, MetadataExtractor, RawEntry};

/// Environment variable naming the extractor executable.
const PROGRAM_ENV: &str = "YTDLP_PATH";
const DEFAULT_PROGRAM: &str = "yt-dlp";

/// Socket timeout forwarded to yt-dlp, in seconds.
const SOCKET_TIMEOUT_SECS: &str = "15";

/// stderr markers that indicate transport-level trouble worth retrying.
const NETWORK_MARKERS: [&str; 8] = [
    "ssl",
    "certificate",
    "handshake",
    "timed out",
    "timeout",
    "connection reset",
    "temporary failure",
    "unable to connect",
];

pub struct YtDlpExtractor {
    program: String,
}

impl YtDlpExtractor {
    /// Uses the executable named by `YTDLP_PATH`, falling back to `yt-dlp`
    /// on the PATH.
    pub fn new() -> Self {
        let program = std::env::var(PROGRAM_ENV).unwrap_or_else(|_| DEFAULT_PROGRAM.to_string());
        Self { program }
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn build_args(options: &ExtractOptions, query: &str) -> Vec<String> {
        let mut args: Vec<String> = Vec::new();

        match options.mode {
            ExtractMode::Single => {
                args.extend(
                    ["-j", "--no-playlist", "--default-search", "auto"].map(String::from),
                );
            }
            ExtractMode::FlatPlaylist => {
                args.extend(["--dump-single-json", "--flat-playlist"].map(String::from));
            }
            ExtractMode::FullPlaylist => {
                args.extend(["--dump-single-json", "--yes-playlist"].map(String::from));
            }
        }

        // Flat listings carry no format data, so the format selector only
        // applies to the other modes.
        if options.mode != ExtractMode::FlatPlaylist {
            args.extend(["-f", "bestaudio/best"].map(String::from));
        }

        if let Some(limit) = options.entry_limit {
            args.extend(["--playlist-end".to_string(), limit.to_string()]);
        }

        if !options.verify_certificates {
            args.push("--no-check-certificates".to_string());
        }

        args.extend(
            ["--no-warnings", "-q", "--socket-timeout", SOCKET_TIMEOUT_SECS].map(String::from),
        );
        args.push(query.to_string());
        args
    }

    fn parse_output(stdout: &[u8]) -> Result<Extraction, ExtractError> {
        let payload: YtDlpPayload = serde_json::from_slice(stdout)
            .map_err(|err| ExtractError::Output(format!("bad JSON from yt-dlp: {err}")))?;
        Ok(payload.into_extraction())
    }
}

impl Default for YtDlpExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataExtractor for YtDlpExtractor {
    async fn extract(
        &self,
        query: &str,
        options: &ExtractOptions,
    ) -> Result<Extraction, ExtractError> {
        let args = Self::build_args(options, query);
        debug!("Running {} {}", self.program, args.join(" "));

        let output = Command::new(&self.program)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("yt-dlp exited with {} for '{}'", output.status, query);
            return Err(classify_failure(&stderr));
        }

        Self::parse_output(&output.stdout)
    }
}

/// Sort a non-zero exit into retryable network trouble or a plain backend
/// failure, based on the diagnostics yt-dlp printed.
fn classify_failure(stderr: &str) -> ExtractError {
    let lowered = stderr.to_lowercase();
    let summary = summarize(stderr);

    if NETWORK_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
    {
        ExtractError::Network(summary)
    } else {
        ExtractError::Backend(summary)
    }
}

/// The last non-empty stderr line is usually the actual error.
fn summarize(stderr: &str) -> String {
    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("yt-dlp failed without diagnostics")
        .to_string()
}

/// The subset of yt-dlp's JSON we consume. Everything else the backend
/// attaches is dropped here, at the boundary.
#[derive(Debug, Deserialize)]
struct YtDlpPayload {
    #[serde(rename = "_type")]
    kind: Option<String>,
    title: Option<String>,
    webpage_url: Option<String>,
    url: Option<String>,
    duration: Option<f64>,
    entries: Option<Vec<Option<YtDlpPayload>>>,
}

impl YtDlpPayload {
    fn into_extraction(self) -> Extraction {
        match self.entries {
            Some(entries) => {
                // yt-dlp emits `null` for entries it failed to extract; those
                // are dropped rather than failing the whole playlist.
                let entries = entries
                    .into_iter()
                    .flatten()
                    .map(YtDlpPayload::into_entry)
                    .collect();
                Extraction::Playlist {
                    title: self.title.filter(|title| !title.is_empty()),
                    entries,
                }
            }
            None => Extraction::Single(self.into_entry()),
        }
    }

    fn into_entry(self) -> RawEntry {
        // In flat listings an entry is a reference: its `url` is the page
        // URL, not a stream.
        let is_reference = self.kind.as_deref() == Some("url");
        let (stream_url, page_url) = if is_reference {
            (None, self.url.or(self.webpage_url))
        } else {
            (self.url, self.webpage_url)
        };

        RawEntry {
            title: self.title.filter(|title| !title.is_empty()),
            page_url,
            stream_url,
            duration_seconds: self.duration.map(|secs| secs.max(0.0) as u64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_options(verify: bool) -> ExtractOptions {
        ExtractOptions {
            mode: ExtractMode::Single,
            verify_certificates: verify,
            entry_limit: None,
        }
    }

    #[test]
    fn single_mode_args_keep_playlists_out() {
        let args = YtDlpExtractor::build_args(&single_options(false), "https://example.com/v");
        assert!(args.contains(&"-j".to_string()));
        assert!(args.contains(&"--no-playlist".to_string()));
        assert!(args.contains(&"--no-check-certificates".to_string()));
        assert_eq!(args.last().unwrap(), "https://example.com/v");
    }

    #[test]
    fn verified_calls_omit_the_certificate_override() {
        let args = YtDlpExtractor::build_args(&single_options(true), "https://example.com/v");
        assert!(!args.contains(&"--no-check-certificates".to_string()));
    }

    #[test]
    fn flat_mode_lists_without_formats() {
        let options = ExtractOptions {
            mode: ExtractMode::FlatPlaylist,
            verify_certificates: false,
            entry_limit: Some(100),
        };
        let args = YtDlpExtractor::build_args(&options, "https://example.com/list");
        assert!(args.contains(&"--flat-playlist".to_string()));
        assert!(args.contains(&"--playlist-end".to_string()));
        assert!(args.contains(&"100".to_string()));
        assert!(!args.contains(&"-f".to_string()));
    }

    #[test]
    fn ssl_failures_classify_as_network() {
        let err = classify_failure("ERROR: Unable to download: SSL: CERTIFICATE_VERIFY_FAILED");
        assert!(matches!(err, ExtractError::Network(_)));
    }

    #[test]
    fn unavailable_videos_classify_as_backend() {
        let err = classify_failure("ERROR: Video unavailable\n");
        assert!(matches!(err, ExtractError::Backend(_)));
    }

    #[test]
    fn summary_takes_the_last_meaningful_line() {
        let err = classify_failure("WARNING: noise\nERROR: timed out waiting for data\n\n");
        match err {
            ExtractError::Network(summary) => {
                assert_eq!(summary, "ERROR: timed out waiting for data")
            }
            other => panic!("expected network error, got {other:?}"),
        }
    }

    #[test]
    fn parses_a_single_video() {
        let json = br#"{
            "title": "some song",
            "webpage_url": "https://example.com/watch?v=1",
            "url": "https://cdn.example.com/1.m4a",
            "duration": 125.4
        }"#;
        match YtDlpExtractor::parse_output(json).unwrap() {
            Extraction::Single(entry) => {
                assert_eq!(entry.title.as_deref(), Some("some song"));
                assert_eq!(entry.page_url.as_deref(), Some("https://example.com/watch?v=1"));
                assert_eq!(entry.stream_url.as_deref(), Some("https://cdn.example.com/1.m4a"));
                assert_eq!(entry.duration_seconds, Some(125));
            }
            other => panic!("expected a single entry, got {other:?}"),
        }
    }

    #[test]
    fn parses_a_playlist_and_drops_null_entries() {
        let json = br#"{
            "title": "road trip",
            "entries": [
                {"title": "one", "webpage_url": "https://example.com/1", "url": "https://cdn/1"},
                null,
                {"title": "three", "webpage_url": "https://example.com/3", "url": "https://cdn/3"}
            ]
        }"#;
        match YtDlpExtractor::parse_output(json).unwrap() {
            Extraction::Playlist { title, entries } => {
                assert_eq!(title.as_deref(), Some("road trip"));
                assert_eq!(entries.len(), 2);
                assert_eq!(entries[1].title.as_deref(), Some("three"));
            }
            other => panic!("expected a playlist, got {other:?}"),
        }
    }

    #[test]
    fn flat_entries_expose_a_page_url_not_a_stream() {
        let json = br#"{
            "title": "flat list",
            "entries": [
                {"_type": "url", "title": "one", "url": "https://example.com/watch?v=1"}
            ]
        }"#;
        match YtDlpExtractor::parse_output(json).unwrap() {
            Extraction::Playlist { entries, .. } => {
                assert_eq!(entries[0].stream_url, None);
                assert_eq!(
                    entries[0].page_url.as_deref(),
                    Some("https://example.com/watch?v=1")
                );
            }
            other => panic!("expected a playlist, got {other:?}"),
        }
    }

    #[test]
    fn garbage_output_is_an_output_error() {
        let err = YtDlpExtractor::parse_output(b"not json at all").unwrap_err();
        assert!(matches!(err, ExtractError::Output(_)));
    }
}
