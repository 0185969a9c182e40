use poise::{serenity_prelude as serenity, CreateReply};
use serenity::all::CreateEmbed;

use super::track_queue::QueueSnapshot;
use crate::commands::music::audio_sources::track::Track;

const COLOR_OK: u32 = 0x00ff00;
const COLOR_ERROR: u32 = 0xff0000;
const COLOR_INFO: u32 = 0x00b0f0;

/// User-facing error text is capped at this many characters.
const ERROR_PREVIEW_LEN: usize = 100;

fn ok_reply(title: &str, description: String) -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title(title)
            .description(description)
            .color(COLOR_OK),
    )
}

fn info_reply(title: &str, description: String) -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title(title)
            .description(description)
            .color(COLOR_INFO),
    )
}

fn error_reply(description: String) -> CreateReply {
    CreateReply::default()
        .embed(
            CreateEmbed::new()
                .title("❌ Error")
                .description(description)
                .color(COLOR_ERROR),
        )
        .ephemeral(true)
}

/// Truncate backend error text for chat display.
pub fn truncate_error(text: &str) -> String {
    if text.chars().count() <= ERROR_PREVIEW_LEN {
        return text.to_string();
    }
    let preview: String = text.chars().take(ERROR_PREVIEW_LEN).collect();
    format!("{preview}...")
}

fn track_line(track: &Track) -> String {
    format!("**{}**{}", track.title, track.duration_display())
}

pub fn joined_channel(name: &str) -> CreateReply {
    ok_reply("✅ Connected", format!("Joined **{name}**"))
}

pub fn user_not_in_voice_channel() -> CreateReply {
    error_reply("You are not connected to a voice channel.".to_string())
}

pub fn not_connected() -> CreateReply {
    error_reply("I'm not connected to a voice channel.".to_string())
}

pub fn voice_error(error: &super::music_manager::MusicError) -> CreateReply {
    error_reply(truncate_error(&error.to_string()))
}

pub fn added_to_queue(track: &Track) -> CreateReply {
    ok_reply("🎵 Added to Queue", track_line(track))
}

pub fn playlist_detected(url: &str) -> CreateReply {
    info_reply(
        "ℹ️ Playlist Detected",
        format!("Queueing only the first track. Use `/playlist {url}` to queue all of it."),
    )
}

pub fn added_playlist(title: &str, count: usize) -> CreateReply {
    ok_reply(
        "🎵 Added Playlist",
        format!("**{title}** ({count} tracks)"),
    )
}

pub fn not_a_playlist(track: &Track) -> CreateReply {
    info_reply(
        "ℹ️ Not a Playlist",
        format!("Added single track: {}", track_line(track)),
    )
}

pub fn playlist_empty() -> CreateReply {
    error_reply("The playlist has no tracks, or none could be resolved.".to_string())
}

pub fn resolve_failed(error: &crate::commands::music::audio_sources::ResolveError) -> CreateReply {
    error_reply(format!(
        "{}\n💡 Try another track or a direct link.",
        truncate_error(&error.to_string())
    ))
}

pub fn playlist_failed(error: &crate::commands::music::audio_sources::ResolveError) -> CreateReply {
    error_reply(format!(
        "{}\n💡 Check the playlist link.",
        truncate_error(&error.to_string())
    ))
}

pub fn paused(track: Option<&Track>) -> CreateReply {
    let description = track.map(track_line).unwrap_or_default();
    ok_reply("⏸️ Paused", description)
}

pub fn resumed(track: Option<&Track>) -> CreateReply {
    let description = track.map(track_line).unwrap_or_default();
    ok_reply("▶️ Resumed", description)
}

pub fn already_paused() -> CreateReply {
    info_reply("⏸️ Paused", "The track is already paused.".to_string())
}

pub fn not_paused() -> CreateReply {
    info_reply("▶️ Playing", "The track is not paused.".to_string())
}

pub fn nothing_playing() -> CreateReply {
    info_reply("🔇 Nothing Playing", "Nothing is playing right now.".to_string())
}

pub fn skipped() -> CreateReply {
    ok_reply("⏭️ Skipped", "Skipped to the next track.".to_string())
}

pub fn loop_toggled(enabled: bool) -> CreateReply {
    let state = if enabled { "enabled" } else { "disabled" };
    ok_reply("🔄 Loop", format!("Track loop {state}."))
}

pub fn queue_empty() -> CreateReply {
    info_reply("📋 Queue", "The queue is empty.".to_string())
}

pub fn queue_list(snapshot: &QueueSnapshot) -> CreateReply {
    ok_reply("📋 Queue", format_queue(snapshot))
}

pub fn now_playing(track: &Track) -> CreateReply {
    ok_reply("🎵 Now Playing", track_line(track))
}

pub fn stopped() -> CreateReply {
    ok_reply(
        "⏹️ Stopped",
        "Stopped playback and cleared the queue.".to_string(),
    )
}

pub fn left_voice() -> CreateReply {
    ok_reply("👋 Goodbye", "Left the voice channel.".to_string())
}

fn format_queue(snapshot: &QueueSnapshot) -> String {
    let mut lines: Vec<String> = snapshot
        .entries
        .iter()
        .enumerate()
        .map(|(index, track)| format!("{}. {}{}", index + 1, track.title, track.duration_display()))
        .collect();

    if snapshot.remainder > 0 {
        lines.push(format!("... and {} more tracks", snapshot.remainder));
    }

    lines.join("\n")
}
