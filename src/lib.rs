//! Chime is a Discord music bot: per-guild queues, playlist expansion, and a
//! yt-dlp backed track resolver feeding songbird voice playback.

use std::sync::LazyLock;

pub mod commands;
pub mod config;

/// Shared HTTP client handed to songbird's stream inputs.
pub static HTTP_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(reqwest::Client::new);

// Define the user data type we'll be using in our bot
pub struct Data {} // User data, which is stored and accessible in all command invocations

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
pub type CommandResult = Result<(), Error>;
