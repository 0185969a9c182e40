// Export music utilities
pub mod embedded_messages;
pub mod music_manager;
pub mod playback;
pub mod player;
pub mod player_registry;
pub mod track_queue;
