pub mod join;
pub mod leave;
pub mod loop_track;
pub mod now;
pub mod pause;
pub mod play;
pub mod playlist;
pub mod queue;
pub mod resume;
pub mod skip;
pub mod stop;

pub mod audio_sources;
pub mod utils;

use crate::{CommandResult, Context};
