//! Hand-rolled fakes for the external boundaries: the voice transport, the
//! channel notifier, and the metadata extractor.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use chime::commands::music::audio_sources::track::Track;
use chime::commands::music::audio_sources::{
    ExtractError, ExtractMode, ExtractOptions, Extraction, MetadataExtractor,
};
use chime::commands::music::utils::music_manager::MusicError;
use chime::commands::music::utils::playback::{
    ChannelNotifier, CompletionSignal, PlaybackDriver, PlaybackHandle, PlaybackState,
};

/// Transport handle whose lifecycle the test drives by hand.
pub struct FakeHandle {
    state: Mutex<PlaybackState>,
    done: Mutex<Option<CompletionSignal>>,
}

impl FakeHandle {
    fn new(done: CompletionSignal) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(PlaybackState::Playing),
            done: Mutex::new(Some(done)),
        })
    }

    fn fire(&self) {
        if let Some(signal) = self.done.lock().unwrap().take() {
            let _ = signal.send(());
        }
    }

    /// Simulate the track reaching its natural end.
    pub fn complete(&self) {
        *self.state.lock().unwrap() = PlaybackState::Ended;
        self.fire();
    }
}

#[async_trait]
impl PlaybackHandle for FakeHandle {
    async fn pause(&self) -> Result<(), MusicError> {
        *self.state.lock().unwrap() = PlaybackState::Paused;
        Ok(())
    }

    async fn resume(&self) -> Result<(), MusicError> {
        *self.state.lock().unwrap() = PlaybackState::Playing;
        Ok(())
    }

    async fn stop(&self) -> Result<(), MusicError> {
        *self.state.lock().unwrap() = PlaybackState::Ended;
        self.fire();
        Ok(())
    }

    async fn state(&self) -> PlaybackState {
        *self.state.lock().unwrap()
    }
}

/// Records every successful play and hands out the matching [`FakeHandle`]s.
#[derive(Default)]
pub struct FakeDriver {
    plays: Mutex<Vec<(Track, Arc<FakeHandle>)>>,
    failing_titles: Mutex<Vec<String>>,
    disconnects: AtomicUsize,
}

impl FakeDriver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make `play` fail for every track with this title.
    pub fn fail_title(&self, title: &str) {
        self.failing_titles.lock().unwrap().push(title.to_string());
    }

    pub fn play_count(&self) -> usize {
        self.plays.lock().unwrap().len()
    }

    pub fn played_titles(&self) -> Vec<String> {
        self.plays
            .lock()
            .unwrap()
            .iter()
            .map(|(track, _)| track.title.clone())
            .collect()
    }

    pub fn handle(&self, index: usize) -> Arc<FakeHandle> {
        Arc::clone(&self.plays.lock().unwrap()[index].1)
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlaybackDriver for FakeDriver {
    async fn play(
        &self,
        track: &Track,
        _volume: f32,
        on_done: CompletionSignal,
    ) -> Result<Arc<dyn PlaybackHandle>, MusicError> {
        if self
            .failing_titles
            .lock()
            .unwrap()
            .iter()
            .any(|title| title == &track.title)
        {
            return Err(MusicError::Playback(format!(
                "cannot decode '{}'",
                track.title
            )));
        }

        let handle = FakeHandle::new(on_done);
        self.plays
            .lock()
            .unwrap()
            .push((track.clone(), Arc::clone(&handle)));
        Ok(handle)
    }

    async fn disconnect(&self) -> Result<(), MusicError> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Captures what the playback loop announces to the text channel.
#[derive(Default)]
pub struct RecordingNotifier {
    announced: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn announced(&self) -> Vec<String> {
        self.announced.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChannelNotifier for RecordingNotifier {
    async fn now_playing(&self, track: &Track) {
        self.announced.lock().unwrap().push(track.title.clone());
    }

    async fn playback_error(&self, track: &Track, error: &MusicError) {
        self.errors
            .lock()
            .unwrap()
            .push(format!("{}: {}", track.title, error));
    }
}

/// Extractor whose responses are scripted per query, replayed in order. An
/// unscripted call fails the test.
#[derive(Default)]
pub struct ScriptedExtractor {
    responses: Mutex<HashMap<String, VecDeque<Result<Extraction, ExtractError>>>>,
    calls: Mutex<Vec<(String, ExtractMode)>>,
}

impl ScriptedExtractor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script(&self, query: &str, response: Result<Extraction, ExtractError>) {
        self.responses
            .lock()
            .unwrap()
            .entry(query.to_string())
            .or_default()
            .push_back(response);
    }

    /// Every call made so far, as (query, mode) pairs.
    pub fn calls(&self) -> Vec<(String, ExtractMode)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetadataExtractor for ScriptedExtractor {
    async fn extract(
        &self,
        query: &str,
        options: &ExtractOptions,
    ) -> Result<Extraction, ExtractError> {
        self.calls
            .lock()
            .unwrap()
            .push((query.to_string(), options.mode));

        self.responses
            .lock()
            .unwrap()
            .get_mut(query)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| panic!("no scripted response left for '{query}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fake_handle_tracks_pause_state() {
        let (done, _keep_alive) = tokio::sync::oneshot::channel();
        let handle = FakeHandle::new(done);

        assert_eq!(handle.state().await, PlaybackState::Playing);
        handle.pause().await.unwrap();
        assert_eq!(handle.state().await, PlaybackState::Paused);
        handle.resume().await.unwrap();
        assert_eq!(handle.state().await, PlaybackState::Playing);
    }

    #[tokio::test]
    async fn stop_fires_the_completion_signal() {
        let (done, released) = tokio::sync::oneshot::channel();
        let handle = FakeHandle::new(done);

        handle.stop().await.unwrap();
        assert_eq!(handle.state().await, PlaybackState::Ended);
        released.await.unwrap();
    }
}
