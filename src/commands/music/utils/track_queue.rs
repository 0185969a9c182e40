//! Per-guild track queue: many producers (command handlers), one consumer
//! (the guild's playback loop).

use std::collections::VecDeque;

use tokio::sync::{Mutex, Notify};

use crate::commands::music::audio_sources::track::Track;

/// Non-destructive bounded preview of queue contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueSnapshot {
    pub entries: Vec<Track>,
    /// How many queued tracks fell outside the preview.
    pub remainder: usize,
}

/// FIFO queue with a suspending `pop`. The queue itself is the
/// synchronization boundary between command handlers and the loop; callers
/// need no extra locking around it.
#[derive(Default)]
pub struct TrackQueue {
    items: Mutex<VecDeque<Track>>,
    added: Notify,
}

impl TrackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a track and return the new queue length.
    pub async fn push(&self, track: Track) -> usize {
        let mut items = self.items.lock().await;
        items.push_back(track);
        let len = items.len();
        drop(items);

        self.added.notify_one();
        len
    }

    /// Append a batch in order and return the new queue length.
    pub async fn push_all(&self, tracks: impl IntoIterator<Item = Track>) -> usize {
        let mut items = self.items.lock().await;
        items.extend(tracks);
        let len = items.len();
        drop(items);

        self.added.notify_one();
        len
    }

    /// Wait for and remove the next track. Intended for the single playback
    /// loop consumer, which bounds the wait with `tokio::time::timeout`.
    pub async fn pop(&self) -> Track {
        loop {
            if let Some(track) = self.items.lock().await.pop_front() {
                return track;
            }
            // A push between the check above and this await leaves a permit
            // on the Notify, so the wakeup is never lost.
            self.added.notified().await;
        }
    }

    pub async fn snapshot(&self, limit: usize) -> QueueSnapshot {
        let items = self.items.lock().await;
        QueueSnapshot {
            entries: items.iter().take(limit).cloned().collect(),
            remainder: items.len().saturating_sub(limit),
        }
    }

    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.lock().await.is_empty()
    }

    pub async fn clear(&self) {
        self.items.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn track(title: &str, duration_seconds: u64) -> Track {
        Track::new(
            Some(title.to_string()),
            format!("https://example.com/{title}"),
            format!("https://cdn.example.com/{title}"),
            duration_seconds,
        )
    }

    #[tokio::test]
    async fn pops_in_fifo_order() {
        let queue = TrackQueue::new();
        queue.push(track("a", 1)).await;
        queue.push(track("b", 2)).await;
        queue.push(track("c", 3)).await;

        assert_eq!(queue.pop().await.title, "a");
        assert_eq!(queue.pop().await.title, "b");
        assert_eq!(queue.pop().await.title, "c");
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn push_reports_queue_length() {
        let queue = TrackQueue::new();
        assert_eq!(queue.push(track("a", 0)).await, 1);
        assert_eq!(queue.push_all([track("b", 0), track("c", 0)]).await, 3);
    }

    #[tokio::test]
    async fn pop_waits_for_a_producer() {
        let queue = Arc::new(TrackQueue::new());

        let consumer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.pop().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.push(track("late", 0)).await;

        let popped = tokio::time::timeout(Duration::from_secs(1), consumer)
            .await
            .expect("pop should wake after push")
            .unwrap();
        assert_eq!(popped.title, "late");
    }

    #[tokio::test]
    async fn pop_times_out_on_an_empty_queue() {
        let queue = TrackQueue::new();
        let result = tokio::time::timeout(Duration::from_millis(50), queue.pop()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn snapshot_previews_without_draining() {
        let queue = TrackQueue::new();
        queue.push(track("a", 65)).await;
        queue.push(track("b", 0)).await;

        let snapshot = queue.snapshot(10).await;
        let lines: Vec<String> = snapshot
            .entries
            .iter()
            .map(|t| format!("{}{}", t.title, t.duration_display()))
            .collect();
        assert_eq!(lines, vec!["a [1:05]".to_string(), "b".to_string()]);
        assert_eq!(snapshot.remainder, 0);
        assert_eq!(queue.len().await, 2);
    }

    #[tokio::test]
    async fn snapshot_counts_the_overflow() {
        let queue = TrackQueue::new();
        for index in 0..13 {
            queue.push(track(&format!("t{index}"), 0)).await;
        }

        let snapshot = queue.snapshot(10).await;
        assert_eq!(snapshot.entries.len(), 10);
        assert_eq!(snapshot.remainder, 3);
        assert_eq!(snapshot.entries[0].title, "t0");
    }
}
