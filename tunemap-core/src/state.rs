//! Shared session state
//!
//! Thread-safe shared state for the progress collection and completed-island
//! set. All mutation goes through the unlock engine, the submission pipeline
//! and the session store; everything else only reads.

use std::collections::{BTreeSet, HashMap};
use tokio::sync::{broadcast, RwLock};
use tunemap_common::events::QuestEvent;
use tunemap_common::progress::{Snapshot, SongPhase, SongProgress};

/// Shared state accessible by all components
///
/// Uses RwLock for concurrent read access; user-driven transitions and the
/// recurring tick serialize on the same write lock, so every update is a
/// single consistent read-modify-write.
pub struct SharedState {
    /// Per-song progress, keyed by song title
    pub song_progress: RwLock<HashMap<String, SongProgress>>,

    /// Islands that crossed the completion threshold this session
    pub completed_islands: RwLock<BTreeSet<u32>>,

    /// Event broadcaster for the presentation layer
    pub event_tx: broadcast::Sender<QuestEvent>,
}

impl SharedState {
    /// Create new shared state with empty progress
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(100); // Buffer up to 100 events
        Self {
            song_progress: RwLock::new(HashMap::new()),
            completed_islands: RwLock::new(BTreeSet::new()),
            event_tx,
        }
    }

    /// Broadcast an event to all listeners
    pub fn broadcast_event(&self, event: QuestEvent) {
        // Ignore send errors (no receivers is OK)
        let _ = self.event_tx.send(event);
    }

    /// Subscribe to the event stream
    pub fn subscribe_events(&self) -> broadcast::Receiver<QuestEvent> {
        self.event_tx.subscribe()
    }

    /// Clone the progress entry for a song
    pub async fn song(&self, title: &str) -> Option<SongProgress> {
        self.song_progress.read().await.get(title).cloned()
    }

    /// Phase of a song; None = untouched (no entry yet)
    pub async fn phase(&self, title: &str) -> Option<SongPhase> {
        self.song_progress.read().await.get(title).map(|p| p.phase())
    }

    /// Title of the song currently holding the global unlock timer, if any
    pub async fn running_song(&self) -> Option<String> {
        self.song_progress
            .read()
            .await
            .iter()
            .find(|(_, p)| p.unlock_end_time.is_some())
            .map(|(title, _)| title.clone())
    }

    /// Number of submitted songs among the given titles
    pub async fn submitted_count(&self, titles: &[String]) -> usize {
        let progress = self.song_progress.read().await;
        titles
            .iter()
            .filter(|t| progress.get(*t).map(|p| p.is_submitted).unwrap_or(false))
            .count()
    }

    /// Copy the full in-memory state into a persistable snapshot
    pub async fn snapshot(&self) -> Snapshot {
        Snapshot {
            song_progress: self.song_progress.read().await.clone(),
            completed_islands: self.completed_islands.read().await.clone(),
        }
    }

    /// Replace the in-memory state from a loaded snapshot
    pub async fn replace(&self, snapshot: Snapshot) {
        *self.song_progress.write().await = snapshot.song_progress;
        *self.completed_islands.write().await = snapshot.completed_islands;
    }

    /// Drop all in-memory state (sign-out)
    pub async fn clear(&self) {
        self.song_progress.write().await.clear();
        self.completed_islands.write().await.clear();
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
