//! Event types for the tunemap event system
//!
//! Broadcast to the presentation layer over a `tokio::sync::broadcast`
//! channel; send errors (no receivers) are ignored by the sender.

use crate::identity::Identity;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Quest event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum QuestEvent {
    /// A learner signed in (fresh or restored session)
    SignedIn {
        identity: Identity,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The current learner signed out; in-memory state was cleared
    SignedOut {
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The unlock timer started for a song
    ListeningStarted {
        song: String,
        /// Absolute deadline in epoch milliseconds
        ends_at_ms: i64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The listening period elapsed; quiz and note are now editable
    SongUnlocked {
        song: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An attempt was recorded and the song entered its terminal state
    AttemptRecorded {
        attempt_id: Uuid,
        song: String,
        island_id: u32,
        correct: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An island crossed its completion threshold
    IslandMastered {
        island_id: u32,
        island: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}
