//! Per-song progress records and session snapshots

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Lifecycle phase of a song that has a progress entry.
///
/// A song with no entry at all is "untouched"; callers see that as `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SongPhase {
    /// Entry exists, listening not started
    Idle,
    /// Unlock timer counting down
    Running,
    /// Listening period elapsed; quiz and note are editable
    Unlocked,
    /// Attempt recorded; entry is frozen
    Submitted,
}

impl std::fmt::Display for SongPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SongPhase::Idle => write!(f, "idle"),
            SongPhase::Running => write!(f, "running"),
            SongPhase::Unlocked => write!(f, "unlocked"),
            SongPhase::Submitted => write!(f, "submitted"),
        }
    }
}

/// Progress for one song, keyed by song title in the session snapshot.
///
/// Invariants (enforced by the unlock engine and submission pipeline):
/// - at most one entry across the collection holds a non-null
///   `unlock_end_time`
/// - `is_submitted` implies `unlock_end_time == None` and
///   `is_listening_finished == true`
/// - once `is_submitted`, no field changes again
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SongProgress {
    /// Selected quiz choice; empty = unanswered
    #[serde(default)]
    pub answer: String,
    /// Reassembled free-text reflection
    #[serde(default)]
    pub note: String,
    /// Per-field values for the structured note, keyed `field_<index>`
    #[serde(default)]
    pub note_field_values: HashMap<String, String>,
    #[serde(default)]
    pub is_submitted: bool,
    #[serde(default)]
    pub is_listening_finished: bool,
    /// Absolute deadline in epoch milliseconds; Some = timer running
    #[serde(default)]
    pub unlock_end_time: Option<i64>,
    /// Remaining whole seconds; pure projection of `unlock_end_time`
    #[serde(default)]
    pub timer: u32,
}

impl SongProgress {
    /// Fresh entry with the note seeded from the song's template
    pub fn seeded(note_seed: &str) -> Self {
        Self {
            note: note_seed.to_string(),
            ..Self::default()
        }
    }

    /// Derive the lifecycle phase from the stored fields
    pub fn phase(&self) -> SongPhase {
        if self.is_submitted {
            SongPhase::Submitted
        } else if self.unlock_end_time.is_some() {
            SongPhase::Running
        } else if self.is_listening_finished {
            SongPhase::Unlocked
        } else {
            SongPhase::Idle
        }
    }
}

/// Everything persisted for one identity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub song_progress: HashMap<String, SongProgress>,
    #[serde(default)]
    pub completed_islands: BTreeSet<u32>,
}
