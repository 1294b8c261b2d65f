//! Submission pipeline
//!
//! Validates a song attempt, requests the AI remark (degrading to the fixed
//! fallback), writes the attempt to the external recorder, then updates
//! per-song and per-island completion state. Validation happens before any
//! external effect; a failed recorder write leaves progress untouched so the
//! caller can retry.

use crate::services::recorder::{AttemptRecord, AttemptRecorder};
use crate::services::remark::RemarkGenerator;
use crate::state::SharedState;
use crate::store::SessionStore;
use crate::template;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use tunemap_common::catalog::{Catalog, ISLAND_COMPLETION_THRESHOLD};
use tunemap_common::events::QuestEvent;
use tunemap_common::progress::SongPhase;
use tunemap_common::{messages, Error, Result};
use uuid::Uuid;

/// Flavor of a submission outcome notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    /// The submission pushed its island over the completion threshold
    Mastery,
    Correct,
    Incorrect,
}

/// User-facing result of a successful submission
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub kind: OutcomeKind,
    pub title: String,
    pub message: String,
    /// AI remark, real or fallback; always present
    pub remark: String,
    pub correct: bool,
    pub attempt_id: Uuid,
}

/// Submission pipeline over the shared state and the external capabilities
pub struct SubmissionPipeline {
    state: Arc<SharedState>,
    store: Arc<SessionStore>,
    catalog: Arc<Catalog>,
    remark: Arc<dyn RemarkGenerator>,
    recorder: Arc<dyn AttemptRecorder>,
}

impl SubmissionPipeline {
    pub fn new(
        state: Arc<SharedState>,
        store: Arc<SessionStore>,
        catalog: Arc<Catalog>,
        remark: Arc<dyn RemarkGenerator>,
        recorder: Arc<dyn AttemptRecorder>,
    ) -> Self {
        Self {
            state,
            store,
            catalog,
            remark,
            recorder,
        }
    }

    /// Submit a song attempt for the given island.
    ///
    /// Errors:
    /// - `Validation` — missing answer or incomplete note (localized inline
    ///   message, nothing recorded)
    /// - `InvalidInput` — song not in an Unlocked phase (Submitted is
    ///   terminal; Running/Idle have not finished listening)
    /// - `Transport` — recorder write failed; progress unchanged, retryable
    pub async fn submit(
        &self,
        island_id: u32,
        song_title: &str,
        now: DateTime<Utc>,
    ) -> Result<SubmissionOutcome> {
        let identity = self
            .store
            .identity()
            .await
            .ok_or_else(|| Error::Validation(messages::MSG_IDENTITY_INCOMPLETE.to_string()))?;
        let island = self
            .catalog
            .island(island_id)
            .ok_or_else(|| Error::NotFound(format!("island {}", island_id)))?
            .clone();
        let song = self
            .catalog
            .song(song_title)
            .ok_or_else(|| Error::NotFound(format!("song {}", song_title)))?
            .clone();

        let entry = self
            .state
            .song(song_title)
            .await
            .ok_or_else(|| Error::InvalidInput(format!("song {} was never opened", song_title)))?;
        match entry.phase() {
            SongPhase::Unlocked => {}
            phase => {
                return Err(Error::InvalidInput(format!(
                    "song {} cannot be submitted while {}",
                    song_title, phase
                )));
            }
        }

        // Preconditions, checked before any external effect
        if entry.answer.trim().is_empty() {
            return Err(Error::Validation(messages::MSG_ANSWER_MISSING.to_string()));
        }
        if !template::is_note_complete(
            song.response_format.as_deref(),
            &entry.note_field_values,
            &entry.note,
        ) {
            return Err(Error::Validation(messages::MSG_NOTE_INCOMPLETE.to_string()));
        }

        let correct = entry.answer.trim() == song.correct_answer.trim();

        // Remark first, then record; both complete before any state change
        let remark = self.remark_or_fallback(song_title, &entry.note).await;

        let attempt = AttemptRecord {
            id: Uuid::new_v4(),
            identity,
            island: island.name.clone(),
            song: song_title.to_string(),
            answer: entry.answer.clone(),
            verdict: if correct {
                messages::VERDICT_CORRECT.to_string()
            } else {
                messages::VERDICT_INCORRECT.to_string()
            },
            note: entry.note.clone(),
            timestamp: now,
        };

        if let Err(e) = self.recorder.record(&attempt).await {
            warn!(song = %song_title, "Recorder write failed: {}", e);
            return Err(Error::Transport(messages::MSG_TRANSMIT_FAILED.to_string()));
        }

        // Recorder succeeded: freeze the entry and recompute island state
        let mastered = {
            let mut progress = self.state.song_progress.write().await;
            if let Some(entry) = progress.get_mut(song_title) {
                entry.is_submitted = true;
                entry.is_listening_finished = true;
                entry.unlock_end_time = None;
                entry.timer = 0;
            }

            let submitted = island
                .songs
                .iter()
                .filter(|t| progress.get(*t).map(|p| p.is_submitted).unwrap_or(false))
                .count();

            let mut completed = self.state.completed_islands.write().await;
            if submitted >= ISLAND_COMPLETION_THRESHOLD && !completed.contains(&island.id) {
                completed.insert(island.id);
                true
            } else {
                false
            }
        };

        self.store.persist().await?;

        info!(song = %song_title, correct, mastered, "Attempt submitted");
        self.state.broadcast_event(QuestEvent::AttemptRecorded {
            attempt_id: attempt.id,
            song: song_title.to_string(),
            island_id: island.id,
            correct,
            timestamp: now,
        });
        if mastered {
            self.state.broadcast_event(QuestEvent::IslandMastered {
                island_id: island.id,
                island: island.name.clone(),
                timestamp: now,
            });
        }

        let outcome = if mastered {
            SubmissionOutcome {
                kind: OutcomeKind::Mastery,
                title: messages::TITLE_MASTERY.to_string(),
                message: messages::mastery_message(&island.name),
                remark,
                correct,
                attempt_id: attempt.id,
            }
        } else if correct {
            SubmissionOutcome {
                kind: OutcomeKind::Correct,
                title: messages::TITLE_CORRECT.to_string(),
                message: messages::MSG_CORRECT.to_string(),
                remark,
                correct,
                attempt_id: attempt.id,
            }
        } else {
            SubmissionOutcome {
                kind: OutcomeKind::Incorrect,
                title: messages::TITLE_INCORRECT.to_string(),
                message: messages::incorrect_message(&song.correct_answer),
                remark,
                correct,
                attempt_id: attempt.id,
            }
        };
        Ok(outcome)
    }

    /// Request the remark, folding every degradation into the fixed fallback
    async fn remark_or_fallback(&self, song: &str, note: &str) -> String {
        match self.remark.generate(song, note).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                warn!(song = %song, "Remark capability returned empty text, using fallback");
                messages::FALLBACK_REMARK.to_string()
            }
            Err(e) => {
                warn!(song = %song, "Remark capability failed ({}), using fallback", e);
                messages::FALLBACK_REMARK.to_string()
            }
        }
    }
}
