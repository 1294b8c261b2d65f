//! Identity & persistence store
//!
//! Durably associates a progress snapshot with an identity and restores it
//! transparently. Every mutation of progress or completed-islands is
//! followed by a full snapshot write under the current identity's key plus
//! an update of the singleton last-identity pointer.
//!
//! Quiz-answer and note-field entry live here too: they are plain data
//! mutations gated on the Unlocked phase, not timer transitions.

use crate::db::{session, snapshots};
use crate::state::SharedState;
use crate::template::NoteTemplate;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use tunemap_common::catalog::Catalog;
use tunemap_common::events::QuestEvent;
use tunemap_common::progress::{Snapshot, SongPhase, SongProgress};
use tunemap_common::{time, Error, Identity, Result};

/// Session store: current identity, snapshot load/save, learner input
pub struct SessionStore {
    pool: SqlitePool,
    state: Arc<SharedState>,
    catalog: Arc<Catalog>,
    identity: RwLock<Option<Identity>>,
}

impl SessionStore {
    pub fn new(pool: SqlitePool, state: Arc<SharedState>, catalog: Arc<Catalog>) -> Self {
        Self {
            pool,
            state,
            catalog,
            identity: RwLock::new(None),
        }
    }

    /// Current identity, if signed in
    pub async fn identity(&self) -> Option<Identity> {
        self.identity.read().await.clone()
    }

    /// Sign in: validate the identity, adopt it, restore its snapshot.
    ///
    /// A missing snapshot yields fresh empty progress; a malformed one is
    /// treated as absent (logged, never fatal).
    pub async fn sign_in(&self, identity: Identity) -> Result<()> {
        identity.validate()?;
        self.adopt(identity).await
    }

    /// Re-adopt the identity recorded by the last session, if any
    pub async fn restore_last_session(&self) -> Result<Option<Identity>> {
        match session::load_identity(&self.pool).await? {
            None => Ok(None),
            Some(identity) => {
                self.adopt(identity.clone()).await?;
                Ok(Some(identity))
            }
        }
    }

    async fn adopt(&self, identity: Identity) -> Result<()> {
        let snapshot = self.load_snapshot(&identity).await?;
        self.state.replace(snapshot).await;
        *self.identity.write().await = Some(identity.clone());
        session::save_identity(&self.pool, &identity).await?;

        info!("Signed in: {}", identity);
        self.state.broadcast_event(QuestEvent::SignedIn {
            identity,
            timestamp: time::now(),
        });
        Ok(())
    }

    async fn load_snapshot(&self, identity: &Identity) -> Result<Snapshot> {
        let key = identity.storage_key();
        match snapshots::load(&self.pool, &key).await? {
            None => Ok(Snapshot::default()),
            Some(payload) => match serde_json::from_str(&payload) {
                Ok(snapshot) => Ok(snapshot),
                Err(e) => {
                    // First resort to a no-op recovery: corrupt data never
                    // blocks a session, the learner just starts fresh.
                    warn!("Discarding malformed snapshot under {}: {}", key, e);
                    Ok(Snapshot::default())
                }
            },
        }
    }

    /// Write the full current state under the current identity's key.
    ///
    /// No-op when signed out (nothing to key the snapshot by).
    pub async fn persist(&self) -> Result<()> {
        let Some(identity) = self.identity().await else {
            return Ok(());
        };
        let snapshot = self.state.snapshot().await;
        let payload = serde_json::to_string(&snapshot)
            .map_err(|e| Error::Internal(format!("serialize snapshot: {}", e)))?;
        snapshots::save(&self.pool, &identity.storage_key(), &payload).await?;
        session::save_identity(&self.pool, &identity).await?;
        Ok(())
    }

    /// Sign out: clear identity and in-memory state, remove the
    /// last-identity pointer. Per-identity snapshots are kept so returning
    /// under the same identity recovers prior progress.
    pub async fn sign_out(&self) -> Result<()> {
        *self.identity.write().await = None;
        self.state.clear().await;
        session::clear_identity(&self.pool).await?;

        info!("Signed out");
        self.state.broadcast_event(QuestEvent::SignedOut {
            timestamp: time::now(),
        });
        Ok(())
    }

    /// Record the learner's quiz choice for an unlocked song
    pub async fn set_answer(&self, title: &str, answer: &str) -> Result<()> {
        self.mutate_unlocked(title, |entry| {
            entry.answer = answer.to_string();
        })
        .await
    }

    /// Store one structured-note field value and refresh the reassembled
    /// canonical note text
    pub async fn set_note_field(&self, title: &str, index: usize, text: &str) -> Result<()> {
        let song = self
            .catalog
            .song(title)
            .ok_or_else(|| Error::NotFound(format!("song {}", title)))?;
        let template = NoteTemplate::parse(song.response_format.as_deref().unwrap_or(""));
        // A free-form note has no fields; writing one would clobber it
        if !template.has_fields() {
            return Err(Error::InvalidInput(format!(
                "song {} takes a free-form note, not field values",
                title
            )));
        }

        self.mutate_unlocked(title, |entry| {
            let (values, full) = template.apply_field_value(&entry.note_field_values, index, text);
            entry.note_field_values = values;
            entry.note = full;
        })
        .await
    }

    /// Replace the free-form note of a song without a response format
    pub async fn set_free_note(&self, title: &str, text: &str) -> Result<()> {
        self.mutate_unlocked(title, |entry| {
            entry.note = text.to_string();
        })
        .await
    }

    /// Apply a mutation to an Unlocked entry, then persist.
    ///
    /// Submitted entries are frozen; Idle/Running entries are still locked
    /// behind the listening period.
    async fn mutate_unlocked<F>(&self, title: &str, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut SongProgress),
    {
        {
            let mut progress = self.state.song_progress.write().await;
            let entry = progress
                .get_mut(title)
                .ok_or_else(|| Error::InvalidInput(format!("song {} was never opened", title)))?;
            match entry.phase() {
                SongPhase::Unlocked => mutate(entry),
                phase => {
                    return Err(Error::InvalidInput(format!(
                        "song {} is not editable while {}",
                        title, phase
                    )))
                }
            }
        }
        self.persist().await
    }
}
