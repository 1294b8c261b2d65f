//! Unlock timer engine
//!
//! Per-song listening-unlock lifecycle: Idle → Running → Unlocked →
//! Submitted, with a single active timer across all songs. A recurring tick
//! recomputes the remaining-seconds projection from the stored absolute
//! deadline; the deadline is the only temporal state, so the countdown
//! cannot drift.

use crate::services::media::MediaOpener;
use crate::state::SharedState;
use crate::store::SessionStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{interval, Duration};
use tracing::{debug, error, info};
use tunemap_common::catalog::Catalog;
use tunemap_common::events::QuestEvent;
use tunemap_common::progress::{SongPhase, SongProgress};
use tunemap_common::{time, Error, Result};

/// Default listening period before quiz and note unlock
pub const UNLOCK_SECS: u64 = 150;

/// Default tick cadence of the recurring clock
pub const TICK_INTERVAL_MS: u64 = 500;

/// Unlock timer engine
///
/// User-driven transitions and the recurring tick serialize on the progress
/// collection's write lock; no tick observes a stale snapshot concurrently
/// with a user action.
pub struct UnlockEngine {
    state: Arc<SharedState>,
    store: Arc<SessionStore>,
    catalog: Arc<Catalog>,
    opener: Arc<dyn MediaOpener>,

    /// Listening period in seconds
    unlock_secs: u64,
    /// Tick cadence in milliseconds
    tick_interval_ms: u64,

    /// Tick loop running flag
    running: Arc<RwLock<bool>>,
}

impl UnlockEngine {
    pub fn new(
        state: Arc<SharedState>,
        store: Arc<SessionStore>,
        catalog: Arc<Catalog>,
        opener: Arc<dyn MediaOpener>,
    ) -> Self {
        Self {
            state,
            store,
            catalog,
            opener,
            unlock_secs: UNLOCK_SECS,
            tick_interval_ms: TICK_INTERVAL_MS,
            running: Arc::new(RwLock::new(false)),
        }
    }

    /// Override the listening period and tick cadence, typically from
    /// [`crate::config::CoreConfig`]
    pub fn with_timing(mut self, unlock_secs: u64, tick_interval_ms: u64) -> Self {
        self.unlock_secs = unlock_secs;
        self.tick_interval_ms = tick_interval_ms;
        self
    }

    /// Lazily create the progress entry the first time a song is opened.
    ///
    /// The note is seeded from the song's response format so the structured
    /// blanks are visible before anything is filled.
    pub async fn open_song(&self, title: &str) -> Result<SongProgress> {
        let song = self
            .catalog
            .song(title)
            .ok_or_else(|| Error::NotFound(format!("song {}", title)))?;

        let mut created = false;
        let entry = {
            let mut progress = self.state.song_progress.write().await;
            progress
                .entry(title.to_string())
                .or_insert_with(|| {
                    created = true;
                    SongProgress::seeded(song.response_format.as_deref().unwrap_or(""))
                })
                .clone()
        };

        if created {
            debug!(song = %title, "Created progress entry");
            self.store.persist().await?;
        }
        Ok(entry)
    }

    /// Start the timed listening period for a song.
    ///
    /// Only an Idle song arms the timer. If the song is already Running,
    /// Unlocked or Submitted the media link is simply re-opened without
    /// touching timer state. Arming fails with a conflict naming the other
    /// song when any other entry holds the global timer.
    pub async fn start_listening(&self, title: &str, now: DateTime<Utc>) -> Result<()> {
        let song = self
            .catalog
            .song(title)
            .ok_or_else(|| Error::NotFound(format!("song {}", title)))?;
        self.open_song(title).await?;

        let ends_at_ms = {
            let mut progress = self.state.song_progress.write().await;

            let entry = progress
                .get(title)
                .ok_or_else(|| Error::Internal(format!("missing entry for {}", title)))?;
            if entry.phase() != SongPhase::Idle {
                // Re-listen without restarting the countdown
                self.opener.open_url(&song.media_url);
                return Ok(());
            }

            // Global single-timer invariant
            if let Some((other, _)) = progress
                .iter()
                .find(|(name, p)| name.as_str() != title && p.unlock_end_time.is_some())
            {
                return Err(Error::Conflict { song: other.clone() });
            }

            self.opener.open_url(&song.media_url);

            let ends_at_ms = time::to_millis(now) + (self.unlock_secs as i64) * 1000;
            let entry = progress
                .get_mut(title)
                .ok_or_else(|| Error::Internal(format!("missing entry for {}", title)))?;
            entry.unlock_end_time = Some(ends_at_ms);
            entry.timer = self.unlock_secs as u32;
            ends_at_ms
        };

        info!(song = %title, "Listening period started");
        self.store.persist().await?;
        self.state.broadcast_event(QuestEvent::ListeningStarted {
            song: title.to_string(),
            ends_at_ms,
            timestamp: now,
        });
        Ok(())
    }

    /// Re-open the media link for a song whose listening period already
    /// elapsed (or that is still counting down); never restarts the timer.
    pub async fn replay(&self, title: &str) -> Result<()> {
        let song = self
            .catalog
            .song(title)
            .ok_or_else(|| Error::NotFound(format!("song {}", title)))?;

        match self.state.phase(title).await {
            Some(SongPhase::Unlocked) | Some(SongPhase::Submitted) | Some(SongPhase::Running) => {
                self.opener.open_url(&song.media_url);
                Ok(())
            }
            _ => Err(Error::InvalidInput(format!(
                "song {} has no listening to replay",
                title
            ))),
        }
    }

    /// One clock tick: recompute the remaining-seconds projection for every
    /// running entry, unlocking those whose deadline passed.
    ///
    /// Returns true when anything changed (and was persisted).
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<bool> {
        let now_ms = time::to_millis(now);
        let mut unlocked = Vec::new();
        let mut changed = false;

        {
            let mut progress = self.state.song_progress.write().await;
            for (title, entry) in progress.iter_mut() {
                let Some(deadline_ms) = entry.unlock_end_time else {
                    continue;
                };
                if entry.is_submitted {
                    continue;
                }

                let remaining = time::remaining_secs(deadline_ms, now_ms);
                if remaining == 0 {
                    entry.timer = 0;
                    entry.is_listening_finished = true;
                    entry.unlock_end_time = None;
                    unlocked.push(title.clone());
                    changed = true;
                } else if entry.timer != remaining {
                    // Update only on an actual change to avoid state churn
                    entry.timer = remaining;
                    changed = true;
                }
            }
        }

        if changed {
            self.store.persist().await?;
        }
        for song in unlocked {
            info!(song = %song, "Listening period elapsed, song unlocked");
            self.state.broadcast_event(QuestEvent::SongUnlocked {
                song,
                timestamp: now,
            });
        }
        Ok(changed)
    }

    /// Start the recurring tick task
    pub async fn start(&self) {
        *self.running.write().await = true;

        let engine = self.clone_handles();
        tokio::spawn(async move {
            let mut tick = interval(Duration::from_millis(engine.tick_interval_ms));
            loop {
                tick.tick().await;

                if !*engine.running.read().await {
                    debug!("Tick loop stopping");
                    break;
                }

                if let Err(e) = engine.tick(Utc::now()).await {
                    error!("Tick error: {}", e);
                }
            }
        });

        info!("Unlock engine started");
    }

    /// Stop the recurring tick task
    pub async fn stop(&self) {
        *self.running.write().await = false;
        info!("Unlock engine stopped");
    }

    /// Clone handles for spawned tasks
    fn clone_handles(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            store: Arc::clone(&self.store),
            catalog: Arc::clone(&self.catalog),
            opener: Arc::clone(&self.opener),
            unlock_secs: self.unlock_secs,
            tick_interval_ms: self.tick_interval_ms,
            running: Arc::clone(&self.running),
        }
    }
}
