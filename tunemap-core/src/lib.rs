//! # Tunemap Core
//!
//! Library core of the tunemap voyage: a gamified listening-quiz journal
//! where a learner explores themed islands and, per song, triggers a timed
//! listening period, answers a quiz question and fills a structured
//! reflection note before the attempt is recorded to an external sheet.
//!
//! Components:
//! - Session store: identity-keyed SQLite snapshots, restored transparently
//! - Note template engine: `【…】` blanks parsed into positional fields
//! - Unlock engine: per-song timer state machine, one active timer globally
//! - Submission pipeline: validation, AI remark with fallback, recorder
//!   write, island completion tracking
//!
//! This crate has no process-level surface; a presentation layer drives it
//! and subscribes to [`tunemap_common::events::QuestEvent`] broadcasts.

pub mod config;
pub mod db;
pub mod pipeline;
pub mod services;
pub mod state;
pub mod store;
pub mod template;
pub mod unlock;

pub use config::CoreConfig;
pub use pipeline::{SubmissionOutcome, SubmissionPipeline};
pub use state::SharedState;
pub use store::SessionStore;
pub use template::NoteTemplate;
pub use unlock::UnlockEngine;
