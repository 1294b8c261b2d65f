//! # Tunemap Common Library
//!
//! Shared code for the tunemap voyage core including:
//! - Error taxonomy (Error enum, Result alias)
//! - Catalog data model (songs, islands)
//! - Learner identity and storage key derivation
//! - Per-song progress records and session snapshots
//! - Event types (QuestEvent enum)
//! - Localized user-facing message constants
//! - Timestamp utilities

pub mod catalog;
pub mod error;
pub mod events;
pub mod identity;
pub mod messages;
pub mod progress;
pub mod time;

pub use error::{Error, Result};
pub use identity::Identity;
