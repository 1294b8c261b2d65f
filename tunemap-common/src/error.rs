//! Common error types for tunemap
//!
//! Every failure in the core is a recoverable outcome: validation and
//! conflict errors carry a localized user-facing message, transport errors
//! leave progress untouched so the caller may retry, and persistence
//! corruption is absorbed by the store before it ever reaches here.

use thiserror::Error;

/// Common result type for tunemap operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the tunemap core
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found (unknown song or island)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input; the payload is the localized inline message
    #[error("{0}")]
    Validation(String),

    /// Undefined state-machine transition (e.g. submit on a submitted song)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Another song already holds the single global unlock timer
    #[error("{}", crate::messages::conflict_line(.song))]
    Conflict {
        /// Title of the song whose timer is running
        song: String,
    },

    /// Recorder write failed at the transport level; progress is unchanged
    #[error("{0}")]
    Transport(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
