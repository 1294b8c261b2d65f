//! SQLite persistence layer
//!
//! Two tables back the whole core:
//! - `snapshots` — one row per identity storage key, JSON payload
//! - `session` — singleton "last identity" pointer for session auto-restore

pub mod init;
pub mod session;
pub mod snapshots;

pub use init::{init_database, init_in_memory};
