//! Singleton "last identity" pointer
//!
//! Explicit process-wide session state: set on sign-in and restore, cleared
//! on sign-out. A malformed stored identity is treated as absent.

use sqlx::SqlitePool;
use tracing::warn;
use tunemap_common::{time, Identity, Result};

/// Record the identity to auto-restore on next startup
pub async fn save_identity(pool: &SqlitePool, identity: &Identity) -> Result<()> {
    let payload = serde_json::to_string(identity)
        .map_err(|e| tunemap_common::Error::Internal(format!("serialize identity: {}", e)))?;
    sqlx::query(
        r#"
        INSERT INTO session (id, identity, updated_at)
        VALUES (1, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            identity = excluded.identity,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(payload)
    .bind(time::now().to_rfc3339())
    .execute(pool)
    .await?;
    Ok(())
}

/// Read the last signed-in identity, if one was recorded
pub async fn load_identity(pool: &SqlitePool) -> Result<Option<Identity>> {
    let row: Option<(String,)> = sqlx::query_as("SELECT identity FROM session WHERE id = 1")
        .fetch_optional(pool)
        .await?;

    match row {
        None => Ok(None),
        Some((payload,)) => match serde_json::from_str(&payload) {
            Ok(identity) => Ok(Some(identity)),
            Err(e) => {
                warn!("Discarding malformed last-identity record: {}", e);
                Ok(None)
            }
        },
    }
}

/// Remove the pointer (sign-out)
pub async fn clear_identity(pool: &SqlitePool) -> Result<()> {
    sqlx::query("DELETE FROM session WHERE id = 1")
        .execute(pool)
        .await?;
    Ok(())
}
