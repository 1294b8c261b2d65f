//! Per-identity snapshot rows

use sqlx::SqlitePool;
use tunemap_common::{time, Result};

/// Write (or replace) the snapshot payload under a storage key
pub async fn save(pool: &SqlitePool, storage_key: &str, payload: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO snapshots (storage_key, payload, updated_at)
        VALUES (?, ?, ?)
        ON CONFLICT(storage_key) DO UPDATE SET
            payload = excluded.payload,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(storage_key)
    .bind(payload)
    .bind(time::now().to_rfc3339())
    .execute(pool)
    .await?;
    Ok(())
}

/// Read the raw snapshot payload for a storage key, if any
pub async fn load(pool: &SqlitePool, storage_key: &str) -> Result<Option<String>> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT payload FROM snapshots WHERE storage_key = ?")
            .bind(storage_key)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(|(payload,)| payload))
}
