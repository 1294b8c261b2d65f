//! Attempt recorder client
//!
//! A single fire-and-forget form-encoded write per finalized submission. No
//! structured response is read back; success is assumed when the transport
//! call does not fail. Retry/backoff is a caller concern.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;
use tunemap_common::Identity;
use uuid::Uuid;

/// One finalized song submission, as sent to the external sheet
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptRecord {
    pub id: Uuid,
    pub identity: Identity,
    pub island: String,
    pub song: String,
    pub answer: String,
    /// Localized verdict token (答對 / 答錯)
    pub verdict: String,
    pub note: String,
    pub timestamp: DateTime<Utc>,
}

impl AttemptRecord {
    /// Form fields in the wire layout the sheet endpoint expects.
    ///
    /// Field names are part of the external contract; do not rename.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("className", self.identity.group.clone()),
            ("seatNumber", self.identity.seat.clone()),
            ("name", self.identity.name.clone()),
            ("island", self.island.clone()),
            ("song", self.song.clone()),
            ("answer", self.answer.clone()),
            ("isCorrect", self.verdict.clone()),
            ("note", self.note.clone()),
            ("timestamp", self.timestamp.to_rfc3339()),
        ]
    }
}

/// Recorder client errors
#[derive(Debug, Error)]
pub enum RecorderError {
    /// Network communication error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Endpoint answered with an error status
    #[error("API error {0}")]
    ApiError(u16),
}

/// Capability to persist an attempt record externally
#[async_trait]
pub trait AttemptRecorder: Send + Sync {
    async fn record(&self, attempt: &AttemptRecord) -> Result<(), RecorderError>;
}

/// Form-encoded POST to the recording endpoint (a web-app script URL)
pub struct ScriptRecorder {
    http_client: reqwest::Client,
    url: String,
}

impl ScriptRecorder {
    pub fn new(url: impl Into<String>) -> Result<Self, RecorderError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| RecorderError::NetworkError(e.to_string()))?;
        Ok(Self {
            http_client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl AttemptRecorder for ScriptRecorder {
    async fn record(&self, attempt: &AttemptRecord) -> Result<(), RecorderError> {
        tracing::debug!(song = %attempt.song, "Writing attempt record");

        let response = self
            .http_client
            .post(&self.url)
            .form(&attempt.form_fields())
            .send()
            .await
            .map_err(|e| RecorderError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RecorderError::ApiError(status.as_u16()));
        }

        tracing::info!(song = %attempt.song, "Attempt record written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AttemptRecord {
        AttemptRecord {
            id: Uuid::new_v4(),
            identity: Identity::new("601", "12", "小明"),
            island: "宮廷古風".to_string(),
            song: "東風破".to_string(),
            answer: "琵琶".to_string(),
            verdict: "答對".to_string(),
            note: "一盞離愁。".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_form_fields_wire_layout() {
        let record = sample();
        let fields = record.form_fields();
        let names: Vec<&str> = fields.iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec![
                "className",
                "seatNumber",
                "name",
                "island",
                "song",
                "answer",
                "isCorrect",
                "note",
                "timestamp"
            ]
        );
    }

    #[test]
    fn test_timestamp_is_iso8601() {
        let record = sample();
        let fields = record.form_fields();
        let (_, timestamp) = fields.last().unwrap();
        assert!(DateTime::parse_from_rfc3339(timestamp).is_ok());
    }
}
