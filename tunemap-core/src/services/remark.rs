//! Generative remark client
//!
//! One request per submission: the song name and reassembled note are folded
//! into a fixed prompt with a fixed system framing (tone, length, no
//! decorative symbols). Any failure, from missing credentials to empty
//! response text, is folded into the fixed fallback remark by the submission
//! pipeline; errors here never reach the learner.

use crate::config::RemarkConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const GENERATIVE_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// System framing for the remark: poetic, positive, ≤80 characters, ends
/// with a full stop, no emoji
pub const SYSTEM_INSTRUCTION: &str = "你是『音樂寶藏地圖』的航行守護者。請針對學生的感悟給予一段 80 字以內的「靈感迴聲」。語氣要詩意、正向且像個智者。最後必須以句號(。)結尾。絕對禁止使用 Emoji。";

/// Prompt carrying the song name and the learner's note
pub fn remark_prompt(song: &str, note: &str) -> String {
    format!("一位航行者在《{}》的島嶼留下這段感悟：『{}』。", song, note)
}

/// Remark client errors
#[derive(Debug, Error)]
pub enum RemarkError {
    /// No API key configured
    #[error("API key is missing")]
    MissingApiKey,

    /// Network communication error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// API returned error response
    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    /// Failed to parse API response JSON
    #[error("Parse error: {0}")]
    ParseError(String),

    /// API answered but carried no text
    #[error("Empty response")]
    EmptyResponse,
}

/// Capability to generate a short evaluative remark for a note
#[async_trait]
pub trait RemarkGenerator: Send + Sync {
    async fn generate(&self, song: &str, note: &str) -> Result<String, RemarkError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    system_instruction: Content,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    thinking_config: ThinkingConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateResponse {
    fn text(&self) -> Option<String> {
        let text = self
            .candidates
            .as_ref()?
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .map(|p| p.text.as_str())
            .collect::<String>();
        if text.trim().is_empty() {
            None
        } else {
            Some(text.trim().to_string())
        }
    }
}

/// Gemini REST client
pub struct GeminiRemarkClient {
    http_client: reqwest::Client,
    config: RemarkConfig,
}

impl GeminiRemarkClient {
    pub fn new(config: RemarkConfig) -> Result<Self, RemarkError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| RemarkError::NetworkError(e.to_string()))?;
        Ok(Self {
            http_client,
            config,
        })
    }
}

#[async_trait]
impl RemarkGenerator for GeminiRemarkClient {
    async fn generate(&self, song: &str, note: &str) -> Result<String, RemarkError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(RemarkError::MissingApiKey)?;

        let url = format!(
            "{}/{}:generateContent?key={}",
            GENERATIVE_BASE_URL, self.config.model, api_key
        );
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: remark_prompt(song, note),
                }],
            }],
            system_instruction: Content {
                parts: vec![Part {
                    text: SYSTEM_INSTRUCTION.to_string(),
                }],
            },
            generation_config: GenerationConfig {
                max_output_tokens: self.config.max_output_tokens,
                thinking_config: ThinkingConfig {
                    thinking_budget: self.config.thinking_budget,
                },
            },
        };

        tracing::debug!(song = %song, model = %self.config.model, "Requesting remark");

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RemarkError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(RemarkError::ApiError(status.as_u16(), error_text));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| RemarkError::ParseError(e.to_string()))?;

        parsed.text().ok_or(RemarkError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_song_and_note() {
        let prompt = remark_prompt("東風破", "琵琶聲像在說故事。");
        assert_eq!(
            prompt,
            "一位航行者在《東風破》的島嶼留下這段感悟：『琵琶聲像在說故事。』。"
        );
    }

    #[test]
    fn test_missing_api_key() {
        let client = GeminiRemarkClient::new(RemarkConfig::default()).unwrap();
        let err = tokio::runtime::Runtime::new()
            .unwrap()
            .block_on(client.generate("晴天", "note"))
            .unwrap_err();
        assert!(matches!(err, RemarkError::MissingApiKey));
    }

    #[test]
    fn test_request_serialization_shape() {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: "prompt".to_string(),
                }],
            }],
            system_instruction: Content {
                parts: vec![Part {
                    text: SYSTEM_INSTRUCTION.to_string(),
                }],
            },
            generation_config: GenerationConfig {
                max_output_tokens: 1000,
                thinking_config: ThinkingConfig {
                    thinking_budget: 500,
                },
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 1000);
        assert_eq!(json["generationConfig"]["thinkingConfig"]["thinkingBudget"], 500);
        assert!(json["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("靈感迴聲"));
    }

    #[test]
    fn test_response_text_extraction() {
        let parsed: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"  迴聲。  "}]}}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.text().as_deref(), Some("迴聲。"));
    }

    #[test]
    fn test_empty_response_has_no_text() {
        let parsed: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(parsed.text().is_none());

        let parsed: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"content":{"parts":[{"text":"  "}]}}]}"#)
                .unwrap();
        assert!(parsed.text().is_none());
    }
}
