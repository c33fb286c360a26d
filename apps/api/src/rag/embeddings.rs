//! Embeddings client against an OpenAI-compatible `/embeddings` endpoint.
//! Same retry contract as the LLM client: transient failures (timeouts,
//! 429, 5xx) retry with backoff; everything else propagates immediately.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Model used for all query and chunk embeddings.
pub const EMBEDDING_MODEL: &str = "text-embedding-3-small";
/// Inputs are truncated to this many characters before embedding.
const MAX_INPUT_CHARS: usize = 8000;
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("embeddings endpoint returned no vectors")]
    EmptyResponse,

    #[error("embeddings client not configured (missing API key)")]
    Unavailable,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Clone)]
pub struct EmbeddingClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl EmbeddingClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .expect("Failed to build HTTP client"),
            base_url,
            api_key,
        }
    }

    /// Whether the client can make calls at all. The heuristic backend runs
    /// entirely without it.
    pub fn available(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Embeds one text, truncated to the model's input budget.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if !self.available() {
            return Err(EmbeddingError::Unavailable);
        }

        let input = truncate_chars(text, MAX_INPUT_CHARS);
        let url = format!("{}/embeddings", self.base_url.trim_end_matches('/'));
        let request_body = EmbeddingsRequest {
            model: EMBEDDING_MODEL,
            input,
        };

        let mut last_error: Option<EmbeddingError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Embedding call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(EmbeddingError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Embeddings API returned {}: {}", status, body);
                last_error = Some(EmbeddingError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(EmbeddingError::Api {
                    status: status.as_u16(),
                    message: body,
                });
            }

            let parsed: EmbeddingsResponse = response.json().await?;
            return parsed
                .data
                .into_iter()
                .next()
                .map(|d| d.embedding)
                .ok_or(EmbeddingError::EmptyResponse);
        }

        Err(last_error.unwrap_or(EmbeddingError::EmptyResponse))
    }
}

/// Truncates to at most `max` characters without splitting a char boundary.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_input_untouched() {
        assert_eq!(truncate_chars("hello", 8000), "hello");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let text = "é".repeat(10);
        let out = truncate_chars(&text, 4);
        assert_eq!(out.chars().count(), 4);
    }

    #[test]
    fn test_unconfigured_client_is_unavailable() {
        let client = EmbeddingClient::new("https://api.openai.com/v1".to_string(), String::new());
        assert!(!client.available());
    }
}
