//! Oracle client — the single point of entry for all text-completion calls.
//!
//! Scoring and composition share an identical call shape (free-text prompt
//! in, free-text reply out), so both go through one [`Oracle`] trait with
//! two call sites. Swapping the underlying inference service touches this
//! module only; the orchestrator never sees provider details.
//!
//! The production implementation speaks the Mistral chat-completions API
//! over reqwest. Tests substitute in-memory fakes.

use crate::error::{OracleStage, PostingError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

const MISTRAL_API_URL: &str = "https://api.mistral.ai/v1/chat/completions";

/// Default completion model; overridable via configuration.
pub const DEFAULT_MODEL: &str = "mistral-large-latest";

/// How many times a failed or empty oracle call is retried.
///
/// Exactly one retry per call site: a transient blip is worth a second
/// attempt, but a posting must never hold up the batch for long — after the
/// retry the caller substitutes a sentinel value and moves on.
pub const ORACLE_RETRIES: u32 = 1;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("oracle returned empty content")]
    EmptyContent,
}

/// A text-completion service: prompt in, text out.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, OracleError>;
}

// ── Mistral implementation ───────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: String,
}

/// [`Oracle`] over the Mistral chat-completions API.
pub struct MistralOracle {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl MistralOracle {
    pub fn new(api_key: String, model: String, timeout_secs: u64) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            model,
        }
    }
}

#[async_trait]
impl Oracle for MistralOracle {
    async fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(MISTRAL_API_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(OracleError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let reply: ChatResponse = response.json().await?;
        let content = reply
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .unwrap_or_default();

        debug!("oracle reply: {} bytes", content.len());

        if content.trim().is_empty() {
            return Err(OracleError::EmptyContent);
        }
        Ok(content)
    }
}

// ── Shared retry policy ──────────────────────────────────────────────────

/// Call the oracle, retrying once on failure or empty output.
///
/// Returns the reply verbatim on success; after the retry is exhausted the
/// error is wrapped as a recovered [`PostingError::OracleUnavailable`] so
/// callers substitute their sentinel and keep going.
pub async fn complete_with_retry(
    oracle: &dyn Oracle,
    stage: OracleStage,
    prompt: &str,
    backoff_ms: u64,
) -> Result<String, PostingError> {
    let mut last_err: Option<OracleError> = None;

    for attempt in 0..=ORACLE_RETRIES {
        if attempt > 0 {
            warn!("{stage} oracle retry {attempt}/{ORACLE_RETRIES} after {backoff_ms}ms");
            sleep(Duration::from_millis(backoff_ms)).await;
        }

        match oracle.complete(prompt).await {
            Ok(reply) if !reply.trim().is_empty() => return Ok(reply),
            Ok(_) => last_err = Some(OracleError::EmptyContent),
            Err(e) => {
                warn!("{stage} oracle attempt {} failed: {e}", attempt + 1);
                last_err = Some(e);
            }
        }
    }

    Err(PostingError::OracleUnavailable {
        stage,
        retries: ORACLE_RETRIES,
        detail: last_err
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown error".to_string()),
    })
}
