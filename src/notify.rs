//! Message dispatch: the transport boundary of the pipeline.
//!
//! The pipeline only needs "deliver this body somewhere"; everything else —
//! account plumbing, phone numbers, the REST shape — stays behind the
//! [`Notifier`] trait. Dispatch is fire-and-forget per message: a rejected
//! message is logged and recorded on its posting's outcome, and the
//! remaining messages are still attempted.

use crate::error::PostingError;
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("transport rejected message (status {status}): {message}")]
    Api { status: u16, message: String },
}

impl From<NotifyError> for PostingError {
    fn from(e: NotifyError) -> Self {
        PostingError::DispatchFailed {
            detail: e.to_string(),
        }
    }
}

/// A message sink: accepts a body, delivers it to the configured recipient.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, body: &str) -> Result<(), NotifyError>;
}

// ── Twilio implementation ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TwilioErrorBody {
    message: String,
}

/// [`Notifier`] over the Twilio Messages API (form-encoded POST, basic auth).
pub struct TwilioNotifier {
    client: reqwest::Client,
    account_sid: String,
    auth_token: String,
    from: String,
    to: String,
}

impl TwilioNotifier {
    pub fn new(
        account_sid: String,
        auth_token: String,
        from: String,
        to: String,
        timeout_secs: u64,
    ) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(timeout_secs))
                .build()
                .expect("Failed to build HTTP client"),
            account_sid,
            auth_token,
            from,
            to,
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.account_sid
        )
    }
}

#[async_trait]
impl Notifier for TwilioNotifier {
    async fn send(&self, body: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[
                ("To", self.to.as_str()),
                ("From", self.from.as_str()),
                ("Body", body),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<TwilioErrorBody>(&raw)
                .map(|e| e.message)
                .unwrap_or(raw);
            warn!("transport rejected message: {status} {message}");
            return Err(NotifyError::Api {
                status: status.as_u16(),
                message,
            });
        }

        debug!("message dispatched ({} bytes)", body.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_url_embeds_the_account_sid() {
        let notifier = TwilioNotifier::new(
            "AC123".into(),
            "token".into(),
            "+15550001111".into(),
            "+15552223333".into(),
            10,
        );
        assert_eq!(
            notifier.messages_url(),
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Messages.json"
        );
    }

    #[test]
    fn notify_error_converts_to_posting_error() {
        let e = NotifyError::Api {
            status: 400,
            message: "invalid number".into(),
        };
        let posting_err: PostingError = e.into();
        assert!(matches!(posting_err, PostingError::DispatchFailed { .. }));
        assert!(posting_err.to_string().contains("invalid number"));
    }
}
