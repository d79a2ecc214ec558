//! Message composition: the final notification text for one scored posting.
//!
//! The oracle drafts the body; the apply link and posted date are appended
//! afterwards under program control so they are always present and never
//! distorted by the draft. When the composition oracle fails after its
//! retry, the posting falls back to a minimal templated body built from its
//! fields — the run always produces one message per surviving posting.

use crate::error::OracleStage;
use crate::oracle::{self, Oracle};
use crate::pipeline::score::SCORE_UNAVAILABLE;
use crate::pipeline::source::JobPosting;
use crate::prompts;
use tracing::warn;

/// Printed in place of the apply link for postings without one.
pub const APPLY_FALLBACK: &str = "job board listing";

/// A composed notification, with a flag marking oracle-less fallback bodies.
#[derive(Debug, Clone)]
pub struct ComposedMessage {
    pub body: String,
    pub degraded: bool,
}

/// Draft the notification for one scored posting.
///
/// The returned body always ends with two literal lines:
/// `Apply at <url or fallback>` and `Job Posted at <date>`.
pub async fn compose(oracle: &dyn Oracle, posting: &JobPosting, backoff_ms: u64) -> ComposedMessage {
    let prompt = prompts::sms_prompt(&posting.render_fields());

    let (draft, degraded) =
        match oracle::complete_with_retry(oracle, OracleStage::Composition, &prompt, backoff_ms)
            .await
        {
            Ok(reply) => (reply.trim().to_string(), false),
            Err(e) => {
                warn!("posting {}: {e}", posting.id);
                (fallback_draft(posting), true)
            }
        };

    ComposedMessage {
        body: format!("{draft}{}", footer(posting)),
        degraded,
    }
}

/// The program-controlled footer: apply link (or fallback) plus posted date.
fn footer(posting: &JobPosting) -> String {
    let apply_at = posting.apply_url.as_deref().unwrap_or(APPLY_FALLBACK);
    format!("\nApply at {apply_at}\nJob Posted at {}", posting.posted_date)
}

/// Templated body used when the composition oracle is unavailable.
fn fallback_draft(posting: &JobPosting) -> String {
    let score = posting
        .score
        .as_ref()
        .map(|s| s.as_str())
        .unwrap_or(SCORE_UNAVAILABLE);
    format!(
        "New job posting: {}. Applicability: {}.",
        posting.subject, score
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::OracleError;
    use crate::pipeline::score::ScoreOutcome;
    use async_trait::async_trait;
    use chrono::NaiveDate;

    fn posting(apply_url: Option<&str>) -> JobPosting {
        JobPosting {
            id: 7,
            posted_date: NaiveDate::from_ymd_opt(2026, 8, 5).unwrap(),
            subject: "Backend Engineer".into(),
            apply_url: apply_url.map(str::to_string),
            description: "Build APIs.".into(),
            score: Some(ScoreOutcome::Rated("8/10".into())),
        }
    }

    struct CannedOracle(&'static str);

    #[async_trait]
    impl Oracle for CannedOracle {
        async fn complete(&self, _prompt: &str) -> Result<String, OracleError> {
            Ok(self.0.to_string())
        }
    }

    struct DownOracle;

    #[async_trait]
    impl Oracle for DownOracle {
        async fn complete(&self, _prompt: &str) -> Result<String, OracleError> {
            Err(OracleError::Api {
                status: 503,
                message: "down".into(),
            })
        }
    }

    #[tokio::test]
    async fn message_ends_with_the_two_footer_lines() {
        let message = compose(&CannedOracle("Great fit, go apply!"), &posting(Some("http://x")), 1).await;
        assert!(!message.degraded);
        assert_eq!(
            message.body,
            "Great fit, go apply!\nApply at http://x\nJob Posted at 2026-08-05"
        );
    }

    #[tokio::test]
    async fn missing_url_uses_the_fixed_fallback() {
        let message = compose(&CannedOracle("Great fit!"), &posting(None), 1).await;
        let mut lines = message.body.lines().rev();
        assert_eq!(lines.next(), Some("Job Posted at 2026-08-05"));
        assert_eq!(lines.next(), Some("Apply at job board listing"));
    }

    #[tokio::test]
    async fn oracle_failure_falls_back_to_templated_body() {
        let message = compose(&DownOracle, &posting(Some("http://x")), 1).await;
        assert!(message.degraded);
        assert!(message.body.contains("Backend Engineer"));
        assert!(message.body.contains("8/10"));
        assert!(message.body.ends_with("\nApply at http://x\nJob Posted at 2026-08-05"));
    }

    #[tokio::test]
    async fn unscored_posting_falls_back_to_the_sentinel() {
        let mut p = posting(None);
        p.score = None;
        let message = compose(&DownOracle, &p, 1).await;
        assert!(message.body.contains("unavailable"));
    }
}
