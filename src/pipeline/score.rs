//! Applicability scoring: one oracle call per posting, résumé shared.
//!
//! The oracle's reply is stored verbatim — the documented contract is a
//! short rating out of 10, but nothing here parses or validates it beyond
//! non-emptiness. A posting whose scoring call fails after its retry is
//! marked [`ScoreOutcome::Unavailable`] instead of aborting the run: one bad
//! posting must not block the others.

use crate::error::OracleStage;
use crate::oracle::{self, Oracle};
use crate::pipeline::resume::ResumeProfile;
use crate::pipeline::source::JobPosting;
use crate::prompts;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Sentinel rendered for postings whose scoring degraded, visibly different
/// from any real rating so the reader can recognise reduced confidence.
pub const SCORE_UNAVAILABLE: &str = "unavailable";

/// A posting's relevance rating: the oracle's verbatim reply, or the
/// degraded placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreOutcome {
    Rated(String),
    Unavailable,
}

impl ScoreOutcome {
    pub fn as_str(&self) -> &str {
        match self {
            ScoreOutcome::Rated(rating) => rating,
            ScoreOutcome::Unavailable => SCORE_UNAVAILABLE,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, ScoreOutcome::Unavailable)
    }
}

impl fmt::Display for ScoreOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rate one posting against the résumé.
pub async fn score(
    oracle: &dyn Oracle,
    resume: &ResumeProfile,
    posting: &JobPosting,
    backoff_ms: u64,
) -> ScoreOutcome {
    let prompt = prompts::scoring_prompt(&resume.text(), &posting.render_fields());

    match oracle::complete_with_retry(oracle, OracleStage::Scoring, &prompt, backoff_ms).await {
        Ok(reply) => ScoreOutcome::Rated(reply),
        Err(e) => {
            warn!("posting {}: {e}", posting.id);
            ScoreOutcome::Unavailable
        }
    }
}
