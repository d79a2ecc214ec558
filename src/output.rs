//! Run results: per-posting outcomes plus aggregate statistics.
//!
//! A run that degrades still returns `Ok` — callers inspect the outcome
//! records to distinguish clean postings from those that fell back to a
//! sentinel score, a templated message, or an undelivered dispatch.

use crate::error::PostingError;
use crate::pipeline::source::JobPosting;
use serde::Serialize;

/// The final record for one posting that survived the date filter.
#[derive(Debug, Clone, Serialize)]
pub struct PostingOutcome {
    pub posting: JobPosting,
    /// The composed notification body, footer lines included.
    pub message: String,
    /// True when the composition oracle failed and the templated fallback
    /// body was used.
    pub compose_degraded: bool,
    /// True once the transport accepted the message.
    pub dispatched: bool,
    /// Set when the transport rejected this posting's message.
    pub dispatch_error: Option<PostingError>,
}

impl PostingOutcome {
    /// True when the scoring oracle failed and the posting carries the
    /// sentinel score.
    pub fn score_degraded(&self) -> bool {
        self.posting
            .score
            .as_ref()
            .is_some_and(|score| score.is_degraded())
    }
}

/// Aggregate counters and timings for one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    /// Ids listed by the job-board index.
    pub indexed: usize,
    /// Index entries that failed to resolve and were dropped.
    pub dropped_records: usize,
    /// Postings whose posted date matched today.
    pub matched_today: usize,
    /// Postings carrying the sentinel score.
    pub degraded_scores: usize,
    /// Postings whose message fell back to the local template.
    pub degraded_messages: usize,
    /// Messages the transport accepted.
    pub dispatched: usize,
    /// Messages the transport rejected.
    pub dispatch_failures: usize,
    pub total_duration_ms: u64,
    pub source_duration_ms: u64,
    pub oracle_duration_ms: u64,
}

/// Everything a run produced.
#[derive(Debug, Serialize)]
pub struct RunOutput {
    /// One outcome per surviving posting, ordered by `(posted_date, subject)`.
    pub outcomes: Vec<PostingOutcome>,
    pub stats: RunStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::score::ScoreOutcome;
    use chrono::NaiveDate;

    fn outcome(score: Option<ScoreOutcome>) -> PostingOutcome {
        PostingOutcome {
            posting: JobPosting {
                id: 1,
                posted_date: NaiveDate::from_ymd_opt(2026, 8, 5).unwrap(),
                subject: "Backend Engineer".into(),
                apply_url: None,
                description: String::new(),
                score,
            },
            message: String::new(),
            compose_degraded: false,
            dispatched: false,
            dispatch_error: None,
        }
    }

    #[test]
    fn score_degraded_tracks_the_sentinel() {
        assert!(outcome(Some(ScoreOutcome::Unavailable)).score_degraded());
        assert!(!outcome(Some(ScoreOutcome::Rated("9/10".into()))).score_degraded());
        assert!(!outcome(None).score_degraded());
    }
}
