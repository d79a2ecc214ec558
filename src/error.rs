//! Error types for the jobwatch library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`JobwatchError`] — **Fatal**: the run cannot proceed at all (unreadable
//!   résumé, unreachable job-board index, missing credentials). Returned as
//!   `Err(JobwatchError)` from [`crate::run::run`] before any message is
//!   dispatched.
//!
//! * [`PostingError`] — **Non-fatal**: a single posting degraded (item lookup
//!   failed, career page could not be scraped, an oracle call failed after
//!   its retry, the transport rejected one message) while all other postings
//!   are fine. Stored inside [`crate::output::PostingOutcome`] so callers can
//!   inspect partial success rather than losing the whole day's alerts to one
//!   bad posting.
//!
//! Only the fatal kind stops the pipeline; every recovered kind substitutes a
//! placeholder value so a degraded run still sends one message per surviving
//! posting.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the jobwatch library.
///
/// Per-posting failures use [`PostingError`] and are stored in
/// [`crate::output::PostingOutcome`] rather than propagated here.
#[derive(Debug, Error)]
pub enum JobwatchError {
    /// The résumé document is missing or not a parsable PDF.
    /// Without a résumé no scoring is possible, so the run aborts before
    /// any fetch.
    #[error("résumé could not be read: '{path}': {detail}")]
    ResumeUnreadable { path: PathBuf, detail: String },

    /// The job-board postings index was unreachable.
    #[error("job board index unreachable: {reason}")]
    SourceUnavailable { reason: String },

    /// A required credential or setting is missing from the environment.
    #[error("required environment variable '{name}' is not set")]
    MissingConfig { name: String },

    /// Builder validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Which oracle call site a degraded posting came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum OracleStage {
    Scoring,
    Composition,
}

impl fmt::Display for OracleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OracleStage::Scoring => write!(f, "scoring"),
            OracleStage::Composition => write!(f, "composition"),
        }
    }
}

/// A non-fatal error for a single posting.
///
/// The run continues past every one of these; the posting carries a sentinel
/// score, an empty description, or a templated fallback message instead.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PostingError {
    /// Looking up one item from the job-board index failed. The posting is
    /// dropped from the batch.
    #[error("item {id}: lookup failed: {detail}")]
    RecordResolutionFailed { id: u64, detail: String },

    /// Fetching or parsing a posting's linked career page failed. The
    /// posting's description falls back to an empty string.
    #[error("scrape of '{url}' failed: {detail}")]
    ScrapeFailed { url: String, detail: String },

    /// An oracle call failed after its retry. The posting carries a sentinel
    /// score or a templated fallback message.
    #[error("{stage} oracle failed after {retries} retries: {detail}")]
    OracleUnavailable {
        stage: OracleStage,
        retries: u32,
        detail: String,
    },

    /// The message transport rejected this posting's message. Other messages
    /// are still attempted.
    #[error("message dispatch failed: {detail}")]
    DispatchFailed { detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resume_unreadable_display() {
        let e = JobwatchError::ResumeUnreadable {
            path: PathBuf::from("/home/me/resume.pdf"),
            detail: "not a PDF".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("resume.pdf"), "got: {msg}");
        assert!(msg.contains("not a PDF"));
    }

    #[test]
    fn missing_config_display() {
        let e = JobwatchError::MissingConfig {
            name: "MISTRAL_API_KEY".into(),
        };
        assert!(e.to_string().contains("MISTRAL_API_KEY"));
    }

    #[test]
    fn oracle_unavailable_display() {
        let e = PostingError::OracleUnavailable {
            stage: OracleStage::Scoring,
            retries: 1,
            detail: "HTTP 503".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("scoring"));
        assert!(msg.contains("1 retries"));
        assert!(msg.contains("HTTP 503"));
    }

    #[test]
    fn record_resolution_display() {
        let e = PostingError::RecordResolutionFailed {
            id: 42,
            detail: "timeout".into(),
        };
        assert!(e.to_string().contains("item 42"));
    }
}
