//! # jobwatch
//!
//! A daily job-alert pipeline: pull new postings from the Hacker News job
//! board, rate each against a résumé with a text-completion oracle, draft a
//! short SMS-style notification per posting, and deliver the batch over a
//! message transport.
//!
//! ## Pipeline Overview
//!
//! ```text
//! résumé PDF
//!  │
//!  ├─ 1. Resume   extract + clean the candidate profile (once per run)
//!  ├─ 2. Source   job-board index → items → postings; scrape linked pages
//!  ├─ 3. Filter   keep postings created today (local calendar date)
//!  ├─ 4. Score    concurrent oracle calls, one rating per posting
//!  ├─ 5. Compose  concurrent oracle drafts + program-controlled footer
//!  └─ 6. Dispatch one SMS per posting, failures logged per message
//! ```
//!
//! Only two failures abort a run — an unreadable résumé and an unreachable
//! postings index — and both happen before anything is sent. Every other
//! failure degrades a single posting: a sentinel score, an empty scraped
//! description, or a templated fallback message.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use jobwatch::{run, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Credentials from the environment: MISTRAL_API_KEY, TWILIO_* ...
//!     let config = PipelineConfig::builder()
//!         .resume_path("resume.pdf")
//!         .concurrency(4)
//!         .build()?;
//!     let output = run(&config).await?;
//!     eprintln!(
//!         "{}/{} alert(s) dispatched",
//!         output.stats.dispatched, output.stats.matched_today
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `jobwatch` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! jobwatch = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod notify;
pub mod oracle;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod run;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PipelineConfig, PipelineConfigBuilder, Settings};
pub use error::{JobwatchError, OracleStage, PostingError};
pub use notify::{Notifier, NotifyError, TwilioNotifier};
pub use oracle::{MistralOracle, Oracle, OracleError, DEFAULT_MODEL};
pub use output::{PostingOutcome, RunOutput, RunStats};
pub use pipeline::compose::APPLY_FALLBACK;
pub use pipeline::extract::{HttpPageFetcher, PageFetcher};
pub use pipeline::resume::ResumeProfile;
pub use pipeline::score::{ScoreOutcome, SCORE_UNAVAILABLE};
pub use pipeline::source::{HackerNews, JobBoard, JobPosting, RawItem, SourceBatch};
pub use progress::{NoopRunProgress, ProgressCallback, RunProgressCallback};
pub use run::run;
