//! The run orchestrator: one linear pass from résumé to dispatched alerts.
//!
//! `Load Résumé → Fetch Postings → Filter By Date → Score All → Compose All
//! → Dispatch All`, no backward transitions. A fatal error while loading the
//! résumé or fetching the index aborts the run before any message is sent —
//! partial notification batches are worse than none. Everything after that
//! point degrades per posting (see [`crate::error::PostingError`]).
//!
//! Scoring and composition fan out over a bounded worker pool
//! (`buffer_unordered`); postings are independent units of work, and the
//! résumé profile is shared read-only via `Arc`. Dropping the returned
//! future cancels the run: in-flight oracle calls are abandoned and no
//! dispatch occurs for abandoned postings, because dispatch strictly follows
//! the oracle stages.

use crate::config::{self, PipelineConfig};
use crate::error::{JobwatchError, PostingError};
use crate::notify::{Notifier, TwilioNotifier};
use crate::oracle::{MistralOracle, Oracle};
use crate::output::{PostingOutcome, RunOutput, RunStats};
use crate::pipeline::extract::{HttpPageFetcher, PageFetcher};
use crate::pipeline::resume::ResumeProfile;
use crate::pipeline::source::{self, HackerNews, JobBoard, JobPosting};
use crate::pipeline::{compose, score};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Execute one pipeline run.
///
/// # Returns
/// `Ok(RunOutput)` on success, even when individual postings degraded
/// (check `output.stats` and the per-posting outcome records).
///
/// # Errors
/// Returns `Err(JobwatchError)` only for fatal conditions:
/// - missing credentials or invalid configuration
/// - unreadable résumé
/// - unreachable job-board index
pub async fn run(config: &PipelineConfig) -> Result<RunOutput, JobwatchError> {
    let total_start = Instant::now();

    // ── Step 1: Resolve collaborators ────────────────────────────────────
    // Missing credentials surface here, before any I/O.
    let oracle = resolve_oracle(config)?;
    let notifier = if config.dry_run {
        None
    } else {
        Some(resolve_notifier(config)?)
    };
    let board: Arc<dyn JobBoard> = config
        .job_board
        .clone()
        .unwrap_or_else(|| Arc::new(HackerNews::new(config.api_timeout_secs)));
    let fetcher: Arc<dyn PageFetcher> = config
        .page_fetcher
        .clone()
        .unwrap_or_else(|| Arc::new(HttpPageFetcher::new(config.api_timeout_secs)));

    // ── Step 2: Load résumé ──────────────────────────────────────────────
    let resume = match &config.resume {
        Some(profile) => profile.clone(),
        None => {
            // PDF parsing is CPU-bound; keep it off the async workers.
            let path = config.resume_path.clone();
            tokio::task::spawn_blocking(move || ResumeProfile::load(&path))
                .await
                .map_err(|e| JobwatchError::Internal(format!("résumé load task panicked: {e}")))??
        }
    };
    if resume.is_empty() {
        warn!("résumé produced no text segments; scores will not be meaningful");
    }

    // ── Step 3: Fetch and filter postings ────────────────────────────────
    let source_start = Instant::now();
    let batch = source::fetch_today(
        Arc::clone(&board),
        Arc::clone(&fetcher),
        config.concurrency,
    )
    .await?;
    let source_duration_ms = source_start.elapsed().as_millis() as u64;

    if let Some(cb) = &config.progress {
        cb.on_run_start(batch.postings.len());
    }

    // ── Step 4: Score all ────────────────────────────────────────────────
    let oracle_start = Instant::now();
    let resume = Arc::new(resume);
    let scored: Vec<JobPosting> = stream::iter(batch.postings.into_iter().map(|mut posting| {
        let oracle = Arc::clone(&oracle);
        let resume = Arc::clone(&resume);
        let progress = config.progress.clone();
        let backoff = config.retry_backoff_ms;
        async move {
            let outcome = score::score(oracle.as_ref(), &resume, &posting, backoff).await;
            if let Some(cb) = &progress {
                cb.on_posting_scored(&posting.subject, outcome.is_degraded());
            }
            posting.score = Some(outcome);
            posting
        }
    }))
    .buffer_unordered(config.concurrency)
    .collect()
    .await;

    // ── Step 5: Compose all ──────────────────────────────────────────────
    let mut outcomes: Vec<PostingOutcome> = stream::iter(scored.into_iter().map(|posting| {
        let oracle = Arc::clone(&oracle);
        let progress = config.progress.clone();
        let backoff = config.retry_backoff_ms;
        async move {
            let message = compose::compose(oracle.as_ref(), &posting, backoff).await;
            if let Some(cb) = &progress {
                cb.on_posting_composed(&posting.subject, message.degraded);
            }
            PostingOutcome {
                posting,
                message: message.body,
                compose_degraded: message.degraded,
                dispatched: false,
                dispatch_error: None,
            }
        }
    }))
    .buffer_unordered(config.concurrency)
    .collect()
    .await;
    let oracle_duration_ms = oracle_start.elapsed().as_millis() as u64;

    // Deterministic dispatch order regardless of completion order.
    outcomes.sort_by(|a, b| {
        (a.posting.posted_date, a.posting.subject.as_str())
            .cmp(&(b.posting.posted_date, b.posting.subject.as_str()))
    });

    // ── Step 6: Dispatch all ─────────────────────────────────────────────
    let mut dispatched = 0usize;
    let mut dispatch_failures = 0usize;
    match &notifier {
        Some(notifier) => {
            for outcome in &mut outcomes {
                match notifier.send(&outcome.message).await {
                    Ok(()) => {
                        outcome.dispatched = true;
                        dispatched += 1;
                    }
                    Err(e) => {
                        let err: PostingError = e.into();
                        warn!("posting {}: {err}", outcome.posting.id);
                        outcome.dispatch_error = Some(err);
                        dispatch_failures += 1;
                    }
                }
            }
        }
        None => {
            info!(
                "dry run: {} message(s) composed, none dispatched",
                outcomes.len()
            );
        }
    }

    if let Some(cb) = &config.progress {
        cb.on_run_complete(outcomes.len(), dispatched);
    }

    // ── Step 7: Stats ────────────────────────────────────────────────────
    let stats = RunStats {
        indexed: batch.indexed,
        dropped_records: batch.dropped,
        matched_today: outcomes.len(),
        degraded_scores: outcomes.iter().filter(|o| o.score_degraded()).count(),
        degraded_messages: outcomes.iter().filter(|o| o.compose_degraded).count(),
        dispatched,
        dispatch_failures,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        source_duration_ms,
        oracle_duration_ms,
    };

    info!(
        "run complete: {}/{} message(s) dispatched, {}ms total",
        dispatched, stats.matched_today, stats.total_duration_ms
    );

    Ok(RunOutput { outcomes, stats })
}

/// Resolve the oracle, most-specific first: a pre-built instance from the
/// config (tests, custom middleware), else a Mistral client built from the
/// environment.
fn resolve_oracle(config: &PipelineConfig) -> Result<Arc<dyn Oracle>, JobwatchError> {
    if let Some(oracle) = &config.oracle {
        return Ok(Arc::clone(oracle));
    }
    let api_key = config::require_env("MISTRAL_API_KEY")?;
    Ok(Arc::new(MistralOracle::new(
        api_key,
        config.model.clone(),
        config.api_timeout_secs,
    )))
}

/// Resolve the notifier: a pre-built instance, else a Twilio client built
/// from the transport environment variables.
fn resolve_notifier(config: &PipelineConfig) -> Result<Arc<dyn Notifier>, JobwatchError> {
    if let Some(notifier) = &config.notifier {
        return Ok(Arc::clone(notifier));
    }
    Ok(Arc::new(TwilioNotifier::new(
        config::require_env("TWILIO_AUTH_SID")?,
        config::require_env("TWILIO_AUTH_TOKEN")?,
        config::require_env("TWILIO_NUMBER")?,
        config::require_env("PERSONAL_NUMBER")?,
        config.api_timeout_secs,
    )))
}
