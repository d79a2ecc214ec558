//! Job-board source: today's postings in normalised form.
//!
//! Two read-only HTTP calls against the Hacker News Firebase API — one for
//! the current jobstories index, one per item — mapped into [`JobPosting`]s.
//! Items that link out to a career page are enriched by scraping that page's
//! heading/paragraph text; items with inline text carry it verbatim.
//!
//! Failure policy: an unreachable index is fatal (the run has nothing to
//! work with), but a single item that fails to resolve is logged and
//! dropped. Scrape failures degrade to an empty description — a posting is
//! still usable without an enriched description.

use crate::error::{JobwatchError, PostingError};
use crate::pipeline::extract::{self, PageFetcher};
use crate::pipeline::score::ScoreOutcome;
use async_trait::async_trait;
use chrono::{Local, NaiveDate, TimeZone};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Public Hacker News Firebase API root.
pub const HACKER_NEWS_BASE_URL: &str = "https://hacker-news.firebaseio.com/v0";

/// One raw job-board record, as returned by the item endpoint.
///
/// Unknown fields are ignored; absent `url`/`text` are modelled as `None`
/// (a record carries one or the other).
#[derive(Debug, Clone, Deserialize)]
pub struct RawItem {
    pub id: u64,
    #[serde(default)]
    pub time: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

/// One job posting in the pipeline's uniform representation.
#[derive(Debug, Clone, Serialize)]
pub struct JobPosting {
    pub id: u64,
    pub posted_date: NaiveDate,
    pub subject: String,
    pub apply_url: Option<String>,
    /// Always populated after source processing — empty string at worst.
    pub description: String,
    /// Set by the scorer before any message is composed.
    pub score: Option<ScoreOutcome>,
}

impl JobPosting {
    /// Flatten the posting into `key : value` lines for oracle prompts.
    ///
    /// The score line appears only once the posting has been scored, so the
    /// same rendering serves both oracle call sites.
    pub fn render_fields(&self) -> String {
        let mut lines = vec![
            format!("Job Posted Date : {}", self.posted_date),
            format!("Subject : {}", self.subject),
        ];
        if let Some(url) = &self.apply_url {
            lines.push(format!("Apply at : {url}"));
        }
        lines.push(format!("Description : {}", self.description));
        if let Some(score) = &self.score {
            lines.push(format!("Applicability : {score}"));
        }
        lines.join("\n")
    }
}

/// The job-board API: an index of posting ids plus per-id records.
#[async_trait]
pub trait JobBoard: Send + Sync {
    async fn job_ids(&self) -> Result<Vec<u64>, JobwatchError>;
    async fn item(&self, id: u64) -> Result<RawItem, PostingError>;
}

/// [`JobBoard`] over the Hacker News Firebase API.
pub struct HackerNews {
    client: reqwest::Client,
    base_url: String,
}

impl HackerNews {
    pub fn new(timeout_secs: u64) -> Self {
        Self::with_base_url(HACKER_NEWS_BASE_URL, timeout_secs)
    }

    pub fn with_base_url(base_url: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(timeout_secs))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl JobBoard for HackerNews {
    async fn job_ids(&self) -> Result<Vec<u64>, JobwatchError> {
        let url = format!("{}/jobstories.json", self.base_url);
        let response =
            self.client
                .get(&url)
                .send()
                .await
                .map_err(|e| JobwatchError::SourceUnavailable {
                    reason: e.to_string(),
                })?;

        let status = response.status();
        if !status.is_success() {
            return Err(JobwatchError::SourceUnavailable {
                reason: format!("HTTP {status}"),
            });
        }

        response
            .json::<Vec<u64>>()
            .await
            .map_err(|e| JobwatchError::SourceUnavailable {
                reason: e.to_string(),
            })
    }

    async fn item(&self, id: u64) -> Result<RawItem, PostingError> {
        let url = format!("{}/item/{id}.json", self.base_url);
        let response =
            self.client
                .get(&url)
                .send()
                .await
                .map_err(|e| PostingError::RecordResolutionFailed {
                    id,
                    detail: e.to_string(),
                })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PostingError::RecordResolutionFailed {
                id,
                detail: format!("HTTP {status}"),
            });
        }

        // The API answers `null` for deleted or unknown ids.
        response
            .json::<Option<RawItem>>()
            .await
            .map_err(|e| PostingError::RecordResolutionFailed {
                id,
                detail: e.to_string(),
            })?
            .ok_or(PostingError::RecordResolutionFailed {
                id,
                detail: "item not found".to_string(),
            })
    }
}

/// The result of one source pass: today's postings plus batch counters.
#[derive(Debug)]
pub struct SourceBatch {
    pub postings: Vec<JobPosting>,
    /// Ids listed by the index.
    pub indexed: usize,
    /// Ids that failed to resolve and were dropped.
    pub dropped: usize,
}

/// Fetch the postings index, resolve and enrich every record concurrently,
/// and keep only postings created today (local calendar date).
pub async fn fetch_today(
    board: Arc<dyn JobBoard>,
    fetcher: Arc<dyn PageFetcher>,
    concurrency: usize,
) -> Result<SourceBatch, JobwatchError> {
    let ids = board.job_ids().await?;
    let indexed = ids.len();
    info!("job board index: {indexed} posting(s)");

    let resolved: Vec<Option<JobPosting>> = stream::iter(ids.into_iter().map(|id| {
        let board = Arc::clone(&board);
        let fetcher = Arc::clone(&fetcher);
        async move {
            match board.item(id).await {
                Ok(item) => build_posting(item, fetcher.as_ref()).await,
                Err(e) => {
                    warn!("{e}");
                    None
                }
            }
        }
    }))
    .buffer_unordered(concurrency)
    .collect()
    .await;

    let postings: Vec<JobPosting> = resolved.into_iter().flatten().collect();
    let dropped = indexed - postings.len();

    let today = Local::now().date_naive();
    let matched: Vec<JobPosting> = postings
        .into_iter()
        .filter(|posting| posting.posted_date == today)
        .collect();
    info!(
        "{} posting(s) from today ({} resolved, {} dropped)",
        matched.len(),
        indexed - dropped,
        dropped
    );

    Ok(SourceBatch {
        postings: matched,
        indexed,
        dropped,
    })
}

/// Map one raw record into a [`JobPosting`], scraping the linked page when
/// the record has no inline text.
async fn build_posting(item: RawItem, fetcher: &dyn PageFetcher) -> Option<JobPosting> {
    let Some(posted_date) = posted_date_local(item.time) else {
        warn!("item {}: unrepresentable timestamp {}", item.id, item.time);
        return None;
    };

    let (apply_url, description) = match item.url {
        Some(url) => {
            let description = match fetcher.fetch(&url).await {
                Ok(html) => extract::heading_paragraph_text(&html),
                Err(e) => {
                    warn!("{e}");
                    String::new()
                }
            };
            (Some(url), description)
        }
        None => (None, item.text.unwrap_or_default()),
    };

    Some(JobPosting {
        id: item.id,
        posted_date,
        subject: item.title,
        apply_url,
        description,
        score: None,
    })
}

/// Calendar date of an epoch timestamp in the pipeline's local time zone.
pub(crate) fn posted_date_local(epoch_secs: i64) -> Option<NaiveDate> {
    Local
        .timestamp_opt(epoch_secs, 0)
        .single()
        .map(|dt| dt.date_naive())
}
