//! End-to-end pipeline tests with in-memory collaborators.
//!
//! Every external surface — job board, career pages, oracle, transport — is
//! replaced by a fake injected through `PipelineConfig`, so these tests run
//! without network access and exercise the real orchestration: mapping,
//! enrichment, the date filter, both oracle stages, degradation paths, and
//! dispatch accounting.

use async_trait::async_trait;
use chrono::Local;
use jobwatch::{
    run, JobBoard, JobwatchError, Notifier, NotifyError, Oracle, OracleError, PageFetcher,
    PipelineConfig, PostingError, RawItem, ResumeProfile, ScoreOutcome,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

// ── Fakes ────────────────────────────────────────────────────────────────────

struct FakeBoard {
    items: Vec<RawItem>,
    index_called: AtomicBool,
}

impl FakeBoard {
    fn new(items: Vec<RawItem>) -> Arc<Self> {
        Arc::new(Self {
            items,
            index_called: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl JobBoard for FakeBoard {
    async fn job_ids(&self) -> Result<Vec<u64>, JobwatchError> {
        self.index_called.store(true, Ordering::SeqCst);
        Ok(self.items.iter().map(|item| item.id).collect())
    }

    async fn item(&self, id: u64) -> Result<RawItem, PostingError> {
        self.items
            .iter()
            .find(|item| item.id == id)
            .cloned()
            .ok_or(PostingError::RecordResolutionFailed {
                id,
                detail: "missing".into(),
            })
    }
}

struct DownBoard;

#[async_trait]
impl JobBoard for DownBoard {
    async fn job_ids(&self) -> Result<Vec<u64>, JobwatchError> {
        Err(JobwatchError::SourceUnavailable {
            reason: "connection refused".into(),
        })
    }

    async fn item(&self, id: u64) -> Result<RawItem, PostingError> {
        Err(PostingError::RecordResolutionFailed {
            id,
            detail: "unreachable".into(),
        })
    }
}

struct FakeFetcher(&'static str);

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch(&self, _url: &str) -> Result<String, PostingError> {
        Ok(self.0.to_string())
    }
}

struct FailingFetcher;

#[async_trait]
impl PageFetcher for FailingFetcher {
    async fn fetch(&self, url: &str) -> Result<String, PostingError> {
        Err(PostingError::ScrapeFailed {
            url: url.to_string(),
            detail: "HTTP 403".into(),
        })
    }
}

/// Answers by call site: ratings for scoring prompts, a draft for the rest.
struct StageOracle;

#[async_trait]
impl Oracle for StageOracle {
    async fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        if prompt.contains("score out of 10") {
            Ok("8/10".into())
        } else {
            Ok("Strong match for your profile, worth applying today.".into())
        }
    }
}

struct DownOracle;

#[async_trait]
impl Oracle for DownOracle {
    async fn complete(&self, _prompt: &str) -> Result<String, OracleError> {
        Err(OracleError::Api {
            status: 503,
            message: "overloaded".into(),
        })
    }
}

#[derive(Default)]
struct CollectingNotifier {
    sent: Mutex<Vec<String>>,
}

#[async_trait]
impl Notifier for CollectingNotifier {
    async fn send(&self, body: &str) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(body.to_string());
        Ok(())
    }
}

/// Rejects the first message, accepts the rest.
struct FlakyNotifier {
    rejected_one: AtomicBool,
    sent: Mutex<Vec<String>>,
}

#[async_trait]
impl Notifier for FlakyNotifier {
    async fn send(&self, body: &str) -> Result<(), NotifyError> {
        if !self.rejected_one.swap(true, Ordering::SeqCst) {
            return Err(NotifyError::Api {
                status: 400,
                message: "invalid number".into(),
            });
        }
        self.sent.lock().unwrap().push(body.to_string());
        Ok(())
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn today_item(id: u64, title: &str, url: Option<&str>, text: Option<&str>) -> RawItem {
    RawItem {
        id,
        time: Local::now().timestamp(),
        title: title.into(),
        url: url.map(str::to_string),
        text: text.map(str::to_string),
    }
}

fn resume() -> ResumeProfile {
    ResumeProfile::from_raw("Jane Doe, backend engineer\n\nRust, five years")
}

fn base_config(
    board: Arc<dyn JobBoard>,
    fetcher: Arc<dyn PageFetcher>,
    oracle: Arc<dyn Oracle>,
    notifier: Arc<dyn Notifier>,
) -> PipelineConfig {
    PipelineConfig::builder()
        .resume(resume())
        .job_board(board)
        .page_fetcher(fetcher)
        .oracle(oracle)
        .notifier(notifier)
        .concurrency(2)
        .retry_backoff_ms(1)
        .build()
        .unwrap()
}

// ── Scenarios ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn single_posting_with_url_produces_one_alert() {
    let board = FakeBoard::new(vec![today_item(1, "Backend Engineer", Some("http://x"), None)]);
    let notifier = Arc::new(CollectingNotifier::default());
    let config = base_config(
        board,
        Arc::new(FakeFetcher(
            "<html><body><h1>Backend Engineer</h1><p>Build APIs.</p><p>Ship fast.</p></body></html>",
        )),
        Arc::new(StageOracle),
        Arc::clone(&notifier) as Arc<dyn Notifier>,
    );

    let output = run(&config).await.unwrap();

    assert_eq!(output.outcomes.len(), 1);
    let outcome = &output.outcomes[0];
    assert_eq!(outcome.posting.subject, "Backend Engineer");
    assert_eq!(
        outcome.posting.description,
        "Backend Engineer\nBuild APIs.\nShip fast."
    );
    assert_eq!(
        outcome.posting.score,
        Some(ScoreOutcome::Rated("8/10".into()))
    );
    assert!(outcome.message.contains("Apply at http://x"));
    assert!(outcome
        .message
        .contains(&Local::now().date_naive().to_string()));
    assert!(outcome.dispatched);

    let sent = notifier.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0], outcome.message);
    assert_eq!(output.stats.dispatched, 1);
    assert_eq!(output.stats.matched_today, 1);
}

#[tokio::test]
async fn posting_without_url_carries_inline_text_and_fallback_link() {
    let board = FakeBoard::new(vec![today_item(
        2,
        "Platform Engineer",
        None,
        Some("We need a platform engineer."),
    )]);
    let notifier = Arc::new(CollectingNotifier::default());
    let config = base_config(
        board,
        Arc::new(FailingFetcher),
        Arc::new(StageOracle),
        Arc::clone(&notifier) as Arc<dyn Notifier>,
    );

    let output = run(&config).await.unwrap();

    let outcome = &output.outcomes[0];
    assert_eq!(outcome.posting.description, "We need a platform engineer.");
    assert!(outcome.posting.apply_url.is_none());
    assert!(outcome.message.contains("Apply at job board listing"));
}

#[tokio::test]
async fn stale_postings_are_dropped_by_the_date_filter() {
    let two_days_ago = Local::now().timestamp() - 2 * 24 * 60 * 60;
    let board = FakeBoard::new(vec![RawItem {
        id: 3,
        time: two_days_ago,
        title: "Old Posting".into(),
        url: None,
        text: Some("stale".into()),
    }]);
    let notifier = Arc::new(CollectingNotifier::default());
    let config = base_config(
        board,
        Arc::new(FailingFetcher),
        Arc::new(StageOracle),
        Arc::clone(&notifier) as Arc<dyn Notifier>,
    );

    let output = run(&config).await.unwrap();

    assert!(output.outcomes.is_empty());
    assert_eq!(output.stats.indexed, 1);
    assert_eq!(output.stats.matched_today, 0);
    assert!(notifier.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn oracle_outage_degrades_but_still_sends() {
    let board = FakeBoard::new(vec![today_item(
        4,
        "Backend Engineer",
        None,
        Some("Inline description"),
    )]);
    let notifier = Arc::new(CollectingNotifier::default());
    let config = base_config(
        board,
        Arc::new(FailingFetcher),
        Arc::new(DownOracle),
        Arc::clone(&notifier) as Arc<dyn Notifier>,
    );

    let output = run(&config).await.unwrap();

    let outcome = &output.outcomes[0];
    assert_eq!(outcome.posting.score, Some(ScoreOutcome::Unavailable));
    assert!(outcome.score_degraded());
    assert!(outcome.compose_degraded);
    // The fallback message carries the sentinel and still ends with the footer.
    assert!(outcome.message.contains("unavailable"));
    assert!(outcome.message.contains("Apply at job board listing"));
    assert!(outcome.dispatched);
    assert_eq!(output.stats.degraded_scores, 1);
    assert_eq!(output.stats.degraded_messages, 1);
    assert_eq!(notifier.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn scrape_failure_falls_back_to_empty_description() {
    let board = FakeBoard::new(vec![today_item(
        5,
        "Backend Engineer",
        Some("http://blocked.example"),
        None,
    )]);
    let notifier = Arc::new(CollectingNotifier::default());
    let config = base_config(
        board,
        Arc::new(FailingFetcher),
        Arc::new(StageOracle),
        Arc::clone(&notifier) as Arc<dyn Notifier>,
    );

    let output = run(&config).await.unwrap();

    let outcome = &output.outcomes[0];
    assert_eq!(outcome.posting.description, "");
    assert!(outcome.message.contains("Apply at http://blocked.example"));
    assert!(outcome.dispatched);
}

#[tokio::test]
async fn unreachable_index_is_fatal_and_sends_nothing() {
    let notifier = Arc::new(CollectingNotifier::default());
    let config = base_config(
        Arc::new(DownBoard),
        Arc::new(FailingFetcher),
        Arc::new(StageOracle),
        Arc::clone(&notifier) as Arc<dyn Notifier>,
    );

    let err = run(&config).await.unwrap_err();

    assert!(matches!(err, JobwatchError::SourceUnavailable { .. }));
    assert!(notifier.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unreadable_resume_aborts_before_any_fetch() {
    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    use std::io::Write;
    tmp.write_all(b"not a pdf at all").unwrap();

    let board = FakeBoard::new(vec![]);
    let notifier = Arc::new(CollectingNotifier::default());
    let config = PipelineConfig::builder()
        .resume_path(tmp.path())
        .job_board(Arc::clone(&board) as Arc<dyn JobBoard>)
        .page_fetcher(Arc::new(FailingFetcher))
        .oracle(Arc::new(StageOracle))
        .notifier(Arc::clone(&notifier) as Arc<dyn Notifier>)
        .retry_backoff_ms(1)
        .build()
        .unwrap();

    let err = run(&config).await.unwrap_err();

    assert!(matches!(err, JobwatchError::ResumeUnreadable { .. }));
    assert!(!board.index_called.load(Ordering::SeqCst));
    assert!(notifier.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn dispatch_failure_does_not_block_other_messages() {
    let board = FakeBoard::new(vec![
        today_item(10, "Alpha Engineer", None, Some("first")),
        today_item(11, "Beta Engineer", None, Some("second")),
    ]);
    let notifier = Arc::new(FlakyNotifier {
        rejected_one: AtomicBool::new(false),
        sent: Mutex::new(Vec::new()),
    });
    let config = base_config(
        board,
        Arc::new(FailingFetcher),
        Arc::new(StageOracle),
        Arc::clone(&notifier) as Arc<dyn Notifier>,
    );

    let output = run(&config).await.unwrap();

    // Dispatch order is sorted by (posted_date, subject), so Alpha is the
    // rejected message and Beta still goes out.
    assert_eq!(output.outcomes.len(), 2);
    assert_eq!(output.outcomes[0].posting.subject, "Alpha Engineer");
    assert!(!output.outcomes[0].dispatched);
    assert!(matches!(
        output.outcomes[0].dispatch_error,
        Some(PostingError::DispatchFailed { .. })
    ));
    assert_eq!(output.outcomes[1].posting.subject, "Beta Engineer");
    assert!(output.outcomes[1].dispatched);
    assert_eq!(output.stats.dispatched, 1);
    assert_eq!(output.stats.dispatch_failures, 1);
    assert_eq!(notifier.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn dry_run_composes_but_dispatches_nothing() {
    let board = FakeBoard::new(vec![today_item(12, "Backend Engineer", None, Some("text"))]);
    let config = PipelineConfig::builder()
        .resume(resume())
        .job_board(board)
        .page_fetcher(Arc::new(FailingFetcher))
        .oracle(Arc::new(StageOracle))
        .dry_run(true)
        .retry_backoff_ms(1)
        .build()
        .unwrap();

    let output = run(&config).await.unwrap();

    assert_eq!(output.outcomes.len(), 1);
    assert!(!output.outcomes[0].message.is_empty());
    assert!(!output.outcomes[0].dispatched);
    assert_eq!(output.stats.dispatched, 0);
}

#[tokio::test]
async fn broken_record_is_dropped_and_the_rest_survive() {
    // The index lists an id the item endpoint cannot resolve.
    let board = FakeBoard::new(vec![today_item(20, "Gamma Engineer", None, Some("ok"))]);

    struct HalfBrokenBoard(Arc<FakeBoard>);

    #[async_trait]
    impl JobBoard for HalfBrokenBoard {
        async fn job_ids(&self) -> Result<Vec<u64>, JobwatchError> {
            Ok(vec![20, 999])
        }

        async fn item(&self, id: u64) -> Result<RawItem, PostingError> {
            self.0.item(id).await
        }
    }

    let notifier = Arc::new(CollectingNotifier::default());
    let config = base_config(
        Arc::new(HalfBrokenBoard(board)),
        Arc::new(FailingFetcher),
        Arc::new(StageOracle),
        Arc::clone(&notifier) as Arc<dyn Notifier>,
    );

    let output = run(&config).await.unwrap();

    assert_eq!(output.stats.indexed, 2);
    assert_eq!(output.stats.dropped_records, 1);
    assert_eq!(output.outcomes.len(), 1);
    assert_eq!(output.outcomes[0].posting.subject, "Gamma Engineer");
}
