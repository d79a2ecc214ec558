//! Configuration for a pipeline run.
//!
//! All run behaviour is controlled through [`PipelineConfig`], built via its
//! [`PipelineConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share the config across the fan-out stages and to diff two
//! runs to understand why their outputs differ.
//!
//! Credentials live in [`Settings`], loaded from the environment (with
//! `.env` support) once at startup — a missing required variable is a fatal
//! error before any network or file I/O happens.

use crate::error::JobwatchError;
use crate::notify::Notifier;
use crate::oracle::{Oracle, DEFAULT_MODEL};
use crate::pipeline::extract::PageFetcher;
use crate::pipeline::resume::ResumeProfile;
use crate::pipeline::source::JobBoard;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for one pipeline run.
///
/// Built via [`PipelineConfig::builder()`]. The `Option` collaborator fields
/// let callers inject pre-built implementations (tests, custom middleware);
/// when absent, [`crate::run::run`] constructs the production ones.
#[derive(Clone)]
pub struct PipelineConfig {
    /// Path to the résumé PDF. Ignored when `resume` is injected directly.
    pub resume_path: PathBuf,

    /// Worker-pool width for item resolution, scoring, and composition.
    /// Default: 4.
    ///
    /// The oracle stages are network-bound; this cap doubles as the rate
    /// limit on concurrent oracle calls. Raise it if the service quota
    /// allows, lower it on 429s.
    pub concurrency: usize,

    /// Completion model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Delay before the single oracle retry, in milliseconds. Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-HTTP-call timeout in seconds (board, scrape, oracle, transport).
    /// Default: 60.
    pub api_timeout_secs: u64,

    /// Compose everything but dispatch nothing. Default: false.
    pub dry_run: bool,

    /// Pre-built oracle. When `None`, a Mistral client is constructed from
    /// `MISTRAL_API_KEY`.
    pub oracle: Option<Arc<dyn Oracle>>,

    /// Pre-built notifier. When `None`, a Twilio client is constructed from
    /// the transport environment variables.
    pub notifier: Option<Arc<dyn Notifier>>,

    /// Pre-built job board. When `None`, the Hacker News API is used.
    pub job_board: Option<Arc<dyn JobBoard>>,

    /// Pre-built career-page fetcher. When `None`, plain HTTP with a
    /// browser-like User-Agent.
    pub page_fetcher: Option<Arc<dyn PageFetcher>>,

    /// Pre-built résumé profile; takes precedence over `resume_path`.
    pub resume: Option<ResumeProfile>,

    /// Per-posting progress events, if anyone is listening.
    pub progress: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            resume_path: PathBuf::new(),
            concurrency: 4,
            model: DEFAULT_MODEL.to_string(),
            retry_backoff_ms: 500,
            api_timeout_secs: 60,
            dry_run: false,
            oracle: None,
            notifier: None,
            job_board: None,
            page_fetcher: None,
            resume: None,
            progress: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("resume_path", &self.resume_path)
            .field("concurrency", &self.concurrency)
            .field("model", &self.model)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("dry_run", &self.dry_run)
            .field("oracle", &self.oracle.as_ref().map(|_| "<dyn Oracle>"))
            .field("notifier", &self.notifier.as_ref().map(|_| "<dyn Notifier>"))
            .field("job_board", &self.job_board.as_ref().map(|_| "<dyn JobBoard>"))
            .field(
                "page_fetcher",
                &self.page_fetcher.as_ref().map(|_| "<dyn PageFetcher>"),
            )
            .field("resume", &self.resume.as_ref().map(|_| "<ResumeProfile>"))
            .finish()
    }
}

impl PipelineConfig {
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn resume_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.resume_path = path.into();
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn dry_run(mut self, v: bool) -> Self {
        self.config.dry_run = v;
        self
    }

    pub fn oracle(mut self, oracle: Arc<dyn Oracle>) -> Self {
        self.config.oracle = Some(oracle);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.config.notifier = Some(notifier);
        self
    }

    pub fn job_board(mut self, board: Arc<dyn JobBoard>) -> Self {
        self.config.job_board = Some(board);
        self
    }

    pub fn page_fetcher(mut self, fetcher: Arc<dyn PageFetcher>) -> Self {
        self.config.page_fetcher = Some(fetcher);
        self
    }

    pub fn resume(mut self, profile: ResumeProfile) -> Self {
        self.config.resume = Some(profile);
        self
    }

    pub fn progress(mut self, callback: ProgressCallback) -> Self {
        self.config.progress = Some(callback);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, JobwatchError> {
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(JobwatchError::InvalidConfig("concurrency must be ≥ 1".into()));
        }
        if c.resume.is_none() && c.resume_path.as_os_str().is_empty() {
            return Err(JobwatchError::InvalidConfig(
                "a résumé path (or pre-built profile) is required".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Environment settings ─────────────────────────────────────────────────

/// Credentials and settings loaded from the environment.
///
/// Variable names match the deployment surface: transport account and
/// numbers, oracle key, résumé path. `JOBWATCH_MODEL` is the only optional
/// entry.
#[derive(Debug, Clone)]
pub struct Settings {
    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    pub twilio_from: String,
    pub twilio_to: String,
    pub mistral_api_key: String,
    pub resume_path: PathBuf,
    pub model: String,
}

impl Settings {
    /// Load settings, reading `.env` if present. Missing required variables
    /// are fatal.
    pub fn from_env() -> Result<Self, JobwatchError> {
        dotenvy::dotenv().ok();

        Ok(Settings {
            twilio_account_sid: require_env("TWILIO_AUTH_SID")?,
            twilio_auth_token: require_env("TWILIO_AUTH_TOKEN")?,
            twilio_from: require_env("TWILIO_NUMBER")?,
            twilio_to: require_env("PERSONAL_NUMBER")?,
            mistral_api_key: require_env("MISTRAL_API_KEY")?,
            resume_path: PathBuf::from(require_env("RESUME_PATH")?),
            model: std::env::var("JOBWATCH_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
        })
    }
}

pub(crate) fn require_env(name: &str) -> Result<String, JobwatchError> {
    std::env::var(name).map_err(|_| JobwatchError::MissingConfig {
        name: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_clamps_concurrency() {
        let config = PipelineConfig::builder()
            .resume_path("/tmp/resume.pdf")
            .concurrency(0)
            .build()
            .unwrap();
        assert_eq!(config.concurrency, 1);
    }

    #[test]
    fn build_requires_a_resume_source() {
        let err = PipelineConfig::builder().build().unwrap_err();
        assert!(matches!(err, JobwatchError::InvalidConfig(_)));

        let ok = PipelineConfig::builder()
            .resume(ResumeProfile::from_raw("Rust engineer"))
            .build();
        assert!(ok.is_ok());
    }

    #[test]
    fn require_env_reports_the_variable_name() {
        let err = require_env("JOBWATCH_TEST_SURELY_UNSET").unwrap_err();
        assert!(err.to_string().contains("JOBWATCH_TEST_SURELY_UNSET"));
    }
}
