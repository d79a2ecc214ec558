//! CLI binary for jobwatch.
//!
//! A thin shim over the library crate that maps CLI flags and environment
//! configuration to `PipelineConfig` and prints a run summary.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use jobwatch::{
    run, MistralOracle, PipelineConfig, ProgressCallback, RunProgressCallback, Settings,
    TwilioNotifier, DEFAULT_MODEL,
};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar over the posting fan-out plus a
/// per-posting log line. Postings complete out of order (concurrent mode),
/// so every method only appends.
struct CliProgress {
    bar: ProgressBar,
    degraded: AtomicUsize,
}

impl CliProgress {
    /// Create a callback whose bar length is set by `on_run_start` once the
    /// date filter has decided how many postings are in play.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(spinner_style);
        bar.set_prefix("Fetching");
        bar.set_message("Loading résumé and postings…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            degraded: AtomicUsize::new(0),
        })
    }
}

impl RunProgressCallback for CliProgress {
    fn on_run_start(&self, total_postings: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>2}/{len} postings  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar());

        self.bar.set_length(total_postings as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Scoring");
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("{total_postings} posting(s) from today"))
        ));
    }

    fn on_posting_scored(&self, subject: &str, degraded: bool) {
        self.bar.set_message(subject.to_string());
        if degraded {
            self.degraded.fetch_add(1, Ordering::SeqCst);
            self.bar
                .println(format!("  {} score unavailable: {subject}", red("✗")));
        }
    }

    fn on_posting_composed(&self, subject: &str, degraded: bool) {
        let mark = if degraded { red("✗") } else { green("✓") };
        let note = if degraded { "  (fallback message)" } else { "" };
        self.bar.println(format!("  {mark} {subject}{}", dim(note)));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, total_postings: usize, dispatched: usize) {
        self.bar.finish_and_clear();
        let degraded = self.degraded.load(Ordering::SeqCst);

        if dispatched == total_postings && degraded == 0 {
            eprintln!(
                "{} {} alert(s) dispatched",
                green("✔"),
                bold(&dispatched.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} alert(s) dispatched  ({} degraded)",
                cyan("⚠"),
                bold(&dispatched.to_string()),
                total_postings,
                degraded,
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Daily run (credentials from .env or the environment)
  jobwatch

  # Explicit résumé, wider worker pool
  jobwatch --resume ~/cv.pdf --concurrency 8

  # Compose everything but send nothing
  jobwatch --dry-run

  # Structured output for scripting
  jobwatch --json > run.json

ENVIRONMENT VARIABLES:
  MISTRAL_API_KEY     Oracle API key (required)
  JOBWATCH_MODEL      Completion model (default: mistral-large-latest)
  RESUME_PATH         Résumé PDF path (or pass --resume)
  TWILIO_AUTH_SID     Transport account sid (required unless --dry-run)
  TWILIO_AUTH_TOKEN   Transport auth token (required unless --dry-run)
  TWILIO_NUMBER       Transport source number (required unless --dry-run)
  PERSONAL_NUMBER     Destination number (required unless --dry-run)

A `.env` file in the working directory is read automatically.
"#;

/// Score today's job-board postings against a résumé and send SMS alerts.
#[derive(Parser, Debug)]
#[command(
    name = "jobwatch",
    version,
    about = "Score today's job-board postings against a résumé and send SMS alerts",
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Résumé PDF path (overrides RESUME_PATH).
    #[arg(short, long)]
    resume: Option<PathBuf>,

    /// Worker-pool width for scraping, scoring, and composition.
    #[arg(short, long, env = "JOBWATCH_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Completion model ID (overrides JOBWATCH_MODEL).
    #[arg(long)]
    model: Option<String>,

    /// Delay before the single oracle retry, in milliseconds.
    #[arg(long, env = "JOBWATCH_RETRY_BACKOFF_MS", default_value_t = 500)]
    retry_backoff_ms: u64,

    /// Per-HTTP-call timeout in seconds.
    #[arg(long, env = "JOBWATCH_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Compose alerts but do not dispatch them; drafts go to stdout.
    #[arg(long)]
    dry_run: bool,

    /// Output the structured run result as JSON instead of a summary.
    #[arg(long)]
    json: bool,

    /// Disable the progress bar.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs while the progress bar is active;
    // the bar provides all the feedback that matters.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgress::new_dynamic() as Arc<dyn RunProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress)?;

    // ── Run ──────────────────────────────────────────────────────────────
    let output = run(&config).await.context("Run failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialise run output")?
        );
        return Ok(());
    }

    if cli.dry_run {
        for outcome in &output.outcomes {
            println!("{}", outcome.message);
            println!("{}", dim("────"));
        }
    }

    // Summary (the progress callback already printed the final tick).
    if !cli.quiet && !show_progress {
        eprintln!(
            "{}/{} alert(s) dispatched in {}ms",
            output.stats.dispatched, output.stats.matched_today, output.stats.total_duration_ms
        );
        if output.stats.dispatch_failures > 0 {
            eprintln!("  {} dispatch failure(s)", output.stats.dispatch_failures);
        }
    }

    Ok(())
}

/// Map CLI flags and environment settings to `PipelineConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<PipelineConfig> {
    dotenvy::dotenv().ok();

    let mut builder = PipelineConfig::builder()
        .concurrency(cli.concurrency)
        .retry_backoff_ms(cli.retry_backoff_ms)
        .api_timeout_secs(cli.api_timeout)
        .dry_run(cli.dry_run);

    if let Some(cb) = progress {
        builder = builder.progress(cb);
    }

    if cli.dry_run {
        // No transport credentials needed; the oracle key still is.
        let api_key = std::env::var("MISTRAL_API_KEY").context("MISTRAL_API_KEY is not set")?;
        let model = cli.model.clone().unwrap_or_else(|| {
            std::env::var("JOBWATCH_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string())
        });
        let resume_path = match &cli.resume {
            Some(path) => path.clone(),
            None => PathBuf::from(
                std::env::var("RESUME_PATH")
                    .context("RESUME_PATH is not set and --resume was not given")?,
            ),
        };
        builder = builder
            .oracle(Arc::new(MistralOracle::new(
                api_key,
                model.clone(),
                cli.api_timeout,
            )))
            .model(model)
            .resume_path(resume_path);
    } else {
        let settings = Settings::from_env().context("Failed to load configuration")?;
        let model = cli.model.clone().unwrap_or_else(|| settings.model.clone());
        builder = builder
            .oracle(Arc::new(MistralOracle::new(
                settings.mistral_api_key.clone(),
                model.clone(),
                cli.api_timeout,
            )))
            .notifier(Arc::new(TwilioNotifier::new(
                settings.twilio_account_sid.clone(),
                settings.twilio_auth_token.clone(),
                settings.twilio_from.clone(),
                settings.twilio_to.clone(),
                cli.api_timeout,
            )))
            .model(model)
            .resume_path(cli.resume.clone().unwrap_or(settings.resume_path));
    }

    Ok(builder.build().context("Invalid configuration")?)
}
