//! Pipeline stages for the job-alert run.
//!
//! Each submodule implements exactly one transformation step. Keeping the
//! stages separate makes each independently testable and lets us swap an
//! implementation (another job board, another extraction backend) without
//! touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! resume ─┐
//! source ─┴▶ score ──▶ compose ──▶ (dispatch)
//! (fetch+extract) (oracle) (oracle+footer)
//! ```
//!
//! 1. [`extract`] — normalised text from HTML and PDF; the page-fetch seam
//! 2. [`resume`]  — the cleaned candidate profile, loaded once per run
//! 3. [`source`]  — job-board index/items mapped to postings, enriched and
//!    filtered to today
//! 4. [`score`]   — per-posting applicability rating via the scoring oracle
//! 5. [`compose`] — per-posting SMS draft plus the program-controlled footer
pub mod compose;
pub mod extract;
pub mod resume;
pub mod score;
pub mod source;
