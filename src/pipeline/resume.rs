//! Résumé loading: one cleaned text blob representing the candidate profile.
//!
//! PDF text comes out ragged — hard-wrapped lines, ligatures and other
//! non-ASCII artefacts, blank-line noise between layout blocks. The profile
//! keeps an ordered list of cleaned segments instead of the raw dump so the
//! scoring prompt stays compact and printable.
//!
//! The profile is constructed once per run and then shared read-only (via
//! `Arc`) across all concurrent scoring calls.

use crate::error::JobwatchError;
use crate::pipeline::extract;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::info;

static RE_NON_ASCII: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\x00-\x7F]+").unwrap());

/// The candidate profile: ordered, non-empty text segments extracted from
/// the résumé document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeProfile {
    segments: Vec<String>,
}

impl ResumeProfile {
    /// Load and clean the résumé at `path`.
    ///
    /// Fatal when the file is missing or not a parsable PDF — the run cannot
    /// score anything without it.
    pub fn load(path: &Path) -> Result<Self, JobwatchError> {
        let raw = extract::pdf_text(path)?;
        let profile = Self::from_raw(&raw);
        info!(
            "résumé loaded from {}: {} segment(s)",
            path.display(),
            profile.segments.len()
        );
        Ok(profile)
    }

    /// Build a profile from already-extracted document text.
    ///
    /// Segments are delimited by blank lines; within each segment non-ASCII
    /// characters are stripped and internal newlines flattened to spaces.
    /// Segments that clean down to nothing are dropped.
    pub fn from_raw(raw: &str) -> Self {
        let segments = raw
            .split("\n\n")
            .map(|segment| {
                let ascii = RE_NON_ASCII.replace_all(segment, "");
                ascii.replace('\n', " ").trim().to_string()
            })
            .filter(|segment| !segment.is_empty())
            .collect();

        Self { segments }
    }

    /// The cleaned profile text, one segment per line.
    pub fn text(&self) -> String {
        self.segments.join("\n")
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_strips_non_ascii_and_flattens_newlines() {
        let raw = "Jane Doe\nBackend \u{2022} Engineer\n\nRust \u{2014} five years";
        let profile = ResumeProfile::from_raw(raw);

        assert_eq!(
            profile.segments(),
            &["Jane Doe Backend  Engineer", "Rust  five years"]
        );
        assert_eq!(
            profile.text(),
            "Jane Doe Backend  Engineer\nRust  five years"
        );
    }

    #[test]
    fn from_raw_drops_empty_segments() {
        let raw = "first\n\n \n\n\u{00A0}\u{00A0}\n\nsecond\n\n";
        let profile = ResumeProfile::from_raw(raw);
        assert_eq!(profile.segments(), &["first", "second"]);
    }

    #[test]
    fn empty_document_yields_empty_profile() {
        let profile = ResumeProfile::from_raw("");
        assert!(profile.is_empty());
        assert_eq!(profile.text(), "");
    }
}
