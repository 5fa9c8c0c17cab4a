/*!
 * Diagnostics collected while cleaning a transcript.
 */

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::errors::TranscriptIssue;

/// A transcript issue tied to the line it was found on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub line: usize,
    #[serde(flatten)]
    pub issue: TranscriptIssue,
}

impl Diagnostic {
    pub fn new(line: usize, issue: TranscriptIssue) -> Self {
        Self { line, issue }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.issue)
    }
}

impl TranscriptIssue {
    /// Stable name used in summaries and reports
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::MalformedLine { .. } => "malformed_line",
            Self::UnbalancedBracket { .. } => "unbalanced_bracket",
            Self::UnknownMarkerCode { .. } => "unknown_marker_code",
            Self::OrphanDependentTier { .. } => "orphan_dependent_tier",
        }
    }
}

/// Count diagnostics per kind, sorted by kind name
pub fn count_by_kind(diagnostics: &[Diagnostic]) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for diagnostic in diagnostics {
        *counts.entry(diagnostic.issue.kind_name()).or_insert(0) += 1;
    }
    counts
}

/// One-line summary such as `1 malformed_line, 2 unknown_marker_code`
pub fn summarize(diagnostics: &[Diagnostic]) -> String {
    if diagnostics.is_empty() {
        return "no issues".to_string();
    }
    count_by_kind(diagnostics)
        .into_iter()
        .map(|(kind, count)| format!("{} {}", count, kind))
        .collect::<Vec<_>>()
        .join(", ")
}
