/*!
 * Transcript assembler.
 *
 * Drives the line stream in a single pass. A logical line (header, utterance or
 * dependent tier) stays open until the next non-continuation line arrives, so
 * continuation lines can be joined onto it. An utterance stays open until the
 * next header, utterance, unrecognized line or end of input, collecting its
 * dependent tiers; it is then transformed and emitted together with them.
 */

use log::{debug, warn};
use serde::Serialize;

use crate::chat::dependent::{keep_tier, DependentTier};
use crate::chat::diagnostics::Diagnostic;
use crate::chat::line::{classify, split_main_tier, Category};
use crate::chat::rules::RuleTable;
use crate::chat::transformer::TierTransformer;
use crate::errors::TranscriptIssue;

/// Counters describing what happened to a transcript
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssemblyStats {
    pub headers_kept: usize,
    pub utterances: usize,
    pub utterances_kept: usize,
    pub utterances_dropped: usize,
    pub tiers_kept: usize,
    pub tiers_dropped: usize,
    pub unrecognized: usize,
}

/// Output of a complete run over a transcript
#[derive(Debug, Clone, Default)]
pub struct CleanedTranscript {
    pub lines: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: AssemblyStats,
}

impl CleanedTranscript {
    /// Lines joined with `\n`, with a trailing newline when not empty
    pub fn to_text(&self) -> String {
        let mut text = self.lines.join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        text
    }
}

#[derive(Debug)]
enum Pending {
    Header { text: String },
    Utterance { text: String, line: usize },
    Dependent { text: String, line: usize },
}

impl Pending {
    fn append(&mut self, continuation: &str) {
        let (Self::Header { text, .. } | Self::Utterance { text, .. } | Self::Dependent { text, .. }) = self;
        let continuation = continuation.trim();
        if !continuation.is_empty() {
            text.push(' ');
            text.push_str(continuation);
        }
    }
}

#[derive(Debug)]
struct OpenUtterance {
    speaker: String,
    text: String,
    line: usize,
    tiers: Vec<DependentTier>,
}

/// Streaming assembler; feed lines with `push_line`, then call `finish`
pub struct TranscriptAssembler<'r> {
    rules: &'r RuleTable,
    transformer: TierTransformer<'r>,
    line_no: usize,
    prior: Option<Category>,
    pending: Option<Pending>,
    open: Option<OpenUtterance>,
    diagnostics: Vec<Diagnostic>,
    stats: AssemblyStats,
}

impl<'r> TranscriptAssembler<'r> {
    pub fn new(rules: &'r RuleTable) -> Self {
        Self {
            rules,
            transformer: TierTransformer::new(rules),
            line_no: 0,
            prior: None,
            pending: None,
            open: None,
            diagnostics: Vec::new(),
            stats: AssemblyStats::default(),
        }
    }

    /// Feed one raw line; returns the output lines that became final
    pub fn push_line(&mut self, raw: &str) -> Vec<String> {
        self.line_no += 1;
        let mut raw = raw.trim_end_matches(['\r', '\n']);
        if self.line_no == 1 {
            raw = raw.trim_start_matches('\u{feff}');
        }

        let category = classify(raw, self.prior);
        let mut out = Vec::new();

        match category {
            Category::Continuation => {
                if let Some(pending) = self.pending.as_mut() {
                    pending.append(raw);
                }
            }
            Category::Blank => {
                self.flush_pending(&mut out);
            }
            Category::Header => {
                self.flush_pending(&mut out);
                self.pending = Some(Pending::Header { text: raw.to_string() });
            }
            Category::Utterance => {
                self.flush_pending(&mut out);
                self.pending = Some(Pending::Utterance { text: raw.to_string(), line: self.line_no });
            }
            Category::DependentTier => {
                self.flush_pending(&mut out);
                self.pending = Some(Pending::Dependent { text: raw.to_string(), line: self.line_no });
            }
            Category::Unrecognized => {
                self.flush_pending(&mut out);
                self.close_utterance(&mut out);
                self.report(self.line_no, TranscriptIssue::MalformedLine { text: raw.to_string() });
                self.stats.unrecognized += 1;
                out.push(raw.to_string());
            }
        }

        self.prior = Some(category);
        out
    }

    /// Close everything still open and return the remaining output
    pub fn finish(mut self) -> CleanedTranscript {
        let mut lines = Vec::new();
        self.flush_pending(&mut lines);
        self.close_utterance(&mut lines);
        CleanedTranscript {
            lines,
            diagnostics: self.diagnostics,
            stats: self.stats,
        }
    }

    /// Complete the open logical line
    fn flush_pending(&mut self, out: &mut Vec<String>) {
        let Some(pending) = self.pending.take() else {
            return;
        };

        match pending {
            Pending::Header { text } => {
                self.close_utterance(out);
                if self.rules.header_keep_data {
                    self.stats.headers_kept += 1;
                    out.push(text);
                }
            }
            Pending::Utterance { text, line } => {
                self.close_utterance(out);
                match split_main_tier(&text) {
                    Some((speaker, body)) => {
                        self.open = Some(OpenUtterance {
                            speaker: speaker.to_string(),
                            text: body.to_string(),
                            line,
                            tiers: Vec::new(),
                        });
                    }
                    None => {
                        self.report(line, TranscriptIssue::MalformedLine { text: text.clone() });
                        self.stats.unrecognized += 1;
                        out.push(text);
                    }
                }
            }
            Pending::Dependent { text, line } => {
                let Some(tier) = DependentTier::parse(&text, line) else {
                    self.report(line, TranscriptIssue::MalformedLine { text: text.clone() });
                    self.stats.unrecognized += 1;
                    out.push(text);
                    return;
                };
                match self.open.as_mut() {
                    Some(open) => open.tiers.push(tier),
                    None => {
                        self.report(line, TranscriptIssue::OrphanDependentTier { tier: tier.code.clone() });
                        if self.rules.dependent_keep_data {
                            self.stats.tiers_kept += 1;
                            out.push(tier.render());
                        } else {
                            self.stats.tiers_dropped += 1;
                        }
                    }
                }
            }
        }
    }

    /// Transform the open utterance and emit it with its surviving tiers
    fn close_utterance(&mut self, out: &mut Vec<String>) {
        let Some(open) = self.open.take() else {
            return;
        };
        self.stats.utterances += 1;

        let outcome = self.transformer.transform(&open.text, &open.speaker);
        for issue in outcome.issues.iter().cloned() {
            self.report(open.line, issue);
        }

        if outcome.drop_utterance {
            debug!("Line {}: dropping utterance of {} with {} tier(s)", open.line, open.speaker, open.tiers.len());
            self.stats.utterances_dropped += 1;
            self.stats.tiers_dropped += open.tiers.len();
            return;
        }

        if self.rules.utterance_keep_data {
            if outcome.text.is_empty() {
                debug!("Line {}: utterance of {} is empty after cleaning", open.line, open.speaker);
                self.stats.utterances_dropped += 1;
            } else {
                self.stats.utterances_kept += 1;
                out.push(outcome.render());
            }

            if self.rules.interposed {
                for interposition in &outcome.interposed {
                    let text = format!("{} .", interposition.text);
                    let inner = self.transformer.transform(&text, &interposition.speaker);
                    if !inner.drop_utterance && !inner.text.is_empty() {
                        out.push(inner.render());
                    }
                }
            }
        }

        for tier in open.tiers {
            if keep_tier(&tier, self.rules) {
                self.stats.tiers_kept += 1;
                out.push(tier.render());
            } else {
                self.stats.tiers_dropped += 1;
            }
        }
    }

    fn report(&mut self, line: usize, issue: TranscriptIssue) {
        let diagnostic = Diagnostic::new(line, issue);
        warn!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }
}

/// Clean a whole transcript held in memory
pub fn clean_lines<I, S>(lines: I, rules: &RuleTable) -> CleanedTranscript
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut assembler = TranscriptAssembler::new(rules);
    let mut output = Vec::new();
    for line in lines {
        output.extend(assembler.push_line(line.as_ref()));
    }
    let mut cleaned = assembler.finish();
    output.append(&mut cleaned.lines);
    cleaned.lines = output;
    cleaned
}

/// Clean transcript text, splitting it into lines
pub fn clean_text(text: &str, rules: &RuleTable) -> CleanedTranscript {
    clean_lines(text.lines(), rules)
}
