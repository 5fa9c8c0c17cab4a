/*!
 * Scoped bracket scanner.
 *
 * Parses `[ ... ]` annotations and the `< ... >` groups they govern into a flat
 * arena of spans. Each span records its byte range and the index of the group
 * that contains it, so nesting is explicit without a pointer-linked tree.
 * Resolution walks the arena innermost-first and rewrites each scope according
 * to the rule table.
 */

use std::collections::HashSet;

use crate::chat::markers::{
    protect, tokens, ScopedKind, MarkerKind, ELLIPSIS, PROTECT_CLOSE, PROTECT_OPEN, TAG_SEPARATOR,
};
use crate::chat::rules::{Action, RuleTable};
use crate::errors::TranscriptIssue;

/// What a span covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanKind {
    /// A plain word or an engine-produced literal
    Word,
    /// A `< ... >` group; its members point back to it through `parent`
    Group,
    /// A `[ ... ]` annotation; `kind` is `None` for unknown codes
    Bracket {
        kind: Option<ScopedKind>,
        payload: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub kind: SpanKind,
    pub start: usize,
    pub end: usize,
    pub parent: Option<usize>,
}

/// Arena of spans for one utterance
#[derive(Debug)]
pub struct ScopeTree<'a> {
    text: &'a str,
    spans: Vec<Span>,
    issues: Vec<TranscriptIssue>,
}

/// Result of resolving all scoped brackets of an utterance
#[derive(Debug, Default)]
pub struct Resolution {
    pub text: String,
    pub drop_utterance: bool,
    pub issues: Vec<TranscriptIssue>,
}

#[derive(Debug)]
struct Unit {
    text: String,
    wrapped: bool,
}

impl Unit {
    fn plain(text: String) -> Self {
        Self { text, wrapped: false }
    }

    fn render(&self) -> String {
        if self.wrapped {
            format!("<{}>", self.text)
        } else {
            self.text.clone()
        }
    }
}

impl<'a> ScopeTree<'a> {
    /// Scan `text` into spans. Never fails: unbalanced delimiters are recorded
    /// as issues and the affected text is kept as a literal word.
    pub fn scan(text: &'a str) -> Self {
        let mut issues = Vec::new();
        let (openers, closers) = match_groups(text, &mut issues);

        let mut spans: Vec<Span> = Vec::new();
        let mut stack: Vec<usize> = Vec::new();
        let mut i = 0;

        while i < text.len() {
            let Some(ch) = text[i..].chars().next() else { break };

            if ch.is_whitespace() {
                i += ch.len_utf8();
                continue;
            }

            let parent = stack.last().copied();

            if ch == PROTECT_OPEN {
                let end = protected_end(text, i);
                spans.push(Span { kind: SpanKind::Word, start: i, end, parent });
                i = end;
                continue;
            }

            if ch == '[' {
                match bracket_end(text, i) {
                    Some(end) => {
                        let interior = &text[i + 1..end - 1];
                        let (kind, payload) = match ScopedKind::classify(interior) {
                            Some((kind, payload)) => (Some(kind), payload.to_string()),
                            None => (None, String::new()),
                        };
                        spans.push(Span {
                            kind: SpanKind::Bracket { kind, payload },
                            start: i,
                            end,
                            parent,
                        });
                        i = end;
                    }
                    None => {
                        issues.push(TranscriptIssue::UnbalancedBracket { delimiter: '[', offset: i });
                        spans.push(Span { kind: SpanKind::Word, start: i, end: text.len(), parent });
                        i = text.len();
                    }
                }
                continue;
            }

            if ch == '<' && openers.contains(&i) {
                spans.push(Span { kind: SpanKind::Group, start: i, end: i + 1, parent });
                stack.push(spans.len() - 1);
                i += 1;
                continue;
            }

            if ch == '>' && closers.contains(&i) {
                if let Some(group) = stack.pop() {
                    spans[group].end = i + 1;
                }
                i += 1;
                continue;
            }

            // Plain word up to whitespace, a bracket, a protected span or a group closer
            let start = i;
            while i < text.len() {
                let Some(c) = text[i..].chars().next() else { break };
                if c.is_whitespace() || c == '[' || c == PROTECT_OPEN || (c == '>' && closers.contains(&i)) {
                    break;
                }
                i += c.len_utf8();
            }
            if i == start {
                i += ch.len_utf8();
            }
            spans.push(Span { kind: SpanKind::Word, start, end: i, parent });
        }

        Self { text, spans, issues }
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn issues(&self) -> &[TranscriptIssue] {
        &self.issues
    }

    /// Rewrite every scoped bracket, innermost groups first
    pub fn resolve(&self, rules: &RuleTable) -> Resolution {
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); self.spans.len()];
        let mut roots = Vec::new();
        for (idx, span) in self.spans.iter().enumerate() {
            match span.parent {
                Some(parent) => children[parent].push(idx),
                None => roots.push(idx),
            }
        }

        let mut resolution = Resolution {
            issues: self.issues.clone(),
            ..Resolution::default()
        };
        let units = self.eval(&roots, &children, rules, &mut resolution);
        resolution.text = join_units(&units);
        resolution
    }

    fn eval(
        &self,
        members: &[usize],
        children: &[Vec<usize>],
        rules: &RuleTable,
        resolution: &mut Resolution,
    ) -> Vec<Unit> {
        let mut units: Vec<Unit> = Vec::new();

        for &idx in members {
            let span = &self.spans[idx];
            let raw = &self.text[span.start..span.end];
            match &span.kind {
                SpanKind::Word => units.push(Unit::plain(raw.to_string())),
                SpanKind::Group => {
                    let inner = self.eval(&children[idx], children, rules, resolution);
                    units.push(Unit { text: join_units(&inner), wrapped: true });
                }
                SpanKind::Bracket { kind: None, .. } => {
                    let code = raw.trim_start_matches('[').trim_end_matches(']').trim();
                    resolution.issues.push(TranscriptIssue::UnknownMarkerCode { code: code.to_string() });
                    attach_verbatim(&mut units, raw);
                }
                SpanKind::Bracket { kind: Some(kind), payload } => {
                    let action = rules.action(MarkerKind::Scoped(*kind));
                    apply(*kind, action, payload, raw, rules.nonverbal(), &mut units, resolution);
                }
            }
        }

        units
    }
}

fn apply(
    kind: ScopedKind,
    action: &Action,
    payload: &str,
    raw: &str,
    nonverbal: Option<&str>,
    units: &mut Vec<Unit>,
    resolution: &mut Resolution,
) {
    if kind.is_utterance_level() {
        match action {
            Action::DropUtterance => resolution.drop_utterance = true,
            Action::Keep => units.push(Unit::plain(raw.to_string())),
            _ => {}
        }
        return;
    }

    match action {
        Action::Keep => attach_verbatim(units, raw),
        Action::Unmark => {
            if let Some(scope) = units.last_mut() {
                scope.wrapped = false;
            }
        }
        Action::Substitute => {
            let replacement = Unit::plain(payload.to_string());
            match units.last_mut() {
                Some(scope) => *scope = replacement,
                None => units.push(replacement),
            }
        }
        Action::Tag(tag) => {
            // Tagged text is protected, so its `0` must be rendered here
            let scope = units
                .pop()
                .map(|u| render_nonverbal(&u.text, nonverbal))
                .unwrap_or_default();
            let body = match (payload.is_empty(), scope.is_empty()) {
                (false, false) => format!("{} {} {}", payload, TAG_SEPARATOR, scope),
                (false, true) => payload.to_string(),
                (true, _) => scope,
            };
            units.push(Unit::plain(protect(&format!("<{}> {} </{}>", tag, body, tag))));
        }
        Action::Elide => {
            if let Some(scope) = units.last_mut() {
                *scope = Unit::plain(protect(ELLIPSIS));
            }
        }
        Action::Replace(literal) => {
            if let Some(scope) = units.last_mut() {
                *scope = Unit::plain(protect(literal));
            }
        }
        Action::DropScope => {
            units.pop();
        }
        Action::DropUtterance => {
            resolution.drop_utterance = true;
            if let Some(scope) = units.last_mut() {
                scope.wrapped = false;
            }
        }
    }
}

/// Replace every bare `0` token of `text`, dropping it when there is no placeholder
fn render_nonverbal(text: &str, nonverbal: Option<&str>) -> String {
    tokens(text)
        .into_iter()
        .filter_map(|token| match (token, nonverbal) {
            ("0", Some(literal)) => Some(protect(literal)),
            ("0", None) => None,
            _ => Some(token.to_string()),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn attach_verbatim(units: &mut Vec<Unit>, raw: &str) {
    match units.last_mut() {
        Some(scope) => {
            let text = format!("{} {}", scope.render(), raw);
            *scope = Unit::plain(text);
        }
        None => units.push(Unit::plain(raw.to_string())),
    }
}

fn join_units(units: &[Unit]) -> String {
    units
        .iter()
        .map(Unit::render)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Byte offset just past the protected span starting at `start`
fn protected_end(text: &str, start: usize) -> usize {
    let mut depth = 0usize;
    for (offset, c) in text[start..].char_indices() {
        if c == PROTECT_OPEN {
            depth += 1;
        } else if c == PROTECT_CLOSE {
            depth -= 1;
            if depth == 0 {
                return start + offset + c.len_utf8();
            }
        }
    }
    text.len()
}

/// Byte offset just past the `]` matching the `[` at `start`
fn bracket_end(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, c) in text[start..].char_indices() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Pair `<` group openers with `>` closers using a stack. Openers start a
/// token; closers end one. Returns the byte positions of matched delimiters.
fn match_groups(text: &str, issues: &mut Vec<TranscriptIssue>) -> (HashSet<usize>, HashSet<usize>) {
    let mut openers = HashSet::new();
    let mut closers = HashSet::new();
    let mut stack: Vec<usize> = Vec::new();
    let mut square = 0usize;
    let mut protected = 0usize;
    let mut prev: Option<char> = None;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        let next = chars.peek().map(|&(_, n)| n);
        match c {
            PROTECT_OPEN => protected += 1,
            PROTECT_CLOSE => protected = protected.saturating_sub(1),
            _ if protected > 0 => {}
            '[' => square += 1,
            ']' if square == 0 => {
                issues.push(TranscriptIssue::UnbalancedBracket { delimiter: ']', offset: idx });
            }
            ']' => square -= 1,
            _ if square > 0 => {}
            '<' if prev.is_none_or(|p| p.is_whitespace() || p == '<') => stack.push(idx),
            '>' if !stack.is_empty()
                && next.is_none_or(|n| n.is_whitespace() || n == '>' || n == '[') =>
            {
                if let Some(open) = stack.pop() {
                    openers.insert(open);
                    closers.insert(idx);
                }
            }
            _ => {}
        }
        prev = Some(c);
    }

    for open in stack {
        issues.push(TranscriptIssue::UnbalancedBracket { delimiter: '<', offset: open });
    }

    (openers, closers)
}
