/*!
 * Tier transformer: rewrites the text of one utterance.
 *
 * Passes run in a fixed order because later ones rely on the cleanup done by
 * earlier ones:
 *
 * 1. linkers and terminators
 * 2. `@` special forms
 * 3. `xxx` / `yyy` / `www`
 * 4. `&+` / `&-` / `&~` disfluencies
 * 5. incomplete and omitted words
 * 6. single-character prosodic marks
 * 7. scoped brackets, then local events and the nonverbal `0`
 * 8. speaker tag
 *
 * Text produced by a pass is wrapped in protection sentinels so that later
 * passes leave it alone; the sentinels are removed before returning.
 */

use crate::chat::markers::{
    bracket_membership, is_protected, is_terminator_like, protect, split_group_affixes, tokens,
    unprotect, BasicKind, DisfluencyKind, LinkerKind, LinkerPosition, MarkerKind, SpecformKind,
    UnidentifiableKind, COMPLEX_EVENT_REGEX, INCOMPLETE_REGEX, INTERPOSED_REGEX,
    LOCAL_EVENT_REGEX, MEDIA_BULLET_REGEX, OMITTED_REGEX, PAUSE_TOKEN_REGEX, PROTECT_CLOSE,
    PROTECT_OPEN, SPECFORM_REGEX, TAG_SEPARATOR, TIME_MARK_REGEX, TRAILING_POSTCODES_REGEX,
};
use crate::chat::rules::{Action, RuleTable};
use crate::chat::scope::ScopeTree;
use crate::errors::TranscriptIssue;

/// A word spoken by another speaker inside this utterance (`&*MOT:yeah`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interposition {
    pub speaker: String,
    pub text: String,
}

/// Result of transforming one utterance
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransformOutcome {
    /// Cleaned utterance text, without speaker prefix
    pub text: String,
    /// Speaker code to prefix, `None` when speakers are not kept
    pub speaker: Option<String>,
    /// Set by utterance-level markers such as `[+ bch]`
    pub drop_utterance: bool,
    /// Interposed words lifted out of the text
    pub interposed: Vec<Interposition>,
    pub issues: Vec<TranscriptIssue>,
}

impl TransformOutcome {
    pub fn keep_speaker(&self) -> bool {
        self.speaker.is_some()
    }

    /// Output line: `<SPK> text` or just `text`
    pub fn render(&self) -> String {
        match &self.speaker {
            Some(speaker) if !self.text.is_empty() => format!("<{}> {}", speaker, self.text),
            Some(speaker) => format!("<{}>", speaker),
            None => self.text.clone(),
        }
    }
}

/// Edit applied to the core of a token
enum Edit {
    Keep,
    Replace(String),
    Remove,
}

/// Applies the rule table to utterance text
#[derive(Debug, Clone, Copy)]
pub struct TierTransformer<'r> {
    rules: &'r RuleTable,
}

impl<'r> TierTransformer<'r> {
    pub fn new(rules: &'r RuleTable) -> Self {
        Self { rules }
    }

    /// Transform utterance `text` spoken by `speaker`.
    ///
    /// # Arguments
    /// * `text` - main tier content after the `*SPK:` prefix
    /// * `speaker` - speaker code, e.g. `CHI`
    ///
    /// # Returns
    /// The cleaned text with the speaker decision, the drop flag and any
    /// non-fatal issues found along the way
    pub fn transform(&self, text: &str, speaker: &str) -> TransformOutcome {
        let mut issues = Vec::new();

        let (text, interposed) = self.normalize(text);
        let text = self.resolve_linkers(&text, &mut issues);
        let text = self.resolve_specforms(&text, &mut issues);
        let text = self.resolve_unidentifiable(&text);
        let text = self.resolve_disfluencies(&text);
        let text = self.resolve_incomplete(&text);
        let text = self.resolve_basic(&text);

        let resolution = ScopeTree::scan(&text).resolve(self.rules);
        issues.extend(resolution.issues);
        let text = self.resolve_events(&resolution.text);

        let speaker = if self.rules.keep_speaker {
            Some(speaker.to_string())
        } else {
            None
        };

        TransformOutcome {
            text: collapse_whitespace(&unprotect(&text)),
            speaker,
            drop_utterance: resolution.drop_utterance,
            interposed,
            issues,
        }
    }

    /// Strip media bullets, lift out interposed words, collapse whitespace
    fn normalize(&self, text: &str) -> (String, Vec<Interposition>) {
        let text = MEDIA_BULLET_REGEX.replace_all(text, " ");
        let text = TIME_MARK_REGEX.replace_all(&text, " ");

        let interposed = INTERPOSED_REGEX
            .captures_iter(&text)
            .map(|caps| Interposition {
                speaker: caps[1].to_string(),
                text: caps[2].replace('_', " "),
            })
            .collect::<Vec<_>>();
        let text = INTERPOSED_REGEX.replace_all(&text, " ");

        (collapse_whitespace(&text), interposed)
    }

    fn resolve_linkers(&self, text: &str, issues: &mut Vec<TranscriptIssue>) -> String {
        let boundary = TRAILING_POSTCODES_REGEX
            .find(text)
            .map_or(text.len(), |m| m.start());
        let (head, tail) = text.split_at(boundary);

        let mut toks: Vec<String> = tokens(head).into_iter().map(str::to_string).collect();
        let membership = bracket_membership(&toks.iter().map(String::as_str).collect::<Vec<_>>());

        // Trailing terminator: the last token outside brackets
        if let Some(last) = (0..toks.len()).rev().find(|&i| !membership[i]) {
            match LinkerKind::from_token(&toks[last], LinkerPosition::Trailing) {
                Some(kind) => toks[last] = self.linker_text(kind, &toks[last]),
                None if is_terminator_like(&toks[last]) => {
                    issues.push(TranscriptIssue::UnknownMarkerCode { code: toks[last].clone() });
                }
                None => {}
            }
        }

        // Leading linkers, possibly after precodes
        for i in 0..toks.len() {
            if membership[i] {
                continue;
            }
            match LinkerKind::from_token(&toks[i], LinkerPosition::Leading) {
                Some(kind) => toks[i] = self.linker_text(kind, &toks[i]),
                None => break,
            }
        }

        let mut out = toks.join(" ");
        out.push_str(tail);
        out
    }

    fn linker_text(&self, kind: LinkerKind, original: &str) -> String {
        match self.rules.action(MarkerKind::Linker(kind)) {
            Action::Replace(plain) => protect(plain),
            _ => protect(original),
        }
    }

    fn resolve_specforms(&self, text: &str, issues: &mut Vec<TranscriptIssue>) -> String {
        rewrite_tokens(text, |core, _| {
            let Some(caps) = SPECFORM_REGEX.captures(core) else {
                return Edit::Keep;
            };
            let word = &caps[1];
            let code = &caps[2];
            let Some(kind) = SpecformKind::from_code(code) else {
                issues.push(TranscriptIssue::UnknownMarkerCode { code: format!("@{}", code) });
                return Edit::Keep;
            };
            match self.rules.action(MarkerKind::Specform(kind)) {
                Action::Unmark => Edit::Replace(kind.render_kept(word)),
                Action::Replace(literal) => Edit::Replace(protect(literal)),
                Action::DropScope => Edit::Remove,
                _ => Edit::Keep,
            }
        })
    }

    fn resolve_unidentifiable(&self, text: &str) -> String {
        rewrite_tokens(text, |core, _| match UnidentifiableKind::from_token(core) {
            Some(kind) => self.word_edit(MarkerKind::Unidentifiable(kind), core),
            None => Edit::Keep,
        })
    }

    fn resolve_disfluencies(&self, text: &str) -> String {
        rewrite_tokens(text, |core, _| match DisfluencyKind::split(core) {
            Some((kind, word)) => self.word_edit(MarkerKind::Disfluency(kind), word),
            None => Edit::Keep,
        })
    }

    fn resolve_incomplete(&self, text: &str) -> String {
        rewrite_tokens(text, |core, _| {
            if let Some(caps) = OMITTED_REGEX.captures(core) {
                return self.word_edit(MarkerKind::Omitted, &caps[1]);
            }
            if core.starts_with('&') || !INCOMPLETE_REGEX.is_match(core) {
                return Edit::Keep;
            }
            let replacement = match self.rules.action(MarkerKind::Incomplete) {
                Action::Unmark => "$1",
                _ => "",
            };
            let word = INCOMPLETE_REGEX.replace_all(core, replacement);
            if word.is_empty() {
                Edit::Remove
            } else {
                Edit::Replace(word.into_owned())
            }
        })
    }

    /// Common handling for markers that govern one word
    fn word_edit(&self, kind: MarkerKind, word: &str) -> Edit {
        match self.rules.action(kind) {
            Action::Keep => Edit::Keep,
            Action::Unmark if word.is_empty() => Edit::Remove,
            Action::Unmark => Edit::Replace(word.to_string()),
            Action::Replace(literal) => Edit::Replace(protect(literal)),
            _ => Edit::Remove,
        }
    }

    fn resolve_basic(&self, text: &str) -> String {
        rewrite_tokens(text, |core, _| {
            if core.starts_with('&') || core.starts_with('+') || core.contains('@') {
                return Edit::Keep;
            }
            if PAUSE_TOKEN_REGEX.is_match(core) {
                return match self.rules.action(MarkerKind::Basic(BasicKind::Pause)) {
                    Action::Keep => Edit::Keep,
                    _ => Edit::Remove,
                };
            }

            let mut out = String::with_capacity(core.len());
            for c in core.chars() {
                let kind = BasicKind::ALL.into_iter().find(|kind| kind.chars().contains(&c));
                let Some(kind) = kind else {
                    out.push(c);
                    continue;
                };
                // Lengthening only inside or after a word, never a bare colon
                if kind == BasicKind::Lengthening && !out.chars().last().is_some_and(char::is_alphabetic) {
                    out.push(c);
                    continue;
                }
                match self.rules.action(MarkerKind::Basic(kind)) {
                    Action::Keep => out.push(c),
                    Action::Replace(literal) => out.push_str(literal),
                    _ => {}
                }
            }

            if out == core {
                Edit::Keep
            } else if out.is_empty() {
                Edit::Remove
            } else {
                Edit::Replace(out)
            }
        })
    }

    /// Local events and the bare `0`, after brackets are resolved. A `0`
    /// inside a tagged scope is rendered by the scope pass itself.
    fn resolve_events(&self, text: &str) -> String {
        let event_action = self.rules.action(MarkerKind::LocalEvent);
        let nonverbal = self.rules.nonverbal();

        let text = map_unprotected(text, |segment| {
            COMPLEX_EVENT_REGEX
                .replace_all(segment, |caps: &regex::Captures| {
                    let label = &caps[1];
                    let inner = &caps[2];
                    match event_action {
                        Action::Keep => caps[0].to_string(),
                        Action::Tag(tag) => protect(&tagged(tag, label, Some(inner))),
                        _ => inner.to_string(),
                    }
                })
                .into_owned()
        });

        rewrite_tokens(&text, |core, bare| {
            if bare && core == "0" {
                return match nonverbal {
                    Some("0") => Edit::Keep,
                    Some(literal) => Edit::Replace(protect(literal)),
                    None => Edit::Remove,
                };
            }
            let Some(caps) = LOCAL_EVENT_REGEX.captures(core) else {
                return Edit::Keep;
            };
            let event = caps[1].replace([':', '_'], " ");
            match event_action {
                Action::Keep => Edit::Keep,
                Action::Tag(tag) => Edit::Replace(protect(&tagged(tag, &event, nonverbal))),
                _ => match nonverbal {
                    Some(literal) => Edit::Replace(protect(literal)),
                    None => Edit::Remove,
                },
            }
        })
    }
}

fn tagged(tag: &str, event: &str, material: Option<&str>) -> String {
    match material {
        Some(material) if !material.is_empty() => {
            format!("<{}> {} {} {} </{}>", tag, event, TAG_SEPARATOR, material, tag)
        }
        _ => format!("<{}> {} </{}>", tag, event, tag),
    }
}

/// Apply `edit` to the core of every token outside brackets and protected spans.
/// `<` and `>` glued to a token are preserved around the edited core; the
/// second argument tells whether there were none.
fn rewrite_tokens<F>(text: &str, mut edit: F) -> String
where
    F: FnMut(&str, bool) -> Edit,
{
    let toks = tokens(text);
    let membership = bracket_membership(&toks);
    let mut out: Vec<String> = Vec::with_capacity(toks.len());

    for (token, in_bracket) in toks.iter().zip(membership) {
        if in_bracket || is_protected(token) {
            out.push(token.to_string());
            continue;
        }
        let (prefix, core, suffix) = split_group_affixes(token);
        if core.is_empty() {
            out.push(token.to_string());
            continue;
        }
        match edit(core, prefix.is_empty() && suffix.is_empty()) {
            Edit::Keep => out.push(token.to_string()),
            Edit::Replace(new) => out.push(format!("{}{}{}", prefix, new, suffix)),
            Edit::Remove => {
                let rest = format!("{}{}", prefix, suffix);
                if !rest.is_empty() {
                    out.push(rest);
                }
            }
        }
    }

    out.join(" ")
}

/// Run `f` over the parts of `text` outside protected spans
fn map_unprotected<F>(text: &str, mut f: F) -> String
where
    F: FnMut(&str) -> String,
{
    let mut out = String::with_capacity(text.len());
    let mut segment_start = 0;
    let mut depth = 0usize;

    for (idx, c) in text.char_indices() {
        if c == PROTECT_OPEN {
            if depth == 0 {
                out.push_str(&f(&text[segment_start..idx]));
                segment_start = idx;
            }
            depth += 1;
        } else if c == PROTECT_CLOSE && depth > 0 {
            depth -= 1;
            if depth == 0 {
                let end = idx + c.len_utf8();
                out.push_str(&text[segment_start..end]);
                segment_start = end;
            }
        }
    }

    let rest = &text[segment_start..];
    if depth == 0 {
        out.push_str(&f(rest));
    } else {
        out.push_str(rest);
    }
    out
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
