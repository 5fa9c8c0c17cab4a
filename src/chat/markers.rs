/*!
 * Marker grammar of the CHAT main tier.
 *
 * Pure definitions: the marker kinds, the codes and symbols that identify them,
 * the patterns used to find them, and a few token-level helpers shared by the
 * transformation passes. Nothing here depends on the configuration.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// Opens a span of engine-produced text that later passes must not touch
pub const PROTECT_OPEN: char = '\u{E000}';
/// Closes a protected span
pub const PROTECT_CLOSE: char = '\u{E001}';

/// Placeholder used by the `'unk'` disfluency value
pub const UNKNOWN_TOKEN: &str = "<unk>";

/// Replaces retraced material
pub const ELLIPSIS: &str = "...";

/// Separator between an event and the material it annotates in tagged output
pub const TAG_SEPARATOR: &str = "<sep>";

/// Media bullets: `\u{15}1234_5678\u{15}`
pub static MEDIA_BULLET_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\x{15}[^\x{15}]*\x{15}").expect("Invalid media bullet regex")
});

/// Older time marks: `·1234_5678·`
pub static TIME_MARK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"·[^·]*·").expect("Invalid time mark regex")
});

/// A whole token that is a pause: `(.)`, `(..)`, `(...)`, `(1.5)`, `(1:02.5)`, `(1:02)`
pub static PAUSE_TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\((?:\.{1,3}|\d+(?::\d+)?(?:\.\d*)?|\d*\.\d+)\)$").expect("Invalid pause regex")
});

/// Parenthesized material inside a word that contains at least one letter
pub static INCOMPLETE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(([^()\s]*\p{L}[^()\s]*)\)").expect("Invalid incomplete word regex")
});

/// Omitted word: `&=0word` or `0word`
pub static OMITTED_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:&=)?0(\p{L}[^\s]*)$").expect("Invalid omitted word regex")
});

/// Special form suffix: `word@code` or `word@code:arg`
pub static SPECFORM_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([^@\s]+)@([a-z]+)(?:[:$](\S*))?$").expect("Invalid special form regex")
});

/// Simple local event: `&=laughs`, `&=imit:dog`
pub static LOCAL_EVENT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^&=([^\s0][^\s]*)$").expect("Invalid local event regex")
});

/// Long event spanning several words: `&{l=LAUGHS ... &}l=LAUGHS`
pub static COMPLEX_EVENT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&\{[ln]=(\S+)\s*(.*?)\s*&\}[ln]=\S+").expect("Invalid complex event regex")
});

/// Interposed word from another speaker: `&*MOT:yeah`
pub static INTERPOSED_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&\*([A-Za-z0-9]+):(\S+)").expect("Invalid interposed regex")
});

/// Trailing postcodes after the terminator: `. [+ bch] [+ trn]`
pub static TRAILING_POSTCODES_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\s*\[\+[^\]]*\])*\s*$").expect("Invalid postcode block regex")
});

/// Single-character prosodic marks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicKind {
    Satellite,
    Tone,
    Lengthening,
    PrimStress,
    SecStress,
    Blocking,
    Pause,
}

impl BasicKind {
    pub const ALL: [BasicKind; 7] = [
        Self::Satellite,
        Self::Tone,
        Self::Lengthening,
        Self::PrimStress,
        Self::SecStress,
        Self::Blocking,
        Self::Pause,
    ];

    /// Characters identifying this mark inside a word. Lengthening and pause
    /// need context and are matched separately.
    pub fn chars(self) -> &'static [char] {
        match self {
            Self::Satellite => &['‡', '„'],
            Self::Tone => &['↑', '↓'],
            Self::Lengthening => &[':'],
            Self::PrimStress => &['ˈ'],
            Self::SecStress => &['ˌ'],
            Self::Blocking => &['≠'],
            Self::Pause => &['^'],
        }
    }
}

/// Where a linker sits in the utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkerPosition {
    Leading,
    Trailing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkerKind {
    TrailOff,
    TrailOffQ,
    Exclamation,
    Interruption,
    InterruptionQ,
    InterruptionSelf,
    InterruptionSelfQ,
    TransBreak,
    QuoteFollow,
    QuotePrecede,
    Completion,
    Uptake,
    Latching,
    QuoteUtterance,
    Overlap,
}

impl LinkerKind {
    pub const ALL: [LinkerKind; 15] = [
        Self::TrailOff,
        Self::TrailOffQ,
        Self::Exclamation,
        Self::Interruption,
        Self::InterruptionQ,
        Self::InterruptionSelf,
        Self::InterruptionSelfQ,
        Self::TransBreak,
        Self::QuoteFollow,
        Self::QuotePrecede,
        Self::Completion,
        Self::Uptake,
        Self::Latching,
        Self::QuoteUtterance,
        Self::Overlap,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Self::TrailOff => "+...",
            Self::TrailOffQ => "+..?",
            Self::Exclamation => "+!?",
            Self::Interruption => "+/.",
            Self::InterruptionQ => "+/?",
            Self::InterruptionSelf => "+//.",
            Self::InterruptionSelfQ => "+//?",
            Self::TransBreak => "+.",
            Self::QuoteFollow => "+\"/.",
            Self::QuotePrecede => "+\".",
            Self::Completion => "+,",
            Self::Uptake => "+^",
            Self::Latching => "++",
            Self::QuoteUtterance => "+\"",
            Self::Overlap => "+<",
        }
    }

    /// Plain-text form used when the marker is not kept
    pub fn plain(self) -> &'static str {
        match self {
            Self::TrailOff | Self::Interruption | Self::InterruptionSelf => "...",
            Self::TrailOffQ | Self::InterruptionQ | Self::InterruptionSelfQ => "...?",
            Self::Exclamation => "!?",
            Self::TransBreak | Self::QuotePrecede => ".",
            Self::QuoteFollow => ":",
            Self::Completion
            | Self::Uptake
            | Self::Latching
            | Self::QuoteUtterance
            | Self::Overlap => "",
        }
    }

    pub fn position(self) -> LinkerPosition {
        match self {
            Self::Completion | Self::Uptake | Self::Latching | Self::QuoteUtterance | Self::Overlap => {
                LinkerPosition::Leading
            }
            _ => LinkerPosition::Trailing,
        }
    }

    /// Exact token lookup
    pub fn from_token(token: &str, position: LinkerPosition) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.position() == position && kind.symbol() == token)
    }
}

/// Looks like a terminator but is not one we know, e.g. `+=.`
pub fn is_terminator_like(token: &str) -> bool {
    token.len() > 1
        && token.starts_with('+')
        && token[1..]
            .chars()
            .all(|c| matches!(c, '.' | '/' | '!' | '?' | '"' | '^' | ',' | '<' | '+' | '='))
}

/// Codes of the `word@code` special forms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecformKind {
    Babbling,
    ChildInvented,
    Dialect,
    FamilySpec,
    FilledPause,
    General,
    Interjections,
    MultiLetters,
    Letter,
    Neologism,
    Pcf,
    Metaling,
    Singing,
    Sign,
    Sas,
    L2,
    Onomatopoeia,
    Testword,
    Unibet,
    Wordplay,
    Excluded,
}

impl SpecformKind {
    pub const ALL: [SpecformKind; 21] = [
        Self::Babbling,
        Self::ChildInvented,
        Self::Dialect,
        Self::FamilySpec,
        Self::FilledPause,
        Self::General,
        Self::Interjections,
        Self::MultiLetters,
        Self::Letter,
        Self::Neologism,
        Self::Pcf,
        Self::Metaling,
        Self::Singing,
        Self::Sign,
        Self::Sas,
        Self::L2,
        Self::Onomatopoeia,
        Self::Testword,
        Self::Unibet,
        Self::Wordplay,
        Self::Excluded,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Self::Babbling => "b",
            Self::ChildInvented => "c",
            Self::Dialect => "d",
            Self::FamilySpec => "f",
            Self::FilledPause => "fp",
            Self::General => "g",
            Self::Interjections => "i",
            Self::MultiLetters => "k",
            Self::Letter => "l",
            Self::Neologism => "n",
            Self::Pcf => "p",
            Self::Metaling => "q",
            Self::Singing => "si",
            Self::Sign => "sl",
            Self::Sas => "sas",
            Self::L2 => "s",
            Self::Onomatopoeia => "o",
            Self::Testword => "t",
            Self::Unibet => "u",
            Self::Wordplay => "wp",
            Self::Excluded => "x",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    /// Surface form of a kept word
    pub fn render_kept(self, word: &str) -> String {
        match self {
            Self::Letter => word.to_uppercase(),
            Self::MultiLetters => word
                .chars()
                .filter(|c| !c.is_whitespace())
                .map(|c| c.to_uppercase().to_string())
                .collect::<Vec<_>>()
                .join(" "),
            Self::Onomatopoeia => word.replace('_', " "),
            _ => word.to_string(),
        }
    }
}

/// `xxx`, `yyy`, `www`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnidentifiableKind {
    Unintelligible,
    Phonological,
    Untranscribed,
}

impl UnidentifiableKind {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "xxx" => Some(Self::Unintelligible),
            "yyy" => Some(Self::Phonological),
            "www" => Some(Self::Untranscribed),
            _ => None,
        }
    }
}

/// `&+fr`, `&-uh`, `&~gaga`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisfluencyKind {
    Fragment,
    Filler,
    Nonword,
}

impl DisfluencyKind {
    /// Split a token into its kind and the word after the prefix
    pub fn split(token: &str) -> Option<(Self, &str)> {
        let kind = if token.starts_with("&+") {
            Self::Fragment
        } else if token.starts_with("&-") {
            Self::Filler
        } else if token.starts_with("&~") {
            Self::Nonword
        } else {
            return None;
        };
        Some((kind, &token[2..]))
    }
}

/// Bracketed annotation codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopedKind {
    Paralinguistic,
    Explanation,
    Replacement,
    Stressing,
    ContraStressing,
    Alternative,
    Repetition,
    Retracing,
    Reformulation,
    FalseStart,
    Clause,
    Error,
    Precode,
    Postcode,
    BackChannel,
    IncludeTurn,
    ExcludedWord,
    ExcludedUtterance,
    Overlap,
    Duration,
    BestGuess,
}

impl ScopedKind {
    /// Classify a bracket interior (without the brackets) and return the
    /// payload that follows the code.
    pub fn classify(interior: &str) -> Option<(Self, &str)> {
        let inner = interior.trim();

        if inner == "^c" {
            return Some((Self::Clause, ""));
        }
        if inner == "e" {
            return Some((Self::ExcludedWord, ""));
        }
        if inner == "?" {
            return Some((Self::BestGuess, ""));
        }
        if inner == "!!" {
            return Some((Self::ContraStressing, ""));
        }
        if inner == "!" {
            return Some((Self::Stressing, ""));
        }
        if is_overlap_code(inner) {
            return Some((Self::Overlap, ""));
        }
        if let Some(rest) = inner.strip_prefix("+ ").or_else(|| inner.strip_prefix('+')) {
            let code = rest.trim();
            let kind = match code {
                "bch" => Self::BackChannel,
                "trn" => Self::IncludeTurn,
                "exc" => Self::ExcludedUtterance,
                _ => Self::Postcode,
            };
            return Some((kind, code));
        }
        if let Some(rest) = inner.strip_prefix('x') {
            let count = rest.trim();
            if !count.is_empty() && count.chars().all(|c| c.is_ascii_digit()) {
                return Some((Self::Repetition, count));
            }
            return None;
        }

        // Longest prefixes first
        const PREFIXES: [(&str, ScopedKind); 14] = [
            ("=!", ScopedKind::Paralinguistic),
            ("=?", ScopedKind::Alternative),
            ("=", ScopedKind::Explanation),
            ("%", ScopedKind::Explanation),
            ("::", ScopedKind::Replacement),
            (":", ScopedKind::Replacement),
            ("///", ScopedKind::Reformulation),
            ("//", ScopedKind::Retracing),
            ("/?", ScopedKind::Retracing),
            ("/-", ScopedKind::FalseStart),
            ("/", ScopedKind::Repetition),
            ("^", ScopedKind::Paralinguistic),
            ("*", ScopedKind::Error),
            ("#", ScopedKind::Duration),
        ];
        for (prefix, kind) in PREFIXES {
            if let Some(rest) = inner.strip_prefix(prefix) {
                return Some((kind, rest.trim()));
            }
        }
        if let Some(rest) = inner.strip_prefix("- ") {
            return Some((Self::Precode, rest.trim()));
        }
        None
    }

    /// Kinds that annotate the whole utterance rather than a word
    pub fn is_utterance_level(self) -> bool {
        matches!(
            self,
            Self::Precode | Self::Postcode | Self::BackChannel | Self::IncludeTurn | Self::ExcludedUtterance
        )
    }
}

fn is_overlap_code(inner: &str) -> bool {
    let mut chars = inner.chars();
    match chars.next() {
        Some('<') | Some('>') => chars.all(|c| c.is_ascii_digit()),
        _ => false,
    }
}

/// Every marker kind the rule table can map to an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    Basic(BasicKind),
    Linker(LinkerKind),
    Specform(SpecformKind),
    Unidentifiable(UnidentifiableKind),
    Disfluency(DisfluencyKind),
    Incomplete,
    Omitted,
    Scoped(ScopedKind),
    LocalEvent,
    Nonverbal,
}

/// Wrap engine output so later passes treat it as opaque
pub fn protect(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let mut out = String::with_capacity(text.len() + 6);
    out.push(PROTECT_OPEN);
    out.push_str(text);
    out.push(PROTECT_CLOSE);
    out
}

/// Remove protection sentinels
pub fn unprotect(text: &str) -> String {
    text.chars()
        .filter(|c| *c != PROTECT_OPEN && *c != PROTECT_CLOSE)
        .collect()
}

pub fn is_protected(token: &str) -> bool {
    token.starts_with(PROTECT_OPEN)
}

/// Split on whitespace, keeping protected spans whole even when they contain spaces
pub fn tokens(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start: Option<usize> = None;
    let mut protected_depth = 0usize;

    for (idx, ch) in text.char_indices() {
        if ch == PROTECT_OPEN {
            protected_depth += 1;
        } else if ch == PROTECT_CLOSE {
            protected_depth = protected_depth.saturating_sub(1);
        }
        if ch.is_whitespace() && protected_depth == 0 {
            if let Some(s) = start.take() {
                out.push(&text[s..idx]);
            }
        } else if start.is_none() {
            start = Some(idx);
        }
    }
    if let Some(s) = start {
        out.push(&text[s..]);
    }
    out
}

/// Separate `<` group openers and `>` group closers glued to a token
pub fn split_group_affixes(token: &str) -> (&str, &str, &str) {
    let core_start = token.len() - token.trim_start_matches('<').len();
    let rest = &token[core_start..];
    let core_len = rest.trim_end_matches('>').len();
    (&token[..core_start], &rest[..core_len], &rest[core_len..])
}

/// For each token, whether it belongs to a `[...]` bracket
pub fn bracket_membership(tokens: &[&str]) -> Vec<bool> {
    let mut depth = 0usize;
    tokens
        .iter()
        .map(|token| {
            if is_protected(token) {
                return depth > 0;
            }
            let inside = depth > 0 || token.contains('[');
            for ch in token.chars() {
                match ch {
                    '[' => depth += 1,
                    ']' => depth = depth.saturating_sub(1),
                    _ => {}
                }
            }
            inside || token.contains(']')
        })
        .collect()
}
