/*!
 * Line classification for CHAT transcripts.
 */

/// Category of a raw transcript line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// `@Begin`, `@Participants:`, ...
    Header,
    /// `*CHI:\t...`
    Utterance,
    /// `%act:\t...`
    DependentTier,
    /// Tab-indented text continuing the previous logical line
    Continuation,
    /// Empty or whitespace-only
    Blank,
    /// Anything else
    Unrecognized,
}

impl Category {
    /// Whether a continuation line may follow a line of this category
    pub fn accepts_continuation(self) -> bool {
        matches!(
            self,
            Self::Header | Self::Utterance | Self::DependentTier | Self::Continuation
        )
    }
}

/// Classify `raw` given the category of the line before it
pub fn classify(raw: &str, prior: Option<Category>) -> Category {
    if raw.trim().is_empty() {
        return Category::Blank;
    }
    match raw.chars().next() {
        Some('@') => Category::Header,
        Some('*') => Category::Utterance,
        Some('%') => Category::DependentTier,
        Some(c) if c.is_whitespace() => match prior {
            Some(prior) if prior.accepts_continuation() => Category::Continuation,
            _ => Category::Unrecognized,
        },
        _ => Category::Unrecognized,
    }
}

/// Split `*CHI:\ttext` into `("CHI", "text")`
pub fn split_main_tier(line: &str) -> Option<(&str, &str)> {
    split_tier(line.strip_prefix('*')?)
}

/// Split `%act:\ttext` into `("act", "text")`
pub fn split_dependent_tier(line: &str) -> Option<(&str, &str)> {
    split_tier(line.strip_prefix('%')?)
}

fn split_tier(rest: &str) -> Option<(&str, &str)> {
    let (code, text) = rest.split_once(':')?;
    let code = code.trim();
    if code.is_empty() || code.contains(char::is_whitespace) {
        return None;
    }
    Some((code, text.trim()))
}
