/*!
 * Dependent tier filter.
 *
 * `%` tiers are never rewritten: they are either emitted verbatim or dropped.
 * The global `dependent.keep_data` flag gates every tier. Action and situation
 * tiers (`%act`, `%sit`, `%gpx`) are additionally gated by
 * `dependent.action.keep_data`.
 */

use crate::chat::line::split_dependent_tier;
use crate::chat::rules::RuleTable;

/// Known tier codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TierType {
    Action,
    Situation,
    Gesture,
    Comment,
    Morphology,
    Grammar,
    Phonology,
    Other(String),
}

impl TierType {
    pub fn from_code(code: &str) -> Self {
        match code {
            "act" => Self::Action,
            "sit" => Self::Situation,
            "gpx" => Self::Gesture,
            "com" => Self::Comment,
            "mor" => Self::Morphology,
            "gra" => Self::Grammar,
            "pho" => Self::Phonology,
            other => Self::Other(other.to_string()),
        }
    }

    /// Tiers describing what happens around the speech, gated by the action switch
    pub fn is_action_family(&self) -> bool {
        matches!(self, Self::Action | Self::Situation | Self::Gesture)
    }
}

/// One logical `%` line, continuations already joined
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependentTier {
    pub tier_type: TierType,
    pub code: String,
    pub text: String,
    /// 1-based line where the tier starts
    pub line: usize,
}

impl DependentTier {
    /// Parse a `%code:\ttext` line; `None` when there is no `code:` prefix
    pub fn parse(raw: &str, line: usize) -> Option<Self> {
        let (code, text) = split_dependent_tier(raw)?;
        Some(Self {
            tier_type: TierType::from_code(code),
            code: code.to_string(),
            text: text.to_string(),
            line,
        })
    }

    pub fn render(&self) -> String {
        format!("%{}:\t{}", self.code, self.text)
    }
}

/// Whether `tier` survives the configured policy
pub fn keep_tier(tier: &DependentTier, rules: &RuleTable) -> bool {
    if !rules.dependent_keep_data {
        return false;
    }
    if tier.tier_type.is_action_family() {
        rules.action_keep_data
    } else {
        true
    }
}

/// Return the tier when kept, `None` when dropped
pub fn filter_tier(tier: DependentTier, rules: &RuleTable) -> Option<DependentTier> {
    if keep_tier(&tier, rules) { Some(tier) } else { None }
}
