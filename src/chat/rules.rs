/*!
 * Dispatch table from marker kind to transformation action.
 *
 * Built once from a validated `Config`; the transformer only ever asks
 * `RuleTable::action` and never looks at raw option values.
 */

use std::collections::HashMap;

use crate::app_config::{Config, RuleValue, Setting};
use crate::chat::markers::{
    BasicKind, DisfluencyKind, LinkerKind, MarkerKind, ScopedKind, SpecformKind,
    UnidentifiableKind, UNKNOWN_TOKEN,
};
use crate::errors::ConfigError;

/// What to do with a recognized marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Leave the marker (and anything it governs) verbatim
    Keep,
    /// Remove the marker syntax, keep the governed word or scope
    Unmark,
    /// Replace the marker together with its governed word or scope
    Replace(String),
    /// Render the scope inside `<tag> ... </tag>`
    Tag(String),
    /// Replace the scope with the bracket payload
    Substitute,
    /// Replace the scope with an ellipsis
    Elide,
    /// Remove the marker and everything it governs
    DropScope,
    /// Suppress the whole utterance
    DropUtterance,
}

static KEEP: Action = Action::Keep;

/// Immutable rule set shared by every transformation call
#[derive(Debug, Clone)]
pub struct RuleTable {
    actions: HashMap<MarkerKind, Action>,
    pub header_keep_data: bool,
    pub utterance_keep_data: bool,
    pub keep_speaker: bool,
    pub interposed: bool,
    pub dependent_keep_data: bool,
    pub action_keep_data: bool,
}

impl RuleTable {
    /// Resolve every option of `config` into an action, rejecting invalid values
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let utt = &config.utterance;
        let mut actions = HashMap::new();

        let basic = &utt.basic;
        for (kind, keep) in [
            (BasicKind::Satellite, basic.satellite),
            (BasicKind::Tone, basic.tone),
            (BasicKind::Lengthening, basic.lengthening),
            (BasicKind::PrimStress, basic.prim_stress),
            (BasicKind::SecStress, basic.sec_stress),
            (BasicKind::Blocking, basic.blocking),
            (BasicKind::Pause, basic.pause),
        ] {
            let action = match (keep, kind) {
                (true, _) => Action::Keep,
                (false, BasicKind::Satellite) => Action::Replace(",".to_string()),
                (false, _) => Action::Unmark,
            };
            actions.insert(MarkerKind::Basic(kind), action);
        }

        let linkers = &utt.linkers;
        for (kind, keep) in [
            (LinkerKind::TrailOff, linkers.trail_off),
            (LinkerKind::TrailOffQ, linkers.trail_off_q),
            (LinkerKind::Exclamation, linkers.exclamation),
            (LinkerKind::Interruption, linkers.interruption),
            (LinkerKind::InterruptionQ, linkers.interruption_q),
            (LinkerKind::InterruptionSelf, linkers.interruption_self),
            (LinkerKind::InterruptionSelfQ, linkers.interruption_self_q),
            (LinkerKind::TransBreak, linkers.trans_break),
            (LinkerKind::QuoteFollow, linkers.quote_follow),
            (LinkerKind::QuotePrecede, linkers.quote_precede),
            (LinkerKind::Completion, linkers.completion),
            (LinkerKind::Uptake, linkers.uptake),
            (LinkerKind::Latching, linkers.latching),
            (LinkerKind::QuoteUtterance, linkers.quote_utterance),
        ] {
            let action = if keep {
                Action::Keep
            } else {
                Action::Replace(kind.plain().to_string())
            };
            actions.insert(MarkerKind::Linker(kind), action);
        }

        let sf = &utt.specform;
        for (kind, value) in [
            (SpecformKind::Babbling, &sf.babbling),
            (SpecformKind::ChildInvented, &sf.child_invented),
            (SpecformKind::Dialect, &sf.dialect),
            (SpecformKind::FamilySpec, &sf.family_spec),
            (SpecformKind::FilledPause, &sf.filled_pause),
            (SpecformKind::General, &sf.general),
            (SpecformKind::Interjections, &sf.interjections),
            (SpecformKind::MultiLetters, &sf.multi_letters),
            (SpecformKind::Letter, &sf.letter),
            (SpecformKind::Neologism, &sf.neologism),
            (SpecformKind::Pcf, &sf.pcf),
            (SpecformKind::Metaling, &sf.metaling),
            (SpecformKind::Singing, &sf.singing),
            (SpecformKind::Sign, &sf.sign),
            (SpecformKind::Sas, &sf.sas),
            (SpecformKind::L2, &sf.l2),
            (SpecformKind::Onomatopoeia, &sf.onomatopoeia),
            (SpecformKind::Testword, &sf.testword),
            (SpecformKind::Unibet, &sf.unibet),
            (SpecformKind::Wordplay, &sf.wordplay),
            (SpecformKind::Excluded, &sf.excluded),
        ] {
            let option = format!("utterance.specform.{}", specform_option_name(kind));
            let action = word_action(&option, value, Action::Unmark)?;
            actions.insert(MarkerKind::Specform(kind), action);
        }

        let unid = &utt.unidentifiable;
        for (kind, name, value) in [
            (UnidentifiableKind::Unintelligible, "unintelligible", &unid.unintelligible),
            (UnidentifiableKind::Phonological, "phonological", &unid.phonological),
            (UnidentifiableKind::Untranscribed, "untranscribed", &unid.untranscribed),
        ] {
            let option = format!("utterance.unidentifiable.{}", name);
            let action = word_action(&option, value, Action::Keep)?;
            actions.insert(MarkerKind::Unidentifiable(kind), action);
        }

        let dis = &utt.disfluency;
        for (kind, name, value) in [
            (DisfluencyKind::Fragment, "fragment", &dis.fragment),
            (DisfluencyKind::Filler, "filler", &dis.filler),
            (DisfluencyKind::Nonword, "nonwords", &dis.nonwords),
        ] {
            let action = match value.setting() {
                Setting::On => Action::Unmark,
                Setting::Off => Action::DropScope,
                Setting::Literal("unk") => Action::Replace(UNKNOWN_TOKEN.to_string()),
                Setting::Literal(_) => {
                    return Err(invalid(
                        &format!("utterance.disfluency.{}", name),
                        value,
                        "expected 'keep', 'unk' or 'null'",
                    ));
                }
            };
            actions.insert(MarkerKind::Disfluency(kind), action);
        }

        let incomplete = &utt.incomplete;
        actions.insert(MarkerKind::Incomplete, keep_or_drop(incomplete.noncompletion));
        actions.insert(MarkerKind::Omitted, keep_or_drop(incomplete.omitted));

        actions.insert(
            MarkerKind::Nonverbal,
            word_action("utterance.nonverbal", &utt.nonverbal, Action::Keep)?,
        );

        let sc = &utt.scoped;
        let tag = |option: &str, value: &RuleValue| -> Result<Action, ConfigError> {
            match value.setting() {
                Setting::On => Ok(Action::Keep),
                Setting::Off => Ok(Action::Unmark),
                Setting::Literal(name) if is_valid_tag(name) => Ok(Action::Tag(name.to_string())),
                Setting::Literal(_) => Err(invalid(option, value, "expected a boolean or a tag name")),
            }
        };
        let paralinguistic = tag("utterance.scoped.paralinguistic", &sc.paralinguistic)?;
        actions.insert(MarkerKind::LocalEvent, paralinguistic.clone());
        actions.insert(MarkerKind::Scoped(ScopedKind::Paralinguistic), paralinguistic);
        actions.insert(
            MarkerKind::Scoped(ScopedKind::Explanation),
            tag("utterance.scoped.explanation", &sc.explanation)?,
        );
        actions.insert(
            MarkerKind::Scoped(ScopedKind::Stressing),
            tag("utterance.scoped.stressing", &sc.stressing)?,
        );
        actions.insert(
            MarkerKind::Scoped(ScopedKind::ContraStressing),
            tag("utterance.scoped.contra_stressing", &sc.contra_stressing)?,
        );

        // (kind, option, action when on, action when off)
        let switches = [
            (ScopedKind::Replacement, "replacement", &sc.replacement, Action::Substitute, Action::Unmark),
            (ScopedKind::Alternative, "alternative", &sc.alternative, Action::Substitute, Action::Unmark),
            (ScopedKind::Repetition, "repetition", &sc.repetition, Action::Unmark, Action::DropScope),
            (ScopedKind::Clause, "clause", &sc.clause, Action::Keep, Action::Unmark),
            (ScopedKind::Overlap, "overlap", &sc.overlap, Action::Keep, Action::Unmark),
            (ScopedKind::Error, "error", &sc.error, Action::DropUtterance, Action::Unmark),
            (ScopedKind::Precode, "precode", &sc.precode, Action::DropUtterance, Action::Unmark),
            (ScopedKind::Postcode, "postcode", &sc.postcode, Action::DropUtterance, Action::Unmark),
            (ScopedKind::BackChannel, "back_channel", &sc.back_channel, Action::DropUtterance, Action::Unmark),
            (ScopedKind::IncludeTurn, "include_turn", &sc.include_turn, Action::Unmark, Action::DropUtterance),
            (ScopedKind::ExcludedUtterance, "excluded", &sc.excluded, Action::DropUtterance, Action::Unmark),
            (ScopedKind::ExcludedWord, "excluded", &sc.excluded, Action::DropScope, Action::Unmark),
        ];
        for (kind, name, value, on, off) in switches {
            let action = match value.setting() {
                Setting::On => on,
                Setting::Off => off,
                Setting::Literal(_) => {
                    return Err(invalid(
                        &format!("utterance.scoped.{}", name),
                        value,
                        "expected true or false",
                    ));
                }
            };
            actions.insert(MarkerKind::Scoped(kind), action);
        }

        for (kind, name, value) in [
            (ScopedKind::Retracing, "retracing", &sc.retracing),
            (ScopedKind::Reformulation, "reformulation", &sc.reformulation),
            (ScopedKind::FalseStart, "false_start", &sc.false_start),
        ] {
            let action = match value.setting() {
                Setting::On => Action::Elide,
                Setting::Off => Action::DropScope,
                Setting::Literal(text) => Action::Replace(check_literal(
                    &format!("utterance.scoped.{}", name),
                    value,
                    text,
                )?),
            };
            actions.insert(MarkerKind::Scoped(kind), action);
        }

        actions.insert(MarkerKind::Scoped(ScopedKind::Duration), Action::Unmark);
        actions.insert(MarkerKind::Scoped(ScopedKind::BestGuess), Action::Unmark);

        let overlap_linker = match sc.overlap.setting() {
            Setting::On => Action::Keep,
            _ => Action::Replace(String::new()),
        };
        actions.insert(MarkerKind::Linker(LinkerKind::Overlap), overlap_linker);

        Ok(Self {
            actions,
            header_keep_data: config.header.keep_data,
            utterance_keep_data: utt.keep_data,
            keep_speaker: utt.keep_speaker,
            interposed: utt.interposed,
            dependent_keep_data: config.dependent.keep_data,
            action_keep_data: config.dependent.action.keep_data,
        })
    }

    /// Action for a marker kind; kinds without an entry are kept verbatim
    pub fn action(&self, kind: MarkerKind) -> &Action {
        self.actions.get(&kind).unwrap_or(&KEEP)
    }

    /// Text a bare `0` becomes, `None` when it is removed
    pub fn nonverbal(&self) -> Option<&str> {
        match self.action(MarkerKind::Nonverbal) {
            Action::Replace(literal) => Some(literal.as_str()),
            Action::Keep => Some("0"),
            _ => None,
        }
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        // The default configuration only holds valid values
        match Self::from_config(&Config::default()) {
            Ok(table) => table,
            Err(e) => unreachable!("default configuration rejected: {}", e),
        }
    }
}

/// Word-level markers: on keeps the word, off removes it, a literal replaces it
fn word_action(option: &str, value: &RuleValue, on: Action) -> Result<Action, ConfigError> {
    Ok(match value.setting() {
        Setting::On => on,
        Setting::Off => Action::DropScope,
        Setting::Literal(text) => Action::Replace(check_literal(option, value, text)?),
    })
}

fn keep_or_drop(keep: bool) -> Action {
    if keep { Action::Unmark } else { Action::DropScope }
}

fn check_literal(option: &str, value: &RuleValue, text: &str) -> Result<String, ConfigError> {
    if text.trim().is_empty() {
        return Err(invalid(option, value, "literal must not be empty; use false to remove"));
    }
    if text.contains('\n') {
        return Err(invalid(option, value, "literal must be a single line"));
    }
    Ok(text.to_string())
}

fn is_valid_tag(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn invalid(option: &str, value: &RuleValue, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        option: option.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn specform_option_name(kind: SpecformKind) -> &'static str {
    match kind {
        SpecformKind::Babbling => "babbling",
        SpecformKind::ChildInvented => "child_invented",
        SpecformKind::Dialect => "dialect",
        SpecformKind::FamilySpec => "family_spec",
        SpecformKind::FilledPause => "filled_pause",
        SpecformKind::General => "general",
        SpecformKind::Interjections => "interjections",
        SpecformKind::MultiLetters => "multi_letters",
        SpecformKind::Letter => "letter",
        SpecformKind::Neologism => "neologism",
        SpecformKind::Pcf => "pcf",
        SpecformKind::Metaling => "metaling",
        SpecformKind::Singing => "singing",
        SpecformKind::Sign => "sign",
        SpecformKind::Sas => "sas",
        SpecformKind::L2 => "l2",
        SpecformKind::Onomatopoeia => "onomatopoeia",
        SpecformKind::Testword => "testword",
        SpecformKind::Unibet => "unibet",
        SpecformKind::Wordplay => "wordplay",
        SpecformKind::Excluded => "excluded",
    }
}
