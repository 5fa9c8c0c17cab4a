/*!
 * Property tests for the tier transformer
 */

use proptest::prelude::*;

use chatprep::app_config::RuleValue;
use chatprep::chat::{RuleTable, TierTransformer};
use crate::common;

const WORDS: &[&str] = &["a", "dog", "ran", "big", "cookie", "I", "want", "the"];

const CODES: &[&str] = &[
    "[/]", "[//]", "[///]", "[/-]", "[* m]", "[= the thing]", "[!]", "[!!]", "[=! laughs]",
    "[: went]", "[=? gone]", "[x 2]", "[?]", "[^c]", "[e]", "[>]", "[# 1.5]",
];

/// Rules under which every scoped bracket removes text and adds none
fn stripping_rules() -> RuleTable {
    common::rules_with(|c| {
        let scoped = &mut c.utterance.scoped;
        for value in [
            &mut scoped.paralinguistic,
            &mut scoped.explanation,
            &mut scoped.replacement,
            &mut scoped.stressing,
            &mut scoped.contra_stressing,
            &mut scoped.alternative,
            &mut scoped.repetition,
            &mut scoped.retracing,
            &mut scoped.reformulation,
            &mut scoped.false_start,
            &mut scoped.clause,
            &mut scoped.error,
            &mut scoped.precode,
            &mut scoped.postcode,
            &mut scoped.back_channel,
            &mut scoped.excluded,
            &mut scoped.overlap,
        ] {
            *value = RuleValue::Bool(false);
        }
    })
}

/// A scope: a word, or a `<...>` group of scopes followed by a bracket
fn scope() -> impl Strategy<Value = String> {
    let leaf = prop::sample::select(WORDS).prop_map(str::to_string);
    leaf.prop_recursive(3, 24, 4, |inner| {
        (prop::collection::vec(inner, 1..4), prop::sample::select(CODES))
            .prop_map(|(parts, code)| format!("<{}> {}", parts.join(" "), code))
    })
}

/// An utterance made of scopes, some carrying a bracket of their own
fn utterance() -> impl Strategy<Value = String> {
    let unit = (scope(), prop::option::of(prop::sample::select(CODES))).prop_map(|(scope, code)| match code {
        Some(code) => format!("{} {}", scope, code),
        None => scope,
    });
    prop::collection::vec(unit, 1..6).prop_map(|units| format!("{} .", units.join(" ")))
}

proptest! {
    /// Balanced brackets never produce diagnostics and stripping rules never grow the text
    #[test]
    fn test_transform_withBalancedBrackets_shouldNotGrow(text in utterance()) {
        let rules = stripping_rules();
        let outcome = TierTransformer::new(&rules).transform(&text, "CHI");

        prop_assert!(outcome.issues.is_empty(), "issues {:?} for {:?}", outcome.issues, text);
        prop_assert!(!outcome.drop_utterance);
        prop_assert!(outcome.text.len() <= text.len(), "{:?} grew into {:?}", text, outcome.text);
        prop_assert!(!outcome.text.contains('['));
    }

    /// Arbitrary marker soup is handled without panicking, the same way every time
    #[test]
    fn test_transform_withArbitraryInput_shouldBeDeterministic(text in "[ a-z0-9<>\\[\\]/:=!?*&+@.(),^-]{0,48}") {
        let rules = RuleTable::default();
        let transformer = TierTransformer::new(&rules);
        let first = transformer.transform(&text, "CHI");
        let second = transformer.transform(&text, "CHI");
        prop_assert_eq!(first, second);
    }

    /// Plain sentences come out unchanged
    #[test]
    fn test_transform_withPlainWords_shouldBeIdentity(
        words in prop::collection::vec("[a-z]{1,8}", 1..10)
            .prop_filter("placeholder tokens", |w| w.iter().all(|w| !matches!(w.as_str(), "xxx" | "yyy" | "www")))
    ) {
        let text = format!("{} .", words.join(" "));
        let rules = RuleTable::default();
        let outcome = TierTransformer::new(&rules).transform(&text, "CHI");
        prop_assert_eq!(outcome.text, text);
    }
}
