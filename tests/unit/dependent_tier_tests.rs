/*!
 * Tests for dependent tier gating
 */

use chatprep::chat::{clean_lines, filter_tier, keep_tier, DependentTier, TierType};
use crate::common;

fn tier(raw: &str) -> DependentTier {
    DependentTier::parse(raw, 1).expect("test tier should parse")
}

/// Test tier type recognition from codes
#[test]
fn test_parse_withKnownAndUnknownCodes_shouldSetTierType() {
    assert_eq!(tier("%act:\tpoints").tier_type, TierType::Action);
    assert_eq!(tier("%com:\tnice").tier_type, TierType::Comment);
    assert_eq!(tier("%mor:\tn|dog").tier_type, TierType::Morphology);
    assert_eq!(tier("%xtra:\tstuff").tier_type, TierType::Other("xtra".to_string()));
    assert!(DependentTier::parse("%no colon here", 1).is_none());
}

/// Test that render restores the canonical tier line
#[test]
fn test_render_shouldUseTabSeparator() {
    assert_eq!(tier("%sit:   kitchen table").render(), "%sit:\tkitchen table");
}

/// Test every combination of the global and action flags
#[test]
fn test_keep_tier_withAllFlagCombinations_shouldGateAsDocumented() {
    let action_family = [
        tier("%act:\tpoints at cookie"),
        tier("%sit:\tat the table"),
        tier("%gpx:\twaves"),
    ];
    let comment = tier("%com:\tsmiling");

    for global in [false, true] {
        for action_flag in [false, true] {
            let rules = common::rules_with(|c| {
                c.dependent.keep_data = global;
                c.dependent.action.keep_data = action_flag;
            });

            for action in &action_family {
                assert_eq!(
                    keep_tier(action, &rules),
                    global && action_flag,
                    "%{} tier with global={} action={}",
                    action.code,
                    global,
                    action_flag
                );
            }
            assert_eq!(
                keep_tier(&comment, &rules),
                global,
                "comment tier with global={} action={}",
                global,
                action_flag
            );
        }
    }
}

/// Test that filter_tier returns the tier untouched when kept
#[test]
fn test_filter_tier_withKeptTier_shouldReturnItVerbatim() {
    let rules = common::rules_with(|c| c.dependent.keep_data = true);
    let original = tier("%gpx:\twaves [?] hand");

    assert_eq!(filter_tier(original.clone(), &rules), Some(original));
}

/// Test that the defaults drop every tier
#[test]
fn test_filter_tier_withDefaults_shouldDrop() {
    let rules = common::rules_with(|_| {});
    assert_eq!(filter_tier(tier("%com:\tsmiling"), &rules), None);
}

/// Test that situation and gesture tiers follow the action switch in a transcript
#[test]
fn test_clean_lines_withActionFamilyOff_shouldKeepOtherTiers() {
    let rules = common::rules_with(|c| {
        c.dependent.keep_data = true;
        c.dependent.action.keep_data = false;
    });
    let lines = ["*CHI:\thi .", "%act:\tpoints", "%sit:\tat the table", "%gpx:\twaves", "%com:\tnote"];

    let cleaned = clean_lines(lines, &rules);
    assert_eq!(cleaned.lines, vec!["<CHI> hi .", "%com:\tnote"]);
}
