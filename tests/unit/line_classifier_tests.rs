/*!
 * Tests for line classification
 */

use chatprep::chat::line::{classify, split_dependent_tier, split_main_tier, Category};

/// Test the four line prefixes
#[test]
fn test_classify_withLinePrefixes_shouldReturnCategory() {
    assert_eq!(classify("@Begin", None), Category::Header);
    assert_eq!(classify("@Participants:\tCHI Target_Child", None), Category::Header);
    assert_eq!(classify("*CHI:\tI want that .", None), Category::Utterance);
    assert_eq!(classify("%mor:\tpro|I v|want", Some(Category::Utterance)), Category::DependentTier);
}

/// Test that indented lines continue headers, utterances and tiers
#[test]
fn test_classify_withIndentedLine_shouldBeContinuation() {
    for prior in [Category::Header, Category::Utterance, Category::DependentTier, Category::Continuation] {
        assert_eq!(classify("\tthe ball .", Some(prior)), Category::Continuation);
        assert_eq!(classify("    the ball .", Some(prior)), Category::Continuation);
    }
}

/// Test that an indented line with nothing to continue is unrecognized
#[test]
fn test_classify_withIndentedLineAfterUnrecognized_shouldBeUnrecognized() {
    assert_eq!(classify("\tdangling", Some(Category::Unrecognized)), Category::Unrecognized);
}

/// Test blank and garbage lines
#[test]
fn test_classify_withBlankOrGarbage_shouldNotBeTier() {
    assert_eq!(classify("", None), Category::Blank);
    assert_eq!(classify("   \t", Some(Category::Utterance)), Category::Blank);
    assert_eq!(classify("hello there", Some(Category::Utterance)), Category::Unrecognized);
}

/// Test the tier splitting helpers
#[test]
fn test_split_tiers_shouldSeparateCodeAndText() {
    assert_eq!(split_main_tier("*MOT:\tlook !"), Some(("MOT", "look !")));
    assert_eq!(split_dependent_tier("%act:\tpoints"), Some(("act", "points")));
    assert_eq!(split_dependent_tier("%:\tmissing code"), None);
    assert_eq!(split_main_tier("%act:\tpoints"), None);
}
