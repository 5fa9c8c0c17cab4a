/*!
 * Tests for rule configuration loading and validation
 */

use anyhow::Result;
use log::LevelFilter;
use chatprep::app_config::{Config, LogLevel, RuleValue, Setting};
use chatprep::errors::ConfigError;
use crate::common;

/// Test that the shipped default.yaml spells out exactly the built-in defaults
#[test]
fn test_from_file_withShippedDefaults_shouldEqualDefaultConfig() -> Result<()> {
    let config = Config::from_file(common::default_config_path())?;
    assert_eq!(config, Config::default());
    Ok(())
}

/// Test that omitted options keep their defaults
#[test]
fn test_from_yaml_str_withPartialDocument_shouldFillDefaults() -> Result<()> {
    let yaml = "
header:
  keep_data: true
utterance:
  disfluency:
    filler: 'null'
";
    let config = Config::from_yaml_str(yaml)?;

    assert!(config.header.keep_data);
    assert_eq!(config.utterance.disfluency.filler, RuleValue::literal("null"));
    assert_eq!(config.utterance.disfluency.nonwords, RuleValue::literal("unk"));
    assert!(config.utterance.keep_speaker);
    assert!(!config.dependent.keep_data);
    assert!(config.dependent.action.keep_data);
    Ok(())
}

/// Test that an empty document is the default configuration
#[test]
fn test_from_yaml_str_withEmptyMapping_shouldBeDefault() -> Result<()> {
    let config = Config::from_yaml_str("{}")?;
    assert_eq!(config, Config::default());
    Ok(())
}

/// Test that unknown options are rejected instead of ignored
#[test]
fn test_from_yaml_str_withUnknownOption_shouldFail() {
    let yaml = "
utterance:
  basic:
    colour: true
";
    let result = Config::from_yaml_str(yaml);
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

/// Test that a string on a boolean-only option is a parse error
#[test]
fn test_from_yaml_str_withStringOnBoolOption_shouldFail() {
    let result = Config::from_yaml_str("utterance:\n  keep_speaker: 'yes'\n");
    assert!(result.is_err());
}

/// Test that both booleans and strings load into mixed options
#[test]
fn test_from_yaml_str_withMixedOptionValues_shouldParseBoth() -> Result<()> {
    let yaml = "
utterance:
  specform:
    babbling: false
    neologism: '[neo]'
";
    let config = Config::from_yaml_str(yaml)?;
    assert_eq!(config.utterance.specform.babbling, RuleValue::Bool(false));
    assert_eq!(config.utterance.specform.neologism, RuleValue::literal("[neo]"));
    Ok(())
}

/// Test the reserved 'keep' and 'null' aliases
#[test]
fn test_setting_withReservedAliases_shouldMapToSwitches() {
    assert_eq!(RuleValue::literal("keep").setting(), Setting::On);
    assert_eq!(RuleValue::literal("null").setting(), Setting::Off);
    assert_eq!(RuleValue::Bool(true).setting(), Setting::On);
    assert_eq!(RuleValue::literal("<unk>").setting(), Setting::Literal("<unk>"));
}

/// Test that validation names the offending option
#[test]
fn test_validate_withBadDisfluencyValue_shouldNameOption() {
    let mut config = Config::default();
    config.utterance.disfluency.fragment = RuleValue::literal("maybe");

    match config.validate() {
        Err(ConfigError::InvalidValue { option, value, .. }) => {
            assert_eq!(option, "utterance.disfluency.fragment");
            assert_eq!(value, "'maybe'");
        }
        other => panic!("expected an invalid value error, got {:?}", other),
    }
}

/// Test that an empty replacement literal is rejected
#[test]
fn test_validate_withEmptyLiteral_shouldFail() {
    let mut config = Config::default();
    config.utterance.unidentifiable.unintelligible = RuleValue::literal("  ");
    assert!(config.validate().is_err());
}

/// Test that the default configuration validates
#[test]
fn test_validate_withDefaults_shouldSucceed() {
    assert!(Config::default().validate().is_ok());
}

/// Test that save followed by from_file restores a customized configuration
#[test]
fn test_save_withCustomConfig_shouldReloadIdentically() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("nested").join("rules.yaml");

    let mut config = Config::default();
    config.header.keep_data = true;
    config.utterance.scoped.paralinguistic = RuleValue::literal("EVT");
    config.utterance.nonverbal = RuleValue::Bool(false);
    config.save(&path)?;

    assert_eq!(Config::from_file(&path)?, config);
    Ok(())
}

/// Test that a missing file surfaces as an I/O error
#[test]
fn test_from_file_withMissingFile_shouldReturnIoError() {
    let result = Config::from_file("definitely/not/here.yaml");
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

/// Test the log level conversion used by the CLI
#[test]
fn test_log_level_into_level_filter_shouldMatch() {
    assert_eq!(LevelFilter::from(LogLevel::Warn), LevelFilter::Warn);
    assert_eq!(LevelFilter::from(LogLevel::default()), LevelFilter::Info);
}
