/*!
 * Integration tests for the transcript cleaning workflow
 */

use anyhow::Result;

use chatprep::app_config::Config;
use chatprep::app_controller::Controller;
use chatprep::chat::{clean_text, RuleTable};
use chatprep::file_utils::FileManager;
use crate::common;

/// Test loading a transcript, cleaning it and writing the result
#[test]
fn test_transcript_workflow_withFullProcess_shouldSucceed() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_transcript(&temp_dir.path().to_path_buf(), "session.cha")?;

    // 1. Load the transcript
    let content = FileManager::read_to_string(&input)?;

    // 2. Clean it with the default rules
    let cleaned = clean_text(&content, &RuleTable::default());
    assert_eq!(cleaned.lines.len(), 2);

    // 3. Save and reload the output
    let output = FileManager::generate_output_path(&input, temp_dir.path(), "clean", "txt");
    FileManager::write_to_file(&output, &cleaned.to_text())?;
    let written = FileManager::read_to_string(&output)?;

    assert_eq!(written, "<CHI> I want <unk> .\n<MOT> um here you go ...\n");
    Ok(())
}

/// Test that a YAML rule file changes the output
#[test]
fn test_transcript_workflow_withCustomYamlRules_shouldApplyThem() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path().to_path_buf();
    let rules_path = common::create_test_file(&dir, "rules.yaml", "
utterance:
  keep_speaker: false
  unidentifiable:
    unintelligible: '[noise]'
  disfluency:
    filler: 'null'
  linkers:
    trail_off: true
dependent:
  keep_data: true
  action:
    keep_data: false
")?;

    let config = Config::from_file(&rules_path)?;
    config.validate()?;
    let rules = RuleTable::from_config(&config)?;
    let cleaned = clean_text(common::SAMPLE_TRANSCRIPT, &rules);

    assert_eq!(cleaned.lines, vec!["I want [noise] .", "here you go +...", "%com:\tsmiling"]);
    Ok(())
}

/// Test that the streaming file path and the in-memory path agree
#[test]
fn test_clean_file_withSampleTranscript_shouldMatchInMemoryResult() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path().to_path_buf();
    let input = common::create_test_transcript(&dir, "a.cha")?;
    let output = dir.join("out").join("a.clean.txt");

    let rules = RuleTable::default();
    let report = Controller::clean_file(&rules, &input, &output)?;
    let expected = clean_text(common::SAMPLE_TRANSCRIPT, &rules);

    assert_eq!(FileManager::read_to_string(&output)?, expected.to_text());
    assert_eq!(report.stats, expected.stats);
    assert_eq!(report.output, output);
    Ok(())
}

/// Test a transcript exercising most marker families at once
#[test]
fn test_transcript_workflow_withDenseMarkup_shouldProduceReadableText() {
    let transcript = "@Begin
*CHI:\t<I want> [/] I want (be)cause ˈthat +/.
*MOT:\the goed [: went] &=laughs home .
*CHI:\tmama@f &+da da@b yyy ‡ no [!] +...
@End
";
    let cleaned = clean_text(transcript, &RuleTable::default());

    assert_eq!(
        cleaned.lines,
        vec![
            "<CHI> I want I want because that ...",
            "<MOT> he went <ENV> laughs <sep> <0> </ENV> home .",
            "<CHI> <unk> <unk> <unk> , no ...",
        ]
    );
    assert!(cleaned.diagnostics.is_empty());
}
