/*!
 * Integration tests for the application controller
 */

use std::fs;

use anyhow::Result;

use chatprep::app_config::{Config, RuleValue};
use chatprep::app_controller::{Controller, RunSummary, ISSUES_LOG_NAME};
use crate::common;

fn controller() -> Controller {
    Controller::with_config(Config::default())
        .expect("default config should be valid")
        .with_jobs(2)
}

/// Test cleaning a single transcript next to a fresh output directory
#[tokio::test]
async fn test_run_withSingleFile_shouldWriteCleanOutput() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path().to_path_buf();
    let input = common::create_test_transcript(&dir, "session.cha")?;
    let output_dir = dir.join("out");

    let summary = controller().run(input.clone(), output_dir.clone(), false).await?;

    let output = output_dir.join("session.clean.txt");
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.files[0].input, input);
    assert_eq!(summary.files[0].output, output);
    assert_eq!(fs::read_to_string(&output)?, "<CHI> I want <unk> .\n<MOT> um here you go ...\n");
    Ok(())
}

/// Test that an existing output is left alone unless forced
#[tokio::test]
async fn test_run_withExistingOutput_shouldSkipUnlessForced() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path().to_path_buf();
    let input = common::create_test_transcript(&dir, "session.cha")?;
    let existing = common::create_test_file(&dir, "session.clean.txt", "old output\n")?;

    let skipped = controller().run(input.clone(), dir.clone(), false).await?;
    assert_eq!(skipped.skipped, 1);
    assert_eq!(skipped.processed, 0);
    assert_eq!(fs::read_to_string(&existing)?, "old output\n");

    let forced = controller().run(input, dir, true).await?;
    assert_eq!(forced.processed, 1);
    assert!(fs::read_to_string(&existing)?.starts_with("<CHI>"));
    Ok(())
}

/// Test that a missing input file is an error
#[tokio::test]
async fn test_run_withMissingInput_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path().to_path_buf();

    let result = controller().run(dir.join("absent.cha"), dir, false).await;
    assert!(result.is_err());
    Ok(())
}

/// Test folder mode mirrors nested directories and writes the issues log
#[tokio::test]
async fn test_run_folder_withNestedDirs_shouldMirrorTree() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path().to_path_buf();
    let input_dir = dir.join("corpus");
    common::create_test_transcript(&input_dir, "a.cha")?;
    common::create_test_transcript(&input_dir, "kids/b.cha")?;
    common::create_test_file(&input_dir, "kids/c.cha", "*CHI:\tfoo@zz .\n")?;
    common::create_test_file(&input_dir, "notes.txt", "not a transcript")?;
    let output_dir = dir.join("clean");

    let summary = controller().run_folder(input_dir.clone(), output_dir.clone(), false).await?;

    assert_eq!(summary.processed, 3);
    assert_eq!(summary.failed, 0);
    assert!(output_dir.join("a.clean.txt").is_file());
    assert!(output_dir.join("kids").join("b.clean.txt").is_file());
    assert!(output_dir.join("kids").join("c.clean.txt").is_file());
    assert!(!output_dir.join("notes.clean.txt").exists());

    // Reports come back sorted by input path
    let inputs: Vec<_> = summary.files.iter().map(|f| f.input.clone()).collect();
    let mut sorted = inputs.clone();
    sorted.sort();
    assert_eq!(inputs, sorted);
    assert_eq!(summary.diagnostic_count(), 1);

    let log = fs::read_to_string(output_dir.join(ISSUES_LOG_NAME))?;
    assert!(log.contains("Folder Processing:"));
    assert!(log.contains("c.cha"));
    assert!(log.contains("3 processed, 0 skipped, 0 errors, 1 diagnostics"));
    Ok(())
}

/// Test folder mode skipping outputs from an earlier run
#[tokio::test]
async fn test_run_folder_withSecondRun_shouldSkipExisting() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path().to_path_buf();
    let input_dir = dir.join("corpus");
    common::create_test_transcript(&input_dir, "a.cha")?;
    common::create_test_transcript(&input_dir, "b.cha")?;
    let output_dir = dir.join("clean");

    let first = controller().run_folder(input_dir.clone(), output_dir.clone(), false).await?;
    assert_eq!(first.processed, 2);

    let second = controller().run_folder(input_dir.clone(), output_dir.clone(), false).await?;
    assert_eq!(second.processed, 0);
    assert_eq!(second.skipped, 2);

    let forced = controller().run_folder(input_dir, output_dir, true).await?;
    assert_eq!(forced.processed, 2);
    Ok(())
}

/// Test that a folder without transcripts is an error
#[tokio::test]
async fn test_run_folder_withNoTranscripts_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path().to_path_buf();
    common::create_test_file(&dir, "readme.txt", "nothing here")?;

    let result = controller().run_folder(dir.clone(), dir.join("out"), false).await;
    assert!(result.is_err());
    Ok(())
}

/// Test the JSON report written after a run
#[test]
fn test_write_report_withSummary_shouldProduceJson() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path().to_path_buf();
    let input = common::create_test_transcript(&dir, "session.cha")?;

    let summary: RunSummary = tokio_test::block_on(controller().run(input, dir.join("out"), false))?;
    let report_path = dir.join("report.json");
    Controller::write_report(&summary, &report_path)?;

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report_path)?)?;
    assert_eq!(json["processed"], 1);
    assert_eq!(json["files"][0]["stats"]["utterances_kept"], 2);
    assert_eq!(json["files"][0]["stats"]["utterances_dropped"], 1);
    assert!(json["files"][0]["diagnostics"].as_array().is_some_and(|d| d.is_empty()));
    Ok(())
}

/// Test that an invalid rule value is rejected when building the controller
#[test]
fn test_with_config_withInvalidValue_shouldFail() {
    let mut config = Config::default();
    config.utterance.disfluency.filler = RuleValue::literal("sometimes");
    assert!(Controller::with_config(config).is_err());
}

/// Test that the job count never drops below one
#[test]
fn test_with_jobs_withZero_shouldClampToOne() {
    assert_eq!(controller().with_jobs(0).jobs(), 1);
    assert_eq!(controller().with_jobs(8).jobs(), 8);
}
