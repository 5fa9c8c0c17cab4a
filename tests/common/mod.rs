/*!
 * Common test utilities for the chatprep test suite
 */

use std::path::PathBuf;
use std::fs;
use anyhow::Result;
use tempfile::TempDir;

use chatprep::app_config::Config;
use chatprep::chat::RuleTable;

/// A short transcript touching headers, tiers, markers and a back-channel
pub const SAMPLE_TRANSCRIPT: &str = "@UTF8
@Begin
@Participants:\tCHI Target_Child, MOT Mother
*CHI:\tI want xxx .
%act:\tpoints at cookie
*MOT:\t&-um here you go +...
%com:\tsmiling
*CHI:\tmhm . [+ bch]
%act:\tnods
@End
";

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &PathBuf, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates the sample transcript in the specified directory
pub fn create_test_transcript(dir: &PathBuf, filename: &str) -> Result<PathBuf> {
    create_test_file(dir, filename, SAMPLE_TRANSCRIPT)
}

/// Rule table for a configuration tweaked by `edit`
pub fn rules_with<F: FnOnce(&mut Config)>(edit: F) -> RuleTable {
    let mut config = Config::default();
    edit(&mut config);
    RuleTable::from_config(&config).expect("test configuration should be valid")
}

/// Route engine logs to the test output; safe to call more than once
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Path to the shipped default configuration
pub fn default_config_path() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("configs");
    path.push("default.yaml");
    path
}
