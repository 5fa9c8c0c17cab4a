use anyhow::{Result, Context, anyhow};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, warn, info, debug};
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::app_config::Config;
use crate::chat::diagnostics::{summarize, Diagnostic};
use crate::chat::{AssemblyStats, RuleTable, TranscriptAssembler};
use crate::errors::AppError;
use crate::file_utils::{FileManager, TRANSCRIPT_EXTENSION};

// @module: Application controller for transcript cleaning

/// Suffix inserted before the output extension
pub const OUTPUT_SUFFIX: &str = "clean";
/// Extension of cleaned transcripts
pub const OUTPUT_EXTENSION: &str = "txt";
/// Name of the folder summary log written to the output directory
pub const ISSUES_LOG_NAME: &str = "chatprep.issues.log";

/// What happened to one input file
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub stats: AssemblyStats,
    pub diagnostics: Vec<Diagnostic>,
}

/// Outcome of a run over one file or a folder
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub files: Vec<FileReport>,
}

impl RunSummary {
    pub fn diagnostic_count(&self) -> usize {
        self.files.iter().map(|f| f.diagnostics.len()).sum()
    }
}

enum FileOutcome {
    Cleaned(FileReport),
    Skipped(PathBuf),
    Failed(PathBuf, anyhow::Error),
}

/// Main application controller for transcript cleaning
pub struct Controller {
    // @field: Rule configuration as loaded
    config: Config,
    // @field: Resolved rules shared with worker tasks
    rules: Arc<RuleTable>,
    // @field: Max files cleaned at once
    jobs: usize,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let rules = RuleTable::from_config(&config).map_err(AppError::from)?;
        Ok(Self {
            config,
            rules: Arc::new(rules),
            jobs: default_jobs(),
        })
    }

    /// Set the number of files cleaned concurrently (at least one)
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Clean one transcript into `output_dir`
    pub async fn run(&self, input_file: PathBuf, output_dir: PathBuf, force_overwrite: bool) -> Result<RunSummary> {
        let start_time = Instant::now();

        if !input_file.is_file() {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        let output_path = FileManager::generate_output_path(&input_file, &output_dir, OUTPUT_SUFFIX, OUTPUT_EXTENSION);
        let outcome = Self::process_file(Arc::clone(&self.rules), input_file, output_path, force_overwrite).await;

        let mut summary = RunSummary::default();
        match outcome {
            FileOutcome::Cleaned(report) => {
                info!("Success: {} ({}) in {}",
                    report.output.display(),
                    summarize(&report.diagnostics),
                    Self::format_duration(start_time.elapsed()));
                summary.processed = 1;
                summary.files.push(report);
            }
            FileOutcome::Skipped(path) => {
                debug!("Skipped {:?}", path);
                summary.skipped = 1;
            }
            FileOutcome::Failed(path, e) => {
                return Err(e.context(format!("Failed to clean {:?}", path)));
            }
        }
        Ok(summary)
    }

    /// Run the workflow in folder mode, cleaning every `.cha` file below
    /// `input_dir` into the mirrored location below `output_dir`.
    /// Files whose output already exists are skipped unless forced.
    pub async fn run_folder(&self, input_dir: PathBuf, output_dir: PathBuf, force_overwrite: bool) -> Result<RunSummary> {
        let start_time = Instant::now();

        if !input_dir.is_dir() {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let transcripts = FileManager::find_files(&input_dir, TRANSCRIPT_EXTENSION)?;
        if transcripts.is_empty() {
            return Err(anyhow!("No .{} files found in directory: {:?}", TRANSCRIPT_EXTENSION, input_dir));
        }
        debug!("Found {} transcript(s) under {:?}", transcripts.len(), input_dir);

        let progress = ProgressBar::new(transcripts.len() as u64);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress.set_style(template_result.progress_chars("#>-"));
        progress.set_message("Cleaning transcripts");

        let outcomes: Vec<FileOutcome> = stream::iter(transcripts)
            .map(|input| {
                let rules = Arc::clone(&self.rules);
                let output = FileManager::mirrored_output_path(&input, &input_dir, &output_dir, OUTPUT_SUFFIX, OUTPUT_EXTENSION);
                let progress = progress.clone();
                async move {
                    let outcome = Self::process_file(rules, input, output, force_overwrite).await;
                    progress.inc(1);
                    outcome
                }
            })
            .buffer_unordered(self.jobs)
            .collect()
            .await;

        progress.finish_with_message("Folder processing complete");

        let mut summary = RunSummary::default();
        for outcome in outcomes {
            match outcome {
                FileOutcome::Cleaned(report) => {
                    summary.processed += 1;
                    summary.files.push(report);
                }
                FileOutcome::Skipped(path) => {
                    debug!("Skipped {:?}", path);
                    summary.skipped += 1;
                }
                FileOutcome::Failed(path, e) => {
                    error!("Error processing file {:?}: {:#}", path, e);
                    summary.failed += 1;
                }
            }
        }
        // Completion order is arbitrary
        summary.files.sort_by(|a, b| a.input.cmp(&b.input));

        let duration = start_time.elapsed();
        let summary_message = format!("Folder processing completed: {} processed, {} skipped, {} errors, {} diagnostics",
            summary.processed, summary.skipped, summary.failed, summary.diagnostic_count());
        info!("{}", summary_message);

        let log_file_path = output_dir.join(ISSUES_LOG_NAME);
        if let Err(e) = Self::write_issues_log(&log_file_path, &input_dir, &summary, &summary_message, duration) {
            warn!("Failed to write folder log to file: {}", e);
        } else {
            debug!("Folder processing log written to {}", log_file_path.display());
        }

        Ok(summary)
    }

    /// Write a JSON report of `summary`
    pub fn write_report<P: AsRef<Path>>(summary: &RunSummary, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(summary)
            .context("Failed to serialize diagnostics report")?;
        FileManager::write_to_file(path, &json)
    }

    /// Clean `input` into `output` on the blocking pool
    async fn process_file(rules: Arc<RuleTable>, input: PathBuf, output: PathBuf, force_overwrite: bool) -> FileOutcome {
        if output.exists() && !force_overwrite {
            warn!("Skipping {:?}, output already exists (use -f to force overwrite)", input);
            return FileOutcome::Skipped(input);
        }

        let task_input = input.clone();
        let joined = tokio::task::spawn_blocking(move || Self::clean_file(&rules, &task_input, &output)).await;
        match joined {
            Ok(Ok(report)) => FileOutcome::Cleaned(report),
            Ok(Err(e)) => FileOutcome::Failed(input, e),
            Err(e) => FileOutcome::Failed(input, anyhow!("Cleaning task failed: {}", e)),
        }
    }

    /// Clean one transcript synchronously, streaming its lines
    pub fn clean_file(rules: &RuleTable, input: &Path, output: &Path) -> Result<FileReport> {
        let file = File::open(input)
            .with_context(|| format!("Failed to open transcript: {:?}", input))?;
        let reader = BufReader::new(file);

        let mut assembler = TranscriptAssembler::new(rules);
        let mut lines = Vec::new();
        for line in reader.lines() {
            let line = line.with_context(|| format!("Failed to read transcript: {:?}", input))?;
            lines.extend(assembler.push_line(&line));
        }
        let mut cleaned = assembler.finish();
        lines.append(&mut cleaned.lines);
        cleaned.lines = lines;

        FileManager::write_to_file(output, &cleaned.to_text())?;
        debug!("Cleaned {:?}: {} of {} utterance(s) kept", input, cleaned.stats.utterances_kept, cleaned.stats.utterances);

        Ok(FileReport {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            stats: cleaned.stats,
            diagnostics: cleaned.diagnostics,
        })
    }

    fn write_issues_log(path: &Path, input_dir: &Path, summary: &RunSummary, message: &str, duration: std::time::Duration) -> Result<()> {
        FileManager::append_to_log_file(path, &format!("Folder Processing: {}", input_dir.display()))?;
        for report in summary.files.iter().filter(|r| !r.diagnostics.is_empty()) {
            FileManager::append_to_log_file(path, &format!("  {}: {}", report.input.display(), summarize(&report.diagnostics)))?;
        }
        FileManager::append_to_log_file(path, &format!("{} - Duration: {}", message, Self::format_duration(duration)))
    }

    // Format duration in a human-readable format
    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}

fn default_jobs() -> usize {
    std::thread::available_parallelism().map_or(4, |n| n.get())
}
