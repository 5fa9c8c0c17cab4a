// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow, Context};
use log::{warn, info, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::path::{Path, PathBuf};
use std::io::Write;
use clap::{Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use chatprep::app_config::{self, Config};
use chatprep::app_controller::{Controller, RunSummary};
use chatprep::file_utils::FileManager;

/// Configuration file used when `-c` is not given
const DEFAULT_CONFIG_PATH: &str = "chatprep.yaml";

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Clean CHAT transcripts (default command)
    Clean(CleanArgs),

    /// Write the default rule configuration
    InitConfig {
        /// Where to write it
        #[arg(value_name = "PATH", default_value = DEFAULT_CONFIG_PATH)]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force_overwrite: bool,
    },

    /// Generate shell completions for chatprep
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct CleanArgs {
    /// Transcript file or directory of .cha files
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Output directory (defaults to the input's directory)
    #[arg(short, long, value_name = "OUTPUT_PATH")]
    output_path: Option<PathBuf>,

    /// Rule configuration file (YAML)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config_path: PathBuf,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Number of files cleaned concurrently
    #[arg(short, long, env = "CHATPREP_JOBS")]
    jobs: Option<usize>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Write a JSON diagnostics report to this path
    #[arg(long, value_name = "REPORT_PATH")]
    report: Option<PathBuf>,
}

/// chatprep - CHAT transcript cleaner
///
/// Turns CHAT-annotated transcripts into plain text suitable for language
/// model training, keeping or dropping each kind of annotation according to
/// a YAML rule configuration.
#[derive(Parser, Debug)]
#[command(name = "chatprep")]
#[command(version)]
#[command(about = "CHAT transcript cleaning tool")]
#[command(long_about = "chatprep cleans CHAT transcripts into plain text, one utterance per line.

EXAMPLES:
    chatprep session.cha                       # Writes session.clean.txt next to the input
    chatprep -f session.cha                    # Force overwrite existing output
    chatprep -c strict.yaml corpus/ -o clean/  # Clean a whole corpus with custom rules
    chatprep -j 8 --report report.json corpus/ # Eight files at a time, JSON report
    chatprep init-config rules.yaml            # Write the default configuration
    chatprep completions bash > chatprep.bash  # Generate bash completions

CONFIGURATION:
    Rules are read from chatprep.yaml by default. You can specify a different
    file with --config-path. If the file doesn't exist, the default rules are
    written there automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Transcript file or directory of .cha files
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Output directory (defaults to the input's directory)
    #[arg(short, long, value_name = "OUTPUT_PATH")]
    output_path: Option<PathBuf>,

    /// Rule configuration file (YAML)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config_path: PathBuf,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Number of files cleaned concurrently
    #[arg(short, long, env = "CHATPREP_JOBS")]
    jobs: Option<usize>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Write a JSON diagnostics report to this path
    #[arg(long, value_name = "REPORT_PATH")]
    report: Option<PathBuf>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color and label for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "ERROR"),
            Level::Warn => ("\x1B[1;33m", "WARN "),
            Level::Info => ("\x1B[1;32m", "INFO "),
            Level::Debug => ("\x1B[1;36m", "DEBUG"),
            Level::Trace => ("\x1B[1;35m", "TRACE"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (color, label) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {} {}\x1B[0m", color, now, label, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Accept everything here; the effective level is set once arguments are parsed
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "chatprep", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::InitConfig { path, force_overwrite }) => init_config(&path, force_overwrite),
        Some(Commands::Clean(args)) => run_clean(args).await,
        None => {
            // Default behavior - top-level args stand in for `clean`
            let input_path = cli.input_path.ok_or_else(|| {
                anyhow!("INPUT_PATH is required when no subcommand is specified")
            })?;

            let clean_args = CleanArgs {
                input_path,
                output_path: cli.output_path,
                config_path: cli.config_path,
                force_overwrite: cli.force_overwrite,
                jobs: cli.jobs,
                log_level: cli.log_level,
                report: cli.report,
            };
            run_clean(clean_args).await
        }
    }
}

fn init_config(path: &Path, force_overwrite: bool) -> Result<()> {
    if path.exists() && !force_overwrite {
        return Err(anyhow!("Config file already exists: {:?}. Use -f to force overwrite.", path));
    }
    Config::default().save(path)
        .with_context(|| format!("Failed to write default config to file: {:?}", path))?;
    info!("Default configuration written to {}", path.display());
    Ok(())
}

fn load_config(config_path: &Path) -> Result<Config> {
    if config_path.exists() {
        Config::from_file(config_path)
            .with_context(|| format!("Failed to load config file: {:?}", config_path))
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path.display());
        let config = Config::default();
        config.save(config_path)
            .with_context(|| format!("Failed to write default config to file: {:?}", config_path))?;
        Ok(config)
    }
}

async fn run_clean(options: CleanArgs) -> Result<()> {
    if let Some(cmd_log_level) = &options.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.into());
    }

    let config = load_config(&options.config_path)?;
    config.validate()
        .context("Configuration validation failed")?;

    let mut controller = Controller::with_config(config)?;
    if let Some(jobs) = options.jobs {
        controller = controller.with_jobs(jobs);
    }

    let input_path = options.input_path;
    let summary: RunSummary = if FileManager::file_exists(&input_path) {
        if !FileManager::is_transcript(&input_path) {
            warn!("{} does not have a .cha extension, cleaning it anyway", input_path.display());
        }
        let output_dir = options.output_path
            .unwrap_or_else(|| input_path.parent().unwrap_or(Path::new(".")).to_path_buf());
        controller.run(input_path, output_dir, options.force_overwrite).await?
    } else if FileManager::dir_exists(&input_path) {
        let output_dir = options.output_path.unwrap_or_else(|| input_path.clone());
        controller.run_folder(input_path, output_dir, options.force_overwrite).await?
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", input_path));
    };

    if let Some(report_path) = &options.report {
        Controller::write_report(&summary, report_path)?;
        info!("Diagnostics report written to {}", report_path.display());
    }

    if summary.failed > 0 {
        return Err(anyhow!("{} file(s) failed to clean", summary.failed));
    }
    Ok(())
}
