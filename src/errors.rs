/*!
 * Error types for the chatprep application.
 *
 * Configuration problems are fatal and surface as `ConfigError`. Problems found
 * inside a transcript never abort processing: they are reported as
 * `TranscriptIssue` values attached to a line number (see `chat::diagnostics`).
 */

use serde::Serialize;
use thiserror::Error;

/// Errors raised while loading or resolving the rule configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The YAML document could not be parsed, or contained an unknown option
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// An option holds a value outside its accepted set
    #[error("Invalid value '{value}' for option '{option}': {reason}")]
    InvalidValue {
        /// Dotted option path, e.g. `utterance.disfluency.filler`
        option: String,
        /// The rejected value as written
        value: String,
        /// What the option accepts
        reason: String,
    },

    /// Reading or writing the configuration file failed
    #[error("Configuration file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Non-fatal problems found while cleaning a transcript
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TranscriptIssue {
    /// A line matching none of the known line prefixes
    #[error("Unrecognized line passed through: {text}")]
    MalformedLine { text: String },

    /// An opening bracket without its closing counterpart
    #[error("Unbalanced '{delimiter}' at byte {offset}; remaining text kept verbatim")]
    UnbalancedBracket { delimiter: char, offset: usize },

    /// A marker whose code is not part of the grammar
    #[error("Unknown marker code '{code}' kept verbatim")]
    UnknownMarkerCode { code: String },

    /// A dependent tier appearing before any utterance
    #[error("Dependent tier '%{tier}' has no owning utterance")]
    OrphanDependentTier { tier: String },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from configuration loading
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
