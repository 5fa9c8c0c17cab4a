/*!
 * # chatprep - CHAT transcript cleaner
 *
 * A Rust library that turns transcripts annotated in the CHAT format into
 * plain text, one utterance per line, for language model training.
 *
 * ## Features
 *
 * - Line classification of headers, utterances, dependent tiers and continuations
 * - Per-marker-kind keep/drop/replace rules loaded from YAML
 * - Bracketed scope resolution with nested and chained markers
 * - Dependent tier filtering, with a separate switch for action tiers
 * - Non-fatal diagnostics with line numbers, plus a JSON report
 * - Concurrent folder processing with progress reporting
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Rule configuration and its YAML form
 * - `chat`: The cleaning engine:
 *   - `chat::line`: Line classifier
 *   - `chat::markers`: Marker grammar
 *   - `chat::rules`: Marker kind to action table
 *   - `chat::scope`: Bracket scanner and scope resolution
 *   - `chat::transformer`: Tier transformer
 *   - `chat::dependent`: Dependent tier filter
 *   - `chat::assembler`: Transcript assembler
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod chat;
pub mod errors;
pub mod file_utils;

// Re-export main types for easier usage
pub use app_config::{Config, RuleValue};
pub use app_controller::Controller;
pub use chat::{clean_lines, clean_text, CleanedTranscript, RuleTable, TierTransformer, TranscriptAssembler};
pub use errors::{AppError, ConfigError, TranscriptIssue};
