/*!
 * CHAT transcript cleaning engine.
 *
 * - `markers`: marker kinds, codes and patterns
 * - `line`: line classification
 * - `rules`: marker kind to action table built from the configuration
 * - `scope`: bracket scanner and scope resolution
 * - `transformer`: the per-utterance rewrite pipeline
 * - `dependent`: `%` tier keep/drop policy
 * - `assembler`: streaming driver producing the cleaned transcript
 * - `diagnostics`: non-fatal issues with line numbers
 */

pub mod assembler;
pub mod dependent;
pub mod diagnostics;
pub mod line;
pub mod markers;
pub mod rules;
pub mod scope;
pub mod transformer;

pub use assembler::{clean_lines, clean_text, AssemblyStats, CleanedTranscript, TranscriptAssembler};
pub use dependent::{filter_tier, keep_tier, DependentTier, TierType};
pub use diagnostics::Diagnostic;
pub use line::{classify, Category};
pub use rules::{Action, RuleTable};
pub use transformer::{Interposition, TierTransformer, TransformOutcome};
