/*!
 * Rule configuration for the cleaning engine.
 *
 * The configuration mirrors the YAML layout users edit: a `header` group, an
 * `utterance` group split into marker families, and a `dependent` group. Every
 * option is either a boolean or a string literal, and every group rejects
 * options it does not know about.
 */

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::chat::rules::RuleTable;
use crate::errors::ConfigError;

/// A configuration value that is either a switch or a literal string.
///
/// The literals `'keep'` and `'null'` are aliases for `true` and `false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleValue {
    Bool(bool),
    Text(String),
}

/// Normalized reading of a `RuleValue`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting<'a> {
    On,
    Off,
    Literal(&'a str),
}

impl RuleValue {
    /// Shorthand for a literal value
    pub fn literal(text: &str) -> Self {
        Self::Text(text.to_string())
    }

    /// Resolve the reserved aliases
    pub fn setting(&self) -> Setting<'_> {
        match self {
            Self::Bool(true) => Setting::On,
            Self::Bool(false) => Setting::Off,
            Self::Text(text) => match text.as_str() {
                "keep" => Setting::On,
                "null" => Setting::Off,
                other => Setting::Literal(other),
            },
        }
    }
}

impl From<bool> for RuleValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for RuleValue {
    fn from(value: &str) -> Self {
        Self::literal(value)
    }
}

impl std::fmt::Display for RuleValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{}", value),
            Self::Text(text) => write!(f, "'{}'", text),
        }
    }
}

/// Root of the rule configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// `@` header lines
    pub header: HeaderConfig,

    /// `*` main tier lines and their inline markers
    pub utterance: UtteranceConfig,

    /// `%` dependent tiers
    pub dependent: DependentConfig,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeaderConfig {
    // @field: Emit header lines
    pub keep_data: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UtteranceConfig {
    // @field: Emit utterance lines at all
    pub keep_data: bool,

    // @field: Prefix each utterance with `<SPK>`
    pub keep_speaker: bool,

    // @field: Split `&*SPK:word` interpositions into their own utterance
    pub interposed: bool,

    // @field: Placeholder for the bare `0` action token
    pub nonverbal: RuleValue,

    pub basic: BasicConfig,
    pub linkers: LinkerConfig,
    pub incomplete: IncompleteConfig,
    pub specform: SpecformConfig,
    pub unidentifiable: UnidentifiableConfig,
    pub disfluency: DisfluencyConfig,
    pub scoped: ScopedConfig,
}

impl Default for UtteranceConfig {
    fn default() -> Self {
        Self {
            keep_data: true,
            keep_speaker: true,
            interposed: true,
            nonverbal: RuleValue::literal("<0>"),
            basic: BasicConfig::default(),
            linkers: LinkerConfig::default(),
            incomplete: IncompleteConfig::default(),
            specform: SpecformConfig::default(),
            unidentifiable: UnidentifiableConfig::default(),
            disfluency: DisfluencyConfig::default(),
            scoped: ScopedConfig::default(),
        }
    }
}

/// Single-character prosodic marks. `true` keeps the mark, `false` strips it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BasicConfig {
    pub satellite: bool,
    pub tone: bool,
    pub lengthening: bool,
    pub prim_stress: bool,
    pub sec_stress: bool,
    pub blocking: bool,
    pub pause: bool,
}

/// Utterance linkers and terminators. `true` keeps the marker verbatim,
/// `false` substitutes its plain-text form.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinkerConfig {
    pub trail_off: bool,
    pub trail_off_q: bool,
    pub exclamation: bool,
    pub interruption: bool,
    pub completion: bool,
    pub interruption_q: bool,
    pub interruption_self: bool,
    pub interruption_self_q: bool,
    pub trans_break: bool,
    pub uptake: bool,
    pub latching: bool,
    pub quote_follow: bool,
    pub quote_precede: bool,
    pub quote_utterance: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IncompleteConfig {
    // @field: `(be)cause` -> `because` when true, `cause` when false
    pub noncompletion: bool,

    // @field: `0is` -> `is` when true, removed when false
    pub omitted: bool,
}

impl Default for IncompleteConfig {
    fn default() -> Self {
        Self {
            noncompletion: true,
            omitted: true,
        }
    }
}

/// `word@code` special forms. `true` keeps the word, `false` removes it,
/// any other string replaces the whole word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpecformConfig {
    pub babbling: RuleValue,
    pub child_invented: RuleValue,
    pub dialect: RuleValue,
    pub family_spec: RuleValue,
    pub filled_pause: RuleValue,
    pub general: RuleValue,
    pub interjections: RuleValue,
    pub multi_letters: RuleValue,
    pub letter: RuleValue,
    pub neologism: RuleValue,
    pub pcf: RuleValue,
    pub metaling: RuleValue,
    pub singing: RuleValue,
    pub sign: RuleValue,
    pub sas: RuleValue,
    pub l2: RuleValue,
    pub onomatopoeia: RuleValue,
    pub testword: RuleValue,
    pub unibet: RuleValue,
    pub wordplay: RuleValue,
    pub excluded: RuleValue,
}

impl Default for SpecformConfig {
    fn default() -> Self {
        Self {
            babbling: default_unknown(),
            child_invented: default_unknown(),
            dialect: RuleValue::Bool(true),
            family_spec: default_unknown(),
            filled_pause: RuleValue::Bool(false),
            general: RuleValue::Bool(false),
            interjections: RuleValue::Bool(true),
            multi_letters: RuleValue::Bool(true),
            letter: RuleValue::Bool(true),
            neologism: RuleValue::Bool(true),
            pcf: default_unknown(),
            metaling: RuleValue::Bool(true),
            singing: RuleValue::Bool(true),
            sign: RuleValue::Bool(true),
            sas: RuleValue::Bool(true),
            l2: RuleValue::Bool(true),
            onomatopoeia: RuleValue::Bool(true),
            testword: RuleValue::Bool(true),
            unibet: default_unknown(),
            wordplay: default_unknown(),
            excluded: default_unknown(),
        }
    }
}

/// `xxx`, `yyy` and `www` tokens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UnidentifiableConfig {
    pub unintelligible: RuleValue,
    pub phonological: RuleValue,
    pub untranscribed: RuleValue,
}

impl Default for UnidentifiableConfig {
    fn default() -> Self {
        Self {
            unintelligible: default_unknown(),
            phonological: default_unknown(),
            untranscribed: default_unknown(),
        }
    }
}

/// `&+`, `&-` and `&~` tokens. Accepts `'keep'`, `'unk'`, `'null'` or a literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisfluencyConfig {
    pub fragment: RuleValue,
    pub filler: RuleValue,
    pub nonwords: RuleValue,
}

impl Default for DisfluencyConfig {
    fn default() -> Self {
        Self {
            fragment: RuleValue::literal("null"),
            filler: RuleValue::literal("keep"),
            nonwords: RuleValue::literal("unk"),
        }
    }
}

/// Bracketed annotations governing the preceding word or `<...>` group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScopedConfig {
    pub paralinguistic: RuleValue,
    pub explanation: RuleValue,
    pub replacement: RuleValue,
    pub stressing: RuleValue,
    pub contra_stressing: RuleValue,
    pub alternative: RuleValue,
    pub repetition: RuleValue,
    pub retracing: RuleValue,
    pub reformulation: RuleValue,
    pub false_start: RuleValue,
    pub clause: RuleValue,
    pub error: RuleValue,
    pub precode: RuleValue,
    pub postcode: RuleValue,
    pub back_channel: RuleValue,
    pub include_turn: RuleValue,
    pub excluded: RuleValue,
    pub overlap: RuleValue,
}

impl Default for ScopedConfig {
    fn default() -> Self {
        Self {
            paralinguistic: RuleValue::literal("ENV"),
            explanation: RuleValue::Bool(false),
            replacement: RuleValue::Bool(true),
            stressing: RuleValue::Bool(false),
            contra_stressing: RuleValue::Bool(false),
            alternative: RuleValue::Bool(false),
            repetition: RuleValue::Bool(false),
            retracing: RuleValue::Bool(true),
            reformulation: RuleValue::Bool(true),
            false_start: RuleValue::Bool(true),
            clause: RuleValue::Bool(false),
            error: RuleValue::Bool(false),
            precode: RuleValue::Bool(false),
            postcode: RuleValue::Bool(false),
            back_channel: RuleValue::Bool(true),
            include_turn: RuleValue::Bool(true),
            excluded: RuleValue::Bool(true),
            overlap: RuleValue::Bool(false),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DependentConfig {
    // @field: Emit `%` tiers at all
    pub keep_data: bool,

    // @field: Extra gate for `%act` tiers
    pub action: ActionTierConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ActionTierConfig {
    pub keep_data: bool,
}

impl Default for ActionTierConfig {
    fn default() -> Self {
        Self { keep_data: true }
    }
}

fn default_unknown() -> RuleValue {
    RuleValue::literal("<unk>")
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

impl Config {
    /// Parse a YAML document; unknown options are rejected
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load and parse a YAML configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Serialize to YAML, every option spelled out
    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Write the configuration as YAML, creating parent directories
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_yaml_string()?)?;
        Ok(())
    }

    /// Validate option values by resolving the full rule table
    pub fn validate(&self) -> Result<(), ConfigError> {
        RuleTable::from_config(self).map(|_| ())
    }
}
