//! OIE Configuration Management
//!
//! Handles configuration from environment variables and TOML files with
//! defaults suitable for running the bundled pattern models. The
//! extraction settings are built once per run and only read afterwards.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Extraction pipeline toggles
    pub extraction: ExtractionConfig,

    /// Pattern models to load, in evaluation order
    pub extractors: Vec<ExtractorSource>,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        let mut config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.clone(),
            message: e.to_string(),
        })?;

        // Relative model paths are resolved against the config file
        if let Some(base) = path.parent() {
            for source in &mut config.extractors {
                if let Some(model) = source.path.as_mut() {
                    if model.is_relative() {
                        *model = base.join(&*model);
                    }
                }
            }
        }

        Ok(config)
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        self.apply_env()?;
        Ok(self)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(value) = std::env::var("OIE_CONFIDENCE_THRESHOLD") {
            self.extraction.confidence_threshold =
                value.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "OIE_CONFIDENCE_THRESHOLD".to_string(),
                    value,
                })?;
        }
        if let Some(flag) = env_flag("OIE_EXPAND")? {
            self.extraction.expand_extraction = flag;
        }
        if let Some(flag) = env_flag("OIE_RESTRICT_ARGUMENTS")? {
            self.extraction.restrict_arguments = flag;
        }
        if let Some(flag) = env_flag("OIE_SIMPLIFY_POSTAGS")? {
            self.extraction.simplify_postags = flag;
        }
        if let Some(flag) = env_flag("OIE_SIMPLIFY_VB_POSTAGS")? {
            self.extraction.simplify_vb_postags = flag;
        }
        if let Some(flag) = env_flag("OIE_KEEP_DUPLICATES")? {
            self.extraction.keep_duplicates = flag;
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Check the whole configuration before any sentence is processed
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.extraction.validate()?;
        for (i, source) in self.extractors.iter().enumerate() {
            if source.path.is_none() {
                return Err(ConfigError::MissingRequired(format!(
                    "extractors[{}].path for {} extractor",
                    i, source.kind
                )));
            }
        }
        Ok(())
    }
}

fn env_flag(key: &str) -> Result<Option<bool>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => match value.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            }),
        },
        Err(_) => Ok(None),
    }
}

/// Toggles read by the extraction pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Minimum confidence for an extraction to be reported (>= 0)
    pub confidence_threshold: f64,

    /// Expand anchors into full phrases
    pub expand_extraction: bool,

    /// Require argument anchors to be nominal, adjectival, numeric or pronoun
    pub restrict_arguments: bool,

    /// Collapse fine-grained tags before matching
    pub simplify_postags: bool,

    /// Collapse finite verb tags before matching
    pub simplify_vb_postags: bool,

    /// Report every duplicate instead of the best-scoring one
    pub keep_duplicates: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.0,
            expand_extraction: true,
            restrict_arguments: true,
            simplify_postags: true,
            simplify_vb_postags: false,
            keep_duplicates: false,
        }
    }
}

impl ExtractionConfig {
    /// Set the confidence threshold
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Keep or collapse duplicate extractions
    pub fn with_keep_duplicates(mut self, keep: bool) -> Self {
        self.keep_duplicates = keep;
        self
    }

    /// Enable/disable anchor expansion
    pub fn with_expansion(mut self, expand: bool) -> Self {
        self.expand_extraction = expand;
        self
    }

    /// Enable/disable the argument part-of-speech restriction
    pub fn with_restricted_arguments(mut self, restrict: bool) -> Self {
        self.restrict_arguments = restrict;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.confidence_threshold.is_finite() || self.confidence_threshold < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "extraction.confidence_threshold".to_string(),
                value: self.confidence_threshold.to_string(),
            });
        }
        Ok(())
    }
}

/// Supported extractor variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractorKind {
    /// Pattern with a fixed confidence
    General,
    /// Pattern restricted to listed relation lemmas
    Specific,
    /// Pattern scored by a precomputed relation distribution
    TopicModel,
    /// Pattern whose relation is rewritten by a template
    Template,
}

impl ExtractorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Specific => "specific",
            Self::TopicModel => "topic_model",
            Self::Template => "template",
        }
    }
}

impl std::fmt::Display for ExtractorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ExtractorKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "general" => Ok(Self::General),
            "specific" => Ok(Self::Specific),
            "topic_model" => Ok(Self::TopicModel),
            "template" => Ok(Self::Template),
            _ => Err(ConfigError::InvalidValue {
                key: "extractors.kind".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Where an extractor's patterns (or distribution) come from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractorSource {
    pub kind: ExtractorKind,

    /// Pattern file or precomputed distribution file
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl ExtractorSource {
    pub fn new(kind: ExtractorKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: Some(path.into()),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,

    /// Include file/line in logs
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            include_location: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
