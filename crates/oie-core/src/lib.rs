//! OIE Core - Graph primitives, configuration, and shared types
//!
//! This crate defines the core abstractions used throughout the OIE system:
//! - Dependency graph model (nodes, labeled edges, closure queries)
//! - Interval arithmetic over token positions
//! - Common error types
//! - Configuration management

pub mod config;
pub mod graph;
pub mod interval;

pub use config::{
    AppConfig, ConfigError, ExtractionConfig, ExtractorKind, ExtractorSource, LoggingConfig,
};
pub use graph::{DependencyGraph, Edge, Node, NodeSet};
pub use interval::Interval;

use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for OIE operations
#[derive(Error, Debug)]
pub enum OieError {
    /// A pattern match lacks one of the groups the builder requires.
    /// This is a pattern bug, never a runtime condition.
    #[error("Match from pattern `{pattern}` is missing required group `{group}`")]
    MissingGroup { group: String, pattern: String },

    #[error("Invalid dependency graph: {0}")]
    InvalidGraph(String),

    #[error("Invalid pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid sentence record: {0}")]
    InvalidRecord(String),

    #[error("Invalid model file {path} at line {line}: {reason}")]
    InvalidModel {
        path: String,
        line: usize,
        reason: String,
    },

    #[error("IO error reading {path}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, OieError>;

// ============================================================================
// Tests
// ============================================================================
