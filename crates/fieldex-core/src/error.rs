//! Error types for the fieldex-core library.

use thiserror::Error;

/// Main error type for the fieldex library.
#[derive(Error, Debug)]
pub enum FieldexError {
    /// Pattern compilation error.
    #[error("pattern error: {0}")]
    Pattern(#[from] PatternError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A regex pattern that failed to compile at configuration load.
///
/// Fatal for the affected field: extraction cannot start with a broken
/// pattern repository.
#[derive(Error, Debug)]
#[error("invalid pattern for {source_name}/{element} (index {index}): {reason}")]
pub struct PatternError {
    /// Document source the field belongs to.
    pub source_name: String,
    /// Element the pattern was configured for.
    pub element: String,
    /// Index of the pattern within the field's ordered list.
    pub index: usize,
    /// Compiler message from the regex crate.
    pub reason: String,
}

/// Errors related to source/plan configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read config {path}: {reason}")]
    Read { path: String, reason: String },

    /// Configuration file could not be parsed.
    #[error("failed to parse config {path}: {reason}")]
    Parse { path: String, reason: String },

    /// A requested source has no configuration.
    #[error("no configuration found for source '{0}'")]
    MissingSource(String),

    /// A configured source has no fields and no name anchors.
    #[error("source '{0}' has an empty pattern repository")]
    EmptyRepository(String),

    /// A requested source folder contains no documents.
    #[error("no documents found for source '{0}'")]
    NoDocuments(String),
}

/// Result type for the fieldex library.
pub type Result<T> = std::result::Result<T, FieldexError>;
