//! Layered error definitions
//!
//! Categorized by source: input / config / detection / sink

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Input Errors =====
    /// Missing directory, file or config table
    #[error("input not found: {}", .path.display())]
    InputNotFound { path: PathBuf },

    /// Malformed detection record or config content
    #[error("failed to parse '{}': {message}", .path.display())]
    ParseFailure { path: PathBuf, message: String },

    /// Declared camera count differs from supplied directories
    #[error("camera count mismatch: expected {expected}, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    /// Detection record could not be written
    #[error("failed to write '{}': {message}", .path.display())]
    WriteFailure { path: PathBuf, message: String },

    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Detection Errors =====
    /// Detector failed on an image (distinct from "target not visible")
    #[error("detector error on '{}': {message}", .image.display())]
    Detection { image: PathBuf, message: String },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    pub fn input_not_found(path: impl Into<PathBuf>) -> Self {
        Self::InputNotFound { path: path.into() }
    }

    pub fn parse_failure(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::ParseFailure {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    pub fn count_mismatch(expected: usize, actual: usize) -> Self {
        Self::CountMismatch { expected, actual }
    }

    pub fn write_failure(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::WriteFailure {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn detection(image: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Detection {
            image: image.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }
}
