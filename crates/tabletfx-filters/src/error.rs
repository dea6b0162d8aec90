//! Error types for the filter stage.

use crate::channel::Channel;
use tabletfx_expr::FormulaError;
use thiserror::Error;

/// Settings could not be loaded or applied.
///
/// A formula that fails to compile is not a settings error: the stage
/// substitutes the channel's identity formula and carries on. The one
/// exception is [`SettingsError::FallbackFailed`], which means the identity
/// formula itself did not compile.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Multi-sample count outside the supported range
    #[error("Sample count must be {min}-{max}, got {value}")]
    InvalidSampleCount {
        /// Requested count
        value: usize,
        /// Smallest accepted count
        min: usize,
        /// Largest accepted count
        max: usize,
    },

    /// Formula text too long to be a plausible expression
    #[error("{channel} formula is {len} bytes, limit is {limit}")]
    FormulaTooLong {
        /// Channel the formula belongs to
        channel: Channel,
        /// Formula length in bytes
        len: usize,
        /// Byte limit
        limit: usize,
    },

    /// Settings file could not be read
    #[error("Failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file is not valid YAML
    #[error("Invalid YAML settings: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Settings file is not valid JSON
    #[error("Invalid JSON settings: {0}")]
    Json(#[from] serde_json::Error),

    /// Settings file extension is not recognised
    #[error("Unsupported settings format '{0}', expected .yaml, .yml or .json")]
    UnsupportedFormat(String),

    /// A channel's identity formula failed to compile
    #[error("Identity fallback for {channel} failed to compile: {error}")]
    FallbackFailed {
        /// Channel whose fallback failed
        channel: Channel,
        /// Compilation error
        error: FormulaError,
    },
}

/// Result type for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;
