//! Error types for tabletfxctl CLI

use tabletfx_expr::FormulaError;
use tabletfx_filters::SettingsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Formula error: {0}")]
    Formula(#[from] FormulaError),

    #[error("Invalid variable binding '{0}', expected name=value")]
    InvalidBinding(String),

    #[error("Unknown variable '{name}' for the {variant} variant")]
    UnknownVariable { name: String, variant: String },

    #[error("{count} channel(s) fell back to the identity formula")]
    ChannelsFellBack { count: usize },

    #[error("Invalid report on line {line}")]
    InvalidReport {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported tablet spec format '{0}', expected .json, .yaml or .yml")]
    UnsupportedSpecFormat(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Formula(_)
            | CliError::InvalidBinding(_)
            | CliError::UnknownVariable { .. } => 2,
            CliError::Settings(_) | CliError::UnsupportedSpecFormat(_) => 3,
            CliError::ChannelsFellBack { .. } => 4,
            CliError::InvalidReport { .. } | CliError::JsonError(_) | CliError::YamlError(_) => 5,
            CliError::IoError(_) => 1,
        }
    }
}
