//! Unified error type hierarchy for the plugin CI tooling
//!
//! Provides structured error handling with ConfigError, BuildError, RunError
//! and ExtensionError.

use std::io;
use thiserror::Error;

/// Environment and configuration file errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Required environment variable not set: {0}")]
    MissingVariable(String),

    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid JSON in config: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("IO error during config operations: {0}")]
    IoError(#[from] io::Error),
}

/// Build pipeline errors, one variant per phase.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Preparation phase failed: {0}")]
    PreparationFailed(String),

    #[error("Configuration phase failed: {0}")]
    ConfigurationFailed(String),

    #[error("Build phase failed: {0}")]
    BuildFailed(String),
}

/// A single external command that did not complete successfully.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Failed to launch '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Command '{}' exited with status {}", .command, format_code(.code))]
    ExitStatus { command: String, code: Option<i32> },
}

fn format_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "unknown (terminated by signal)".to_string(),
    }
}

/// Errors surfaced to the host application by extensions and their actions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtensionError {
    #[error("Action '{0}' is already running")]
    AlreadyRunning(String),

    #[error("No action registered with id '{0}'")]
    UnknownAction(String),

    #[error("Action '{0}' is disabled")]
    ActionDisabled(String),

    #[error("Delegate failed: {0}")]
    Delegate(String),
}
