//! Error types for brood operations.
//!
//! This module defines [`BroodError`], the primary error type used throughout
//! the application, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Queries (tool present? variable set? endpoint healthy?) return `bool`
//!   and never produce a `BroodError`
//! - Lifecycle operations surface exactly one `BroodError` per call, raised
//!   at the first step that cannot continue
//! - Use `anyhow::Error` (via `BroodError::Other`) for unexpected errors

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Core error type for brood operations.
#[derive(Debug, Error)]
pub enum BroodError {
    /// An instance with this name is already registered.
    #[error("Instance '{name}' already exists")]
    InstanceExists { name: String },

    /// No instance with this name is registered.
    #[error("Instance '{name}' not found")]
    InstanceNotFound { name: String },

    /// The birth path of a new instance is already present on disk.
    #[error("Path already exists: {path}")]
    PathExists { path: PathBuf },

    /// Source code could not be obtained by clone or download.
    #[error("Could not obtain source code: {source:#}")]
    SourceUnavailable {
        #[source]
        source: anyhow::Error,
    },

    /// A required tool is missing and cannot be installed.
    #[error("Missing requirement '{requirement}': {message}")]
    RequirementMissing {
        requirement: String,
        message: String,
    },

    /// The install command for a requirement failed.
    #[error("Requirement install failed for '{requirement}': {message}")]
    RequirementCheckFailed {
        requirement: String,
        message: String,
    },

    /// The user declined to install a requirement.
    #[error("Installation of '{requirement}' was declined")]
    InstallDeclined { requirement: String },

    /// The mode-specific configure step failed.
    #[error("Configuring instance '{instance}' failed: {message}")]
    ConfigureFailed { instance: String, message: String },

    /// The instance process could not be launched.
    #[error("Starting instance '{instance}' failed: {message}")]
    StartFailed { instance: String, message: String },

    /// The instance launched but never became healthy.
    #[error("Instance '{instance}' did not become healthy at {endpoint} within {timeout:?}")]
    Unhealthy {
        instance: String,
        endpoint: String,
        timeout: Duration,
    },

    /// The instance has no launch record to act on.
    #[error("Instance '{instance}' has not been started")]
    NotStarted { instance: String },

    /// Failed to parse a settings or registry file.
    #[error("Failed to parse {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid settings or arguments.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// Shell command failed.
    #[error("Command failed with exit code {code:?}: {command}")]
    CommandFailed { command: String, code: Option<i32> },

    /// Command exceeded its timeout and was killed.
    #[error("Command timed out after {timeout:?}: {command}")]
    CommandTimedOut { command: String, timeout: Duration },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for brood operations.
pub type Result<T> = std::result::Result<T, BroodError>;
