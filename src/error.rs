//! Error types for Ailloy
//!
//! All modules use `AilloyResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Ailloy operations
pub type AilloyResult<T> = Result<T, AilloyError>;

/// Broad classification of an error, used to decide whether it aborts a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed user input (reference string, constraint syntax)
    Input,
    /// A git command against the origin or the local bare clone failed
    Remote,
    /// Something that was searched for does not exist
    NotFound,
    /// A computed path escaped the directory it must stay inside
    Security,
    /// Lock file trouble; logged, never fatal to a resolution
    Degraded,
    /// Everything else (local IO, config, serialization)
    Other,
}

/// All errors that can occur in Ailloy
#[derive(Error, Debug)]
pub enum AilloyError {
    // Input errors
    #[error("Invalid mold reference '{raw}': {reason}")]
    InvalidReference { raw: String, reason: String },

    #[error("Invalid version constraint '{raw}': {reason}")]
    InvalidConstraint { raw: String, reason: String },

    // Remote errors
    #[error("git {command} failed:\n{output}")]
    Git { command: String, output: String },

    // Not-found errors
    #[error("No semver tags found in {url}")]
    NoSemverTags { url: String },

    #[error("Tag {version} not found in {url}")]
    TagNotFound { version: String, url: String },

    #[error("No tag in {url} satisfies constraint {constraint}")]
    ConstraintUnsatisfied { constraint: String, url: String },

    #[error("Branch {branch} not found in {url}")]
    BranchNotFound { branch: String, url: String },

    #[error("No manifest found at {path} (expected mold.yaml or ingot.yaml)")]
    ManifestNotFound { path: PathBuf },

    // Security errors
    #[error("Path {path} escapes {root}")]
    PathEscape { path: PathBuf, root: PathBuf },

    // Degraded errors
    #[error("Failed to read lockfile {path}: {reason}")]
    LockfileRead { path: PathBuf, reason: String },

    #[error("Failed to write lockfile {path}: {reason}")]
    LockfileWrite { path: PathBuf, reason: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Home directory could not be determined")]
    NoHomeDir,

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl AilloyError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error (the process could not be spawned)
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a git error carrying the command's combined output
    pub fn git(command: impl Into<String>, output: impl Into<String>) -> Self {
        Self::Git {
            command: command.into(),
            output: output.into(),
        }
    }

    /// Create an invalid reference error
    pub fn invalid_reference(raw: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidReference {
            raw: raw.into(),
            reason: reason.into(),
        }
    }

    /// Classify the error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidReference { .. } | Self::InvalidConstraint { .. } => ErrorCategory::Input,
            Self::Git { .. } | Self::CommandFailed { .. } => ErrorCategory::Remote,
            Self::NoSemverTags { .. }
            | Self::TagNotFound { .. }
            | Self::ConstraintUnsatisfied { .. }
            | Self::BranchNotFound { .. }
            | Self::ManifestNotFound { .. } => ErrorCategory::NotFound,
            Self::PathEscape { .. } => ErrorCategory::Security,
            Self::LockfileRead { .. } | Self::LockfileWrite { .. } => ErrorCategory::Degraded,
            _ => ErrorCategory::Other,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidReference { .. } => {
                Some("Expected <host>/<owner>/<repo>[@<version>][//<subpath>]")
            }
            Self::CommandFailed { .. } => Some("Is git installed and on PATH?"),
            Self::NoSemverTags { .. } => {
                Some("Pin a branch or commit instead, e.g. <ref>@main or <ref>@<sha>")
            }
            Self::ManifestNotFound { .. } => Some("Check the //subpath part of the reference"),
            _ => None,
        }
    }
}
