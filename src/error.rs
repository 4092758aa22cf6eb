//! Error types for Freshen
//!
//! All modules use `FreshenResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Freshen operations
pub type FreshenResult<T> = Result<T, FreshenError>;

/// All errors that can occur in Freshen
#[derive(Error, Debug)]
pub enum FreshenError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown configuration key: {0}")]
    ConfigKeyUnknown(String),

    // Publish errors
    #[error("Page shell {path} is missing the {marker} placeholder")]
    PlaceholderMissing { path: PathBuf, marker: &'static str },

    #[error("Page shell {path} has no version globals; run `freshen publish` first")]
    ShellGlobalsMissing { path: PathBuf },

    #[error("Asset root not found: {0}")]
    AssetRootNotFound(PathBuf),

    // Version resource errors
    #[error("Failed to fetch version from {source_desc}: {reason}")]
    VersionFetch { source_desc: String, reason: String },

    #[error("Invalid version manifest: {0}")]
    VersionManifestInvalid(String),

    #[error("Version identifier must not be empty")]
    VersionEmpty,

    // Storage errors
    #[error("Storage area {area} failed: {reason}")]
    Storage { area: String, reason: String },

    // API errors
    #[error("Session expired, please sign in again")]
    Unauthorized,

    #[error("API request to {url} failed with status {status}")]
    ApiStatus { url: String, status: u16 },

    #[error("API error {code}: {message}")]
    ApiEnvelope { code: i64, message: String },

    #[error("HTTP transport error: {0}")]
    Http(String),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command execution error: {command}, stderr: {stderr}")]
    CommandExecution { command: String, stderr: String },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("TOML edit error: {0}")]
    TomlEdit(#[from] toml_edit::TomlError),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl FreshenError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a command execution error
    pub fn command_exec(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::CommandExecution {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// Create a version fetch error
    pub fn fetch(source_desc: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::VersionFetch {
            source_desc: source_desc.into(),
            reason: reason.into(),
        }
    }

    /// Create a storage error for the named area
    pub fn storage(area: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Storage {
            area: area.into(),
            reason: reason.into(),
        }
    }

    /// Check if error is retryable on the next poll
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::VersionFetch { .. }
                | Self::VersionManifestInvalid(_)
                | Self::Http(_)
                | Self::ApiStatus { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::PlaceholderMissing { .. } => Some(
                "Add <!-- VERSION_INJECT_START --> and <!-- VERSION_INJECT_END --> to the page shell",
            ),
            Self::ShellGlobalsMissing { .. } => Some("Run: freshen publish"),
            Self::ConfigKeyUnknown(_) => Some("Run: freshen config show"),
            Self::Unauthorized => Some("Sign in again to refresh the auth token"),
            _ => None,
        }
    }
}
