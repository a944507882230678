//! Error types for release artifact upload operations.
//!
//! This module defines all error types with actionable error messages and recovery suggestions.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for upload operations
pub type Result<T> = std::result::Result<T, UploadError>;

/// Main error type for all upload operations
#[derive(Error, Debug)]
pub enum UploadError {
    /// No release assets matched the discovery patterns
    #[error("No assets found under specified path: {path}")]
    NoAssets {
        /// Assets path that was searched
        path: PathBuf,
    },

    /// Build configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// A required credential was not present in the environment
    #[error("Missing credential: set the {name} environment variable")]
    MissingCredential {
        /// Environment variable that must be set
        name: &'static str,
    },

    /// S3 transfer errors
    #[error("S3 upload failed for '{key}': {reason}")]
    Storage {
        /// Object key that failed
        key: String,
        /// Reason for the error
        reason: String,
    },

    /// packagecloud API errors
    #[error("packagecloud upload failed for '{file}': {reason}")]
    PackageRepo {
        /// Package file name
        file: String,
        /// Reason for the error
        reason: String,
    },

    /// GitHub operation errors
    #[error("GitHub error: {0}")]
    GitHub(String),

    /// An asset on disk could not be used
    #[error("Unusable asset {path}: {reason}")]
    Asset {
        /// Path to the asset
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Build configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No package.json above the starting directory
    #[error("Could not find package.json above {path}. Please run from within the application repository.")]
    RootNotFound {
        /// Directory the search started from
        path: PathBuf,
    },

    /// package.json has no version field
    #[error("package.json at {path} has no version field")]
    MissingVersion {
        /// Path to the package.json that was read
        path: PathBuf,
    },

    /// Version string did not parse as semver
    #[error("Invalid version '{version}': {source}")]
    InvalidVersion {
        /// Version string
        version: String,
        /// Parsing error
        #[source]
        source: semver::Error,
    },
}

impl UploadError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            UploadError::NoAssets { path } => vec![
                format!("Verify the build produced artifacts under {}", path.display()),
                "Pass --assets-path if the artifacts live somewhere else".to_string(),
            ],
            UploadError::Config(ConfigError::RootNotFound { .. }) => vec![
                "Run from inside the application repository".to_string(),
                "The repository root is located by the nearest package.json".to_string(),
            ],
            UploadError::MissingCredential { name } => vec![
                format!("Export {} in the CI environment", name),
                "Credential values are read from the environment, never from flags".to_string(),
            ],
            UploadError::GitHub(_) => vec![
                "Check that GITHUB_TOKEN has repo scope for the release repository".to_string(),
                "Verify the tag is not owned by a release you cannot modify".to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn no_assets_message_names_the_path() {
        let err = UploadError::NoAssets {
            path: Path::new("/tmp/out").to_path_buf(),
        };
        assert_eq!(
            err.to_string(),
            "No assets found under specified path: /tmp/out"
        );
    }

    #[test]
    fn missing_credential_names_the_variable() {
        let err = UploadError::MissingCredential {
            name: "GITHUB_TOKEN",
        };
        assert!(err.to_string().contains("GITHUB_TOKEN"));
        assert!(!err.recovery_suggestions().is_empty());
    }
}
