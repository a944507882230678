//! Credentials for the external services the pipeline talks to.
//!
//! Every value is optional at construction: [`Credentials::from_env`] never
//! fails, and a missing value only becomes an error when a collaborator
//! actually needs it. Tests build the struct directly and never touch the
//! process environment.

use std::env;

use crate::error::{Result, UploadError};

/// Environment variable holding the S3 access key.
pub const S3_KEY_ENV: &str = "ATOM_RELEASES_S3_KEY";
/// Environment variable holding the S3 secret key.
pub const S3_SECRET_ENV: &str = "ATOM_RELEASES_S3_SECRET";
/// Environment variable holding the S3 bucket name.
pub const S3_BUCKET_ENV: &str = "ATOM_RELEASES_S3_BUCKET";
/// Environment variable holding the S3 region (optional).
pub const S3_REGION_ENV: &str = "ATOM_RELEASES_S3_REGION";
/// Environment variable holding the packagecloud API key.
pub const PACKAGE_CLOUD_API_KEY_ENV: &str = "PACKAGE_CLOUD_API_KEY";
/// Environment variable holding the GitHub API token.
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Region used when [`S3_REGION_ENV`] is not set.
pub const DEFAULT_S3_REGION: &str = "us-east-1";

/// Credentials gathered from the environment at the process boundary.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    /// S3 access key
    pub s3_key: Option<String>,
    /// S3 secret key
    pub s3_secret: Option<String>,
    /// S3 bucket receiving the release assets
    pub s3_bucket: Option<String>,
    /// S3 region override
    pub s3_region: Option<String>,
    /// packagecloud API key
    pub package_cloud_api_key: Option<String>,
    /// GitHub API token
    pub github_token: Option<String>,
}

/// S3 connection settings with every required value present.
#[derive(Debug, Clone)]
pub struct S3Credentials {
    /// Access key
    pub access_key: String,
    /// Secret key
    pub secret_key: String,
    /// Bucket name
    pub bucket: String,
    /// Region
    pub region: String,
}

impl Credentials {
    /// Read all credential variables from the environment.
    ///
    /// Empty values are treated as unset, matching how CI systems surface
    /// undefined secrets.
    pub fn from_env() -> Self {
        Credentials {
            s3_key: non_empty_var(S3_KEY_ENV),
            s3_secret: non_empty_var(S3_SECRET_ENV),
            s3_bucket: non_empty_var(S3_BUCKET_ENV),
            s3_region: non_empty_var(S3_REGION_ENV),
            package_cloud_api_key: non_empty_var(PACKAGE_CLOUD_API_KEY_ENV),
            github_token: non_empty_var(GITHUB_TOKEN_ENV),
        }
    }

    /// Resolve the full S3 credential set, naming the first missing variable.
    pub fn s3(&self) -> Result<S3Credentials> {
        Ok(S3Credentials {
            access_key: require(&self.s3_key, S3_KEY_ENV)?,
            secret_key: require(&self.s3_secret, S3_SECRET_ENV)?,
            bucket: require(&self.s3_bucket, S3_BUCKET_ENV)?,
            region: self
                .s3_region
                .clone()
                .unwrap_or_else(|| DEFAULT_S3_REGION.to_string()),
        })
    }

    /// packagecloud API key, required for Linux package uploads.
    pub fn package_cloud_key(&self) -> Result<&str> {
        self.package_cloud_api_key
            .as_deref()
            .ok_or(UploadError::MissingCredential {
                name: PACKAGE_CLOUD_API_KEY_ENV,
            })
    }

    /// GitHub token, if one was provided.
    ///
    /// Read-only API calls work anonymously (at a lower rate limit), so this
    /// stays optional; publishing requires it and errors when absent.
    pub fn github_token(&self) -> Option<&str> {
        self.github_token.as_deref()
    }

    /// GitHub token, required for publishing.
    pub fn require_github_token(&self) -> Result<&str> {
        self.github_token
            .as_deref()
            .ok_or(UploadError::MissingCredential {
                name: GITHUB_TOKEN_ENV,
            })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

fn require(value: &Option<String>, name: &'static str) -> Result<String> {
    value
        .clone()
        .ok_or(UploadError::MissingCredential { name })
}
