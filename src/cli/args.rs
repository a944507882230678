//! Command line argument parsing and validation.
//!
//! This module provides minimal CLI argument parsing. Everything not given
//! here is resolved from the shared build configuration: the tool is designed
//! to "just work" from a CI job with no flags at all.

use std::path::PathBuf;

use clap::Parser;

/// Uploads release assets for the current build
#[derive(Parser, Debug)]
#[command(
    name = "atom_artifact_uploader",
    version,
    about = "Uploads release assets to S3, packagecloud, and GitHub releases",
    long_about = "Uploads the current build's release assets to S3, optionally publishes
Linux packages to a packagecloud repository, and optionally creates a
GitHub release with generated release notes.

Credentials are read from the environment, never from flags:
ATOM_RELEASES_S3_KEY / ATOM_RELEASES_S3_SECRET / ATOM_RELEASES_S3_BUCKET,
PACKAGE_CLOUD_API_KEY, and GITHUB_TOKEN."
)]
pub struct Args {
    /// Path to the folder where all release assets are stored
    #[arg(long, value_name = "PATH")]
    pub assets_path: Option<PathBuf>,

    /// Indicates the S3 path in which the assets should be uploaded
    #[arg(long, value_name = "PREFIX")]
    pub s3_path: Option<String>,

    /// Creates a GitHub release for this build, draft if release branch, public if Nightly
    #[arg(long)]
    pub create_github_release: bool,

    /// Repository name (user/repo) in which to upload Linux packages
    #[arg(long, value_name = "REPO")]
    pub linux_repo_name: Option<String>,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if matches!(self.s3_path.as_deref(), Some("")) {
            return Err("--s3-path must not be empty".to_string());
        }
        if matches!(self.linux_repo_name.as_deref(), Some("")) {
            return Err("--linux-repo-name must not be empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_flags_are_required() {
        let args = Args::try_parse_from(["atom_artifact_uploader"]).unwrap();
        assert!(args.assets_path.is_none());
        assert!(args.s3_path.is_none());
        assert!(!args.create_github_release);
        assert!(args.linux_repo_name.is_none());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn all_flags_parse() {
        let args = Args::try_parse_from([
            "atom_artifact_uploader",
            "--assets-path",
            "/tmp/out",
            "--s3-path",
            "releases/v1.2.3/",
            "--create-github-release",
            "--linux-repo-name",
            "atom/atom",
        ])
        .unwrap();
        assert_eq!(args.assets_path.as_deref(), Some(std::path::Path::new("/tmp/out")));
        assert_eq!(args.s3_path.as_deref(), Some("releases/v1.2.3/"));
        assert!(args.create_github_release);
        assert_eq!(args.linux_repo_name.as_deref(), Some("atom/atom"));
        assert!(args.validate().is_ok());
    }

    #[test]
    fn empty_values_are_rejected() {
        let args =
            Args::try_parse_from(["atom_artifact_uploader", "--linux-repo-name", ""]).unwrap();
        assert!(args.validate().is_err());

        let args = Args::try_parse_from(["atom_artifact_uploader", "--s3-path", ""]).unwrap();
        assert!(args.validate().is_err());
    }
}
