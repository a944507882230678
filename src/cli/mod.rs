//! Command line interface for the artifact uploader.
//!
//! This module wires the resolved configuration, the discovered assets, and
//! the real collaborator implementations into one [`Uploader`] run, with
//! proper argument parsing and user feedback.

mod args;
mod output;

pub use args::Args;
pub use output::OutputManager;

use std::env;

use crate::config::{self, BuildConfig, UploadSettings};
use crate::credentials::Credentials;
use crate::discovery;
use crate::error::Result;
use crate::github::{GitHubReleaseNotes, GitHubReleasePublisher};
use crate::packagecloud::PackageCloudClient;
use crate::storage::S3ArtifactStore;
use crate::uploader::{UploadJob, Uploader};

/// Main CLI entry point. Returns the process exit code.
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    execute(args).await
}

/// Execute one upload run for already parsed arguments.
pub async fn execute(args: Args) -> Result<i32> {
    let output = OutputManager::new();
    if let Err(reason) = args.validate() {
        output.error(&reason);
        return Ok(1);
    }

    // The only two environment reads outside the credentials struct: the
    // version override and the working directory the root walk starts from.
    let version_override = env::var(config::VERSION_OVERRIDE_ENV).ok();
    let start_dir = env::current_dir()?;
    let build = BuildConfig::resolve(&start_dir, version_override)?;
    log::debug!(
        "Resolved version {} ({} channel) at {}",
        build.app_version,
        build.channel,
        build.repository_root.display()
    );

    let settings = UploadSettings::resolve(
        &build,
        args.assets_path,
        args.s3_path,
        args.create_github_release,
        args.linux_repo_name,
    );

    let assets = discovery::discover_assets(&settings.assets_path)?;
    let job = UploadJob {
        version: build.app_version,
        channel: build.channel,
        bucket_path: settings.bucket_path,
        assets,
        linux_repo_name: settings.linux_repo_name,
        create_github_release: settings.create_github_release,
        notes_output_dir: build.build_output_path,
    };

    let credentials = Credentials::from_env();
    let uploader = Uploader::new(
        S3ArtifactStore::new(),
        PackageCloudClient::new(),
        GitHubReleaseNotes::new(),
        GitHubReleasePublisher::new(),
    );
    uploader.run(&credentials, &job, &output).await?;
    Ok(0)
}
