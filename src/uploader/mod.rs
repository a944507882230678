//! Upload orchestration.
//!
//! [`Uploader`] drives the whole release upload as one sequential pipeline:
//! S3 first, then Linux packages when a packagecloud repo was named, then
//! the GitHub release work when it was requested. Every stage is awaited to
//! completion before the next starts and the first failure aborts the run.
//!
//! The four collaborators are trait seams so the sequence is testable with
//! in-process fakes; the real implementations live in [`crate::storage`],
//! [`crate::packagecloud`], and [`crate::github`].

// Consumers are generic and the pipeline stays on one task, so no Send
// bounds are needed on the returned futures.
#![allow(async_fn_in_trait)]

use std::path::PathBuf;

use crate::cli::OutputManager;
use crate::config::Channel;
use crate::credentials::Credentials;
use crate::error::Result;
use crate::github::release_repo_for;

/// File name the previous release's notes are preserved under, inside the
/// build output directory.
pub const OLD_NOTES_FILE_NAME: &str = "OLD_RELEASE_NOTES.md";

/// Uploads the complete asset list to object storage.
pub trait ArtifactStore {
    /// Upload every asset under the bucket path prefix.
    async fn upload(
        &self,
        credentials: &Credentials,
        bucket_path: &str,
        assets: &[PathBuf],
    ) -> Result<()>;
}

/// Publishes Linux packages from the asset list to a package repository.
pub trait PackageRepository {
    /// Upload the eligible packages among `assets` to `repo_name`.
    async fn upload_packages(
        &self,
        credentials: &Credentials,
        repo_name: &str,
        version: &str,
        assets: &[PathBuf],
    ) -> Result<()>;
}

/// Retrieves and generates release notes.
pub trait ReleaseNotesProvider {
    /// Notes of the release currently tagged `v<version>`, if one exists.
    async fn fetch(&self, credentials: &Credentials, version: &str) -> Result<Option<String>>;

    /// Notes for a stable/beta/dev release, with any prior notes as context.
    async fn generate_for_version(
        &self,
        credentials: &Credentials,
        version: &str,
        prior_notes: Option<&str>,
    ) -> Result<String>;

    /// Notes for a nightly release, with any prior notes as context.
    async fn generate_for_nightly(
        &self,
        credentials: &Credentials,
        version: &str,
        prior_notes: Option<&str>,
    ) -> Result<String>;
}

/// Creates or updates the GitHub release and attaches the assets.
pub trait ReleasePublisher {
    /// Publish per the request's reuse/skip semantics.
    async fn publish(
        &self,
        credentials: &Credentials,
        request: &ReleaseRequest,
    ) -> Result<PublishedRelease>;
}

/// Everything one upload run needs, resolved before any network call.
#[derive(Debug, Clone)]
pub struct UploadJob {
    /// Application version being released
    pub version: String,
    /// Release channel derived from the version
    pub channel: Channel,
    /// S3 key prefix the assets go under
    pub bucket_path: String,
    /// Discovered release assets, in upload order
    pub assets: Vec<PathBuf>,
    /// packagecloud repository for Linux packages, when requested
    pub linux_repo_name: Option<String>,
    /// Whether to create (or update) a GitHub release
    pub create_github_release: bool,
    /// Directory `OLD_RELEASE_NOTES.md` is written into
    pub notes_output_dir: PathBuf,
}

/// A fully assembled GitHub release request.
#[derive(Debug, Clone)]
pub struct ReleaseRequest {
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Tag name (`v<version>`)
    pub tag: String,
    /// Release title (the bare version)
    pub name: String,
    /// Release notes body
    pub body: String,
    /// Whether the release is created as a draft
    pub draft: bool,
    /// Whether the release is marked as a prerelease
    pub prerelease: bool,
    /// Reuse an existing release for the tag instead of failing
    pub reuse_release: bool,
    /// Leave an already published release untouched instead of failing
    pub skip_if_published: bool,
    /// Assets to attach to the release
    pub assets: Vec<PathBuf>,
}

/// Outcome of a publish call.
#[derive(Debug, Clone)]
pub struct PublishedRelease {
    /// Release id
    pub id: u64,
    /// Web URL of the release
    pub html_url: String,
    /// True when an already published release was left untouched
    pub skipped: bool,
}

/// The upload pipeline over its four collaborators.
pub struct Uploader<S, P, N, R> {
    storage: S,
    packages: P,
    notes: N,
    publisher: R,
}

impl<S, P, N, R> Uploader<S, P, N, R>
where
    S: ArtifactStore,
    P: PackageRepository,
    N: ReleaseNotesProvider,
    R: ReleasePublisher,
{
    /// Assemble the pipeline.
    pub fn new(storage: S, packages: P, notes: N, publisher: R) -> Self {
        Self {
            storage,
            packages,
            notes,
            publisher,
        }
    }

    /// Run the full upload sequence for one job.
    ///
    /// The job's asset list is already validated to be non-empty; this
    /// method performs no discovery of its own.
    pub async fn run(
        &self,
        credentials: &Credentials,
        job: &UploadJob,
        output: &OutputManager,
    ) -> Result<()> {
        // ===== PHASE 1: S3 UPLOAD =====
        output.println(&format!(
            "Uploading {} release assets for {} to S3 under '{}'",
            job.assets.len(),
            job.version,
            job.bucket_path
        ));
        self.storage
            .upload(credentials, &job.bucket_path, &job.assets)
            .await?;
        output.success(&format!("Uploaded {} assets to S3", job.assets.len()));

        // ===== PHASE 2: LINUX PACKAGES =====
        match &job.linux_repo_name {
            Some(repo_name) => {
                self.packages
                    .upload_packages(credentials, repo_name, &job.version, &job.assets)
                    .await?;
                output.success(&format!("Uploaded Linux packages to '{}'", repo_name));
            }
            None => output.info("Skipping upload of Linux packages"),
        }

        // ===== PHASE 3: GITHUB RELEASE =====
        if !job.create_github_release {
            output.info("Skipping GitHub release creation");
            return Ok(());
        }

        let old_notes = self.notes.fetch(credentials, &job.version).await?;
        if let Some(notes) = &old_notes {
            let path = job.notes_output_dir.join(OLD_NOTES_FILE_NAME);
            output.println(&format!(
                "Saving existing {} release notes to {}",
                job.version,
                path.display()
            ));
            tokio::fs::create_dir_all(&job.notes_output_dir).await?;
            tokio::fs::write(&path, notes).await?;
        }

        output.println(&format!(
            "\nGenerating new release notes for {}",
            job.version
        ));
        let body = if job.channel.is_nightly() {
            self.notes
                .generate_for_nightly(credentials, &job.version, old_notes.as_deref())
                .await?
        } else {
            self.notes
                .generate_for_version(credentials, &job.version, old_notes.as_deref())
                .await?
        };
        output.println(&format!("New release notes:\n\n{body}"));

        output.println(&format!("Creating GitHub release v{}", job.version));
        let request = release_request(job, body);
        let release = self.publisher.publish(credentials, &request).await?;
        if release.skipped {
            output.warn(&format!(
                "Release {} was already published: {}",
                request.tag, release.html_url
            ));
        } else {
            output.success(&format!(
                "Release published successfully: {}",
                release.html_url
            ));
        }
        Ok(())
    }
}

/// Assemble the publish request for a job.
///
/// Nightly releases go public immediately in the nightly repository; every
/// other channel gets a draft in the main repository for a human to publish.
/// Anything that is not stable is marked as a prerelease.
fn release_request(job: &UploadJob, body: String) -> ReleaseRequest {
    let (owner, repo) = release_repo_for(job.channel);
    ReleaseRequest {
        owner: owner.to_string(),
        repo: repo.to_string(),
        tag: format!("v{}", job.version),
        name: job.version.clone(),
        body,
        draft: !job.channel.is_nightly(),
        prerelease: !job.channel.is_stable(),
        reuse_release: true,
        skip_if_published: true,
        assets: job.assets.clone(),
    }
}
