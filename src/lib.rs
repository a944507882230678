//! # Atom Artifact Uploader
//!
//! Release upload automation for the editor's CI pipeline.
//!
//! This crate takes the artifacts a build produced and pushes them out:
//! every asset to the releases S3 bucket, Linux packages to packagecloud
//! when a repository is named, and a GitHub release with generated notes
//! when one is requested.
//!
//! ## Features
//!
//! - **Zero-flag operation**: version, channel, and paths resolve from the
//!   repository's `package.json`; flags only override
//! - **Channel-aware publishing**: nightly builds go public in the nightly
//!   repository, everything else becomes a draft for a human to publish
//! - **Idempotent re-runs**: existing releases are reused, published ones
//!   skipped, and already uploaded assets are not sent again
//! - **Credential isolation**: secrets come from the environment and are
//!   only required by the stage that uses them
//!
//! ## Usage
//!
//! ```bash
//! atom_artifact_uploader                                  # S3 upload only
//! atom_artifact_uploader --create-github-release          # plus GitHub release
//! atom_artifact_uploader --linux-repo-name atom/atom      # plus packagecloud
//! atom_artifact_uploader --assets-path /tmp/out --s3-path releases/v1.60.0/
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Core modules
pub mod cli;
pub mod config;
pub mod credentials;
pub mod discovery;
pub mod error;
pub mod github;
pub mod packagecloud;
pub mod storage;
pub mod uploader;

// Re-export main types for public API
pub use cli::Args;
pub use config::{BuildConfig, Channel, UploadSettings};
pub use credentials::Credentials;
pub use error::{ConfigError, Result, UploadError};
pub use uploader::{PublishedRelease, ReleaseRequest, UploadJob, Uploader};
