//! S3-backed artifact store.
//!
//! Builds a client from the explicit credential set (no provider chain, no
//! profile files: CI injects everything through the environment) and puts
//! one object per asset under the bucket path. Objects are publicly readable
//! because the bucket serves the release download site.

use std::path::{Path, PathBuf};

use aws_sdk_s3::Client;
use aws_sdk_s3::config::{BehaviorVersion, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;

use super::content_type_for;
use crate::credentials::{Credentials, S3Credentials};
use crate::error::{Result, UploadError};
use crate::uploader::ArtifactStore;

/// Provider name shown in SDK diagnostics.
const CREDENTIALS_PROVIDER_NAME: &str = "atom-release-environment";

/// Artifact store backed by an S3 bucket.
#[derive(Debug, Default)]
pub struct S3ArtifactStore;

impl S3ArtifactStore {
    /// Create a new store.
    pub fn new() -> Self {
        Self
    }
}

impl ArtifactStore for S3ArtifactStore {
    async fn upload(
        &self,
        credentials: &Credentials,
        bucket_path: &str,
        assets: &[PathBuf],
    ) -> Result<()> {
        let s3 = credentials.s3()?;
        let client = build_client(&s3);
        for asset in assets {
            upload_one(&client, &s3, bucket_path, asset).await?;
        }
        Ok(())
    }
}

fn build_client(s3: &S3Credentials) -> Client {
    let provider = aws_sdk_s3::config::Credentials::new(
        s3.access_key.clone(),
        s3.secret_key.clone(),
        None,
        None,
        CREDENTIALS_PROVIDER_NAME,
    );
    let config = aws_sdk_s3::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new(s3.region.clone()))
        .credentials_provider(provider)
        .build();
    Client::from_conf(config)
}

/// Object key for an asset. The bucket path is a verbatim prefix, exactly as
/// resolved from `--s3-path` or the `releases/v<version>/` default.
fn object_key(bucket_path: &str, file_name: &str) -> String {
    format!("{bucket_path}{file_name}")
}

async fn upload_one(
    client: &Client,
    s3: &S3Credentials,
    bucket_path: &str,
    asset: &Path,
) -> Result<()> {
    let file_name = asset
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| UploadError::Asset {
            path: asset.to_path_buf(),
            reason: "file name is not valid UTF-8".to_string(),
        })?;
    let key = object_key(bucket_path, file_name);
    log::info!("Uploading {} to s3://{}/{}", asset.display(), s3.bucket, key);

    let body = ByteStream::from_path(asset)
        .await
        .map_err(|err| UploadError::Asset {
            path: asset.to_path_buf(),
            reason: err.to_string(),
        })?;

    client
        .put_object()
        .bucket(s3.bucket.as_str())
        .key(key.as_str())
        .acl(ObjectCannedAcl::PublicRead)
        .content_type(content_type_for(asset))
        .body(body)
        .send()
        .await
        .map_err(|err| UploadError::Storage {
            key,
            reason: format!("{}", DisplayErrorContext(&err)),
        })?;
    Ok(())
}
