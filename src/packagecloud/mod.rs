//! Linux package publishing to packagecloud.
//!
//! Only `.deb` and `.rpm` assets are eligible. Packages go to the universal
//! distributions (`any/any` for deb, `rpm_any/rpm_any` for rpm) so one
//! upload serves every distro version; the numeric distribution ids are
//! resolved against the live distributions listing rather than hardcoded.
//! Re-runs are tolerated: packagecloud answers 422 for a file it already
//! has, which is logged and skipped.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use reqwest::multipart::{Form, Part};
use reqwest::{Body, StatusCode};
use serde::Deserialize;
use tokio_util::io::ReaderStream;

use crate::credentials::Credentials;
use crate::error::{Result, UploadError};
use crate::uploader::PackageRepository;

/// Base URL for the packagecloud API.
const PACKAGECLOUD_API_BASE: &str = "https://packagecloud.io/api/v1";

/// Universal distribution for .deb packages.
const DEB_TARGET: &str = "any/any";
/// Universal distribution for .rpm packages.
const RPM_TARGET: &str = "rpm_any/rpm_any";

/// Package repository backed by packagecloud.io.
#[derive(Debug, Default)]
pub struct PackageCloudClient;

impl PackageCloudClient {
    /// Create a new client.
    pub fn new() -> Self {
        Self
    }
}

impl PackageRepository for PackageCloudClient {
    async fn upload_packages(
        &self,
        credentials: &Credentials,
        repo_name: &str,
        version: &str,
        assets: &[PathBuf],
    ) -> Result<()> {
        let (debs, rpms) = partition_packages(assets);
        if debs.is_empty() && rpms.is_empty() {
            log::info!("No Linux packages among the release assets");
            return Ok(());
        }
        // The API key is only needed once there is something to upload.
        let api_key = credentials.package_cloud_key()?;
        validate_repo_name(repo_name)?;

        let client = http_client()?;
        let distributions = fetch_distributions(&client, api_key).await?;
        log::info!(
            "Uploading {} Linux package(s) for {} to packagecloud repo '{}'",
            debs.len() + rpms.len(),
            version,
            repo_name
        );

        for deb in &debs {
            let id = resolve_target(&distributions, "deb", DEB_TARGET, deb)?;
            upload_package(&client, api_key, repo_name, id, deb).await?;
        }
        for rpm in &rpms {
            let id = resolve_target(&distributions, "rpm", RPM_TARGET, rpm)?;
            upload_package(&client, api_key, repo_name, id, rpm).await?;
        }
        Ok(())
    }
}

/// The distributions listing, keyed by package type (`deb`, `rpm`, ...).
type DistributionIndex = HashMap<String, Vec<Distribution>>;

#[derive(Debug, Deserialize)]
struct Distribution {
    index_name: String,
    #[serde(default)]
    versions: Vec<DistroVersion>,
}

#[derive(Debug, Deserialize)]
struct DistroVersion {
    id: u64,
    index_name: String,
}

fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("atom-artifact-uploader/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(std::time::Duration::from_secs(30))
        .build()
        .map_err(UploadError::from)
}

/// Split the asset list into (.deb, .rpm) package paths.
fn partition_packages(assets: &[PathBuf]) -> (Vec<&Path>, Vec<&Path>) {
    let mut debs = Vec::new();
    let mut rpms = Vec::new();
    for asset in assets {
        match asset.extension().and_then(|ext| ext.to_str()) {
            Some("deb") => debs.push(asset.as_path()),
            Some("rpm") => rpms.push(asset.as_path()),
            _ => {}
        }
    }
    (debs, rpms)
}

/// The packagecloud repo name is `user/repo`; reject anything else before
/// it turns into a misleading 404 from the API.
fn validate_repo_name(repo_name: &str) -> Result<()> {
    match repo_name.split_once('/') {
        Some((user, repo)) if !user.is_empty() && !repo.is_empty() => Ok(()),
        _ => Err(UploadError::PackageRepo {
            file: repo_name.to_string(),
            reason: "repository name must be of the form 'user/repo'".to_string(),
        }),
    }
}

async fn fetch_distributions(
    client: &reqwest::Client,
    api_key: &str,
) -> Result<DistributionIndex> {
    let url = format!("{PACKAGECLOUD_API_BASE}/distributions.json");
    log::debug!("GET {url}");
    let response = client.get(&url).basic_auth(api_key, Some("")).send().await?;
    if !response.status().is_success() {
        return Err(UploadError::PackageRepo {
            file: "distributions.json".to_string(),
            reason: failure_reason(response).await,
        });
    }
    Ok(response.json().await?)
}

fn find_distro_version_id(
    index: &DistributionIndex,
    package_type: &str,
    target: &str,
) -> Option<u64> {
    let (distro_name, version_name) = target.split_once('/')?;
    index
        .get(package_type)?
        .iter()
        .filter(|distro| distro.index_name == distro_name)
        .flat_map(|distro| &distro.versions)
        .find(|version| version.index_name == version_name)
        .map(|version| version.id)
}

fn resolve_target(
    index: &DistributionIndex,
    package_type: &str,
    target: &str,
    path: &Path,
) -> Result<u64> {
    find_distro_version_id(index, package_type, target).ok_or_else(|| UploadError::PackageRepo {
        file: path.display().to_string(),
        reason: format!("packagecloud has no '{target}' distribution for {package_type} packages"),
    })
}

async fn upload_package(
    client: &reqwest::Client,
    api_key: &str,
    repo_name: &str,
    distro_version_id: u64,
    path: &Path,
) -> Result<()> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| UploadError::Asset {
            path: path.to_path_buf(),
            reason: "file name is not valid UTF-8".to_string(),
        })?;

    log::info!("Uploading {file_name} to packagecloud repo '{repo_name}'");
    let file = tokio::fs::File::open(path).await?;
    let part = Part::stream(Body::wrap_stream(ReaderStream::new(file)))
        .file_name(file_name.to_string())
        .mime_str("application/octet-stream")?;
    let form = Form::new()
        .text("package[distro_version_id]", distro_version_id.to_string())
        .part("package[package_file]", part);

    let url = format!("{PACKAGECLOUD_API_BASE}/repos/{repo_name}/packages.json");
    let response = client
        .post(&url)
        .basic_auth(api_key, Some(""))
        .multipart(form)
        .send()
        .await?;

    if response.status() == StatusCode::UNPROCESSABLE_ENTITY {
        let body = response.text().await.unwrap_or_default();
        if body.contains("has already been taken") {
            log::info!("{file_name} already exists in '{repo_name}', skipping");
            return Ok(());
        }
        return Err(UploadError::PackageRepo {
            file: file_name.to_string(),
            reason: format!("HTTP 422 Unprocessable Entity: {}", truncate(body)),
        });
    }
    if !response.status().is_success() {
        return Err(UploadError::PackageRepo {
            file: file_name.to_string(),
            reason: failure_reason(response).await,
        });
    }
    Ok(())
}

async fn failure_reason(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    format!("HTTP {status}: {}", truncate(body))
}

/// Cap an error body for the failure message. The cut backs up to a char
/// boundary so a multi-byte response cannot split mid-character.
fn truncate(mut body: String) -> String {
    if body.len() > 300 {
        let mut cut = 300;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push_str("...");
    }
    body
}
