//! GitHub release publishing.
//!
//! Publishing is idempotent across CI re-runs: an existing release for the
//! tag is reused (fields patched onto it) rather than duplicated, an already
//! published release is skipped when the request allows it, and assets whose
//! names are already attached are not uploaded again.

use std::collections::HashSet;

use bytes::Bytes;
use url::Url;

use super::{API_BASE, Release, ReleaseAsset, api_client, check_response, find_release_by_tag};
use crate::credentials::Credentials;
use crate::error::{Result, UploadError};
use crate::storage::content_type_for;
use crate::uploader::{PublishedRelease, ReleasePublisher, ReleaseRequest};

/// Release publisher backed by the GitHub API.
#[derive(Debug, Default)]
pub struct GitHubReleasePublisher;

impl GitHubReleasePublisher {
    /// Create a new publisher.
    pub fn new() -> Self {
        Self
    }
}

/// What to do about a tag, given what already exists for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PublishPlan {
    /// No release for the tag: create one
    Create,
    /// A release exists and the request allows reusing it
    Reuse,
    /// A published release exists and the request says to leave it alone
    Skip,
    /// A release exists but the request allows neither reuse nor skip
    Conflict,
}

/// Pure decision over the existing release state.
///
/// `existing_is_draft` is `None` when no release exists for the tag.
/// Skipping only applies to published releases; drafts are always fair game
/// for reuse.
fn plan_publish(
    existing_is_draft: Option<bool>,
    reuse_release: bool,
    skip_if_published: bool,
) -> PublishPlan {
    match existing_is_draft {
        None => PublishPlan::Create,
        Some(false) if skip_if_published => PublishPlan::Skip,
        Some(_) if reuse_release => PublishPlan::Reuse,
        Some(_) => PublishPlan::Conflict,
    }
}

impl ReleasePublisher for GitHubReleasePublisher {
    async fn publish(
        &self,
        credentials: &Credentials,
        request: &ReleaseRequest,
    ) -> Result<PublishedRelease> {
        let token = credentials.require_github_token()?;
        let client = api_client(Some(token))?;

        let existing =
            find_release_by_tag(&client, &request.owner, &request.repo, &request.tag).await?;
        let plan = plan_publish(
            existing.as_ref().map(|release| release.draft),
            request.reuse_release,
            request.skip_if_published,
        );

        let release = match (plan, existing) {
            (PublishPlan::Skip, Some(existing)) => {
                log::info!(
                    "Release {} is already published; leaving it untouched",
                    request.tag
                );
                return Ok(PublishedRelease {
                    id: existing.id,
                    html_url: existing.html_url,
                    skipped: true,
                });
            }
            (PublishPlan::Reuse, Some(existing)) => {
                log::info!("Reusing existing release {} (id {})", request.tag, existing.id);
                update_release(&client, request, existing.id).await?
            }
            (PublishPlan::Create, _) => create_release(&client, request).await?,
            (PublishPlan::Conflict, _) => {
                return Err(UploadError::GitHub(format!(
                    "a release for tag {} already exists and the request allows neither reuse nor skip",
                    request.tag
                )));
            }
            (PublishPlan::Skip | PublishPlan::Reuse, None) => {
                return Err(UploadError::GitHub(
                    "release disappeared between lookup and publish".to_string(),
                ));
            }
        };

        upload_missing_assets(&client, &release, request).await?;

        Ok(PublishedRelease {
            id: release.id,
            html_url: release.html_url,
            skipped: false,
        })
    }
}

fn release_payload(request: &ReleaseRequest) -> serde_json::Value {
    serde_json::json!({
        "tag_name": request.tag,
        "name": request.name,
        "body": request.body,
        "draft": request.draft,
        "prerelease": request.prerelease,
    })
}

async fn create_release(client: &reqwest::Client, request: &ReleaseRequest) -> Result<Release> {
    let url = format!(
        "{API_BASE}/repos/{}/{}/releases",
        request.owner, request.repo
    );
    log::debug!("POST {url}");
    let response = client.post(&url).json(&release_payload(request)).send().await?;
    let response = check_response("create release", response).await?;
    Ok(response.json().await?)
}

async fn update_release(
    client: &reqwest::Client,
    request: &ReleaseRequest,
    release_id: u64,
) -> Result<Release> {
    let url = format!(
        "{API_BASE}/repos/{}/{}/releases/{release_id}",
        request.owner, request.repo
    );
    log::debug!("PATCH {url}");
    let response = client
        .patch(&url)
        .json(&release_payload(request))
        .send()
        .await?;
    let response = check_response("update release", response).await?;
    Ok(response.json().await?)
}

/// Attach every request asset not already present on the release.
async fn upload_missing_assets(
    client: &reqwest::Client,
    release: &Release,
    request: &ReleaseRequest,
) -> Result<()> {
    let existing: HashSet<&str> = release
        .assets
        .iter()
        .map(|asset| asset.name.as_str())
        .collect();

    for path in &request.assets {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| UploadError::Asset {
                path: path.clone(),
                reason: "file name is not valid UTF-8".to_string(),
            })?;

        if existing.contains(file_name) {
            log::info!("Skipping {file_name} (already uploaded)");
            continue;
        }

        let content = tokio::fs::read(path).await?;
        let url = asset_upload_url(&release.upload_url, file_name)?;
        log::debug!("POST {url}");
        let response = client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, content_type_for(path))
            .body(Bytes::from(content))
            .send()
            .await?;
        let response = check_response("upload release asset", response).await?;
        let asset: ReleaseAsset = response.json().await?;
        log::info!("Uploaded {} ({} bytes)", asset.name, asset.size);
    }
    Ok(())
}

/// Expand a release's `upload_url` hypermedia template for one asset name.
///
/// The template ends in `{?name,label}`; everything from the brace on is
/// dropped and the name is added as a proper query parameter.
fn asset_upload_url(template: &str, file_name: &str) -> Result<Url> {
    let base = template.split('{').next().unwrap_or(template);
    let mut url = Url::parse(base).map_err(|err| {
        UploadError::GitHub(format!("invalid upload URL '{template}': {err}"))
    })?;
    url.query_pairs_mut().append_pair("name", file_name);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_release_is_created() {
        assert_eq!(plan_publish(None, true, true), PublishPlan::Create);
        assert_eq!(plan_publish(None, false, false), PublishPlan::Create);
    }

    #[test]
    fn published_release_is_skipped_when_allowed() {
        assert_eq!(plan_publish(Some(false), true, true), PublishPlan::Skip);
        assert_eq!(plan_publish(Some(false), false, true), PublishPlan::Skip);
    }

    #[test]
    fn existing_release_is_reused_when_allowed() {
        // Drafts are reusable regardless of the skip flag.
        assert_eq!(plan_publish(Some(true), true, true), PublishPlan::Reuse);
        assert_eq!(plan_publish(Some(true), true, false), PublishPlan::Reuse);
        // A published release is only reused when skipping was not requested.
        assert_eq!(plan_publish(Some(false), true, false), PublishPlan::Reuse);
    }

    #[test]
    fn conflicting_requests_are_rejected() {
        assert_eq!(plan_publish(Some(true), false, false), PublishPlan::Conflict);
        assert_eq!(plan_publish(Some(true), false, true), PublishPlan::Conflict);
        assert_eq!(plan_publish(Some(false), false, false), PublishPlan::Conflict);
    }

    #[test]
    fn upload_url_template_is_expanded() {
        let url = asset_upload_url(
            "https://uploads.github.com/repos/atom/atom/releases/42/assets{?name,label}",
            "AtomSetup.exe",
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://uploads.github.com/repos/atom/atom/releases/42/assets?name=AtomSetup.exe"
        );
    }

    #[test]
    fn upload_url_without_template_still_works() {
        let url = asset_upload_url(
            "https://uploads.github.com/repos/atom/atom/releases/42/assets",
            "atom-amd64.deb",
        )
        .unwrap();
        assert!(url.as_str().ends_with("assets?name=atom-amd64.deb"));
    }

    #[test]
    fn release_payload_carries_all_flags() {
        let request = ReleaseRequest {
            owner: "atom".to_string(),
            repo: "atom-nightly-releases".to_string(),
            tag: "v1.62.0-nightly10".to_string(),
            name: "1.62.0-nightly10".to_string(),
            body: "notes".to_string(),
            draft: false,
            prerelease: true,
            reuse_release: true,
            skip_if_published: true,
            assets: Vec::new(),
        };
        let payload = release_payload(&request);
        assert_eq!(payload["tag_name"], "v1.62.0-nightly10");
        assert_eq!(payload["name"], "1.62.0-nightly10");
        assert_eq!(payload["draft"], false);
        assert_eq!(payload["prerelease"], true);
    }
}
