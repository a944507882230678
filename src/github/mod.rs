//! GitHub REST API integration for release operations.
//!
//! A thin client over the v3 REST API: release listing and lookup live here,
//! release notes and publishing build on top in their own modules. All calls
//! go through one [`reqwest::Client`] configured with the tool's user agent
//! and, when available, a bearer token (drafts are only visible with auth).

mod publisher;
mod release_notes;

pub use publisher::GitHubReleasePublisher;
pub use release_notes::GitHubReleaseNotes;

use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::Deserialize;

use crate::config::Channel;
use crate::error::{Result, UploadError};

/// Base URL for the GitHub REST API.
pub(crate) const API_BASE: &str = "https://api.github.com";

/// Repository owner for all release repositories.
pub const RELEASE_OWNER: &str = "atom";
/// Repository owning stable, beta, and dev releases.
pub const RELEASE_REPO: &str = "atom";
/// Nightly builds are published to a dedicated repository so the main
/// release feed stays curated.
pub const NIGHTLY_RELEASE_REPO: &str = "atom-nightly-releases";

/// The `(owner, repo)` pair owning releases for a channel.
pub fn release_repo_for(channel: Channel) -> (&'static str, &'static str) {
    if channel.is_nightly() {
        (RELEASE_OWNER, NIGHTLY_RELEASE_REPO)
    } else {
        (RELEASE_OWNER, RELEASE_REPO)
    }
}

/// A GitHub release, reduced to the fields this tool reads.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Release {
    pub id: u64,
    pub tag_name: String,
    pub draft: bool,
    pub html_url: String,
    pub upload_url: String,
    pub body: Option<String>,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// An asset attached to a release.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ReleaseAsset {
    pub name: String,
    pub size: u64,
}

/// Build the shared API client.
///
/// The token header is marked sensitive so it never shows up in debug logs.
pub(crate) fn api_client(token: Option<&str>) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("application/vnd.github+json"),
    );
    if let Some(token) = token {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
            UploadError::GitHub("GITHUB_TOKEN contains invalid characters".to_string())
        })?;
        value.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, value);
    }

    // No overall request timeout: release assets can be hundreds of
    // megabytes. Connect timeout still bounds unreachable hosts.
    reqwest::Client::builder()
        .user_agent(concat!("atom-artifact-uploader/", env!("CARGO_PKG_VERSION")))
        .default_headers(headers)
        .connect_timeout(Duration::from_secs(30))
        .build()
        .map_err(UploadError::from)
}

/// Turn a non-success response into a [`UploadError::GitHub`] carrying the
/// API's own message, truncated to keep logs readable.
pub(crate) async fn check_response(
    context: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = truncate_body(response.text().await.unwrap_or_default());
    Err(UploadError::GitHub(format!(
        "{context}: HTTP {status}: {body}"
    )))
}

/// Cap an API error body for the failure message. The cut backs up to a
/// char boundary so a multi-byte response cannot split mid-character.
fn truncate_body(mut body: String) -> String {
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

/// List the most recent releases of a repository, drafts included when the
/// client is authenticated.
pub(crate) async fn list_releases(
    client: &reqwest::Client,
    owner: &str,
    repo: &str,
) -> Result<Vec<Release>> {
    let url = format!("{API_BASE}/repos/{owner}/{repo}/releases?per_page=100");
    log::debug!("GET {url}");
    let response = client.get(&url).send().await?;
    let response = check_response("list releases", response).await?;
    Ok(response.json().await?)
}

/// Find a release by its tag name.
///
/// Uses the listing rather than the by-tag endpoint: the latter only sees
/// published releases, and this tool routinely works with drafts.
pub(crate) async fn find_release_by_tag(
    client: &reqwest::Client,
    owner: &str,
    repo: &str,
    tag: &str,
) -> Result<Option<Release>> {
    let releases = list_releases(client, owner, repo).await?;
    Ok(releases.into_iter().find(|release| release.tag_name == tag))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nightly_releases_live_in_their_own_repository() {
        assert_eq!(
            release_repo_for(Channel::Nightly),
            ("atom", "atom-nightly-releases")
        );
        assert_eq!(release_repo_for(Channel::Stable), ("atom", "atom"));
        assert_eq!(release_repo_for(Channel::Beta), ("atom", "atom"));
        assert_eq!(release_repo_for(Channel::Dev), ("atom", "atom"));
    }

    #[test]
    fn release_model_parses_the_fields_we_read() {
        let raw = r#"{
            "id": 42,
            "tag_name": "v1.60.0",
            "draft": true,
            "html_url": "https://github.com/atom/atom/releases/tag/v1.60.0",
            "upload_url": "https://uploads.github.com/repos/atom/atom/releases/42/assets{?name,label}",
            "body": "notes",
            "assets": [{ "name": "atom-mac.zip", "size": 1024, "browser_download_url": "ignored" }]
        }"#;
        let release: Release = serde_json::from_str(raw).unwrap();
        assert_eq!(release.id, 42);
        assert!(release.draft);
        assert_eq!(release.assets.len(), 1);
        assert_eq!(release.assets[0].name, "atom-mac.zip");
    }

    #[test]
    fn error_body_cap_lands_on_char_boundaries() {
        let mut body = "a".repeat(299);
        body.push('é');
        body.push_str("Not Found");
        let capped = truncate_body(body);
        assert!(capped.ends_with("..."));
        assert!(!capped.contains('é'));
        assert_eq!(capped.len(), 299 + 3);

        let ascii = truncate_body("x".repeat(400));
        assert_eq!(ascii.len(), 303);
        assert_eq!(truncate_body("short".to_string()), "short");
    }

    #[test]
    fn release_model_tolerates_missing_optional_fields() {
        let raw = r#"{
            "id": 7,
            "tag_name": "v1.0.0",
            "draft": false,
            "html_url": "https://example.invalid",
            "upload_url": "https://example.invalid/assets{?name,label}",
            "body": null
        }"#;
        let release: Release = serde_json::from_str(raw).unwrap();
        assert!(release.body.is_none());
        assert!(release.assets.is_empty());
    }
}
