//! Release notes retrieval and generation.
//!
//! Two generation strategies exist because the channels are curated
//! differently: versioned releases (stable/beta) carry human-edited notes,
//! so an existing draft body is reused verbatim and generation only kicks in
//! as a fallback; nightly bodies are always machine-written from the source
//! repository's recent commit history.

use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use super::{
    API_BASE, RELEASE_OWNER, RELEASE_REPO, api_client, check_response, find_release_by_tag,
    list_releases, release_repo_for,
};
use crate::config::Channel;
use crate::credentials::Credentials;
use crate::error::Result;
use crate::uploader::ReleaseNotesProvider;

/// Commit bullets are capped so a long-lived branch cannot produce a
/// megabyte release body.
const MAX_NOTE_COMMITS: usize = 50;

/// Release notes provider backed by the GitHub API.
#[derive(Debug, Default)]
pub struct GitHubReleaseNotes;

impl GitHubReleaseNotes {
    /// Create a new provider.
    pub fn new() -> Self {
        Self
    }
}

impl ReleaseNotesProvider for GitHubReleaseNotes {
    /// Fetch the notes of the release currently tagged `v<version>`, if any.
    ///
    /// The channel decides which repository to look in. Drafts are visible
    /// only when a token is present; an anonymous client simply finds
    /// nothing, which downstream treats as "no prior notes".
    async fn fetch(&self, credentials: &Credentials, version: &str) -> Result<Option<String>> {
        let client = api_client(credentials.github_token())?;
        let (owner, repo) = release_repo_for(Channel::of(version));
        let release = find_release_by_tag(&client, owner, repo, &format!("v{version}")).await?;
        Ok(release
            .and_then(|release| release.body)
            .filter(|body| !body.trim().is_empty()))
    }

    async fn generate_for_version(
        &self,
        credentials: &Credentials,
        version: &str,
        prior_notes: Option<&str>,
    ) -> Result<String> {
        if let Some(prior) = prior_notes {
            if !prior.trim().is_empty() {
                log::info!("Reusing curated notes for v{version}");
                return Ok(prior.to_string());
            }
        }

        let client = api_client(credentials.github_token())?;
        let previous_tag = latest_published_tag(&client, RELEASE_OWNER, RELEASE_REPO).await?;
        let summaries = match &previous_tag {
            Some(tag) => {
                let branch = default_branch(&client, RELEASE_OWNER, RELEASE_REPO).await?;
                let messages =
                    compare_commit_messages(&client, RELEASE_OWNER, RELEASE_REPO, tag, &branch)
                        .await?;
                summarize_commits(&messages)
            }
            None => Vec::new(),
        };
        Ok(format_versioned_notes(
            version,
            previous_tag.as_deref(),
            &summaries,
        ))
    }

    /// Nightly bodies ignore prior notes: every nightly is rebuilt from the
    /// last 24 hours of source history.
    async fn generate_for_nightly(
        &self,
        credentials: &Credentials,
        version: &str,
        _prior_notes: Option<&str>,
    ) -> Result<String> {
        let client = api_client(credentials.github_token())?;
        let since = Utc::now() - chrono::Duration::hours(24);
        let messages =
            commit_messages_since(&client, RELEASE_OWNER, RELEASE_REPO, &since.to_rfc3339())
                .await?;
        let summaries = summarize_commits(&messages);
        Ok(format_nightly_notes(
            version,
            Utc::now().date_naive(),
            &summaries,
        ))
    }
}

#[derive(Debug, Deserialize)]
struct RepoInfo {
    default_branch: String,
}

#[derive(Debug, Deserialize)]
struct Comparison {
    #[serde(default)]
    commits: Vec<CommitItem>,
}

#[derive(Debug, Deserialize)]
struct CommitItem {
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    message: String,
}

/// Tag of the most recent non-draft release, releases listed newest first.
async fn latest_published_tag(
    client: &reqwest::Client,
    owner: &str,
    repo: &str,
) -> Result<Option<String>> {
    let releases = list_releases(client, owner, repo).await?;
    Ok(releases
        .into_iter()
        .find(|release| !release.draft)
        .map(|release| release.tag_name))
}

async fn default_branch(client: &reqwest::Client, owner: &str, repo: &str) -> Result<String> {
    let url = format!("{API_BASE}/repos/{owner}/{repo}");
    let response = client.get(&url).send().await?;
    let response = check_response("read repository", response).await?;
    let info: RepoInfo = response.json().await?;
    Ok(info.default_branch)
}

async fn compare_commit_messages(
    client: &reqwest::Client,
    owner: &str,
    repo: &str,
    base: &str,
    head: &str,
) -> Result<Vec<String>> {
    let url = format!("{API_BASE}/repos/{owner}/{repo}/compare/{base}...{head}");
    log::debug!("GET {url}");
    let response = client.get(&url).send().await?;
    let response = check_response("compare commits", response).await?;
    let comparison: Comparison = response.json().await?;
    Ok(comparison
        .commits
        .into_iter()
        .map(|item| item.commit.message)
        .collect())
}

async fn commit_messages_since(
    client: &reqwest::Client,
    owner: &str,
    repo: &str,
    since: &str,
) -> Result<Vec<String>> {
    let url = format!("{API_BASE}/repos/{owner}/{repo}/commits?since={since}&per_page=100");
    log::debug!("GET {url}");
    let response = client.get(&url).send().await?;
    let response = check_response("list commits", response).await?;
    let commits: Vec<CommitItem> = response.json().await?;
    Ok(commits.into_iter().map(|item| item.commit.message).collect())
}

/// First line of each commit message, capped at [`MAX_NOTE_COMMITS`].
///
/// The overflow count is taken after blank first lines are dropped, so it
/// only reports bullets that were actually cut.
fn summarize_commits(messages: &[String]) -> Vec<String> {
    let mut summaries: Vec<String> = messages
        .iter()
        .map(|message| message.lines().next().unwrap_or("").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();
    if summaries.len() > MAX_NOTE_COMMITS {
        let hidden = summaries.len() - MAX_NOTE_COMMITS;
        summaries.truncate(MAX_NOTE_COMMITS);
        summaries.push(format!("...and {hidden} more changes"));
    }
    summaries
}

fn format_versioned_notes(
    version: &str,
    previous_tag: Option<&str>,
    summaries: &[String],
) -> String {
    let mut notes = format!("## Notable changes in {version}\n");
    if summaries.is_empty() {
        notes.push_str("\nNo merged changes recorded since the previous release.\n");
    } else {
        notes.push('\n');
        for line in summaries {
            notes.push_str("* ");
            notes.push_str(line);
            notes.push('\n');
        }
    }
    if let Some(previous) = previous_tag {
        notes.push_str(&format!(
            "\n[Full change log](https://github.com/{RELEASE_OWNER}/{RELEASE_REPO}/compare/{previous}...v{version})\n"
        ));
    }
    notes
}

fn format_nightly_notes(version: &str, date: NaiveDate, summaries: &[String]) -> String {
    let mut notes = format!("### Nightly {version} ({date})\n\n");
    if summaries.is_empty() {
        notes.push_str("No source changes since the previous nightly build.\n");
    } else {
        notes.push_str("Changes landed in the last 24 hours:\n\n");
        for line in summaries {
            notes.push_str("* ");
            notes.push_str(line);
            notes.push('\n');
        }
    }
    notes
}
