//! Shared build configuration for the release pipeline.
//!
//! Resolution walks up from the starting directory to the application
//! repository root, reads the app version from `package.json` (unless an
//! override is supplied), and derives the release channel from the version's
//! prerelease component. The environment is only consulted at the CLI
//! boundary; everything here is pure given its inputs.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Environment variable that overrides the `package.json` version.
pub const VERSION_OVERRIDE_ENV: &str = "ATOM_RELEASE_VERSION";

/// Release channel, derived from the version's prerelease component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Versions without a recognized prerelease component
    Stable,
    /// `beta*` prerelease versions
    Beta,
    /// `nightly*` prerelease versions
    Nightly,
    /// `dev*` prerelease versions
    Dev,
}

impl Channel {
    /// Derive the channel from a parsed semver version.
    pub fn from_version(version: &semver::Version) -> Self {
        let pre = version.pre.as_str();
        if pre.starts_with("nightly") {
            Channel::Nightly
        } else if pre.starts_with("beta") {
            Channel::Beta
        } else if pre.starts_with("dev") {
            Channel::Dev
        } else {
            Channel::Stable
        }
    }

    /// Derive the channel from a raw version string.
    ///
    /// Unparseable versions fall back to stable; callers that care about
    /// validity parse the version before reaching this point.
    pub fn of(version: &str) -> Self {
        semver::Version::parse(version)
            .map(|v| Self::from_version(&v))
            .unwrap_or(Channel::Stable)
    }

    /// Channel name as used in bucket paths and log output.
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Stable => "stable",
            Channel::Beta => "beta",
            Channel::Nightly => "nightly",
            Channel::Dev => "dev",
        }
    }

    /// Whether this is the nightly channel.
    pub fn is_nightly(self) -> bool {
        self == Channel::Nightly
    }

    /// Whether this is the stable channel.
    pub fn is_stable(self) -> bool {
        self == Channel::Stable
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct PackageManifest {
    version: Option<String>,
}

/// Immutable build configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Repository root: the nearest ancestor directory containing `package.json`
    pub repository_root: PathBuf,
    /// Application version being released
    pub app_version: String,
    /// Release channel derived from the version
    pub channel: Channel,
    /// Directory the build writes artifacts and reports into
    pub build_output_path: PathBuf,
}

impl BuildConfig {
    /// Resolve the build configuration by walking up from `start_dir`.
    ///
    /// `version_override` wins over `package.json`; callers populate it from
    /// [`VERSION_OVERRIDE_ENV`] at the process boundary so this stays pure.
    pub fn resolve(start_dir: &Path, version_override: Option<String>) -> Result<Self> {
        let repository_root = find_repository_root(start_dir)?;
        let app_version = match version_override {
            Some(version) => version,
            None => read_package_version(&repository_root)?,
        };
        let parsed = semver::Version::parse(&app_version).map_err(|source| {
            ConfigError::InvalidVersion {
                version: app_version.clone(),
                source,
            }
        })?;
        let channel = Channel::from_version(&parsed);
        Ok(BuildConfig {
            build_output_path: repository_root.join("out"),
            repository_root,
            app_version,
            channel,
        })
    }
}

/// Resolved per-run settings: CLI overrides merged over configuration defaults.
#[derive(Debug, Clone)]
pub struct UploadSettings {
    /// Directory searched for release assets
    pub assets_path: PathBuf,
    /// S3 key prefix the assets are uploaded under
    pub bucket_path: String,
    /// Whether to create (or update) a GitHub release
    pub create_github_release: bool,
    /// packagecloud repository (`user/repo`) for Linux packages, when given
    pub linux_repo_name: Option<String>,
}

impl UploadSettings {
    /// Pure merge of CLI overrides over the build configuration.
    ///
    /// The assets path defaults to the build output directory and the bucket
    /// path to `releases/v<version>/`. Explicit values are used verbatim.
    pub fn resolve(
        config: &BuildConfig,
        assets_path: Option<PathBuf>,
        s3_path: Option<String>,
        create_github_release: bool,
        linux_repo_name: Option<String>,
    ) -> Self {
        UploadSettings {
            assets_path: assets_path.unwrap_or_else(|| config.build_output_path.clone()),
            bucket_path: s3_path.unwrap_or_else(|| format!("releases/v{}/", config.app_version)),
            create_github_release,
            linux_repo_name,
        }
    }
}

fn find_repository_root(start_dir: &Path) -> Result<PathBuf> {
    let start = start_dir.canonicalize()?;
    let mut dir = start.as_path();
    loop {
        if dir.join("package.json").is_file() {
            return Ok(dir.to_path_buf());
        }
        match dir.parent() {
            Some(parent) => dir = parent,
            None => {
                return Err(ConfigError::RootNotFound {
                    path: start.clone(),
                }
                .into());
            }
        }
    }
}

fn read_package_version(repository_root: &Path) -> Result<String> {
    let path = repository_root.join("package.json");
    let raw = fs::read_to_string(&path)?;
    let manifest: PackageManifest = serde_json::from_str(&raw)?;
    manifest
        .version
        .ok_or_else(|| ConfigError::MissingVersion { path }.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UploadError;
    use std::fs;

    fn version(s: &str) -> semver::Version {
        semver::Version::parse(s).unwrap()
    }

    #[test]
    fn channel_derivation_covers_all_suffixes() {
        assert_eq!(Channel::from_version(&version("1.60.0")), Channel::Stable);
        assert_eq!(Channel::from_version(&version("1.61.0-beta2")), Channel::Beta);
        assert_eq!(
            Channel::from_version(&version("1.62.0-nightly10")),
            Channel::Nightly
        );
        assert_eq!(Channel::from_version(&version("1.63.0-dev")), Channel::Dev);
        // Unrecognized prerelease components count as stable, matching the
        // channel naming the release branches use.
        assert_eq!(Channel::from_version(&version("1.0.0-rc1")), Channel::Stable);
    }

    #[test]
    fn channel_of_tolerates_bad_versions() {
        assert_eq!(Channel::of("2.0.0-nightly20260825"), Channel::Nightly);
        assert_eq!(Channel::of("not-a-version"), Channel::Stable);
    }

    #[test]
    fn resolve_reads_version_from_package_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{ "name": "app", "version": "1.62.0-nightly10" }"#,
        )
        .unwrap();

        let config = BuildConfig::resolve(dir.path(), None).unwrap();
        assert_eq!(config.app_version, "1.62.0-nightly10");
        assert_eq!(config.channel, Channel::Nightly);
        assert_eq!(config.build_output_path, config.repository_root.join("out"));
    }

    #[test]
    fn resolve_walks_up_to_the_repository_root() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{ "version": "1.2.3" }"#,
        )
        .unwrap();
        let nested = dir.path().join("script").join("vsts");
        fs::create_dir_all(&nested).unwrap();

        let config = BuildConfig::resolve(&nested, None).unwrap();
        assert_eq!(
            config.repository_root,
            dir.path().canonicalize().unwrap()
        );
        assert_eq!(config.channel, Channel::Stable);
    }

    #[test]
    fn resolve_prefers_the_version_override() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{ "version": "1.2.3" }"#,
        )
        .unwrap();

        let config =
            BuildConfig::resolve(dir.path(), Some("1.63.0-beta1".to_string())).unwrap();
        assert_eq!(config.app_version, "1.63.0-beta1");
        assert_eq!(config.channel, Channel::Beta);
    }

    #[test]
    fn resolve_rejects_invalid_versions() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{ "version": "one point two" }"#,
        )
        .unwrap();

        let err = BuildConfig::resolve(dir.path(), None).unwrap_err();
        assert!(matches!(
            err,
            UploadError::Config(ConfigError::InvalidVersion { .. })
        ));
    }

    #[test]
    fn resolve_requires_a_version_field() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("package.json"), r#"{ "name": "app" }"#).unwrap();

        let err = BuildConfig::resolve(dir.path(), None).unwrap_err();
        assert!(matches!(
            err,
            UploadError::Config(ConfigError::MissingVersion { .. })
        ));
    }

    #[test]
    fn settings_use_defaults_when_no_overrides_given() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{ "version": "1.2.3" }"#,
        )
        .unwrap();
        let config = BuildConfig::resolve(dir.path(), None).unwrap();

        let settings = UploadSettings::resolve(&config, None, None, false, None);
        assert_eq!(settings.assets_path, config.build_output_path);
        assert_eq!(settings.bucket_path, "releases/v1.2.3/");
        assert!(!settings.create_github_release);
        assert!(settings.linux_repo_name.is_none());
    }

    #[test]
    fn settings_overrides_win_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{ "version": "1.2.3" }"#,
        )
        .unwrap();
        let config = BuildConfig::resolve(dir.path(), None).unwrap();

        let settings = UploadSettings::resolve(
            &config,
            Some(PathBuf::from("/tmp/artifacts")),
            Some("custom/prefix/".to_string()),
            true,
            Some("atom/atom".to_string()),
        );
        assert_eq!(settings.assets_path, PathBuf::from("/tmp/artifacts"));
        assert_eq!(settings.bucket_path, "custom/prefix/");
        assert!(settings.create_github_release);
        assert_eq!(settings.linux_repo_name.as_deref(), Some("atom/atom"));
    }
}
