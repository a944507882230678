//! Release asset discovery.
//!
//! Walks the assets directory once and collects every file the release
//! distributes: platform installers and packages by extension, Squirrel
//! `RELEASES*` manifests, and the Electron API metadata file. Traversal
//! order is deterministic (sorted per directory) so upload order and logs
//! are stable across runs.

use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Result, UploadError};

/// File extensions eligible for release distribution.
const ASSET_EXTENSIONS: [&str; 6] = [".exe", ".zip", ".nupkg", ".tar.gz", ".rpm", ".deb"];

/// Squirrel update manifests: `RELEASES`, `RELEASES-beta`, ...
const RELEASES_MANIFEST_PREFIX: &str = "RELEASES";

/// Electron API metadata produced by the Windows build.
const API_MANIFEST_NAME: &str = "atom-api.json";

/// Whether a file name counts as a release asset.
pub fn is_release_asset(file_name: &str) -> bool {
    ASSET_EXTENSIONS.iter().any(|ext| file_name.ends_with(ext))
        || file_name.starts_with(RELEASES_MANIFEST_PREFIX)
        || file_name == API_MANIFEST_NAME
}

/// Collect every release asset under `assets_path`, recursively.
///
/// Returns absolute paths in sorted traversal order. An empty result is the
/// precondition failure of the whole run: [`UploadError::NoAssets`] is
/// returned before any network call is made. A missing or non-directory
/// assets path counts as "no assets", not as an IO error.
pub fn discover_assets(assets_path: &Path) -> Result<Vec<PathBuf>> {
    let no_assets = || UploadError::NoAssets {
        path: assets_path.to_path_buf(),
    };

    let root = assets_path.canonicalize().map_err(|_| no_assets())?;
    if !root.is_dir() {
        return Err(no_assets());
    }

    let mut assets = Vec::new();
    for entry in WalkDir::new(&root).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if is_release_asset(&name) {
            assets.push(entry.into_path());
        }
    }

    if assets.is_empty() {
        return Err(no_assets());
    }
    Ok(assets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn matches_every_distributed_artifact_kind() {
        for name in [
            "AtomSetup.exe",
            "atom-mac.zip",
            "atom-1.60.0-full.nupkg",
            "atom-amd64.tar.gz",
            "atom.x86_64.rpm",
            "atom-amd64.deb",
            "RELEASES",
            "RELEASES-beta",
            "atom-api.json",
        ] {
            assert!(is_release_asset(name), "expected match: {name}");
        }
    }

    #[test]
    fn ignores_everything_else() {
        for name in [
            "build.log",
            "RELEASE",
            "atom.gz",
            "atom-api.json.bak",
            "notes.txt",
            "atom.tar",
        ] {
            assert!(!is_release_asset(name), "expected no match: {name}");
        }
    }

    #[test]
    fn finds_assets_recursively_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("app.zip"), b"zip").unwrap();
        fs::write(dir.path().join("app.exe"), b"exe").unwrap();
        fs::write(dir.path().join("notes.txt"), b"skip").unwrap();
        let nested = dir.path().join("linux");
        fs::create_dir(&nested).unwrap();
        fs::write(nested.join("atom-amd64.deb"), b"deb").unwrap();

        let assets = discover_assets(dir.path()).unwrap();
        let names: Vec<_> = assets
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["app.exe", "app.zip", "atom-amd64.deb"]);
        assert!(assets.iter().all(|p| p.is_absolute()));
    }

    #[test]
    fn empty_directory_is_the_no_assets_precondition() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover_assets(dir.path()).unwrap_err();
        assert!(matches!(err, UploadError::NoAssets { .. }));
        assert!(err.to_string().contains("No assets found"));
    }

    #[test]
    fn missing_directory_is_the_no_assets_precondition() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let err = discover_assets(&missing).unwrap_err();
        assert!(matches!(err, UploadError::NoAssets { .. }));
    }

    #[test]
    fn directories_matching_the_pattern_are_not_assets() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("bundle.zip")).unwrap();
        fs::write(dir.path().join("app.exe"), b"exe").unwrap();

        let assets = discover_assets(dir.path()).unwrap();
        assert_eq!(assets.len(), 1);
        assert!(assets[0].ends_with("app.exe"));
    }
}
