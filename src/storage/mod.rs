//! Object storage upload for release assets.

mod s3;

pub use s3::S3ArtifactStore;

use std::path::Path;

/// MIME type for a release asset, by extension.
///
/// Extension-less files (the Squirrel `RELEASES*` manifests) fall through to
/// the octet-stream default.
pub(crate) fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("deb") => "application/vnd.debian.binary-package",
        Some("rpm") => "application/x-rpm",
        Some("exe") => "application/x-msdownload",
        Some("zip") | Some("nupkg") => "application/zip",
        Some("gz") | Some("tgz") => "application/gzip",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}
