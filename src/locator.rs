//! Locate the installed `package.json` of a dependency

use crate::error::{AttributionError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Directory npm installs dependencies into
pub const DEPENDENCY_STORE: &str = "node_modules";
/// Manifest file name of a package
pub const MANIFEST_FILE: &str = "package.json";

/// Find the manifest of `name` installed under `root`.
///
/// Tries `<root>/node_modules/<name>/package.json` first, then falls back to
/// the first match of `**/node_modules/<name>/package.json` below `root`.
pub async fn locate_manifest(root: &Path, name: &str) -> Result<PathBuf> {
    let expected = expected_manifest_path(root, name);

    match tokio::fs::metadata(&expected).await {
        Ok(meta) if meta.is_file() => return Ok(expected),
        _ => debug!("{} not at {}, searching {}", name, expected.display(), root.display()),
    }

    let search_root = root.to_path_buf();
    let search_name = name.to_string();
    let found =
        tokio::task::spawn_blocking(move || find_nested_manifest(&search_root, &search_name))
            .await?;

    found.ok_or_else(|| AttributionError::ManifestNotFound(name.to_string()))
}

/// Conventional manifest location of `name` directly under `root`
pub fn expected_manifest_path(root: &Path, name: &str) -> PathBuf {
    root.join(DEPENDENCY_STORE).join(name).join(MANIFEST_FILE)
}

/// Depth-first search in file-name order so repeated runs pick the same match
fn find_nested_manifest(root: &Path, name: &str) -> Option<PathBuf> {
    let suffix = Path::new(DEPENDENCY_STORE).join(name).join(MANIFEST_FILE);

    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .find(|path| path.ends_with(&suffix))
}
