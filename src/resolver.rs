//! Derive authors and license text for a dependency

use crate::error::{AttributionError, Result};
use crate::locator::locate_manifest;
use crate::types::{PackageManifest, People, RawDependencyRecord, ResolvedAttribution};
use std::path::Path;
use tracing::{info, warn};

/// Locate, read and resolve one dependency.
///
/// A missing manifest is an error. A failure while reading the license
/// file only degrades this entry.
pub async fn resolve_dependency(record: &RawDependencyRecord) -> Result<ResolvedAttribution> {
    info!("processing {}", record.key());

    let root = record
        .dir
        .as_deref()
        .ok_or_else(|| AttributionError::ManifestNotFound(record.name.clone()))?;
    let manifest_path = locate_manifest(root, &record.name).await?;
    let manifest = read_manifest(&manifest_path).await?;

    info!(
        "processing {} for authors and licenseText",
        manifest.name.as_deref().unwrap_or(&record.name)
    );

    Ok(resolve_attribution(record, &manifest).await)
}

/// Read and parse a `package.json`
pub async fn read_manifest(path: &Path) -> Result<PackageManifest> {
    let content = tokio::fs::read_to_string(path).await?;
    serde_json::from_str(&content).map_err(|e| AttributionError::invalid_manifest(path, e))
}

/// Combine a raw record with its manifest into an attribution entry
pub async fn resolve_attribution(
    record: &RawDependencyRecord,
    manifest: &PackageManifest,
) -> ResolvedAttribution {
    let authors = resolve_authors(manifest);

    match resolve_license_text(record.license_file.as_deref()).await {
        Ok(license_text) => ResolvedAttribution::from_record(record, authors, license_text),
        Err(e) => {
            warn!("Failed to read license file for {}: {}", record.key(), e);
            ResolvedAttribution::degraded(record)
        }
    }
}

/// First non-empty of: author, contributors, maintainers
pub fn resolve_authors(manifest: &PackageManifest) -> String {
    if let Some(author) = &manifest.author {
        let rendered = author.attribution();
        if !rendered.is_empty() {
            return rendered;
        }
    }

    [&manifest.contributors, &manifest.maintainers]
        .into_iter()
        .flatten()
        .map(join_people)
        .find(|rendered| !rendered.is_empty())
        .unwrap_or_default()
}

fn join_people(people: &People) -> String {
    people
        .iter()
        .map(|p| p.attribution())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Contents of the license file, or empty when there is none or its name
/// does not mention "license"
pub async fn resolve_license_text(license_file: Option<&Path>) -> Result<String> {
    let Some(path) = license_file else {
        return Ok(String::new());
    };

    if !is_license_file_name(path) || !tokio::fs::try_exists(path).await? {
        return Ok(String::new());
    }

    Ok(tokio::fs::read_to_string(path).await?)
}

/// Case-insensitive match of "license" anywhere in the file name
pub fn is_license_file_name(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase().contains("license"))
        .unwrap_or(false)
}
