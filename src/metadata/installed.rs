//! Read dependency metadata from an installed `node_modules` tree

use super::{MetadataService, ScanOptions};
use crate::error::{AttributionError, Result};
use crate::locator::{DEPENDENCY_STORE, MANIFEST_FILE};
use crate::types::{DependencyMap, Licenses, PackageManifest, RawDependencyRecord};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// License file name prefixes, in order of preference
const LICENSE_FILE_PREFIXES: [&str; 4] = ["license", "licence", "copying", "readme"];

/// Walks the dependency graph declared by `package.json` files, resolving
/// each dependency the way Node does: in the nearest enclosing
/// `node_modules` directory.
///
/// The root project is part of the output.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstalledTreeReader;

impl MetadataService for InstalledTreeReader {
    fn read_dependencies(&self, root: &Path, options: &ScanOptions) -> Result<DependencyMap> {
        let root_manifest = read_manifest_sync(&root.join(MANIFEST_FILE))?;

        let mut result = DependencyMap::new();
        let mut visited: HashSet<PathBuf> = HashSet::from([root.to_path_buf()]);
        let mut queue = VecDeque::from([(root.to_path_buf(), root_manifest, true)]);

        while let Some((dir, manifest, is_root)) = queue.pop_front() {
            let mut wanted: Vec<(&String, bool)> = manifest
                .dependencies
                .keys()
                .map(|name| (name, false))
                .chain(manifest.optional_dependencies.keys().map(|name| (name, true)))
                .collect();
            if is_root && !options.production_only {
                wanted.extend(manifest.dev_dependencies.keys().map(|name| (name, false)));
            }

            for (name, optional) in wanted {
                let Some(dep_dir) = find_installed(root, &dir, name) else {
                    if !optional {
                        warn!("{} is required by {} but not installed", name, dir.display());
                    }
                    continue;
                };
                if !visited.insert(dep_dir.clone()) {
                    continue;
                }
                let dep_manifest = read_manifest_sync(&dep_dir.join(MANIFEST_FILE))?;
                queue.push_back((dep_dir, dep_manifest, false));
            }

            let record = describe_package(&dir, &manifest)?;
            debug!("found {}", record.key());
            result.insert(record.key(), record);
        }

        Ok(result)
    }
}

fn read_manifest_sync(path: &Path) -> Result<PackageManifest> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| AttributionError::invalid_manifest(path, e))
}

/// Nearest `node_modules/<name>` from `from` upwards, without leaving `root`
fn find_installed(root: &Path, from: &Path, name: &str) -> Option<PathBuf> {
    let mut current = Some(from);

    while let Some(dir) = current.filter(|d| d.starts_with(root)) {
        let candidate = dir.join(DEPENDENCY_STORE).join(name);
        if candidate.join(MANIFEST_FILE).is_file() {
            return Some(candidate);
        }
        current = dir.parent();
    }

    None
}

fn describe_package(dir: &Path, manifest: &PackageManifest) -> Result<RawDependencyRecord> {
    let name = manifest.name.clone().unwrap_or_else(|| {
        dir.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    });
    let author = manifest.author.as_ref().map(|a| a.parts()).unwrap_or_default();
    let license_file = find_license_file(dir)?;

    let licenses = match declared_licenses(manifest) {
        Some(licenses) => Some(licenses),
        None => license_file
            .as_deref()
            .and_then(|path| std::fs::read_to_string(path).ok())
            .map(|text| Licenses::Single(guess_license(&text).to_string())),
    };

    Ok(RawDependencyRecord {
        name,
        version: manifest.version.clone().unwrap_or_default(),
        description: manifest.description.clone(),
        repository: manifest
            .repository
            .as_ref()
            .and_then(|r| r.url())
            .map(normalize_repository),
        publisher: author.name,
        email: author.email,
        url: author.url,
        licenses,
        license_file,
        license_modified: false,
        dir: None,
    })
}

fn declared_licenses(manifest: &PackageManifest) -> Option<Licenses> {
    if let Some(id) = manifest.license.as_ref().and_then(|l| l.identifier()) {
        return Some(Licenses::Single(id.to_string()));
    }

    let mut ids: Vec<String> = manifest
        .licenses
        .iter()
        .flatten()
        .filter_map(|l| l.identifier())
        .map(String::from)
        .collect();

    match ids.len() {
        0 => None,
        1 => ids.pop().map(Licenses::Single),
        _ => Some(Licenses::Multiple(ids)),
    }
}

/// Best candidate license file in a package directory
fn find_license_file(dir: &Path) -> Result<Option<PathBuf>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();

    Ok(LICENSE_FILE_PREFIXES.iter().find_map(|prefix| {
        names
            .iter()
            .find(|n| n.to_lowercase().starts_with(prefix))
            .map(|n| dir.join(n))
    }))
}

/// Guess a license from file contents when the manifest declares none.
/// The trailing `*` marks the identifier as guessed.
fn guess_license(text: &str) -> &'static str {
    let lower = text.to_lowercase();

    if lower.contains("mit license") || lower.contains("permission is hereby granted, free of charge")
    {
        "MIT*"
    } else if lower.contains("isc license") {
        "ISC*"
    } else if lower.contains("apache license") {
        "Apache*"
    } else if lower.contains("bsd") {
        "BSD*"
    } else {
        "UNKNOWN"
    }
}

/// Turn the common git URL spellings into a browsable https URL
fn normalize_repository(url: &str) -> String {
    let url = url.trim();
    let url = url.strip_prefix("git+").unwrap_or(url);

    let https = if let Some(rest) = url.strip_prefix("git@") {
        format!("https://{}", rest.replacen(':', "/", 1))
    } else if let Some(rest) = url.strip_prefix("ssh://git@") {
        format!("https://{}", rest)
    } else if let Some(rest) = url.strip_prefix("git://") {
        format!("https://{}", rest)
    } else if let Some(rest) = url.strip_prefix("github:") {
        format!("https://github.com/{}", rest)
    } else if !url.contains(':') && url.matches('/').count() == 1 {
        format!("https://github.com/{}", url)
    } else {
        url.to_string()
    };

    https.strip_suffix(".git").map(String::from).unwrap_or(https)
}
