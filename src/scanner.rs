//! Validate a scan root and collect its dependency metadata

use crate::error::{AttributionError, Result};
use crate::locator::{DEPENDENCY_STORE, MANIFEST_FILE};
use crate::metadata::{MetadataService, ScanOptions};
use crate::resolver::read_manifest;
use crate::types::DependencyMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Scan one root directory.
///
/// Roots without a `package.json` or without installed dependencies yield
/// an empty map. The root's own project is never part of the result, since
/// it is not installed anywhere the locator could find it. A failing
/// metadata service is reported as an error for this root only.
pub async fn scan_directory(
    root: &Path,
    service: Arc<dyn MetadataService>,
    options: ScanOptions,
) -> Result<DependencyMap> {
    if !tokio::fs::try_exists(root.join(MANIFEST_FILE)).await? {
        info!(
            "directory at \"{}\" does not look like an NPM project, skipping NPM checks",
            root.display()
        );
        return Ok(DependencyMap::new());
    }

    if !tokio::fs::try_exists(root.join(DEPENDENCY_STORE)).await? {
        warn!(
            "No node_modules directory found in \"{}\". Please run \"npm install\" or \"yarn install\" in that directory first. Skipping NPM checks",
            root.display()
        );
        return Ok(DependencyMap::new());
    }

    let scan_root = root.to_path_buf();
    let scanned =
        tokio::task::spawn_blocking(move || service.read_dependencies(&scan_root, &options))
            .await?;

    let mut dependencies = match scanned {
        Ok(dependencies) => dependencies,
        Err(e) => {
            error!("Error scanning directory \"{}\": {}", root.display(), e);
            return Err(AttributionError::scan(root, e.to_string()));
        }
    };

    match read_manifest(&root.join(MANIFEST_FILE)).await {
        Ok(manifest) => {
            if let Some(identity) = manifest.identity() {
                if dependencies.remove(&identity).is_some() {
                    debug!("Dropped project {} of {}", identity, root.display());
                }
            }
        }
        Err(e) => warn!("Could not read project identity of {}: {}", root.display(), e),
    }

    for record in dependencies.values_mut() {
        record.dir = Some(root.to_path_buf());
    }

    Ok(dependencies)
}
