//! Aggregate dependency metadata across scan roots and resolve attributions

use crate::config::AttributionConfig;
use crate::error::{AttributionError, Result};
use crate::locator::MANIFEST_FILE;
use crate::metadata::{MetadataService, ScanOptions};
use crate::resolver::{read_manifest, resolve_dependency};
use crate::scanner::scan_directory;
use crate::types::{DependencyMap, ResolvedAttribution};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Scan every configured root and resolve the attribution of each
/// dependency found, excluding the top-level project itself.
///
/// Fails as soon as one dependency cannot be resolved.
pub async fn aggregate_licenses(
    config: &AttributionConfig,
    service: Arc<dyn MetadataService>,
) -> Result<Vec<ResolvedAttribution>> {
    let Some(first_root) = config.base_dirs.first() else {
        return Ok(Vec::new());
    };

    info!(
        "Looking at directories: {}",
        config
            .base_dirs
            .iter()
            .map(|d| d.display().to_string())
            .collect::<Vec<_>>()
            .join(",")
    );

    let options = ScanOptions {
        production_only: config.production_only,
    };
    let mut merged = scan_all(&config.base_dirs, service, options).await?;
    exclude_top_level(&mut merged, first_root).await;

    info!("Resolving {} dependencies", merged.len());

    let records: Vec<_> = merged.into_values().collect();
    bounded_map(records, config.concurrency, |record| async move {
        resolve_dependency(&record).await
    })
    .await
}

/// Scan all roots concurrently and merge the results in declared order.
///
/// A root whose scan fails contributes nothing.
pub async fn scan_all(
    roots: &[PathBuf],
    service: Arc<dyn MetadataService>,
    options: ScanOptions,
) -> Result<DependencyMap> {
    let tasks: Vec<_> = roots
        .iter()
        .map(|root| {
            let root = root.clone();
            let service = Arc::clone(&service);
            tokio::spawn(async move { scan_directory(&root, service, options).await })
        })
        .collect();

    let mut results = Vec::with_capacity(tasks.len());
    for (root, task) in roots.iter().zip(tasks) {
        match task.await? {
            Ok(dependencies) => results.push(dependencies),
            Err(e) => warn!("Skipping {}: {}", root.display(), e),
        }
    }

    Ok(merge_dependency_maps(results))
}

/// Merge per-root maps; on a `name@version` collision the later map wins
pub fn merge_dependency_maps(maps: impl IntoIterator<Item = DependencyMap>) -> DependencyMap {
    maps.into_iter().fold(DependencyMap::new(), |mut merged, map| {
        merged.extend(map);
        merged
    })
}

/// Remove the project declared by `root/package.json` from `merged`
async fn exclude_top_level(merged: &mut DependencyMap, root: &Path) {
    let manifest_path = root.join(MANIFEST_FILE);
    let is_file = tokio::fs::metadata(&manifest_path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false);
    if !is_file {
        debug!("No top-level manifest at {}", manifest_path.display());
        return;
    }

    match read_manifest(&manifest_path).await {
        Ok(manifest) => {
            if let Some(identity) = manifest.identity() {
                if merged.remove(&identity).is_some() {
                    debug!("Excluded top-level project {}", identity);
                }
            }
        }
        Err(e) => warn!("Could not read top-level project identity: {}", e),
    }
}

/// Map `f` over `items` with at most `limit` calls in flight.
///
/// Output order matches input order. The first error aborts the
/// remaining work and is returned.
pub async fn bounded_map<T, R, F, Fut>(items: Vec<T>, limit: usize, f: F) -> Result<Vec<R>>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R>> + Send + 'static,
{
    let total = items.len();
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let f = Arc::new(f);
    let mut join_set = JoinSet::new();

    for (idx, item) in items.into_iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let f = Arc::clone(&f);
        join_set.spawn(async move {
            let _permit = semaphore
                .acquire()
                .await
                .map_err(|e| AttributionError::Task(format!("Failed to acquire semaphore: {}", e)))?;
            f(item).await.map(|result| (idx, result))
        });
    }

    let mut slots: Vec<Option<R>> = (0..total).map(|_| None).collect();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok(Ok((idx, result))) => slots[idx] = Some(result),
            Ok(Err(e)) => {
                join_set.abort_all();
                return Err(e);
            }
            Err(e) => {
                join_set.abort_all();
                return Err(e.into());
            }
        }
    }

    Ok(slots.into_iter().flatten().collect())
}
