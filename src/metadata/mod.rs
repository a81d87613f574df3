//! Dependency metadata providers

pub mod installed;

pub use installed::InstalledTreeReader;

use crate::error::Result;
use crate::types::DependencyMap;
use std::path::Path;

/// Options passed to a [`MetadataService`] for one scan root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Skip development dependencies
    pub production_only: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            production_only: true,
        }
    }
}

/// Enumerates the resolved dependencies of a project root.
///
/// Implementations return one [`crate::types::RawDependencyRecord`] per
/// installed package keyed by `name@version`; the root project itself may
/// be included. Calls run on the blocking thread pool.
pub trait MetadataService: Send + Sync {
    fn read_dependencies(&self, root: &Path, options: &ScanOptions) -> Result<DependencyMap>;
}
