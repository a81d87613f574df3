//! # oss_attribution
//!
//! Generates a third-party attribution (credits) report for npm projects:
//! - **Discovery**: enumerates the installed production dependencies of one or more project roots
//! - **Resolution**: extracts author attribution and license text for every dependency
//! - **Overrides**: merges user corrections from `overrides.json`
//! - **Reporting**: writes `attribution.txt` and a `licenseInfos.json` snapshot
//!
//! ## Quick Start
//!
//! ```no_run
//! use oss_attribution::{generate_attribution, AttributionConfig, InstalledTreeReader};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = AttributionConfig::builder()
//!     .base_dir(".")
//!     .output_dir("./oss-attribution")
//!     .build()
//!     .resolved()?;
//!
//! let summary = generate_attribution(&config, Arc::new(InstalledTreeReader)).await?;
//! println!("Generated attribution for {} packages", summary.package_count);
//! # Ok(())
//! # }
//! ```

mod aggregate;
mod config;
mod error;
mod locator;
mod metadata;
mod report;
mod resolver;
mod scanner;
mod types;

use std::sync::Arc;

// Re-export public API
pub use aggregate::{aggregate_licenses, bounded_map, merge_dependency_maps, scan_all};
pub use config::{
    default_concurrency, AttributionConfig, AttributionConfigBuilder, ATTRIBUTION_FILE,
    DEFAULT_OUTPUT_DIR, HEADER_FILE, LICENSE_INFOS_FILE, OVERRIDES_FILE,
};
pub use error::{AttributionError, Result};
pub use locator::locate_manifest;
pub use metadata::{InstalledTreeReader, MetadataService, ScanOptions};
pub use report::{prepare_license_infos, render_attribution, write_report, ReportSummary};
pub use resolver::{resolve_attribution, resolve_authors, resolve_dependency};
pub use scanner::scan_directory;
pub use types::{
    AttributionOverride, DependencyMap, LicenseInfos, Licenses, PackageManifest, Person,
    RawDependencyRecord, ResolvedAttribution,
};

/// Run the whole pipeline: aggregate, apply overrides, write outputs
pub async fn generate_attribution(
    config: &AttributionConfig,
    service: Arc<dyn MetadataService>,
) -> Result<ReportSummary> {
    let resolved = aggregate_licenses(config, service).await?;
    let infos = prepare_license_infos(config, resolved).await?;
    write_report(config, &infos).await
}
