//! Configuration for the attribution run

use crate::error::{AttributionError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// User corrections merged over computed results
pub const OVERRIDES_FILE: &str = "overrides.json";
/// Text prepended verbatim to the report
pub const HEADER_FILE: &str = "header.txt";
/// JSON snapshot of every resolved attribution
pub const LICENSE_INFOS_FILE: &str = "licenseInfos.json";
/// Final human-readable report
pub const ATTRIBUTION_FILE: &str = "attribution.txt";

/// Default output directory, relative to the working directory
pub const DEFAULT_OUTPUT_DIR: &str = "./oss-attribution";

/// Main configuration for an attribution run
///
/// Built once at startup and passed by reference into every stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributionConfig {
    /// Directory holding override/header inputs and receiving outputs
    pub output_dir: PathBuf,
    /// Project roots to scan for installed dependencies
    pub base_dirs: Vec<PathBuf>,
    /// Maximum number of dependency resolutions in flight
    pub concurrency: usize,
    /// Only follow production dependencies
    pub production_only: bool,
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            base_dirs: std::env::current_dir().map(|d| vec![d]).unwrap_or_default(),
            concurrency: default_concurrency(),
            production_only: true,
        }
    }
}

/// Number of available processing units, never less than one
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl AttributionConfig {
    /// Create a new builder for AttributionConfig
    pub fn builder() -> AttributionConfigBuilder {
        AttributionConfigBuilder::default()
    }

    /// Check invariants that deserialization cannot enforce
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(AttributionError::config("concurrency must be at least 1"));
        }
        Ok(())
    }

    /// Make every configured path absolute against the working directory
    pub fn resolved(mut self) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        self.output_dir = absolutize(&cwd, &self.output_dir);
        self.base_dirs = self
            .base_dirs
            .iter()
            .map(|dir| absolutize(&cwd, dir))
            .collect();
        Ok(self)
    }

    pub fn overrides_path(&self) -> PathBuf {
        self.output_dir.join(OVERRIDES_FILE)
    }

    pub fn header_path(&self) -> PathBuf {
        self.output_dir.join(HEADER_FILE)
    }

    pub fn license_infos_path(&self) -> PathBuf {
        self.output_dir.join(LICENSE_INFOS_FILE)
    }

    pub fn attribution_path(&self) -> PathBuf {
        self.output_dir.join(ATTRIBUTION_FILE)
    }
}

fn absolutize(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

/// Builder for AttributionConfig
#[derive(Default)]
pub struct AttributionConfigBuilder {
    output_dir: Option<PathBuf>,
    base_dirs: Vec<PathBuf>,
    concurrency: Option<usize>,
    production_only: Option<bool>,
}

impl AttributionConfigBuilder {
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dirs.push(dir.into());
        self
    }

    pub fn concurrency(mut self, limit: usize) -> Self {
        self.concurrency = Some(limit);
        self
    }

    pub fn production_only(mut self, production_only: bool) -> Self {
        self.production_only = Some(production_only);
        self
    }

    /// Unset fields fall back to [`AttributionConfig::default`]; an empty
    /// base directory list is kept empty rather than defaulted.
    pub fn build(self) -> AttributionConfig {
        let defaults = AttributionConfig::default();
        AttributionConfig {
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
            base_dirs: self.base_dirs,
            concurrency: self.concurrency.unwrap_or(defaults.concurrency),
            production_only: self.production_only.unwrap_or(defaults.production_only),
        }
    }
}
