//! Apply user overrides and render the attribution report

use crate::config::AttributionConfig;
use crate::error::{AttributionError, Result};
use crate::types::{AttributionOverride, LicenseInfos, ResolvedAttribution};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Platform line separator used in the text report
pub const EOL: &str = if cfg!(windows) { "\r\n" } else { "\n" };

/// Row placed between package blocks
pub const SEPARATOR_RULE: &str = "******************************";

/// Overrides keyed by package name
pub type Overrides = BTreeMap<String, AttributionOverride>;

/// Outcome of a completed report run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    /// Number of entries in the JSON snapshot, ignored ones included
    pub package_count: usize,
    pub license_infos_path: PathBuf,
    pub attribution_path: PathBuf,
}

/// Key resolved entries by name and merge `overrides.json` over them, if
/// present in the output directory
pub async fn prepare_license_infos(
    config: &AttributionConfig,
    resolved: Vec<ResolvedAttribution>,
) -> Result<LicenseInfos> {
    let mut infos = index_by_name(resolved);

    if let Some(overrides) = load_overrides(&config.overrides_path()).await? {
        info!("using {} overrides", overrides.len());
        apply_overrides(&mut infos, &overrides);
    }

    Ok(infos)
}

/// Render the report and persist it alongside the JSON snapshot
pub async fn write_report(config: &AttributionConfig, infos: &LicenseInfos) -> Result<ReportSummary> {
    let mut attribution = render_attribution(infos);

    if let Some(header) = read_optional(&config.header_path()).await? {
        info!("using template {}", config.header_path().display());
        attribution = with_header(&header, &attribution);
    }

    tokio::fs::create_dir_all(&config.output_dir).await?;

    let license_infos_path = config.license_infos_path();
    tokio::fs::write(&license_infos_path, serde_json::to_string_pretty(infos)?).await?;

    let attribution_path = config.attribution_path();
    tokio::fs::write(&attribution_path, attribution).await?;

    Ok(ReportSummary {
        package_count: infos.len(),
        license_infos_path,
        attribution_path,
    })
}

/// Later entries with the same name replace earlier ones
pub fn index_by_name(resolved: Vec<ResolvedAttribution>) -> LicenseInfos {
    resolved
        .into_iter()
        .map(|entry| (entry.name.clone().unwrap_or_default(), entry))
        .collect()
}

/// Read `overrides.json`; a missing file means no overrides
pub async fn load_overrides(path: &Path) -> Result<Option<Overrides>> {
    let Some(content) = read_optional(path)
        .await
        .map_err(|e| AttributionError::override_file(path, e))?
    else {
        return Ok(None);
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| AttributionError::override_file(path, e))
}

/// Merge each override over the entry of the same name.
///
/// Names without a computed entry get one built from the override alone.
pub fn apply_overrides(infos: &mut LicenseInfos, overrides: &Overrides) {
    for (name, overrides) in overrides {
        debug!("applying override for {}", name);
        infos
            .entry(name.clone())
            .or_default()
            .apply_override(overrides);
    }
}

/// Join the blocks of every reportable entry, sorted case-insensitively
pub fn render_attribution(infos: &LicenseInfos) -> String {
    let mut entries: Vec<(&str, &ResolvedAttribution)> = infos
        .values()
        .filter(|entry| !entry.ignore)
        .filter_map(|entry| entry.name.as_deref().map(|name| (name, entry)))
        .collect();
    entries.sort_by_key(|(name, _)| name.to_lowercase());

    let separator = format!("{EOL}{EOL}{SEPARATOR_RULE}{EOL}{EOL}");
    entries
        .into_iter()
        .map(|(name, entry)| format_entry(name, entry))
        .collect::<Vec<_>>()
        .join(&separator)
}

/// Name, version line, then license text or a license/authors summary
pub fn format_entry(name: &str, entry: &ResolvedAttribution) -> String {
    let version = entry.version.as_deref().unwrap_or_default();
    let version_line = match entry.url.as_deref().filter(|url| !url.is_empty()) {
        Some(url) => format!("{} <{}>", version, url),
        None => version.to_string(),
    };

    let body = if entry.license_text.is_empty() {
        let license = entry
            .license
            .as_ref()
            .map(|l| l.to_string())
            .unwrap_or_default();
        format!("license: {}{EOL}authors: {}", license, entry.authors)
    } else {
        entry.license_text.clone()
    };

    [name.to_string(), version_line, body].join(EOL)
}

pub fn with_header(header: &str, attribution: &str) -> String {
    format!("{header}{EOL}{EOL}{attribution}")
}

async fn read_optional(path: &Path) -> Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
