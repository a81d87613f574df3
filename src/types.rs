//! Core data types for dependency metadata and attribution entries

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Raw metadata records keyed by `name@version`
pub type DependencyMap = BTreeMap<String, RawDependencyRecord>;

/// Resolved attributions keyed by package name
pub type LicenseInfos = BTreeMap<String, ResolvedAttribution>;

/// Metadata reported for one installed dependency of a scan root
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawDependencyRecord {
    pub name: String,
    pub version: String,
    pub description: Option<String>,
    /// Repository URL, normalized to https where possible
    pub repository: Option<String>,
    /// Author name
    pub publisher: Option<String>,
    /// Author email
    pub email: Option<String>,
    /// Author url
    pub url: Option<String>,
    pub licenses: Option<Licenses>,
    pub license_file: Option<PathBuf>,
    pub license_modified: bool,
    /// Scan root this record was reported under
    pub dir: Option<PathBuf>,
}

impl RawDependencyRecord {
    /// Identity used for merging across scan roots
    pub fn key(&self) -> String {
        package_key(&self.name, &self.version)
    }
}

/// Format a `name@version` identity
pub fn package_key(name: &str, version: &str) -> String {
    format!("{}@{}", name, version)
}

/// One license identifier or several
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Licenses {
    Single(String),
    Multiple(Vec<String>),
}

impl std::fmt::Display for Licenses {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(license) => write!(f, "{}", license),
            Self::Multiple(licenses) => write!(f, "{}", licenses.join(", ")),
        }
    }
}

/// An author, contributor or maintainer entry of a package manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Person {
    Text(String),
    Record {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        email: Option<String>,
        #[serde(default)]
        url: Option<String>,
        #[serde(default)]
        homepage: Option<String>,
    },
}

impl Person {
    /// Render as used in the report.
    ///
    /// Plain strings are kept verbatim. Records render as `name <contact>`
    /// where contact is the first of email, homepage, url.
    pub fn attribution(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Record {
                name,
                email,
                url,
                homepage,
            } => {
                let name = name.as_deref().unwrap_or_default();
                let contact = [email, homepage, url]
                    .into_iter()
                    .flatten()
                    .find(|c| !c.is_empty());
                match contact {
                    Some(contact) if name.is_empty() => format!("<{}>", contact),
                    Some(contact) => format!("{} <{}>", name, contact),
                    None => name.to_string(),
                }
            }
        }
    }

    /// Split into name, email and url.
    ///
    /// The string form follows the npm convention `Name <email> (url)`.
    pub fn parts(&self) -> PersonParts {
        match self {
            Self::Text(text) => parse_person(text),
            Self::Record {
                name,
                email,
                url,
                homepage,
            } => PersonParts {
                name: name.clone(),
                email: email.clone(),
                url: url.clone().or_else(|| homepage.clone()),
            },
        }
    }
}

/// Name, email and url of a person, any of which may be missing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonParts {
    pub name: Option<String>,
    pub email: Option<String>,
    pub url: Option<String>,
}

fn parse_person(text: &str) -> PersonParts {
    fn delimited(text: &str, open: char, close: char) -> Option<String> {
        let start = text.find(open)? + 1;
        let end = start + text[start..].find(close)?;
        let inner = text[start..end].trim();
        (!inner.is_empty()).then(|| inner.to_string())
    }

    let name_end = text.find(&['<', '('][..]).unwrap_or(text.len());
    let name = text[..name_end].trim();

    PersonParts {
        name: (!name.is_empty()).then(|| name.to_string()),
        email: delimited(text, '<', '>'),
        url: delimited(text, '(', ')'),
    }
}

/// One person or a list, as found in `contributors`/`maintainers`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum People {
    Many(Vec<Person>),
    One(Person),
}

impl People {
    pub fn iter(&self) -> std::slice::Iter<'_, Person> {
        match self {
            Self::Many(people) => people.iter(),
            Self::One(person) => std::slice::from_ref(person).iter(),
        }
    }
}

/// `repository` field of a package manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Repository {
    Text(String),
    Record {
        #[serde(default)]
        url: Option<String>,
    },
}

impl Repository {
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Text(url) => Some(url.as_str()),
            Self::Record { url } => url.as_deref(),
        }
    }
}

/// `license` field, or one element of the legacy `licenses` array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LicenseValue {
    Text(String),
    Record {
        #[serde(default, rename = "type")]
        kind: Option<String>,
    },
}

impl LicenseValue {
    pub fn identifier(&self) -> Option<&str> {
        match self {
            Self::Text(id) => Some(id.as_str()),
            Self::Record { kind } => kind.as_deref(),
        }
    }
}

/// The subset of an installed `package.json` this tool reads
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PackageManifest {
    pub name: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub author: Option<Person>,
    pub contributors: Option<People>,
    pub maintainers: Option<People>,
    pub repository: Option<Repository>,
    pub license: Option<LicenseValue>,
    pub licenses: Option<Vec<LicenseValue>>,
    pub dependencies: BTreeMap<String, String>,
    pub optional_dependencies: BTreeMap<String, String>,
    pub dev_dependencies: BTreeMap<String, String>,
}

impl PackageManifest {
    /// `name@version` identity, when both are declared
    pub fn identity(&self) -> Option<String> {
        match (&self.name, &self.version) {
            (Some(name), Some(version)) => Some(package_key(name, version)),
            _ => None,
        }
    }
}

/// Attribution data for one dependency, as written to `licenseInfos.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolvedAttribution {
    /// Excluded from the text report when set
    pub ignore: bool,
    pub name: Option<String>,
    pub version: Option<String>,
    pub authors: String,
    pub url: Option<String>,
    pub license: Option<Licenses>,
    pub license_text: String,
}

impl ResolvedAttribution {
    /// Build an entry from a raw record and the computed fields
    pub fn from_record(
        record: &RawDependencyRecord,
        authors: String,
        license_text: String,
    ) -> Self {
        Self {
            ignore: false,
            name: Some(record.name.clone()),
            version: Some(record.version.clone()),
            authors,
            url: record.repository.clone(),
            license: record.licenses.clone(),
            license_text,
        }
    }

    /// Entry with blank authors and license text, used when reading the
    /// license file failed. Name, version, url and license are kept so the
    /// package still appears in the report.
    pub fn degraded(record: &RawDependencyRecord) -> Self {
        Self::from_record(record, String::new(), String::new())
    }

    /// Overlay every field the override specifies
    pub fn apply_override(&mut self, overrides: &AttributionOverride) {
        if let Some(ignore) = overrides.ignore {
            self.ignore = ignore;
        }
        if let Some(name) = &overrides.name {
            self.name = Some(name.clone());
        }
        if let Some(version) = &overrides.version {
            self.version = Some(version.clone());
        }
        if let Some(authors) = &overrides.authors {
            self.authors = authors.clone();
        }
        if let Some(url) = &overrides.url {
            self.url = Some(url.clone());
        }
        if let Some(license) = &overrides.license {
            self.license = Some(license.clone());
        }
        if let Some(license_text) = &overrides.license_text {
            self.license_text = license_text.clone();
        }
    }
}

/// User-authored partial attribution from `overrides.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AttributionOverride {
    pub ignore: Option<bool>,
    pub name: Option<String>,
    pub version: Option<String>,
    pub authors: Option<String>,
    pub url: Option<String>,
    pub license: Option<Licenses>,
    pub license_text: Option<String>,
}
