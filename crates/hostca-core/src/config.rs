// ABOUTME: Issuer configuration: the YAML targets file and runtime options.
// ABOUTME: Targets name projects and folders to scan; IssuerOptions carry signing policy.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default certificate validity in days.
pub const DEFAULT_VALIDITY_DAYS: u32 = 365;

/// Default number of projects signed concurrently.
pub const DEFAULT_PARALLELISM: usize = 3;

/// What to scan. Loaded from YAML:
///
/// ```yaml
/// Projects:
///   - my-project
/// Folders:
///   - "123456789"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Targets {
    #[serde(rename = "Projects")]
    pub projects: Vec<String>,
    #[serde(rename = "Folders")]
    pub folders: Vec<String>,
}

/// On-disk shape; either list may be missing or null.
#[derive(Deserialize)]
struct RawTargets {
    #[serde(rename = "Projects", alias = "projects", default)]
    projects: Option<Vec<String>>,
    #[serde(rename = "Folders", alias = "folders", default)]
    folders: Option<Vec<String>>,
}

impl Targets {
    pub fn new(projects: Vec<String>, folders: Vec<String>) -> Result<Self, ConfigError> {
        let projects = projects
            .into_iter()
            .map(|p| non_blank(p, "project"))
            .collect::<Result<Vec<_>, _>>()?;
        let folders = folders
            .into_iter()
            .map(|f| non_blank(f, "folder").map(|f| normalize_folder_id(&f).to_string()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { projects, folders })
    }

    /// Load targets from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes as null
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: RawTargets = serde_yaml::from_str(content)?;
        Self::new(
            raw.projects.unwrap_or_default(),
            raw.folders.unwrap_or_default(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty() && self.folders.is_empty()
    }
}

fn non_blank(value: String, what: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("blank {what} identifier")));
    }
    Ok(trimmed.to_string())
}

/// `folders/123` and `123` name the same folder.
pub fn normalize_folder_id(folder_id: &str) -> &str {
    folder_id.strip_prefix("folders/").unwrap_or(folder_id)
}

/// Signing policy shared by every worker in a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuerOptions {
    /// Add RFC 1918 internal addresses as principals.
    pub sign_internal_ips: bool,
    /// Add external NAT addresses as principals.
    pub sign_external_ips: bool,
    /// Maximum projects processed at once.
    pub parallelism: usize,
    /// Build certificates and log, but never write metadata.
    pub simulate: bool,
    /// Certificate lifetime.
    pub validity: Duration,
    /// Skip instances with no eligible address instead of issuing an
    /// empty-principal certificate.
    pub skip_empty_principals: bool,
}

impl Default for IssuerOptions {
    fn default() -> Self {
        Self {
            sign_internal_ips: true,
            sign_external_ips: true,
            parallelism: DEFAULT_PARALLELISM,
            simulate: false,
            validity: hostca_ssh::days(DEFAULT_VALIDITY_DAYS),
            skip_empty_principals: false,
        }
    }
}

impl IssuerOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.parallelism == 0 {
            return Err(ConfigError::Invalid(
                "parallelism must be at least 1".to_string(),
            ));
        }
        if self.validity.is_zero() {
            return Err(ConfigError::Invalid(
                "validity must be at least 1 day".to_string(),
            ));
        }
        Ok(())
    }
}
