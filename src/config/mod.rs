//! Configuration management.
//!
//! One immutable [`Config`] is built per invocation and passed by value to
//! the reconciliation entry point. There is no process-wide mutable state.
//!
//! # Sources
//!
//! Configuration is resolved in order:
//! 1. Defaults (SharePoint-style list names, Mongo-style document names)
//! 2. The config file (`~/.sharesync/config.json`, or `--config <path>`)
//! 3. Environment overrides (`SSYNC_LIST_URL`, `SSYNC_DOCS_URL`, ...)
//!
//! Field-name differences between the two backends are declarative
//! [`FieldMap`] tables here, not code branches in the core.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Per-side mapping between native and canonical field names.
///
/// `id`, `modified`, and `key` name the backend's bookkeeping and key
/// fields natively. `rename` maps canonical payload names to native ones;
/// payload fields absent from the table pass through under their native
/// name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMap {
    /// Native name of the backend's record identifier field.
    pub id: String,
    /// Native name of the last-modified timestamp field.
    pub modified: String,
    /// Native names of the natural-key fields, in tuple order.
    pub key: Vec<String>,
    /// Canonical payload name -> native payload name.
    #[serde(default)]
    pub rename: BTreeMap<String, String>,
}

impl FieldMap {
    /// Default mapping for the hosted list service.
    #[must_use]
    pub fn list_default() -> Self {
        Self {
            id: "ID".to_string(),
            modified: "Modified".to_string(),
            key: vec!["Title".to_string()],
            rename: BTreeMap::new(),
        }
    }

    /// Default mapping for the document store.
    #[must_use]
    pub fn docs_default() -> Self {
        Self {
            id: "_id".to_string(),
            modified: "updatedAt".to_string(),
            key: vec!["title".to_string()],
            rename: BTreeMap::new(),
        }
    }

    /// Native name for a canonical payload field.
    #[must_use]
    pub fn native_name<'a>(&'a self, canonical: &'a str) -> &'a str {
        self.rename.get(canonical).map_or(canonical, String::as_str)
    }

    /// Canonical name for a native payload field.
    #[must_use]
    pub fn canonical_name<'a>(&'a self, native: &'a str) -> &'a str {
        self.rename
            .iter()
            .find(|(_, n)| n.as_str() == native)
            .map_or(native, |(c, _)| c.as_str())
    }

    /// Whether a native field is key or bookkeeping (excluded from the
    /// canonical payload).
    #[must_use]
    pub fn is_bookkeeping(&self, native: &str) -> bool {
        native == self.id || native == self.modified || self.key.iter().any(|k| k == native)
    }
}

/// Connection settings and field mapping for one backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Service base URL.
    pub base_url: String,
    /// List name or collection name on that service.
    pub resource: String,
    /// Bearer token, if the service requires one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Native/canonical field mapping.
    pub mapping: FieldMap,
}

/// Immutable run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub list: BackendConfig,
    pub docs: BackendConfig,
    /// Per-request deadline for fetch and apply calls.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_timeout_secs() -> u64 {
    30
}

/// Raw config-file shape: everything optional so a partial file merges
/// over the defaults.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    list: Option<PartialBackend>,
    docs: Option<PartialBackend>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct PartialBackend {
    base_url: Option<String>,
    resource: Option<String>,
    token: Option<String>,
    mapping: Option<FieldMap>,
}

impl Config {
    /// Load configuration from the default (or given) file plus
    /// environment overrides.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if an explicitly given path does not exist,
    /// if the file is not valid JSON, or if the resolved configuration is
    /// incomplete (see [`Config::validate`]).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, |var| std::env::var(var).ok())
    }

    /// Load with an explicit environment lookup (tests inject a map here
    /// instead of mutating process env).
    pub fn load_with_env(
        path: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let file = match path {
            Some(p) => {
                if !p.exists() {
                    return Err(Error::Config(format!(
                        "config file not found: {}",
                        p.display()
                    )));
                }
                Self::read_file(p)?
            }
            None => match default_config_path() {
                Some(p) if p.exists() => Self::read_file(&p)?,
                _ => ConfigFile::default(),
            },
        };

        let mut config = Self::from_file(file);
        config.apply_env(&env);
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<ConfigFile> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("invalid config file {}: {e}", path.display())))
    }

    fn from_file(file: ConfigFile) -> Self {
        let list = file.list.unwrap_or_default();
        let docs = file.docs.unwrap_or_default();
        Self {
            list: BackendConfig {
                base_url: list.base_url.unwrap_or_default(),
                resource: list.resource.unwrap_or_else(|| "Tasks".to_string()),
                token: list.token,
                mapping: list.mapping.unwrap_or_else(FieldMap::list_default),
            },
            docs: BackendConfig {
                base_url: docs.base_url.unwrap_or_default(),
                resource: docs.resource.unwrap_or_else(|| "tasks".to_string()),
                token: docs.token,
                mapping: docs.mapping.unwrap_or_else(FieldMap::docs_default),
            },
            timeout_secs: file.timeout_secs.unwrap_or_else(default_timeout_secs),
        }
    }

    fn apply_env(&mut self, env: &impl Fn(&str) -> Option<String>) {
        if let Some(v) = env("SSYNC_LIST_URL") {
            self.list.base_url = v;
        }
        if let Some(v) = env("SSYNC_LIST_NAME") {
            self.list.resource = v;
        }
        if let Some(v) = env("SSYNC_LIST_TOKEN") {
            self.list.token = Some(v);
        }
        if let Some(v) = env("SSYNC_DOCS_URL") {
            self.docs.base_url = v;
        }
        if let Some(v) = env("SSYNC_DOCS_COLLECTION") {
            self.docs.resource = v;
        }
        if let Some(v) = env("SSYNC_DOCS_TOKEN") {
            self.docs.token = Some(v);
        }
        if let Some(v) = env("SSYNC_TIMEOUT") {
            if let Ok(secs) = v.parse() {
                self.timeout_secs = secs;
            }
        }
    }

    /// Check the resolved configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` when a backend URL is missing, a key-field
    /// list is empty, or the two sides disagree on key arity (keys are
    /// compared as whole tuples, so the widths must match).
    pub fn validate(&self) -> Result<()> {
        if self.list.base_url.is_empty() {
            return Err(Error::Config("list backend URL is not set".to_string()));
        }
        if self.docs.base_url.is_empty() {
            return Err(Error::Config("docs backend URL is not set".to_string()));
        }
        if self.list.mapping.key.is_empty() || self.docs.mapping.key.is_empty() {
            return Err(Error::Config(
                "natural-key field list must not be empty".to_string(),
            ));
        }
        if self.list.mapping.key.len() != self.docs.mapping.key.len() {
            return Err(Error::Config(format!(
                "natural-key width differs between sides ({} vs {})",
                self.list.mapping.key.len(),
                self.docs.mapping.key.len()
            )));
        }
        Ok(())
    }
}

/// Default config file location (`~/.sharesync/config.json`).
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    sharesync_dir().map(|d| d.join("config.json"))
}

/// The per-user ShareSync directory (`~/.sharesync`).
#[must_use]
pub fn sharesync_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".sharesync"))
}
