//! Local CLI configuration.
//!
//! A small JSON document at `<config root>/config.json`. Loaded once per
//! invocation into an explicit [`Config`] value and passed to whatever
//! needs it — no process-global config state.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::paths::write_private_file;

/// Environment variable overriding the API base URL.
pub const API_URL_ENV: &str = "MESH_API_URL";

/// Default API base URL.
pub const DEFAULT_API_URL: &str = "https://api.joinme.sh";

const CONFIG_FILE: &str = "config.json";

/// CLI configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API base URL (see [`Config::api_url`] for the env-aware accessor)
    pub api_url: String,
    /// Free-form user settings under custom keys
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            custom: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load the config, writing a default document on first run.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let config = Self::default();
                config.save(root)?;
                return Ok(config);
            }
            Err(e) => return Err(Error::Io(e)),
        };
        Ok(serde_json::from_slice(&data)?)
    }

    /// Persist the config.
    pub fn save(&self, root: &Path) -> Result<()> {
        let data = serde_json::to_vec_pretty(self)?;
        write_private_file(&root.join(CONFIG_FILE), &data)
    }

    /// Effective API base URL: `$MESH_API_URL` wins over the stored value.
    pub fn api_url(&self) -> String {
        match std::env::var(API_URL_ENV) {
            Ok(url) if !url.is_empty() => url,
            _ => self.api_url.clone(),
        }
    }

    /// Read a config value by key.
    pub fn get(&self, key: &str) -> Result<String> {
        match key {
            "api_url" => Ok(self.api_url.clone()),
            _ => self
                .custom
                .get(key)
                .cloned()
                .ok_or_else(|| Error::Config(format!("unknown config key: {key}"))),
        }
    }

    /// Set a config value by key. Unknown keys land in `custom`.
    pub fn set(&mut self, key: &str, value: &str) {
        match key {
            "api_url" => self.api_url = value.to_string(),
            _ => {
                self.custom.insert(key.to_string(), value.to_string());
            }
        }
    }

    /// All key-value pairs, for `mesh config ls`.
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut entries = vec![("api_url".to_string(), self.api_url.clone())];
        for (key, value) in &self.custom {
            entries.push((key.clone(), value.clone()));
        }
        entries
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn first_load_writes_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert!(dir.path().join(CONFIG_FILE).is_file());
    }

    #[test]
    fn set_and_reload() {
        let dir = tempdir().unwrap();
        let mut config = Config::load(dir.path()).unwrap();
        config.set("api_url", "https://mesh.example.com");
        config.set("editor", "vi");
        config.save(dir.path()).unwrap();

        let reloaded = Config::load(dir.path()).unwrap();
        assert_eq!(reloaded.get("api_url").unwrap(), "https://mesh.example.com");
        assert_eq!(reloaded.get("editor").unwrap(), "vi");
    }

    #[test]
    fn unknown_key_is_a_config_error() {
        let dir = tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert!(matches!(config.get("no_such_key"), Err(Error::Config(_))));
    }

    #[test]
    fn entries_include_custom_settings() {
        let mut config = Config::default();
        config.set("render.format", "plain");
        let entries = config.entries();
        assert!(entries.iter().any(|(k, _)| k == "api_url"));
        assert!(entries
            .iter()
            .any(|(k, v)| k == "render.format" && v == "plain"));
    }
}
