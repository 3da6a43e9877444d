//! Configuration handling for the docquery CLI
//!
//! Reads an optional `docquery.toml` from the working directory.
//!
//! ## Environment Variables
//!
//! - `DOCQUERY_DATA` - Record data file (JSON object of tables)
//! - `DOCQUERY_EXTENSIONS` - Comma-separated document extensions, e.g. `md,markdown`
//!
//! These can be set in a `.env` file next to the configuration file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{DocqueryError, DocqueryResult};

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = "docquery.toml";

/// Environment variable names
pub const ENV_DATA: &str = "DOCQUERY_DATA";
pub const ENV_EXTENSIONS: &str = "DOCQUERY_EXTENSIONS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Record data file, relative to the configuration directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<PathBuf>,
    /// Extensions of documents picked up when walking a directory
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Patterns to ignore
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,
}

fn default_extensions() -> Vec<String> {
    vec!["md".to_string()]
}

fn default_ignore() -> Vec<String> {
    vec![".git".to_string(), "node_modules".to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: None,
            extensions: default_extensions(),
            ignore: default_ignore(),
        }
    }
}

impl Config {
    /// Load configuration from a directory
    ///
    /// A missing configuration file is not an error: defaults are used. Any
    /// `.env` file in the directory is loaded first so that its variables
    /// take part in the overrides.
    pub fn load(dir: &Path) -> DocqueryResult<Self> {
        let env_path = dir.join(".env");
        if env_path.exists() {
            if let Err(e) = dotenvy::from_path(&env_path) {
                warn!("Ignoring {}: {}", env_path.display(), e);
            }
        }

        let config_path = dir.join(CONFIG_FILE_NAME);
        let mut config = if config_path.exists() {
            Self::load_file(&config_path)?
        } else {
            debug!("No {} in {}, using defaults", CONFIG_FILE_NAME, dir.display());
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse a configuration file without looking at the environment.
    pub fn load_file(path: &Path) -> DocqueryResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        if config.extensions.is_empty() {
            return Err(DocqueryError::ConfigError(format!(
                "{}: 'extensions' must not be empty",
                path.display()
            )));
        }
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(
            std::env::var(ENV_DATA).ok(),
            std::env::var(ENV_EXTENSIONS).ok(),
        );
    }

    fn apply_overrides(&mut self, data: Option<String>, extensions: Option<String>) {
        if let Some(data) = data.filter(|d| !d.is_empty()) {
            self.data = Some(PathBuf::from(data));
        }

        if let Some(extensions) = extensions {
            let parsed: Vec<String> = extensions
                .split(',')
                .map(|ext| ext.trim().trim_start_matches('.').to_string())
                .filter(|ext| !ext.is_empty())
                .collect();
            if !parsed.is_empty() {
                self.extensions = parsed;
            }
        }
    }

    /// Record data file, resolved against `config_dir` when relative.
    pub fn data_path(&self, config_dir: &Path) -> Option<PathBuf> {
        self.data.as_ref().map(|data| {
            if data.is_absolute() {
                data.clone()
            } else {
                config_dir.join(data)
            }
        })
    }

    /// Check if a path should be ignored
    pub fn should_ignore(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();

        for pattern in &self.ignore {
            if let Some(ext) = pattern.strip_prefix("*.") {
                if path_str.ends_with(&format!(".{}", ext)) {
                    return true;
                }
            } else if path_str.contains(pattern.as_str()) {
                return true;
            }
        }

        false
    }

    /// Whether a file found while walking a directory is a document to evaluate.
    pub fn is_document(&self, path: &Path) -> bool {
        if self.should_ignore(path) {
            return false;
        }
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }
}
