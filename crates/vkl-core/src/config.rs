use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Top-level loader configuration, loaded from vkl.toml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    #[serde(default)]
    pub loader: LoaderSection,
    #[serde(default)]
    pub extensions: ExtensionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderSection {
    /// Log filter used when VKL_LOG is not set
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtensionConfig {
    /// Extensions hidden from applications even when supported
    #[serde(default)]
    pub disable: Vec<String>,
}

impl ExtensionConfig {
    pub fn is_disabled(&self, name: &str) -> bool {
        self.disable.iter().any(|d| d == name)
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            loader: LoaderSection::default(),
            extensions: ExtensionConfig::default(),
        }
    }
}

impl Default for LoaderSection {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
        }
    }
}

impl LoaderConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, CoreError> {
        let config: LoaderConfig = toml::from_str(content)?;
        if config.loader.log_filter.trim().is_empty() {
            return Err(CoreError::ConfigError(
                "loader.log_filter must not be empty".to_string(),
            ));
        }
        Ok(config)
    }

    /// Load configuration from file if it exists, otherwise return defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Render the configuration back to TOML.
    pub fn to_toml(&self) -> Result<String, CoreError> {
        toml::to_string_pretty(self).map_err(|e| CoreError::ConfigError(e.to_string()))
    }
}

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "VKL_CONFIG";

/// Candidate config files, most specific first: `override_path` (normally the
/// value of [`CONFIG_ENV`]), the system-wide file, then `vkl.toml` in the
/// working directory.
pub fn config_search_paths(override_path: Option<&str>) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = override_path
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
        .into_iter()
        .collect();
    paths.push(system_config_path());
    paths.push(PathBuf::from("vkl.toml"));
    paths
}

/// First existing candidate from [`config_search_paths`], or the local
/// `vkl.toml` when none exists.
pub fn default_config_path() -> PathBuf {
    let override_path = std::env::var(CONFIG_ENV).ok();
    let mut candidates = config_search_paths(override_path.as_deref());
    match candidates.iter().position(|p| p.exists()) {
        Some(found) => candidates.swap_remove(found),
        None => PathBuf::from("vkl.toml"),
    }
}

#[cfg(windows)]
fn system_config_path() -> PathBuf {
    let programdata =
        std::env::var("PROGRAMDATA").unwrap_or_else(|_| r"C:\ProgramData".to_string());
    Path::new(&programdata).join("VKL").join("vkl.toml")
}

#[cfg(not(windows))]
fn system_config_path() -> PathBuf {
    PathBuf::from("/etc/vkl/vkl.toml")
}

fn default_log_filter() -> String {
    "info".to_string()
}
