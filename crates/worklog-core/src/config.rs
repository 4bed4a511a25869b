use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Per-repository configuration, read from `.worklog/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub git: GitIdentity,
    #[serde(default)]
    pub monitor: MonitorConfig,
}

/// Author identity used for every commit the store makes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitIdentity {
    #[serde(default = "default_user_name")]
    pub user_name: String,
    #[serde(default = "default_user_email")]
    pub user_email: String,
}

impl Default for GitIdentity {
    fn default() -> Self {
        Self {
            user_name: default_user_name(),
            user_email: default_user_email(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Days without an update before a non-terminal item counts as stale.
    #[serde(default = "default_stale_after_days")]
    pub stale_after_days: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            stale_after_days: default_stale_after_days(),
        }
    }
}

/// Per-user configuration, read from `<config_dir>/worklog/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserConfig {
    /// Preferred CLI output mode: `human` or `json`.
    #[serde(default)]
    pub output: Option<String>,
    /// Fallback author identity when the repo config carries none.
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
}

pub fn load_store_config(repo_root: &Path) -> Result<StoreConfig> {
    let path = repo_root.join(".worklog/config.toml");
    if !path.exists() {
        return Ok(StoreConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<StoreConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("worklog/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Merge the user-level identity fallback into a store config.
#[must_use]
pub fn with_user_fallback(mut store: StoreConfig, user: &UserConfig) -> StoreConfig {
    if store.git.user_name == default_user_name() {
        if let Some(name) = &user.user_name {
            store.git.user_name = name.clone();
        }
    }
    if store.git.user_email == default_user_email() {
        if let Some(email) = &user.user_email {
            store.git.user_email = email.clone();
        }
    }
    store
}

fn default_user_name() -> String {
    "Worklog Bot".to_string()
}

fn default_user_email() -> String {
    "bot@worklog.local".to_string()
}

const fn default_stale_after_days() -> u32 {
    7
}
