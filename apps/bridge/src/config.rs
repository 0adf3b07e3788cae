//! Bridge configuration.
//!
//! Stored as TOML at `$HASSBRIDGE_CONFIG` when set, otherwise:
//! - Linux: `~/.config/hassbridge/bridge.toml`
//! - Windows: `%APPDATA%/hassbridge/bridge.toml`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use hassbridge_hub_connection::HubSettings;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "HASSBRIDGE_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// How to reach the hub.
    #[serde(default)]
    pub hub: HubSettings,

    /// Seconds between light state polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Run light discovery once at startup.
    #[serde(default = "default_discover_on_start")]
    pub discover_on_start: bool,
}

fn default_poll_interval() -> u64 {
    5
}

fn default_discover_on_start() -> bool {
    true
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            hub: HubSettings::default(),
            poll_interval_secs: default_poll_interval(),
            discover_on_start: default_discover_on_start(),
        }
    }
}

impl BridgeConfig {
    /// Loads configuration from disk, or creates a default if not found.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path()?)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: BridgeConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = BridgeConfig::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Writes the configuration to `path`, readable only by the owner
    /// since it holds the access token.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }
}

/// Returns the configuration file path.
pub fn config_path() -> anyhow::Result<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }

    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("hassbridge")
            .join("bridge.toml"))
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata).join("hassbridge").join("bridge.toml"))
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        Ok(PathBuf::from("/tmp/hassbridge/bridge.toml"))
    }
}
