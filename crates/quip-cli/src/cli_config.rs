//! Persistent CLI configuration.

use std::env;
use std::path::{Path, PathBuf};

use quip_core::config::SyncSettings;
use quip_core::util::non_blank;
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "cli-config.json";
pub const SYNC_ENDPOINT_ENV: &str = "QUIP_SYNC_ENDPOINT";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliConfig {
    #[serde(default = "default_config_version")]
    pub version: u32,
    #[serde(default)]
    pub sync: SyncSettings,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            version: default_config_version(),
            sync: SyncSettings::default(),
        }
    }
}

const fn default_config_version() -> u32 {
    1
}

pub fn default_config_path() -> Result<PathBuf, String> {
    dirs::config_dir()
        .map(|dir| dir.join("quip").join(CONFIG_FILE_NAME))
        .ok_or_else(|| "Failed to resolve CLI config directory".to_string())
}

impl CliConfig {
    pub fn load() -> Result<Self, String> {
        Self::load_from_path(&default_config_path()?)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|error| format!("Failed to read config at {}: {}", path.display(), error))?;
        let config = serde_json::from_str::<Self>(&raw)
            .map_err(|error| format!("Failed to parse config at {}: {}", path.display(), error))?;
        config
            .normalized()
            .map_err(|error| format!("Invalid config at {}: {}", path.display(), error))
    }

    pub fn save(&self) -> Result<PathBuf, String> {
        let path = default_config_path()?;
        self.save_to_path(&path)?;
        Ok(path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| {
                format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    error
                )
            })?;
        }

        let normalized = self.clone().normalized().map_err(|error| error.to_string())?;
        let serialized = serde_json::to_string_pretty(&normalized)
            .map_err(|error| format!("Failed to serialize config: {error}"))?;
        std::fs::write(path, serialized)
            .map_err(|error| format!("Failed to write config at {}: {}", path.display(), error))
    }

    /// Sync settings with the `QUIP_SYNC_ENDPOINT` override applied
    pub fn effective_sync_settings(&self) -> Result<SyncSettings, String> {
        self.sync_settings_with_override(env::var(SYNC_ENDPOINT_ENV).ok())
    }

    pub fn sync_settings_with_override(
        &self,
        endpoint_override: Option<String>,
    ) -> Result<SyncSettings, String> {
        let mut settings = self.sync.clone();
        if let Some(endpoint) = endpoint_override.as_deref().and_then(non_blank) {
            settings.endpoint = endpoint;
        }
        settings.validated().map_err(|error| error.to_string())
    }

    fn normalized(mut self) -> Result<Self, quip_core::Error> {
        self.sync = self.sync.validated()?;
        Ok(self)
    }
}
