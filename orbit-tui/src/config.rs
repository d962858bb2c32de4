use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::ui::theme::ColorScheme;

/// Default API base when nothing else is configured.
pub const DEFAULT_API_BASE: &str = "http://localhost:7071/api";

/// Server configuration stored locally
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub server_url: String,
    pub last_updated: chrono::DateTime<chrono::Utc>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_API_BASE.to_string(),
            last_updated: chrono::Utc::now(),
        }
    }
}

/// Display preferences stored locally
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    #[serde(default)]
    pub color_scheme: ColorScheme,
}

/// Configuration manager for the .orbit directory
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a config manager for `~/.orbit`
    pub fn new() -> Result<Self> {
        let home_dir = dirs::home_dir().context("Could not determine home directory")?;
        Self::at(home_dir.join(".orbit"))
    }

    /// Create a config manager rooted at `config_dir`, creating it if needed
    pub fn at(config_dir: PathBuf) -> Result<Self> {
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir).context("Failed to create .orbit directory")?;
        }
        Ok(Self { config_dir })
    }

    pub fn config_dir(&self) -> &PathBuf {
        &self.config_dir
    }

    fn server_config_file(&self) -> PathBuf {
        self.config_dir.join("server_config.json")
    }

    fn preferences_file(&self) -> PathBuf {
        self.config_dir.join("prefs.json")
    }

    pub fn save_server_config(&self, config: &ServerConfig) -> Result<()> {
        let json =
            serde_json::to_string_pretty(config).context("Failed to serialize server config")?;
        fs::write(self.server_config_file(), json).context("Failed to write server config file")?;
        Ok(())
    }

    pub fn load_server_config(&self) -> Result<Option<ServerConfig>> {
        let config_file = self.server_config_file();
        if !config_file.exists() {
            return Ok(None);
        }

        let json =
            fs::read_to_string(&config_file).context("Failed to read server config file")?;
        let config: ServerConfig =
            serde_json::from_str(&json).context("Failed to parse server config")?;
        Ok(Some(config))
    }

    pub fn save_preferences(&self, prefs: &UserPreferences) -> Result<()> {
        let json = serde_json::to_string_pretty(prefs).context("Failed to serialize preferences")?;
        fs::write(self.preferences_file(), json).context("Failed to write preferences file")?;
        Ok(())
    }

    /// Load preferences. A missing or unreadable file yields defaults.
    pub fn load_preferences(&self) -> UserPreferences {
        let path = self.preferences_file();
        let Ok(json) = fs::read_to_string(&path) else {
            return UserPreferences::default();
        };
        serde_json::from_str(&json).unwrap_or_else(|e| {
            log::warn!("Ignoring unreadable preferences at {}: {}", path.display(), e);
            UserPreferences::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_server_config_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManager::at(temp_dir.path().join(".orbit")).unwrap();
        assert!(manager.load_server_config().unwrap().is_none());

        let config = ServerConfig {
            server_url: "https://media.example/api".to_string(),
            last_updated: chrono::Utc::now(),
        };
        manager.save_server_config(&config).unwrap();

        let loaded = manager.load_server_config().unwrap().unwrap();
        assert_eq!(loaded.server_url, "https://media.example/api");
    }

    #[test]
    fn test_preferences_default_when_missing_or_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManager::at(temp_dir.path().to_path_buf()).unwrap();
        assert_eq!(manager.load_preferences(), UserPreferences::default());

        fs::write(temp_dir.path().join("prefs.json"), "{not json").unwrap();
        assert_eq!(manager.load_preferences(), UserPreferences::default());

        let prefs = UserPreferences {
            color_scheme: ColorScheme::Light,
        };
        manager.save_preferences(&prefs).unwrap();
        assert_eq!(manager.load_preferences(), prefs);
    }
}
