use crate::config::{ConfigManager, ServerConfig, DEFAULT_API_BASE};
use anyhow::Result;

/// Environment variable that overrides the saved API base.
pub const API_BASE_ENV: &str = "ORBIT_API_BASE";

/// Pick the API base by priority: CLI, environment, saved config, default.
pub fn resolve_server_url(
    cli_override: Option<String>,
    env_value: Option<String>,
    saved: Option<ServerConfig>,
) -> String {
    cli_override
        .filter(|u| !u.trim().is_empty())
        .or_else(|| env_value.filter(|u| !u.trim().is_empty()))
        .or_else(|| saved.map(|c| c.server_url))
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
}

/// Server configuration utility for managing the API base URL
pub struct ServerConfigManager {
    config_manager: ConfigManager,
}

impl ServerConfigManager {
    pub fn new() -> Result<Self> {
        Ok(Self::with_manager(ConfigManager::new()?))
    }

    pub fn with_manager(config_manager: ConfigManager) -> Self {
        Self { config_manager }
    }

    pub fn config_manager(&self) -> &ConfigManager {
        &self.config_manager
    }

    /// Determine the API base for this run.
    ///
    /// An unreadable saved config is logged and skipped.
    pub fn determine_server_url(&self, cli_override: Option<String>) -> String {
        let saved = self.config_manager.load_server_config().unwrap_or_else(|e| {
            log::warn!("Ignoring saved server config: {}", e);
            None
        });
        resolve_server_url(cli_override, std::env::var(API_BASE_ENV).ok(), saved)
    }

    pub fn save_server_url(&self, server_url: String) -> Result<()> {
        let config = ServerConfig {
            server_url,
            last_updated: chrono::Utc::now(),
        };
        self.config_manager.save_server_config(&config)
    }

    /// Display-friendly description of the server in use
    pub fn server_description(current_url: &str) -> &'static str {
        if current_url == DEFAULT_API_BASE {
            "Local Functions Host (default)"
        } else if current_url.contains("localhost") || current_url.contains("127.0.0.1") {
            "Local Functions Host (custom)"
        } else {
            "Custom Server"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn saved(url: &str) -> Option<ServerConfig> {
        Some(ServerConfig {
            server_url: url.to_string(),
            last_updated: chrono::Utc::now(),
        })
    }

    #[test]
    fn test_cli_override_priority() {
        let url = resolve_server_url(
            Some("http://cli:1".to_string()),
            Some("http://env:2".to_string()),
            saved("http://file:3"),
        );
        assert_eq!(url, "http://cli:1");
    }

    #[test]
    fn test_env_before_saved() {
        let url = resolve_server_url(None, Some("http://env:2".to_string()), saved("http://file:3"));
        assert_eq!(url, "http://env:2");
    }

    #[test]
    fn test_saved_then_default() {
        assert_eq!(resolve_server_url(None, None, saved("http://file:3")), "http://file:3");
        assert_eq!(resolve_server_url(None, Some("  ".to_string()), None), DEFAULT_API_BASE);
    }

    #[test]
    fn test_saved_url_is_used_by_manager() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ServerConfigManager::with_manager(
            ConfigManager::at(temp_dir.path().to_path_buf()).unwrap(),
        );
        manager.save_server_url("http://saved:9/api".to_string()).unwrap();
        let url = manager.determine_server_url(Some("http://cli:1".to_string()));
        assert_eq!(url, "http://cli:1");
    }

    #[test]
    fn test_server_description() {
        assert!(ServerConfigManager::server_description(DEFAULT_API_BASE).contains("default"));
        assert!(ServerConfigManager::server_description("http://127.0.0.1:9").contains("custom"));
        assert_eq!(
            ServerConfigManager::server_description("https://media.example/api"),
            "Custom Server"
        );
    }
}
