//! Layered configuration for Taskboard.
//!
//! Values are resolved in three layers, later layers winning:
//!
//! 1. `taskboard.toml` in the working directory (optional)
//! 2. Environment variables, including `.env` in the same directory
//! 3. CLI flags, applied by the command handlers
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 5000
//! db_path = ".taskboard/taskboard.db"
//! client_url = "https://board.example.com"
//! dev_mode = false
//!
//! [ai]
//! api_key = "..."
//! model = "gemini-2.5-flash"
//! endpoint = "https://generativelanguage.googleapis.com/v1beta"
//!
//! [log]
//! format = "pretty"
//!
//! [client]
//! api_url = "http://localhost:5000"
//! offline = false
//! connect_timeout_secs = 3
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = "taskboard.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    /// Extra CORS origin besides `http://localhost:3000`; `*` mirrors any origin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_url: Option<String>,
    /// Permissive CORS and bind on all interfaces.
    pub dev_mode: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            db_path: PathBuf::from(".taskboard/taskboard.db"),
            client_url: None,
            dev_mode: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => anyhow::bail!("Invalid log format '{}'. Valid values: pretty, json", s),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub format: LogFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub api_url: String,
    /// Never contact the backend; every board mutation stays local.
    pub offline: bool,
    pub connect_timeout_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5000".to_string(),
            offline: false,
            connect_timeout_secs: 3,
        }
    }
}

/// The complete taskboard.toml configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskboardConfig {
    pub server: ServerSettings,
    pub ai: AiSettings,
    pub log: LogSettings,
    pub client: ClientSettings,
}

impl TaskboardConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse taskboard.toml")
    }

    /// Load `taskboard.toml` from `dir`, or defaults if it doesn't exist.
    pub fn load_or_default(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize taskboard.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// File layer plus environment layer for the given directory.
    pub fn resolve(dir: &Path) -> Result<Self> {
        match dotenvy::from_path(dir.join(".env")) {
            Ok(()) => {}
            Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e).context("Failed to load .env"),
        }
        let mut config = Self::load_or_default(dir)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Overlay environment values. `lookup` is injectable for tests.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("Invalid PORT value '{}'", port))?;
        }
        if let Some(path) = lookup("DATABASE_PATH") {
            self.server.db_path = PathBuf::from(path);
        }
        if let Some(url) = lookup("CLIENT_URL") {
            self.server.client_url = Some(url);
        }
        if let Some(key) = lookup("GEMINI_API_KEY") {
            self.ai.api_key = Some(key);
        }
        if let Some(model) = lookup("GEMINI_MODEL") {
            self.ai.model = model;
        }
        if let Some(endpoint) = lookup("GEMINI_ENDPOINT") {
            self.ai.endpoint = endpoint;
        }
        if let Some(format) = lookup("TASKBOARD_LOG_FORMAT") {
            self.log.format = format.parse()?;
        }
        if let Some(url) = lookup("TASKBOARD_API_URL") {
            self.client.api_url = url;
        }
        if let Some(offline) = lookup("TASKBOARD_OFFLINE") {
            self.client.offline = offline != "false" && offline != "0";
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = TaskboardConfig::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(
            config.server.db_path,
            PathBuf::from(".taskboard/taskboard.db")
        );
        assert_eq!(config.ai.model, "gemini-2.5-flash");
        assert_eq!(config.log.format, LogFormat::Pretty);
        assert_eq!(config.client.api_url, "http://localhost:5000");
        assert!(!config.client.offline);
    }

    #[test]
    fn test_parse_partial_file() {
        let config = TaskboardConfig::parse(
            r#"
            [server]
            port = 8080

            [log]
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.ai, AiSettings::default());
    }

    #[test]
    fn test_parse_rejects_bad_toml() {
        assert!(TaskboardConfig::parse("[server\nport = 1").is_err());
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = TaskboardConfig::parse("[server]\nport = 8080\n").unwrap();
        config
            .apply_env(env(&[
                ("PORT", "9090"),
                ("DATABASE_PATH", "/tmp/board.db"),
                ("CLIENT_URL", "https://board.example.com"),
                ("GEMINI_API_KEY", "secret"),
                ("TASKBOARD_OFFLINE", "1"),
            ]))
            .unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.db_path, PathBuf::from("/tmp/board.db"));
        assert_eq!(
            config.server.client_url.as_deref(),
            Some("https://board.example.com")
        );
        assert_eq!(config.ai.api_key.as_deref(), Some("secret"));
        assert!(config.client.offline);
    }

    #[test]
    fn test_env_invalid_port() {
        let mut config = TaskboardConfig::default();
        let err = config.apply_env(env(&[("PORT", "http")])).unwrap_err();
        assert!(err.to_string().contains("Invalid PORT"));
    }

    #[test]
    fn test_env_invalid_log_format() {
        let mut config = TaskboardConfig::default();
        assert!(
            config
                .apply_env(env(&[("TASKBOARD_LOG_FORMAT", "xml")]))
                .is_err()
        );
    }

    #[test]
    fn test_load_or_default_and_save_roundtrip() {
        let dir = tempdir().unwrap();
        let loaded = TaskboardConfig::load_or_default(dir.path()).unwrap();
        assert_eq!(loaded, TaskboardConfig::default());

        let mut config = TaskboardConfig::default();
        config.server.port = 7000;
        config.client.offline = true;
        config.save(&dir.path().join(CONFIG_FILE_NAME)).unwrap();

        let reloaded = TaskboardConfig::load_or_default(dir.path()).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_resolve_rejects_malformed_dotenv() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), "this is not valid\n").unwrap();
        let err = TaskboardConfig::resolve(dir.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to load .env"));
    }
}
