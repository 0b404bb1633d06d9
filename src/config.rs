//! Configuration management.
//!
//! A config file is optional. An explicit `--config` path wins; otherwise
//! `prefer` discovers `sovereign.*` in its standard locations. Environment variables override file values; secrets only ever come from
//! the environment.
//!
//! Env vars: SOVEREIGN_DATABASE_URL, SOVEREIGN_PUBLIC_URL, SOVEREIGN_BIND
//! (plus the model, pub/sub and email variables read by their sections)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::email::EmailConfig;
use crate::llm::LlmConfig;
use crate::notify::NotifyConfig;
use crate::repository::DbContext;

const CONFIG_STEM: &str = "sovereign";
const DEFAULT_DATABASE_FILENAME: &str = "sovereign.db";
pub const DEFAULT_BIND: &str = "127.0.0.1:3030";
const DEFAULT_PUBLIC_URL: &str = "http://localhost:3030";

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Database URL or path (`sqlite:` prefix optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    /// Base URL magic links point at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
    /// Default `host:port` for `serve`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub email: EmailConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Discover and load configuration, then apply environment overrides.
    pub async fn load(explicit: Option<&Path>) -> Result<Self, String> {
        let config = match explicit {
            Some(path) => Self::load_from_path(path).await?,
            None => match discover().await {
                Some(path) => Self::load_from_path(&path).await?,
                None => {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };
        Ok(config.with_env_overrides())
    }

    /// Load configuration from a specific file path.
    /// The format follows the extension; anything unknown is read as JSON.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("SOVEREIGN_DATABASE_URL") {
            self.database_url = Some(url);
        }
        if let Ok(url) = std::env::var("SOVEREIGN_PUBLIC_URL") {
            self.public_url = Some(url);
        }
        if let Ok(bind) = std::env::var("SOVEREIGN_BIND") {
            self.bind = Some(bind);
        }
        self.llm = self.llm.with_env_overrides();
        self.notify = self.notify.with_env_overrides();
        self.email = self.email.with_env_overrides();
        self
    }

    /// Directory of the loaded config file, for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    pub fn to_settings(&self) -> Settings {
        let mut settings = Settings::default();
        if let Some(url) = &self.database_url {
            settings.database_url = Some(self.resolve_database_url(url));
        }
        if let Some(url) = &self.public_url {
            settings.public_url = url.trim_end_matches('/').to_string();
        }
        if let Some(bind) = &self.bind {
            settings.bind = bind.clone();
        }
        settings
    }

    /// Relative SQLite paths in a config file are relative to that file.
    fn resolve_database_url(&self, url: &str) -> String {
        let path_part = url.strip_prefix("sqlite:").unwrap_or(url);
        let path = Path::new(path_part);
        match self.base_dir() {
            Some(base) if path.is_relative() && !path_part.starts_with("//") => {
                format!("sqlite:{}", base.join(path).display())
            }
            _ => url.to_string(),
        }
    }
}

/// Locate a config file with `prefer`; parsing stays with serde so the
/// extension picks the format.
async fn discover() -> Option<PathBuf> {
    match prefer::load(CONFIG_STEM).await {
        Ok(found) => {
            let path = found.source_path().map(|p| p.to_path_buf());
            if let Some(path) = &path {
                debug!("Using config file {}", path.display());
            }
            path
        }
        Err(e) => {
            debug!("Config discovery: {}", e);
            None
        }
    }
}

/// Resolved runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory (holds the default database).
    pub data_dir: PathBuf,
    /// Explicit database URL; overrides `data_dir` when set.
    pub database_url: Option<String>,
    pub public_url: String,
    pub bind: String,
}

impl Default for Settings {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_STEM);
        Self {
            data_dir,
            database_url: None,
            public_url: DEFAULT_PUBLIC_URL.to_string(),
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

impl Settings {
    /// Get the database URL, constructing from path if not explicitly set.
    pub fn database_url(&self) -> String {
        match &self.database_url {
            Some(url) => url.clone(),
            None => format!(
                "sqlite:{}",
                self.data_dir.join(DEFAULT_DATABASE_FILENAME).display()
            ),
        }
    }

    /// Create the directory the SQLite file lives in.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        let url = self.database_url();
        let path = Path::new(url.strip_prefix("sqlite:").unwrap_or(&url));
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!("Cannot create {}: {}", parent.display(), e);
                return Err(e);
            }
        }
        Ok(())
    }

    pub fn create_db_context(&self) -> DbContext {
        DbContext::new(&self.database_url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_load_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sovereign.toml");
        std::fs::write(
            &path,
            r#"
database_url = "data/app.db"
public_url = "https://app.example.com/"

[llm]
model = "gemini-1.5-pro"
temperature = 0.4

[notify]
app_key = "pk_live"
"#,
        )
        .unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        assert_eq!(config.llm.model, "gemini-1.5-pro");
        assert_eq!(config.llm.max_output_tokens, 8192);
        assert_eq!(config.notify.app_key.as_deref(), Some("pk_live"));

        let settings = config.to_settings();
        assert_eq!(settings.public_url, "https://app.example.com");
        assert_eq!(
            settings.database_url(),
            format!("sqlite:{}", dir.path().join("data/app.db").display())
        );
    }

    #[tokio::test]
    async fn test_load_yaml_and_json() {
        let dir = tempdir().unwrap();
        let yaml = dir.path().join("c.yaml");
        std::fs::write(&yaml, "bind: 0.0.0.0:8080\nllm:\n  project: acme\n").unwrap();
        let config = Config::load_from_path(&yaml).await.unwrap();
        assert_eq!(config.bind.as_deref(), Some("0.0.0.0:8080"));
        assert_eq!(config.llm.project.as_deref(), Some("acme"));

        let json = dir.path().join("c.json");
        std::fs::write(&json, r#"{"email": {"from": "me@studio.io"}}"#).unwrap();
        let config = Config::load_from_path(&json).await.unwrap();
        assert_eq!(config.email.from, "me@studio.io");
    }

    #[tokio::test]
    async fn test_invalid_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "llm = [").unwrap();
        let err = Config::load_from_path(&path).await.unwrap_err();
        assert!(err.contains("TOML"));
    }

    #[tokio::test]
    async fn test_explicit_path_skips_discovery() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.yml");
        std::fs::write(&path, "public_url: https://studio.example\n").unwrap();

        let config = Config::load(Some(&path)).await.unwrap();
        assert_eq!(config.source_path.as_deref(), Some(path.as_path()));
        assert_eq!(config.base_dir().as_deref(), Some(dir.path()));

        let missing = dir.path().join("absent.toml");
        assert!(Config::load(Some(&missing)).await.is_err());
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert!(settings.database_url().ends_with("sovereign.db"));
        assert_eq!(settings.bind, DEFAULT_BIND);
    }

    #[test]
    fn test_absolute_database_url_untouched() {
        let config = Config {
            database_url: Some("sqlite:/var/lib/sovereign.db".to_string()),
            source_path: Some(PathBuf::from("/etc/sovereign/config.toml")),
            ..Default::default()
        };
        assert_eq!(
            config.to_settings().database_url(),
            "sqlite:/var/lib/sovereign.db"
        );
    }
}
