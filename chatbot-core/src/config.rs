use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Where the HTTP server binds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8000 }
    }
}

/// Open-Meteo endpoints used by the weather lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Geocoding API base, `/search` is appended.
    pub geocoding_url: String,
    /// Forecast API base, `/forecast` is appended.
    pub forecast_url: String,
    pub language: String,
    pub timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            geocoding_url: "https://geocoding-api.open-meteo.com/v1".to_string(),
            forecast_url: "https://api.open-meteo.com/v1".to_string(),
            language: "en".to_string(),
            timeout_secs: 8,
        }
    }
}

/// Optional language-model fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    pub enabled: bool,
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            model: "gpt-3.5-turbo".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout_secs: 20,
        }
    }
}

impl CompletionConfig {
    /// The fallback only runs when it is switched on *and* has a credential.
    pub fn is_active(&self) -> bool {
        self.enabled && self.api_key().is_some()
    }

    /// Returns the API key, treating a blank string as absent.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [server]
/// port = 8080
///
/// [completion]
/// enabled = true
/// api_key = "..."
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub weather: WeatherConfig,
    pub completion: CompletionConfig,
}

impl Config {
    /// Load config from the platform config directory, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    /// Load config from an explicit path, then apply environment overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut cfg = Self::load_file(path)?;
        cfg.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    /// Only the file contents, or defaults if it doesn't exist yet.
    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Apply `USE_OPENAI`, `OPENAI_API_KEY`, `CHATBOT_HOST` and `CHATBOT_PORT`.
    ///
    /// The lookup is injected so tests don't have to touch the process environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(flag) = lookup("USE_OPENAI") {
            self.completion.enabled = flag.trim().eq_ignore_ascii_case("true");
        }
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.completion.api_key = Some(key);
        }
        if let Some(host) = lookup("CHATBOT_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("CHATBOT_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("CHATBOT_PORT is not a valid port: {port}"))?;
        }
        Ok(())
    }

    /// Save config to the platform config directory.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "chatbot", "chatbot")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Convenience helper: enable the completion fallback with the given key.
    pub fn enable_completion(&mut self, api_key: String) {
        self.completion.enabled = true;
        self.completion.api_key = Some(api_key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_keep_completion_off() {
        let cfg = Config::default();
        assert!(!cfg.completion.enabled);
        assert!(!cfg.completion.is_active());
        assert_eq!(cfg.weather.timeout_secs, 8);
        assert_eq!(cfg.completion.timeout_secs, 20);
    }

    #[test]
    fn completion_needs_both_flag_and_key() {
        let mut cfg = Config::default();
        cfg.completion.enabled = true;
        assert!(!cfg.completion.is_active());

        cfg.completion.api_key = Some("   ".into());
        assert!(!cfg.completion.is_active());

        cfg.enable_completion("sk-test".into());
        assert!(cfg.completion.is_active());
        assert_eq!(cfg.completion.api_key(), Some("sk-test"));
    }

    #[test]
    fn env_overrides_apply() {
        let mut cfg = Config::default();
        cfg.apply_env_overrides(env(&[
            ("USE_OPENAI", "TRUE"),
            ("OPENAI_API_KEY", "sk-env"),
            ("CHATBOT_PORT", "9090"),
        ]))
        .expect("overrides should apply");

        assert!(cfg.completion.is_active());
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.server.host, "127.0.0.1");
    }

    #[test]
    fn use_openai_other_than_true_disables() {
        let mut cfg = Config::default();
        cfg.completion.enabled = true;
        cfg.apply_env_overrides(env(&[("USE_OPENAI", "yes")])).expect("overrides should apply");
        assert!(!cfg.completion.enabled);
    }

    #[test]
    fn invalid_port_is_an_error() {
        let mut cfg = Config::default();
        let err = cfg.apply_env_overrides(env(&[("CHATBOT_PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("CHATBOT_PORT"));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [completion]
            enabled = true
            api_key = "abc"
            "#,
        )
        .expect("toml should parse");

        assert!(cfg.completion.is_active());
        assert_eq!(cfg.completion.model, "gpt-3.5-turbo");
        assert_eq!(cfg.server, ServerConfig::default());
        assert_eq!(cfg.weather, WeatherConfig::default());
    }

    #[test]
    fn save_then_load_from_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.server.port = 3000;
        cfg.save_to(&path).expect("save should succeed");

        let loaded = Config::load_file(&path).expect("load should succeed");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config::load_file(&dir.path().join("absent.toml")).expect("load should succeed");
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "server = 12").expect("write");

        let err = Config::load_file(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
