//! Layered configuration: defaults < TOML file < environment.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use serde::Deserialize;

use crate::error::AgentError;
use crate::models::{GroqModel, Temperature};

const CONFIG_FILE_NAME: &str = "config.toml";

/// Service keys used for API keys and base URL overrides.
pub mod service {
    pub const GROQ: &str = "groq";
    pub const DUCKDUCKGO: &str = "duckduckgo";
    pub const YFINANCE_QUERY: &str = "yfinance-query";
    pub const YFINANCE_COOKIE: &str = "yfinance-cookie";
}

/// Defaults applied when an agent is built without explicit overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentDefaults {
    pub model: GroqModel,
    pub temperature: Temperature,
    pub max_tokens: u32,
    pub retry_on_error: bool,
    pub retry_count: u32,
}

impl Default for AgentDefaults {
    fn default() -> Self {
        Self {
            model: GroqModel::default(),
            temperature: Temperature::DEFAULT,
            max_tokens: 1024,
            retry_on_error: true,
            retry_count: 3,
        }
    }
}

/// Configuration shared by the runner, the shell and the agent factory.
///
/// Keys and URLs sit behind shared locks so clones observe later overrides.
#[derive(Clone)]
pub struct AppConfig {
    api_keys: Arc<RwLock<HashMap<String, String>>>,
    base_urls: Arc<RwLock<HashMap<String, String>>>,
    defaults: AgentDefaults,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<String> = self
            .api_keys
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        f.debug_struct("AppConfig")
            .field("api_keys", &keys)
            .field("base_urls", &self.base_urls)
            .field("defaults", &self.defaults)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AppConfig {
    /// Empty config with built-in defaults.
    pub fn new() -> Self {
        Self {
            api_keys: Arc::new(RwLock::new(HashMap::new())),
            base_urls: Arc::new(RwLock::new(HashMap::new())),
            defaults: AgentDefaults::default(),
        }
    }

    /// Load from the environment only (GROQ_API_KEY, base URL overrides).
    pub fn from_env() -> Self {
        let config = Self::new();
        config.apply_env();
        config
    }

    /// Full layered load.
    ///
    /// An explicit `path` must exist; otherwise the platform config file is
    /// read when present.
    pub fn load(path: Option<&Path>) -> Result<Self, AgentError> {
        let mut config = Self::new();
        match path {
            Some(path) => config.apply_file(path)?,
            None => {
                if let Some(default_path) = default_config_path() {
                    if default_path.is_file() {
                        config.apply_file(&default_path)?;
                    }
                }
            }
        }
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&self) {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error

        if let Ok(key) = std::env::var("GROQ_API_KEY") {
            self.set_api_key(service::GROQ, key);
        }

        let url_mappings = [
            ("GROQ_BASE_URL", service::GROQ),
            ("DUCKDUCKGO_BASE_URL", service::DUCKDUCKGO),
            ("YFINANCE_QUERY_URL", service::YFINANCE_QUERY),
            ("YFINANCE_COOKIE_URL", service::YFINANCE_COOKIE),
        ];
        for (env_var, service) in &url_mappings {
            if let Ok(url) = std::env::var(env_var) {
                self.set_base_url(service, url);
            }
        }
    }

    fn apply_file(&mut self, path: &Path) -> Result<(), AgentError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AgentError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        let file: ConfigFile = toml::from_str(&raw).map_err(|e| {
            AgentError::Configuration(format!("invalid {}: {e}", path.display()))
        })?;
        tracing::debug!(path = %path.display(), "loaded config file");

        if let Some(groq) = file.groq {
            if let Some(key) = groq.api_key {
                self.set_api_key(service::GROQ, key);
            }
            if let Some(url) = groq.base_url {
                self.set_base_url(service::GROQ, url);
            }
        }
        if let Some(tools) = file.tools {
            let urls = [
                (tools.duckduckgo_base_url, service::DUCKDUCKGO),
                (tools.yfinance_query_url, service::YFINANCE_QUERY),
                (tools.yfinance_cookie_url, service::YFINANCE_COOKIE),
            ];
            for (url, service) in urls {
                if let Some(url) = url {
                    self.set_base_url(service, url);
                }
            }
        }
        if let Some(defaults) = file.defaults {
            if let Some(model) = defaults.model {
                self.defaults.model = model;
            }
            if let Some(temperature) = defaults.temperature {
                self.defaults.temperature = temperature;
            }
            if let Some(max_tokens) = defaults.max_tokens {
                self.defaults.max_tokens = max_tokens;
            }
            if let Some(retry) = defaults.retry_on_error {
                self.defaults.retry_on_error = retry;
            }
            if let Some(count) = defaults.retry_count {
                self.defaults.retry_count = count;
            }
        }
        Ok(())
    }

    pub fn defaults(&self) -> &AgentDefaults {
        &self.defaults
    }

    pub fn with_defaults(mut self, defaults: AgentDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn set_api_key(&self, service: &str, key: String) {
        self.api_keys
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(service.to_string(), key);
    }

    pub fn get_api_key(&self, service: &str) -> Option<String> {
        self.api_keys
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(service)
            .cloned()
    }

    pub fn set_base_url(&self, service: &str, url: String) {
        self.base_urls
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(service.to_string(), url);
    }

    pub fn get_base_url(&self, service: &str) -> Option<String> {
        self.base_urls
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(service)
            .cloned()
    }

    pub fn has_credentials(&self, service: &str) -> bool {
        self.get_api_key(service).is_some()
    }
}

/// Platform config file location (e.g. `~/.config/agent-team/config.toml`).
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "agent-team")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    groq: Option<GroqSection>,
    tools: Option<ToolsSection>,
    defaults: Option<DefaultsSection>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GroqSection {
    api_key: Option<String>,
    base_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ToolsSection {
    duckduckgo_base_url: Option<String>,
    yfinance_query_url: Option<String>,
    yfinance_cookie_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DefaultsSection {
    model: Option<GroqModel>,
    temperature: Option<Temperature>,
    max_tokens: Option<u32>,
    retry_on_error: Option<bool>,
    retry_count: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn file_overrides_defaults() {
        let file = write_config(
            r#"
[groq]
api_key = "file-key"

[defaults]
model = "llama-3.3-70b-versatile"
temperature = 0.2
max_tokens = 2048
retry_count = 5
"#,
        );
        let mut config = AppConfig::new();
        config.apply_file(file.path()).unwrap();

        assert_eq!(config.get_api_key(service::GROQ).as_deref(), Some("file-key"));
        assert_eq!(config.defaults().model, GroqModel::Llama3370bVersatile);
        assert_eq!(config.defaults().temperature.value(), 0.2);
        assert_eq!(config.defaults().max_tokens, 2048);
        assert_eq!(config.defaults().retry_count, 5);
        assert!(config.defaults().retry_on_error);
    }

    #[test]
    fn file_with_unknown_model_is_a_configuration_error() {
        let file = write_config("[defaults]\nmodel = \"gpt-4o\"\n");
        let err = AppConfig::new().apply_file(file.path()).unwrap_err();
        assert!(matches!(err, AgentError::Configuration(_)));
    }

    #[test]
    fn file_with_out_of_range_temperature_is_rejected() {
        let file = write_config("[defaults]\ntemperature = 1.5\n");
        assert!(AppConfig::new().apply_file(file.path()).is_err());
    }

    #[test]
    fn tool_urls_are_read_from_file() {
        let file = write_config(
            "[tools]\nduckduckgo_base_url = \"http://localhost:1\"\nyfinance_query_url = \"http://localhost:2\"\n",
        );
        let mut config = AppConfig::new();
        config.apply_file(file.path()).unwrap();
        assert_eq!(
            config.get_base_url(service::DUCKDUCKGO).as_deref(),
            Some("http://localhost:1")
        );
        assert_eq!(
            config.get_base_url(service::YFINANCE_QUERY).as_deref(),
            Some("http://localhost:2")
        );
        assert_eq!(config.get_base_url(service::YFINANCE_COOKIE), None);
    }

    #[test]
    fn missing_explicit_file_fails() {
        let err = AppConfig::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, AgentError::Configuration(_)));
    }

    #[test]
    fn clones_share_keys() {
        let config = AppConfig::new();
        let clone = config.clone();
        config.set_api_key(service::GROQ, "k".into());
        assert!(clone.has_credentials(service::GROQ));
    }

    #[test]
    fn debug_output_hides_key_values() {
        let config = AppConfig::new();
        config.set_api_key(service::GROQ, "super-secret".into());
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("groq"));
    }
}
