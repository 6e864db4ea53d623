//! Layered configuration: file values, then environment overrides.

use std::io::Write;
use std::sync::{Mutex, OnceLock};

use agent_team::config::{service, AppConfig};
use agent_team::models::GroqModel;
use agent_team::team::AgentFactory;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const CONFIG_ENV_VARS: [&str; 5] = [
    "GROQ_API_KEY",
    "GROQ_BASE_URL",
    "DUCKDUCKGO_BASE_URL",
    "YFINANCE_QUERY_URL",
    "YFINANCE_COOKIE_URL",
];

struct EnvGuard {
    saved: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    fn capture(keys: &[&str]) -> Self {
        let saved = keys
            .iter()
            .map(|key| ((*key).to_string(), std::env::var(key).ok()))
            .collect();
        Self { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.saved {
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
    }
}

fn env_lock_guard() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn clear_env() -> EnvGuard {
    let guard = EnvGuard::capture(&CONFIG_ENV_VARS);
    for key in CONFIG_ENV_VARS {
        std::env::remove_var(key);
    }
    guard
}

fn config_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn environment_overrides_file() {
    let _lock = env_lock_guard();
    let _env = clear_env();
    let file = config_file(
        "[groq]\napi_key = \"from-file\"\nbase_url = \"http://file.test\"\n\n[defaults]\nmodel = \"llama-3.2-3b-preview\"\n",
    );
    std::env::set_var("GROQ_API_KEY", "from-env");

    let config = AppConfig::load(Some(file.path())).unwrap();

    assert_eq!(config.get_api_key(service::GROQ).as_deref(), Some("from-env"));
    assert_eq!(
        config.get_base_url(service::GROQ).as_deref(),
        Some("http://file.test")
    );
    assert_eq!(config.defaults().model, GroqModel::Llama323bPreview);
}

#[test]
fn tool_endpoints_come_from_environment() {
    let _lock = env_lock_guard();
    let _env = clear_env();
    std::env::set_var("DUCKDUCKGO_BASE_URL", "http://127.0.0.1:7001");
    std::env::set_var("YFINANCE_QUERY_URL", "http://127.0.0.1:7002");

    let config = AppConfig::from_env();

    assert_eq!(
        config.get_base_url(service::DUCKDUCKGO).as_deref(),
        Some("http://127.0.0.1:7001")
    );
    assert_eq!(
        config.get_base_url(service::YFINANCE_QUERY).as_deref(),
        Some("http://127.0.0.1:7002")
    );
}

#[test]
fn invalid_file_reports_its_path() {
    let file = config_file("[groq]\napi_key = 42\n");
    let err = AppConfig::load(Some(file.path())).unwrap_err();
    assert!(err.to_string().contains(&file.path().display().to_string()));
}

#[test]
fn file_key_is_enough_to_build_agents() {
    let _lock = env_lock_guard();
    let _env = clear_env();
    let file = config_file("[groq]\napi_key = \"from-file\"\n");

    let factory = AgentFactory::new(AppConfig::load(Some(file.path())).unwrap());

    let agent = factory
        .create_script_agent(GroqModel::Llama3370bVersatile)
        .unwrap();
    assert_eq!(agent.provider().provider_name(), "groq");
    assert_eq!(agent.name(), "Agent");
}
