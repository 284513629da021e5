//! Global configuration loader for twinmem.
//!
//! Reads `config.toml` from the data directory (`~/.twinmem/` by default)
//! and deserializes it into [`GlobalConfig`]. Falls back to defaults when
//! the file is missing or malformed.

use std::path::{Path, PathBuf};

use secrecy::SecretString;

use twinmem_types::config::GlobalConfig;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "TWINMEM_DATA_DIR";

/// Environment variable holding the LLM API key (unused by local Ollama).
pub const LLM_API_KEY_ENV: &str = "TWINMEM_LLM_API_KEY";

/// Load global configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`GlobalConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
    };

    match toml::from_str::<GlobalConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            GlobalConfig::default()
        }
    }
}

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `TWINMEM_DATA_DIR` environment variable
/// 2. `~/.twinmem`
/// 3. `.twinmem` in the current directory
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".twinmem");
    }

    PathBuf::from(".twinmem")
}

/// Directory of the LanceDB database for `config`.
///
/// Relative paths resolve under `data_dir`.
pub fn vector_store_path(data_dir: &Path, config: &GlobalConfig) -> PathBuf {
    let path = Path::new(&config.vector_store.path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        data_dir.join(path)
    }
}

/// SQLite URL for the graph store.
///
/// A relative file path in the URL resolves under `data_dir`; `mode=rwc` is
/// appended so the file is created on first use.
pub fn graph_database_url(data_dir: &Path, config: &GlobalConfig) -> String {
    let raw = config.graph_store.url.trim();
    let rest = raw.strip_prefix("sqlite://").unwrap_or(raw);

    if rest.starts_with(':') {
        // `:memory:` and friends pass through untouched.
        return format!("sqlite://{rest}");
    }

    let (path, query) = match rest.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (rest, None),
    };

    let path = Path::new(path);
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        data_dir.join(path)
    };

    match query {
        Some(query) => format!("sqlite://{}?{query}", path.display()),
        None => format!("sqlite://{}?mode=rwc", path.display()),
    }
}

/// LLM API key from the environment, if set and non-empty.
pub fn llm_api_key() -> Option<SecretString> {
    std::env::var(LLM_API_KEY_ENV)
        .ok()
        .filter(|k| !k.trim().is_empty())
        .map(SecretString::from)
}
