//! Configuration loading and database path resolution
//!
//! Resolution priority for the database location:
//! 1. Explicit argument from the embedding application (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)

use serde::Deserialize;
use std::path::PathBuf;
use tunemap_common::Result;

/// Environment variable overriding the database path
pub const ENV_DATABASE: &str = "TUNEMAP_DB";
/// Environment variable overriding the recorder endpoint
pub const ENV_RECORDER_URL: &str = "TUNEMAP_RECORDER_URL";
/// Environment variable carrying the generative-text API key
pub const ENV_API_KEY: &str = "GEMINI_API_KEY";

/// Generative remark request parameters
#[derive(Debug, Clone)]
pub struct RemarkConfig {
    /// API key; None means the capability degrades to the fallback remark
    pub api_key: Option<String>,
    /// Model identifier
    pub model: String,
    /// Token ceiling for the response
    pub max_output_tokens: u32,
    /// Thinking budget passed alongside the token ceiling
    pub thinking_budget: u32,
}

impl Default for RemarkConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-3-flash-preview".to_string(),
            max_output_tokens: 1000,
            thinking_budget: 500,
        }
    }
}

/// Core configuration
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// SQLite database holding snapshots and the last-identity pointer
    pub database_path: PathBuf,
    /// Recorder endpoint; None disables the recorder client constructor
    pub recorder_url: Option<String>,
    pub remark: RemarkConfig,
    /// Listening period in seconds, fed to the unlock engine
    pub unlock_secs: u64,
    /// Tick cadence for the unlock engine in milliseconds
    pub tick_interval_ms: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            recorder_url: None,
            remark: RemarkConfig::default(),
            unlock_secs: 150,
            tick_interval_ms: 500,
        }
    }
}

/// TOML file shape (all keys optional)
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    database_path: Option<String>,
    recorder_url: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    unlock_secs: Option<u64>,
    tick_interval_ms: Option<u64>,
}

impl CoreConfig {
    /// Load configuration following the priority order above.
    ///
    /// `database_arg` is the embedding application's explicit override.
    pub fn load(database_arg: Option<&str>) -> Result<Self> {
        Self::from_sources(database_arg, read_config_file().unwrap_or_default())
    }

    fn from_sources(database_arg: Option<&str>, file: ConfigFile) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = database_arg {
            config.database_path = PathBuf::from(path);
        } else if let Ok(path) = std::env::var(ENV_DATABASE) {
            config.database_path = PathBuf::from(path);
        } else if let Some(path) = &file.database_path {
            config.database_path = PathBuf::from(path);
        }

        if let Ok(url) = std::env::var(ENV_RECORDER_URL) {
            config.recorder_url = Some(url);
        } else if let Some(url) = &file.recorder_url {
            config.recorder_url = Some(url.clone());
        }

        if let Ok(key) = std::env::var(ENV_API_KEY) {
            config.remark.api_key = Some(key);
        } else if let Some(key) = &file.api_key {
            config.remark.api_key = Some(key.clone());
        }

        if let Some(model) = &file.model {
            config.remark.model = model.clone();
        }

        if let Some(secs) = file.unlock_secs {
            config.unlock_secs = secs;
        }
        if let Some(ms) = file.tick_interval_ms {
            config.tick_interval_ms = ms;
        }

        Ok(config)
    }
}

fn read_config_file() -> Option<ConfigFile> {
    let path = dirs::config_dir()?.join("tunemap").join("config.toml");
    let content = std::fs::read_to_string(&path).ok()?;
    match toml::from_str(&content) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!("Ignoring malformed config file {}: {}", path.display(), e);
            None
        }
    }
}

/// OS-dependent default database location
fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("tunemap"))
        .unwrap_or_else(|| PathBuf::from("./tunemap_data"))
        .join("voyage.db")
}
