//! Shared configuration used across Folio crates.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default simulated typing latency before a bot reply is delivered.
pub const DEFAULT_REPLY_DELAY_MS: u64 = 1000;

/// Config file read when `FOLIO_CONFIG` is unset, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/gateway.toml";

/// Default time a session may sit untouched before the registry closes it.
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 30 * 60;

/// Global application configuration (gateway + chat behaviour). Load from TOML or env.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Application identity shown by the status endpoint.
    pub app_name: String,
    /// HTTP port for the gateway.
    pub port: u16,
    /// Simulated "typing" delay in milliseconds before each bot reply lands.
    #[serde(default = "default_reply_delay_ms")]
    pub reply_delay_ms: u64,
    /// Optional JSON knowledge base file. Empty means the built-in portfolio data.
    #[serde(default)]
    pub knowledge_path: String,
    /// Idle seconds before an abandoned session is closed. 0 keeps sessions until deleted.
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
}

fn default_reply_delay_ms() -> u64 {
    DEFAULT_REPLY_DELAY_MS
}

fn default_session_idle_secs() -> u64 {
    DEFAULT_SESSION_IDLE_SECS
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            app_name: "Folio Gateway".to_string(),
            port: 8001,
            reply_delay_ms: DEFAULT_REPLY_DELAY_MS,
            knowledge_path: String::new(),
            session_idle_secs: DEFAULT_SESSION_IDLE_SECS,
        }
    }
}

impl CoreConfig {
    /// Reply delay as a [`Duration`].
    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }

    /// Idle expiry for sessions; `None` when disabled.
    pub fn session_idle_timeout(&self) -> Option<Duration> {
        (self.session_idle_secs > 0).then(|| Duration::from_secs(self.session_idle_secs))
    }

    /// Knowledge base path, if one is configured.
    pub fn knowledge_path(&self) -> Option<&Path> {
        let trimmed = self.knowledge_path.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Path::new(trimmed))
        }
    }

    /// Load config from file and environment. Precedence: env `FOLIO_*` > `FOLIO_CONFIG` path (default [`DEFAULT_CONFIG_PATH`]) > defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("FOLIO_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&config_path))
    }

    /// Same as [`CoreConfig::load`] with an explicit file; a missing file is skipped.
    pub fn load_from(path: &Path) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .set_default("app_name", "Folio Gateway")?
            .set_default("port", 8001_i64)?
            .set_default("reply_delay_ms", DEFAULT_REPLY_DELAY_MS as i64)?
            .set_default("knowledge_path", "")?
            .set_default("session_idle_secs", DEFAULT_SESSION_IDLE_SECS as i64)?;

        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        let built = builder
            .add_source(config::Environment::with_prefix("FOLIO").separator("__"))
            .build()?;

        built.try_deserialize()
    }
}
