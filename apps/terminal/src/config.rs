//! # Terminal Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     CAJERO_DB_PATH=/var/lib/cajero/cajero.db                           │
//! │     CAJERO_AUTHORITY_ENV=beta                                          │
//! │                                                                         │
//! │  2. TOML Config File (--config, or the platform config dir)            │
//! │     ~/.config/cajero/terminal.toml (Linux)                             │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The company profile is NOT part of this file: it lives in the database
//! and is passed explicitly to whoever needs it.
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/var/lib/cajero/cajero.db"
//! max_connections = 5
//!
//! [authority]
//! environment = "beta"
//! success_rate = 0.9
//! latency_ms = 2000
//! sale_note_delay_ms = 500
//! seed = 42
//!
//! [integrations]
//! lookup_base_url = "https://api.decolecta.com/v1"
//! messaging_base_url = "https://api.whatsapp-provider.com"
//! request_timeout_secs = 10
//! ```

use std::path::PathBuf;
use std::time::Duration;

use cajero_sunat::GatewayConfig;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ConfigError, ConfigResult};

const CONFIG_FILE: &str = "terminal.toml";
const DATABASE_FILE: &str = "cajero.db";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("pe", "cajero", "cajero")
}

// =============================================================================
// Database Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. Default: `cajero.db` in the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseSettings {
    /// Resolves the database file, creating the data directory if needed.
    pub fn resolve_path(&self) -> ConfigResult<PathBuf> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }

        let dirs = project_dirs()
            .ok_or_else(|| ConfigError::Invalid("could not determine the data directory".into()))?;
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;
        Ok(data_dir.join(DATABASE_FILE))
    }
}

// =============================================================================
// Integration Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationSettings {
    /// Identity lookup provider (DNI/RUC).
    #[serde(default = "default_lookup_base_url")]
    pub lookup_base_url: String,

    /// Messaging gateway used when the instance is an id rather than a URL.
    #[serde(default = "default_messaging_base_url")]
    pub messaging_base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_lookup_base_url() -> String {
    "https://api.decolecta.com/v1".to_string()
}

fn default_messaging_base_url() -> String {
    "https://api.whatsapp-provider.com".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

impl Default for IntegrationSettings {
    fn default() -> Self {
        IntegrationSettings {
            lookup_base_url: default_lookup_base_url(),
            messaging_base_url: default_messaging_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl IntegrationSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// =============================================================================
// Terminal Configuration
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TerminalConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub authority: GatewayConfig,

    #[serde(default)]
    pub integrations: IntegrationSettings,
}

impl TerminalConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`--config` or the platform config directory)
    /// 3. Environment variables (`CAJERO_*`)
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading terminal config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Writes the configuration as TOML.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<PathBuf> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ConfigError::Invalid("no config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&path, toml::to_string_pretty(self)?)?;
        info!(?path, "Terminal config saved");
        Ok(path)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        self.authority.validate()?;

        for (name, value) in [
            ("integrations.lookup_base_url", &self.integrations.lookup_base_url),
            ("integrations.messaging_base_url", &self.integrations.messaging_base_url),
        ] {
            let url = Url::parse(value)
                .map_err(|e| ConfigError::Invalid(format!("{name}: {e}")))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ConfigError::Invalid(format!(
                    "{name} must start with http:// or https://, got: {value}"
                )));
            }
        }

        Ok(())
    }

    /// Applies `CAJERO_*` overrides read through `var`.
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(path) = var("CAJERO_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(max) = var("CAJERO_DB_MAX_CONNECTIONS") {
            match max.parse() {
                Ok(max) => self.database.max_connections = max,
                Err(_) => warn!(value = %max, "Ignoring invalid CAJERO_DB_MAX_CONNECTIONS"),
            }
        }

        if let Some(env) = var("CAJERO_AUTHORITY_ENV") {
            match env.parse() {
                Ok(parsed) => {
                    debug!(environment = %env, "Overriding authority environment");
                    self.authority.environment = parsed;
                }
                Err(_) => warn!(value = %env, "Unknown authority environment in environment"),
            }
        }

        if let Some(rate) = var("CAJERO_SUCCESS_RATE") {
            match rate.parse() {
                Ok(rate) => self.authority.success_rate = rate,
                Err(_) => warn!(value = %rate, "Ignoring invalid CAJERO_SUCCESS_RATE"),
            }
        }

        if let Some(ms) = var("CAJERO_LATENCY_MS") {
            match ms.parse() {
                Ok(ms) => self.authority.latency_ms = ms,
                Err(_) => warn!(value = %ms, "Ignoring invalid CAJERO_LATENCY_MS"),
            }
        }

        if let Some(ms) = var("CAJERO_SALE_NOTE_DELAY_MS") {
            match ms.parse() {
                Ok(ms) => self.authority.sale_note_delay_ms = ms,
                Err(_) => warn!(value = %ms, "Ignoring invalid CAJERO_SALE_NOTE_DELAY_MS"),
            }
        }

        if let Some(seed) = var("CAJERO_SEED") {
            match seed.parse() {
                Ok(seed) => self.authority.seed = Some(seed),
                Err(_) => warn!(value = %seed, "Ignoring invalid CAJERO_SEED"),
            }
        }

        if let Some(url) = var("CAJERO_LOOKUP_URL") {
            self.integrations.lookup_base_url = url;
        }

        if let Some(url) = var("CAJERO_MESSAGING_URL") {
            self.integrations.messaging_base_url = url;
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }
}
