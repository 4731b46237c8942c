//! # Gateway Configuration
//!
//! Settings for the simulated authority transport. The terminal embeds
//! [`GatewayConfig`] as the `[authority]` section of its TOML file.
//!
//! ```toml
//! [authority]
//! environment = "beta"      # beta | production
//! success_rate = 0.9        # probability of acceptance
//! latency_ms = 2000         # simulated round trip for invoices/receipts
//! sale_note_delay_ms = 500  # simulated processing for sale notes
//! seed = 42                 # optional, makes decisions reproducible
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{SubmissionError, SubmissionResult};

const BETA_ENDPOINT: &str = "https://e-beta.sunat.gob.pe/ol-ti-itcpfegem-beta/billService";
const PRODUCTION_ENDPOINT: &str = "https://e-factura.sunat.gob.pe/ol-ti-itcpfegem/billService";

/// Authority environment the envelope is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    /// Test environment ("PRUEBAS"), accepts the MODDATOS credentials.
    #[default]
    Beta,
    Production,
}

impl Environment {
    /// `billService` endpoint for this environment.
    pub const fn endpoint(&self) -> &'static str {
        match self {
            Environment::Beta => BETA_ENDPOINT,
            Environment::Production => PRODUCTION_ENDPOINT,
        }
    }

    /// Label used in acceptance messages.
    pub const fn label(&self) -> &'static str {
        match self {
            Environment::Beta => "PRUEBAS (BETA)",
            Environment::Production => "PRODUCCIÓN",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Beta => write!(f, "beta"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = SubmissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beta" | "test" | "pruebas" => Ok(Environment::Beta),
            "production" | "prod" | "produccion" => Ok(Environment::Production),
            other => Err(SubmissionError::UnknownEnvironment(other.to_string())),
        }
    }
}

/// Simulated gateway settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub environment: Environment,

    /// Probability that an invoice or receipt is accepted (0.0 - 1.0).
    /// Default: 0.9
    #[serde(default = "default_success_rate")]
    pub success_rate: f64,

    /// Simulated round trip for invoices and receipts.
    /// Default: 2000 ms
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,

    /// Simulated processing time for sale notes.
    /// Default: 500 ms
    #[serde(default = "default_sale_note_delay_ms")]
    pub sale_note_delay_ms: u64,

    /// RNG seed. `None` seeds from entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_success_rate() -> f64 {
    0.9
}

fn default_latency_ms() -> u64 {
    2000
}

fn default_sale_note_delay_ms() -> u64 {
    500
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            environment: Environment::default(),
            success_rate: default_success_rate(),
            latency_ms: default_latency_ms(),
            sale_note_delay_ms: default_sale_note_delay_ms(),
            seed: None,
        }
    }
}

impl GatewayConfig {
    /// Zero-latency configuration for tests and scripted runs.
    pub fn instant() -> Self {
        GatewayConfig {
            latency_ms: 0,
            sale_note_delay_ms: 0,
            ..Self::default()
        }
    }

    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }

    pub fn sale_note_delay(&self) -> Duration {
        Duration::from_millis(self.sale_note_delay_ms)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SubmissionResult<()> {
        if !(0.0..=1.0).contains(&self.success_rate) {
            return Err(SubmissionError::InvalidConfig(format!(
                "success_rate must be between 0.0 and 1.0, got {}",
                self.success_rate
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.environment, Environment::Beta);
        assert_eq!(config.success_rate, 0.9);
        assert_eq!(config.latency(), Duration::from_secs(2));
        assert_eq!(config.sale_note_delay(), Duration::from_millis(500));
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!("beta".parse::<Environment>().unwrap(), Environment::Beta);
        assert_eq!("PROD".parse::<Environment>().unwrap(), Environment::Production);
        assert!("staging".parse::<Environment>().is_err());
        assert!(Environment::Production.endpoint().starts_with("https://e-factura"));
    }

    #[test]
    fn test_success_rate_bounds() {
        let mut config = GatewayConfig::instant();
        config.success_rate = 1.5;
        assert!(config.validate().is_err());
        config.success_rate = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: GatewayConfig = toml::from_str("environment = \"production\"\nseed = 7\n").unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.latency_ms, 2000);
    }
}
