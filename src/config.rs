//! Engine configuration
//!
//! Loaded once at startup from a JSON file, then overridden from the
//! environment (a `.env` file is honoured). The only setting the core
//! consumes is the per-method limit table; the rest configures logging.
//!
//! ```json
//! {
//!   "limits": { "UPI": 100000, "CREDIT": 200000 },
//!   "log_level": "info",
//!   "log_format": "pretty"
//! }
//! ```

use crate::logging::LogFormat;
use anyhow::Context;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Selects `config/{env}.json` when no explicit path is given
pub const ENV_VAR: &str = "PAYFLOW_ENV";
pub const MAX_UPI_AMOUNT_VAR: &str = "PAYFLOW_MAX_UPI_AMOUNT";
pub const MAX_CREDIT_AMOUNT_VAR: &str = "PAYFLOW_MAX_CREDIT_AMOUNT";

const DEFAULT_ENV: &str = "development";

/// Maximum transaction amount per normalised method name
///
/// Keys are stored upper case (`UPI`, `CREDIT`, `BANK`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Decimal>", into = "BTreeMap<String, Decimal>")]
pub struct PaymentLimits {
    limits: BTreeMap<String, Decimal>,
}

impl PaymentLimits {
    pub fn new() -> Self {
        Self {
            limits: BTreeMap::new(),
        }
    }

    pub fn with_limit(mut self, key: &str, amount: Decimal) -> Self {
        self.set(key, amount);
        self
    }

    pub fn set(&mut self, key: &str, amount: Decimal) {
        self.limits.insert(key.trim().to_ascii_uppercase(), amount);
    }

    pub fn get(&self, key: &str) -> Option<Decimal> {
        self.limits.get(&key.trim().to_ascii_uppercase()).copied()
    }
}

impl Default for PaymentLimits {
    fn default() -> Self {
        PaymentLimits::new()
            .with_limit("UPI", Decimal::new(100_000, 0))
            .with_limit("CREDIT", Decimal::new(200_000, 0))
    }
}

impl From<BTreeMap<String, Decimal>> for PaymentLimits {
    fn from(raw: BTreeMap<String, Decimal>) -> Self {
        let mut limits = PaymentLimits::new();
        for (key, amount) in raw {
            limits.set(&key, amount);
        }
        limits
    }
}

impl From<PaymentLimits> for BTreeMap<String, Decimal> {
    fn from(limits: PaymentLimits) -> Self {
        limits.limits
    }
}

/// Full engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub limits: PaymentLimits,
    /// Default `tracing` filter when `RUST_LOG` is unset
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            limits: PaymentLimits::default(),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl EngineConfig {
    /// Load configuration for this process
    ///
    /// An explicit `path` must exist. Without one, `config/{PAYFLOW_ENV}.json`
    /// is used when present and built-in defaults otherwise. Environment
    /// overrides are applied last.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = default_path();
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Apply `PAYFLOW_MAX_*_AMOUNT` overrides looked up through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        for (var, key) in [(MAX_UPI_AMOUNT_VAR, "UPI"), (MAX_CREDIT_AMOUNT_VAR, "CREDIT")] {
            if let Some(raw) = lookup(var) {
                let amount: Decimal = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("{var} must be a decimal amount, got '{raw}'"))?;
                self.limits.set(key, amount);
            }
        }
        Ok(())
    }
}

fn default_path() -> PathBuf {
    let env = std::env::var(ENV_VAR).unwrap_or_else(|_| DEFAULT_ENV.to_string());
    PathBuf::from("config").join(format!("{env}.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_cover_upi_and_credit_only() {
        let limits = PaymentLimits::default();
        assert_eq!(limits.get("UPI"), Some(Decimal::new(100_000, 0)));
        assert_eq!(limits.get("credit"), Some(Decimal::new(200_000, 0)));
        assert_eq!(limits.get("BANK"), None);
    }

    #[test]
    fn test_from_file_normalises_keys() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"limits": {{"upi": 1000, "Credit": "2500.50"}}, "log_format": "json"}}"#
        )
        .unwrap();

        let config = EngineConfig::from_file(file.path()).unwrap();

        assert_eq!(config.limits.get("UPI"), Some(Decimal::new(1000, 0)));
        assert_eq!(config.limits.get("CREDIT"), Some(Decimal::new(250050, 2)));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = EngineConfig::load(Some(Path::new("/definitely/not/here.json")));
        assert!(result.is_err());
    }

    #[test]
    fn test_env_overrides_replace_limits() {
        let mut config = EngineConfig::default();

        config
            .apply_overrides(|name| match name {
                MAX_UPI_AMOUNT_VAR => Some("1000".to_string()),
                _ => None,
            })
            .unwrap();

        assert_eq!(config.limits.get("UPI"), Some(Decimal::new(1000, 0)));
        assert_eq!(config.limits.get("CREDIT"), Some(Decimal::new(200_000, 0)));
    }

    #[test]
    fn test_malformed_override_is_rejected() {
        let mut config = EngineConfig::default();
        let result = config.apply_overrides(|name| {
            (name == MAX_CREDIT_AMOUNT_VAR).then(|| "lots".to_string())
        });
        assert!(result.is_err());
    }
}
