//! Configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use coordination::caller::{COUNTRY_CODE_ENV, DATA_DIR_ENV};
use coordination::{CallerConfig, WorkerCommand, DEFAULT_COUNTRY_CODE};
use sync_engine::{EngineConfig, DEFAULT_INACTIVITY_TICKS, DEFAULT_PAIRING_TICKS};
use wa_bridge::config::DEFAULT_BRIDGE_URL;
use wa_bridge::BridgeConfig;

/// Bridge daemon URL variable.
pub const BRIDGE_URL_ENV: &str = "WAHELPER_BRIDGE_URL";
/// Caller budget variable.
pub const TIMEOUT_ENV: &str = "WAHELPER_TIMEOUT_SECS";
/// Inactivity threshold variable.
pub const INACTIVITY_ENV: &str = "WAHELPER_INACTIVITY_SECS";
/// Pairing inactivity threshold variable.
pub const PAIRING_INACTIVITY_ENV: &str = "WAHELPER_PAIRING_INACTIVITY_SECS";
/// Worker executable variable.
pub const WORKER_BIN_ENV: &str = "WAHELPER_WORKER_BIN";

/// Helper configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding every device file.
    pub data_dir: PathBuf,
    /// Bridge daemon base URL.
    pub bridge_url: String,
    /// Country code substituted for leading zeros.
    pub country_code: String,
    /// How long the caller waits for a terminal status.
    pub timeout: Duration,
    /// Seconds of silence after which history sync counts as complete.
    pub inactivity_secs: u32,
    /// Same, while pairing.
    pub pairing_inactivity_secs: u32,
    /// Worker executable; the running binary when unset.
    pub worker_bin: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `WAHELPER_DATA_DIR` | Data directory | `./whatsapp_data` |
    /// | `WAHELPER_BRIDGE_URL` | Bridge daemon URL | `http://127.0.0.1:8090` |
    /// | `WAHELPER_COUNTRY_CODE` | Country code for numbers | `49` |
    /// | `WAHELPER_TIMEOUT_SECS` | Caller budget | `120` |
    /// | `WAHELPER_INACTIVITY_SECS` | Sync completion threshold | `10` |
    /// | `WAHELPER_PAIRING_INACTIVITY_SECS` | Threshold while pairing | `60` |
    /// | `WAHELPER_WORKER_BIN` | Worker executable | current executable |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup` instead of the process
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let number = |key: &'static str, default: u64| -> Result<u64, ConfigError> {
            match lookup(key) {
                Some(value) => value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidNumber { key, value }),
                None => Ok(default),
            }
        };
        let ticks = |key: &'static str, default: u32| -> Result<u32, ConfigError> {
            let value = number(key, u64::from(default))?;
            u32::try_from(value).map_err(|_| ConfigError::InvalidNumber {
                key,
                value: value.to_string(),
            })
        };

        let data_dir = lookup(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./whatsapp_data"));

        let bridge_url =
            lookup(BRIDGE_URL_ENV).unwrap_or_else(|| DEFAULT_BRIDGE_URL.to_string());

        let country_code = lookup(COUNTRY_CODE_ENV)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_COUNTRY_CODE.to_string());
        if !country_code.chars().all(|c| c.is_ascii_digit()) {
            return Err(ConfigError::InvalidCountryCode(country_code));
        }

        Ok(Self {
            data_dir,
            bridge_url,
            country_code,
            timeout: Duration::from_secs(number(TIMEOUT_ENV, 120)?),
            inactivity_secs: ticks(INACTIVITY_ENV, DEFAULT_INACTIVITY_TICKS)?,
            pairing_inactivity_secs: ticks(PAIRING_INACTIVITY_ENV, DEFAULT_PAIRING_TICKS)?,
            worker_bin: lookup(WORKER_BIN_ENV).map(PathBuf::from),
        })
    }

    /// Settings for a worker run. One tick is one second.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::default()
            .with_thresholds(self.inactivity_secs, self.pairing_inactivity_secs)
            .with_country_code(self.country_code.clone())
    }

    pub fn caller_config(&self) -> CallerConfig {
        CallerConfig::new(&self.data_dir)
            .with_country_code(self.country_code.clone())
            .with_timeout(self.timeout)
    }

    pub fn bridge_config(&self) -> BridgeConfig {
        BridgeConfig::new(self.bridge_url.as_str())
    }

    /// The command that starts a worker: `<bin> worker`.
    pub fn worker_command(&self) -> std::io::Result<WorkerCommand> {
        let program = match &self.worker_bin {
            Some(bin) => bin.clone(),
            None => env::current_exe()?,
        };
        Ok(WorkerCommand::new(program)
            .arg("worker")
            .env(BRIDGE_URL_ENV, &self.bridge_url))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must be a non-negative integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("WAHELPER_COUNTRY_CODE must contain only digits, got {0:?}")]
    InvalidCountryCode(String),
}
