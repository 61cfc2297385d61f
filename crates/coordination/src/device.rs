//! Device identity and the per-device file layout.

use std::path::{Path, PathBuf};

/// Default country code substituted for a leading trunk prefix.
pub const DEFAULT_COUNTRY_CODE: &str = "49";

/// Normalize a phone number to the digits-only international form.
///
/// Leading zeros are replaced by `country_code`, then every non-digit is
/// removed: `"0151 1234567"` becomes `"491511234567"`.
pub fn normalize_number(input: &str, country_code: &str) -> String {
    let trimmed = input.trim();
    let rest = trimmed.trim_start_matches('0');

    let with_country = if rest.len() != trimmed.len() {
        format!("{}{}", country_code, rest)
    } else {
        trimmed.to_string()
    };

    with_country.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Every file the caller and worker share for one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevicePaths {
    data_dir: PathBuf,
    device: String,
}

impl DevicePaths {
    /// Lay out paths for an already normalized device number.
    pub fn new(data_dir: impl Into<PathBuf>, device: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            device: device.into(),
        }
    }

    /// Normalized device number.
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Directory holding all device files.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Authentication material, owned by the provider.
    pub fn auth_dir(&self) -> PathBuf {
        self.data_dir.join(format!("auth_{}", self.device))
    }

    /// SQLite message cache.
    pub fn cache_path(&self) -> PathBuf {
        self.data_dir.join(format!("whatsapp_{}.sqlite", self.device))
    }

    /// The cache file together with its WAL and shared-memory siblings.
    pub fn cache_files(&self) -> Vec<PathBuf> {
        let base = format!("whatsapp_{}.sqlite", self.device);
        ["", "-wal", "-shm", "-journal"]
            .iter()
            .map(|suffix| self.data_dir.join(format!("{}{}", base, suffix)))
            .collect()
    }

    /// Worker log.
    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(format!("whatsapp_{}.log", self.device))
    }

    /// Status file polled by the caller.
    pub fn status_path(&self) -> PathBuf {
        self.data_dir.join(format!("whatsapp_{}.json", self.device))
    }

    /// Log receiving the worker's stdout and stderr.
    pub fn startup_log_path(&self) -> PathBuf {
        self.data_dir
            .join(format!("whatsapp.startup_{}.log", self.device))
    }

    /// Lock artifact for the named lock.
    pub fn lock_path(&self, name: &str) -> PathBuf {
        self.data_dir
            .join(format!("{}{}.lock", self.lock_prefix(), name))
    }

    /// Filename prefix shared by all of this device's lock artifacts.
    pub fn lock_prefix(&self) -> String {
        format!("whatsapp_{}-", self.device)
    }
}
