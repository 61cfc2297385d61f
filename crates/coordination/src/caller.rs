//! The caller side: start a worker and wait for its result.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::device::{DevicePaths, DEFAULT_COUNTRY_CODE};
use crate::lock;
use crate::process::{spawn_detached, WorkerCommand};
use crate::request::{Request, INVALID_INPUT_MESSAGE};
use crate::status::{StatusFile, StatusRecord};
use crate::Result;

/// Environment variable carrying the data directory to the worker.
pub const DATA_DIR_ENV: &str = "WAHELPER_DATA_DIR";
/// Environment variable carrying the country code to the worker.
pub const COUNTRY_CODE_ENV: &str = "WAHELPER_COUNTRY_CODE";

/// Caller settings.
#[derive(Debug, Clone)]
pub struct CallerConfig {
    /// Directory holding every device file.
    pub data_dir: PathBuf,
    /// Country code used to normalize numbers.
    pub country_code: String,
    /// Status poll interval.
    pub tick: Duration,
    /// How long to wait for a terminal status.
    pub timeout: Duration,
}

impl CallerConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
            tick: Duration::from_secs(1),
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_country_code(mut self, country_code: impl Into<String>) -> Self {
        self.country_code = country_code.into();
        self
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Starts workers and polls their status files.
#[derive(Debug, Clone)]
pub struct Caller {
    config: CallerConfig,
    worker: WorkerCommand,
}

impl Caller {
    pub fn new(config: CallerConfig, worker: WorkerCommand) -> Self {
        Self { config, worker }
    }

    pub fn config(&self) -> &CallerConfig {
        &self.config
    }

    /// Run a request to completion. Never fails: every problem is reported
    /// through the returned status record.
    pub async fn run(&self, request: &Request) -> StatusRecord {
        self.run_with_progress(request, |_| {}).await
    }

    /// Like [`Caller::run`], calling `on_progress` for every distinct
    /// non-terminal status seen while waiting (e.g. a pairing code).
    pub async fn run_with_progress(
        &self,
        request: &Request,
        mut on_progress: impl FnMut(&StatusRecord),
    ) -> StatusRecord {
        if let Err(e) = request.validate() {
            warn!("Rejecting request: {}", e);
            return StatusRecord::error(INVALID_INPUT_MESSAGE);
        }

        let device = request.device_number(&self.config.country_code);

        let (paths, request) = match self.prepare(&device, request) {
            Ok(prepared) => prepared,
            Err(e) => {
                warn!("Failed to prepare run for {}: {}", device, e);
                return StatusRecord::error(format!("failed to prepare run: {}", e));
            }
        };
        let status = StatusFile::new(paths.status_path());

        let worker = self
            .worker
            .clone()
            .env(DATA_DIR_ENV, paths.data_dir().as_os_str())
            .env(COUNTRY_CODE_ENV, &self.config.country_code);

        if let Err(e) = spawn_detached(&worker, &paths, &request) {
            warn!("{}", e);
            return StatusRecord::error(format!("failed to start worker: {}", e));
        }

        let result = self.poll(&status, &mut on_progress).await;

        if let Err(e) = status.remove() {
            warn!("Failed to remove status file: {}", e);
        }
        result
    }

    /// Clear artifacts of previous runs and resolve paths the worker will
    /// see from its own working directory.
    fn prepare(&self, device: &str, request: &Request) -> Result<(DevicePaths, Request)> {
        fs::create_dir_all(&self.config.data_dir)?;
        let data_dir = fs::canonicalize(&self.config.data_dir)?;
        let paths = DevicePaths::new(data_dir, device);

        StatusFile::new(paths.status_path()).remove()?;
        match fs::remove_file(paths.startup_log_path()) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e.into()),
            _ => {}
        }

        let swept = lock::sweep_stale(&paths)?;
        if swept > 0 {
            info!("Removed {} stale lock(s) for {}", swept, device);
        }

        let mut request = request.clone();
        request.device = device.to_string();
        request.attachments = request
            .attachments
            .iter()
            .map(|a| fs::canonicalize(a).map(|p| p.display().to_string()))
            .collect::<std::io::Result<_>>()?;

        Ok((paths, request))
    }

    async fn poll(
        &self,
        status: &StatusFile,
        on_progress: &mut impl FnMut(&StatusRecord),
    ) -> StatusRecord {
        let deadline = Instant::now() + self.config.timeout;
        let mut last_seen: Option<StatusRecord> = None;

        loop {
            tokio::time::sleep(self.config.tick).await;

            if let Some(record) = status.read() {
                if record.is_terminal() {
                    debug!("Worker finished with {}", record.message);
                    return record;
                }
                if last_seen.as_ref() != Some(&record) {
                    on_progress(&record);
                    last_seen = Some(record);
                }
            }

            if Instant::now() >= deadline {
                warn!(
                    "No result from worker after {:?}; giving up",
                    self.config.timeout
                );
                return StatusRecord::timeout();
            }
        }
    }
}
