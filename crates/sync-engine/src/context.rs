//! State shared by the state machine, the ingestion pipeline and operations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use coordination::{DevicePaths, FlagLock, StatusFile, StatusRecord};
use message_cache::Database;
use wa_bridge::Provider;

use crate::config::EngineConfig;
use crate::inactivity::InactivityDetector;
use crate::Result;

/// Everything one worker run owns, passed explicitly to each component.
///
/// Cloning is cheap; clones share the same detector, lock, cache pool and
/// first-run flag.
#[derive(Clone)]
pub struct SessionContext {
    pub paths: DevicePaths,
    pub provider: Arc<dyn Provider>,
    pub db: Database,
    pub detector: InactivityDetector,
    /// Serializes cache transactions within the worker.
    pub db_lock: FlagLock,
    pub status: StatusFile,
    pub config: EngineConfig,
    first_run: Arc<AtomicBool>,
}

impl SessionContext {
    pub fn new(
        paths: DevicePaths,
        provider: Arc<dyn Provider>,
        db: Database,
        config: EngineConfig,
    ) -> Self {
        Self {
            status: StatusFile::new(paths.status_path()),
            detector: InactivityDetector::new(config.inactivity_ticks, config.pairing_ticks),
            db_lock: FlagLock::new("db"),
            first_run: Arc::new(AtomicBool::new(false)),
            paths,
            provider,
            db,
            config,
        }
    }

    /// Normalized device number.
    pub fn device(&self) -> &str {
        self.paths.device()
    }

    /// Whether this run started by pairing the device.
    pub fn is_first_run(&self) -> bool {
        self.first_run.load(Ordering::SeqCst)
    }

    pub fn mark_first_run(&self) {
        self.first_run.store(true, Ordering::SeqCst);
    }

    /// Write a status record for the caller.
    pub fn publish(&self, record: &StatusRecord) -> Result<()> {
        self.status.write(record)?;
        Ok(())
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("device", &self.device())
            .field("provider", &self.provider.name())
            .field("first_run", &self.is_first_run())
            .finish()
    }
}
