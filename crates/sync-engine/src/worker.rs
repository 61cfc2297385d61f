//! The worker side of a run: lock, connect, operate, publish, shut down.

use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use coordination::{
    lock, DevicePaths, Request, StatusFile, StatusRecord, INVALID_INPUT_MESSAGE, SESSION_LOCK,
};
use message_cache::Database;
use tracing::{error, info, warn};
use wa_bridge::Provider;

use crate::actions::Operation;
use crate::config::EngineConfig;
use crate::context::SessionContext;
use crate::session::{Session, SessionOutcome};
use crate::Result;

/// Public message when automation mode meets an unpaired device.
pub const PAIRING_FORBIDDEN_MESSAGE: &str = "device must be paired interactively first";

/// Run one request for one device.
///
/// Holds the device's session lock for the whole run, waiting if another
/// worker has it. Returns the status record that was published, or `None`
/// when the session closed without a result and nothing was published. An
/// error means the run faulted after the loading status; the caller learns
/// of it only through its own timeout.
pub async fn run_worker(
    request: &Request,
    provider: Arc<dyn Provider>,
    mut config: EngineConfig,
    data_dir: &Path,
) -> Result<Option<StatusRecord>> {
    std::fs::create_dir_all(data_dir)?;
    let paths = DevicePaths::new(data_dir, request.device_number(&config.country_code));

    let swept = lock::sweep_stale(&paths)?;
    if swept > 0 {
        info!("Removed {} stale lock(s) left by a previous run", swept);
    }
    let _session_lock = lock::acquire(&paths.lock_path(SESSION_LOCK), config.tick).await?;
    info!(
        "Worker {} holds the session lock for {}",
        std::process::id(),
        paths.device()
    );

    let status = StatusFile::new(paths.status_path());
    status.write(&StatusRecord::loading())?;

    let operation = match Operation::from_request(request) {
        Ok(operation) => operation,
        Err(e) => {
            warn!("Invalid request: {}", e);
            let record = StatusRecord::error(INVALID_INPUT_MESSAGE);
            status.write(&record)?;
            return Ok(Some(record));
        }
    };

    if request.reset {
        reset_device(&paths)?;
    }
    config.automation |= request.automation;

    let db = Database::open(paths.cache_path()).await?;
    db.migrate().await?;

    let ctx = SessionContext::new(paths, Arc::clone(&provider), db.clone(), config);
    let mut session = Session::new(ctx.clone());
    let outcome = session.run(operation).await;

    // Shutdown: release waiters, close the provider, let batches commit
    ctx.detector.finish();
    if let Err(e) = provider.end().await {
        warn!("Failed to end provider session: {}", e);
    }
    session.drain().await;
    db.close().await;

    let record = match outcome {
        Ok(SessionOutcome::Completed(result)) => result.to_status(),
        Ok(SessionOutcome::PairingRequired) => StatusRecord::error(PAIRING_FORBIDDEN_MESSAGE),
        Ok(SessionOutcome::Closed { status_code }) => {
            warn!("Session closed (status {:?}) without a result", status_code);
            return Ok(None);
        }
        Err(e) => {
            error!("Worker run failed: {}", e);
            return Err(e);
        }
    };

    status.write(&record)?;
    info!("Published {}", record.message);
    Ok(Some(record))
}

/// Delete the device's auth material and cache files.
pub fn reset_device(paths: &DevicePaths) -> Result<()> {
    info!("Resetting device {}", paths.device());

    match std::fs::remove_dir_all(paths.auth_dir()) {
        Err(e) if e.kind() != ErrorKind::NotFound => return Err(e.into()),
        _ => {}
    }
    for file in paths.cache_files() {
        match std::fs::remove_file(&file) {
            Err(e) if e.kind() != ErrorKind::NotFound => return Err(e.into()),
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_device_removes_auth_and_cache() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DevicePaths::new(dir.path(), "491511234567");

        std::fs::create_dir_all(paths.auth_dir().join("keys")).unwrap();
        std::fs::write(paths.cache_path(), b"db").unwrap();
        std::fs::write(dir.path().join("keep.txt"), b"x").unwrap();

        reset_device(&paths).unwrap();
        assert!(!paths.auth_dir().exists());
        assert!(!paths.cache_path().exists());
        assert!(dir.path().join("keep.txt").exists());

        // Nothing left to remove is fine
        reset_device(&paths).unwrap();
    }
}
