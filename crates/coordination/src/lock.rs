//! Advisory locks: OS file locks between processes, flags within one.
//!
//! A file lock is an exclusive `flock` on `<name>.lock`, which also holds the
//! holder's PID for diagnostics. The kernel drops the lock when its holder
//! exits, however it exits. A holder deletes the file before unlocking, so an
//! acquirer that locked a file which has since been unlinked retries on the
//! fresh path.

use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fs2::FileExt;
use tracing::{debug, info, warn};

use crate::device::DevicePaths;
use crate::Result;

/// Holder of a file lock. Dropping it removes the file and releases the lock.
#[derive(Debug)]
pub struct FileLockGuard {
    path: PathBuf,
    file: File,
}

impl FileLockGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release explicitly.
    pub fn release(self) {}
}

impl Drop for FileLockGuard {
    fn drop(&mut self) {
        // Unlink while still locked; the lock goes with the descriptor
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Released lock {}", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove lock {}: {}", self.path.display(), e),
        }
        if let Err(e) = FileExt::unlock(&self.file) {
            debug!("Unlock of {} failed: {}", self.path.display(), e);
        }
    }
}

fn is_contended(e: &io::Error) -> bool {
    e.kind() == ErrorKind::WouldBlock
        || e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

/// Whether `path` still names the file behind `file`.
#[cfg(unix)]
fn still_linked(file: &File, path: &Path) -> io::Result<bool> {
    use std::os::unix::fs::MetadataExt;

    let held = file.metadata()?;
    match fs::metadata(path) {
        Ok(current) => Ok(held.dev() == current.dev() && held.ino() == current.ino()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(not(unix))]
fn still_linked(_file: &File, path: &Path) -> io::Result<bool> {
    Ok(path.exists())
}

/// Try to take the lock once. `Ok(None)` if another holder has it.
pub fn try_acquire(path: &Path) -> Result<Option<FileLockGuard>> {
    loop {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        match FileExt::try_lock_exclusive(&file) {
            Ok(()) => {}
            Err(e) if is_contended(&e) => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        if !still_linked(&file, path)? {
            // The previous holder removed it between our open and lock
            continue;
        }

        file.set_len(0)?;
        write!(file, "{}", std::process::id())?;
        file.sync_all()?;

        debug!("Acquired lock {}", path.display());
        return Ok(Some(FileLockGuard {
            path: path.to_path_buf(),
            file,
        }));
    }
}

/// Acquire the lock, polling every `tick` while it is held.
pub async fn acquire(path: &Path, tick: Duration) -> Result<FileLockGuard> {
    let mut announced = false;

    loop {
        if let Some(guard) = try_acquire(path)? {
            return Ok(guard);
        }

        if !announced {
            match lock_holder(path) {
                Some(pid) => info!("Waiting for lock {} held by PID {}", path.display(), pid),
                None => info!("Waiting for lock {}", path.display()),
            }
            announced = true;
        }
        tokio::time::sleep(tick).await;
    }
}

/// PID recorded in a lock file, if readable.
pub fn lock_holder(path: &Path) -> Option<u32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

/// Whether some holder currently has the lock at `path`.
pub fn is_held(path: &Path) -> Result<bool> {
    let file = match OpenOptions::new().read(true).write(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e.into()),
    };
    match FileExt::try_lock_exclusive(&file) {
        Ok(()) => Ok(false),
        Err(e) if is_contended(&e) => Ok(true),
        Err(e) => Err(e.into()),
    }
}

/// Remove this device's lock files that nobody holds, e.g. left behind by a
/// crashed run. Each file is taken before it is removed, so a live holder is
/// never disturbed.
pub fn sweep_stale(paths: &DevicePaths) -> Result<usize> {
    let prefix = paths.lock_prefix();
    let entries = match fs::read_dir(paths.data_dir()) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let mut removed = 0;
    for entry in entries {
        let path = entry?.path();
        let is_device_lock = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(&prefix) && n.ends_with(".lock"));
        if !is_device_lock {
            continue;
        }

        if let Some(guard) = try_acquire(&path)? {
            info!("Removing stale lock {}", path.display());
            drop(guard);
            removed += 1;
        }
    }

    Ok(removed)
}

/// In-process mutual exclusion with a poll-wait, for tasks sharing one
/// runtime (e.g. serializing cache transactions).
#[derive(Debug, Clone)]
pub struct FlagLock {
    held: Arc<AtomicBool>,
    name: Arc<str>,
}

impl FlagLock {
    pub fn new(name: &str) -> Self {
        Self {
            held: Arc::new(AtomicBool::new(false)),
            name: Arc::from(name),
        }
    }

    /// Take the flag if free.
    pub fn try_acquire(&self) -> Option<FlagLockGuard> {
        self.held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlagLockGuard {
                held: Arc::clone(&self.held),
            })
    }

    /// Take the flag, polling every `tick` while another task holds it.
    pub async fn acquire(&self, tick: Duration) -> FlagLockGuard {
        loop {
            if let Some(guard) = self.try_acquire() {
                return guard;
            }
            debug!("Waiting for {} lock", self.name);
            tokio::time::sleep(tick).await;
        }
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}

/// Holder of a [`FlagLock`]. Dropping it clears the flag.
#[derive(Debug)]
pub struct FlagLockGuard {
    held: Arc<AtomicBool>,
}

impl Drop for FlagLockGuard {
    fn drop(&mut self) {
        self.held.store(false, Ordering::Release);
    }
}
