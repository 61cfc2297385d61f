//! Launching the background worker process.

use std::ffi::OsString;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::{debug, info};

use crate::device::DevicePaths;
use crate::error::CoordError;
use crate::request::Request;
use crate::Result;

/// How to start a worker: a program plus the arguments placed before the
/// request flags (e.g. the `worker` subcommand).
#[derive(Debug, Clone)]
pub struct WorkerCommand {
    pub program: PathBuf,
    pub base_args: Vec<OsString>,
    pub envs: Vec<(OsString, OsString)>,
}

impl WorkerCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            base_args: Vec::new(),
            envs: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.base_args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }
}

/// Start the worker detached from the caller.
///
/// The worker runs in the data directory with stdin closed and both output
/// streams appended to the device's startup log. On unix it gets its own
/// process group so signals aimed at the caller do not reach it. The child
/// is not waited on.
pub fn spawn_detached(command: &WorkerCommand, paths: &DevicePaths, request: &Request) -> Result<u32> {
    let log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(paths.startup_log_path())?;
    let log_err = log.try_clone()?;

    let mut cmd = Command::new(&command.program);
    cmd.args(&command.base_args)
        .args(request.to_args())
        .current_dir(paths.data_dir())
        .stdin(Stdio::null())
        .stdout(Stdio::from(log))
        .stderr(Stdio::from(log_err));

    for (key, value) in &command.envs {
        cmd.env(key, value);
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    info!(
        "Spawning worker: {} {} (device {})",
        command.program.display(),
        request.action,
        paths.device()
    );

    let child = cmd
        .spawn()
        .map_err(|e| CoordError::Spawn(format!("{}: {}", command.program.display(), e)))?;

    let pid = child.id();
    debug!("Worker process started with PID {}", pid);
    Ok(pid)
}
