//! The status record and the file the worker publishes it through.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::Result;

/// Status vocabulary shared by caller and worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusMessage {
    LoadingState,
    PairingCodeRequired,
    Error,
    TimeoutError,
    MessagesFetched,
    MessageUserSent,
    MessageGroupSent,
}

impl StatusMessage {
    /// Whether a caller stops polling when it sees this value.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::LoadingState | Self::PairingCodeRequired)
    }

    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LoadingState => "loading_state",
            Self::PairingCodeRequired => "pairing_code_required",
            Self::Error => "error",
            Self::TimeoutError => "timeout_error",
            Self::MessagesFetched => "messages_fetched",
            Self::MessageUserSent => "message_user_sent",
            Self::MessageGroupSent => "message_group_sent",
        }
    }
}

impl std::fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{success, message, data, public_message?}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub success: bool,
    pub message: StatusMessage,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_message: Option<String>,
}

impl StatusRecord {
    fn new(success: bool, message: StatusMessage, data: Value) -> Self {
        Self {
            success,
            message,
            data,
            public_message: None,
        }
    }

    /// The worker has started and is connecting.
    pub fn loading() -> Self {
        Self::new(false, StatusMessage::LoadingState, Value::Null)
    }

    /// The device must be linked with this pairing code.
    pub fn pairing_code_required(code: impl Into<String>) -> Self {
        Self::new(
            false,
            StatusMessage::PairingCodeRequired,
            Value::String(code.into()),
        )
    }

    /// A failure with a human-readable explanation.
    pub fn error(public_message: impl Into<String>) -> Self {
        Self::new(false, StatusMessage::Error, Value::Null)
            .with_public_message(public_message)
    }

    /// Synthesized by the caller when the worker did not finish in time.
    pub fn timeout() -> Self {
        Self::new(false, StatusMessage::TimeoutError, Value::Null)
    }

    /// A successful operation result.
    pub fn success(message: StatusMessage, data: Value) -> Self {
        Self::new(true, message, data)
    }

    /// Attach a human-readable note.
    pub fn with_public_message(mut self, public_message: impl Into<String>) -> Self {
        self.public_message = Some(public_message.into());
        self
    }

    /// Whether a caller stops polling on this record.
    pub fn is_terminal(&self) -> bool {
        self.message.is_terminal()
    }
}

/// The status file for one device.
///
/// Writes are atomic: the record goes to a temporary file in the same
/// directory which is then renamed over the target, so a reader never sees a
/// partial record.
#[derive(Debug, Clone)]
pub struct StatusFile {
    path: PathBuf,
}

impl StatusFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the current record.
    pub fn write(&self, record: &StatusRecord) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer(&mut tmp, record)?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        debug!("Status {} written to {}", record.message, self.path.display());
        Ok(())
    }

    /// Read the current record. Missing or unparsable files read as `None`.
    pub fn read(&self) -> Option<StatusRecord> {
        let raw = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Ignoring unparsable status file {}: {}", self.path.display(), e);
                None
            }
        }
    }

    /// Delete the file if present.
    pub fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_values() {
        assert!(!StatusMessage::LoadingState.is_terminal());
        assert!(!StatusMessage::PairingCodeRequired.is_terminal());
        assert!(StatusMessage::Error.is_terminal());
        assert!(StatusMessage::TimeoutError.is_terminal());
        assert!(StatusMessage::MessagesFetched.is_terminal());
    }

    #[test]
    fn test_record_wire_shape() {
        let json = serde_json::to_value(StatusRecord::pairing_code_required("ABCD-EFGH")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "success": false,
                "message": "pairing_code_required",
                "data": "ABCD-EFGH"
            })
        );

        let json = serde_json::to_value(StatusRecord::error("input missing or unknown action!")).unwrap();
        assert_eq!(json["message"], "error");
        assert_eq!(json["data"], Value::Null);
        assert_eq!(json["public_message"], "input missing or unknown action!");
    }

    #[test]
    fn test_write_read_remove() {
        let dir = tempfile::tempdir().unwrap();
        let file = StatusFile::new(dir.path().join("whatsapp_4915.json"));
        assert!(file.read().is_none());

        file.write(&StatusRecord::loading()).unwrap();
        assert_eq!(file.read().unwrap().message, StatusMessage::LoadingState);

        let done = StatusRecord::success(StatusMessage::MessagesFetched, serde_json::json!([]));
        file.write(&done).unwrap();
        assert_eq!(file.read(), Some(done));

        file.remove().unwrap();
        assert!(file.read().is_none());
        // Removing twice is fine
        file.remove().unwrap();
    }

    #[test]
    fn test_unparsable_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.json");
        fs::write(&path, "{\"success\": tr").unwrap();

        assert!(StatusFile::new(&path).read().is_none());
    }
}
