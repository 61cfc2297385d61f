//! Scripted provider - plays scripts and records calls.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use wa_bridge::{
    BridgeError, EventStream, GroupMetadata, OutgoingContent, Provider, SendReceipt, WireMessage,
};

use crate::gauge::SessionGauge;
use crate::script::Script;

/// What [`Provider::download_media`] returns.
#[derive(Debug, Clone)]
pub enum MediaMode {
    /// Every download succeeds with these bytes.
    Bytes(Vec<u8>),
    /// Every download fails.
    Fail,
}

/// One recorded call to [`Provider::connect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRecord {
    pub auth_dir: PathBuf,
    /// Whether the auth directory existed at the time of the call.
    pub auth_existed: bool,
}

#[derive(Debug, Default)]
struct State {
    scripts: VecDeque<Script>,
    connects: Vec<ConnectRecord>,
    sent: Vec<(String, OutgoingContent)>,
    pairing_requests: Vec<String>,
    downloads: usize,
    end_calls: usize,
}

/// A provider that plays one [`Script`] per connection attempt.
///
/// Clones share state, so a test can keep one handle while the engine owns
/// another. Connecting after every script has been played fails with
/// [`BridgeError::Connection`].
#[derive(Debug, Clone)]
pub struct ScriptedProvider {
    state: Arc<Mutex<State>>,
    groups: Arc<Vec<GroupMetadata>>,
    pairing_code: Arc<str>,
    media: Arc<MediaMode>,
    in_session: Arc<AtomicBool>,
    gauge: SessionGauge,
}

impl ScriptedProvider {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                scripts: scripts.into(),
                ..Default::default()
            })),
            groups: Arc::new(Vec::new()),
            pairing_code: Arc::from("ABCD1234"),
            media: Arc::new(MediaMode::Bytes(b"media-bytes".to_vec())),
            in_session: Arc::new(AtomicBool::new(false)),
            gauge: SessionGauge::new(),
        }
    }

    /// Groups returned by [`Provider::fetch_groups`].
    pub fn with_groups(mut self, groups: Vec<GroupMetadata>) -> Self {
        self.groups = Arc::new(groups);
        self
    }

    /// Code returned by [`Provider::request_pairing_code`].
    pub fn with_pairing_code(mut self, code: &str) -> Self {
        self.pairing_code = Arc::from(code);
        self
    }

    pub fn with_media(mut self, media: MediaMode) -> Self {
        self.media = Arc::new(media);
        self
    }

    /// Report session open/close to a shared gauge.
    pub fn with_gauge(mut self, gauge: SessionGauge) -> Self {
        self.gauge = gauge;
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // A test that panicked while holding the lock already failed
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn connects(&self) -> Vec<ConnectRecord> {
        self.state().connects.clone()
    }

    pub fn connect_count(&self) -> usize {
        self.state().connects.len()
    }

    /// Every message sent, in order, as `(jid, content)`.
    pub fn sent(&self) -> Vec<(String, OutgoingContent)> {
        self.state().sent.clone()
    }

    pub fn pairing_requests(&self) -> Vec<String> {
        self.state().pairing_requests.clone()
    }

    pub fn download_count(&self) -> usize {
        self.state().downloads
    }

    pub fn end_calls(&self) -> usize {
        self.state().end_calls
    }

    /// Scripts not yet played.
    pub fn remaining_scripts(&self) -> usize {
        self.state().scripts.len()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn connect(&self, auth_dir: &Path) -> Result<EventStream, BridgeError> {
        let script = {
            let mut state = self.state();
            state.connects.push(ConnectRecord {
                auth_dir: auth_dir.to_path_buf(),
                auth_existed: auth_dir.exists(),
            });
            state.scripts.pop_front()
        };

        let script =
            script.ok_or_else(|| BridgeError::Connection("no script left".to_string()))?;

        // Stand in for the engine writing credentials
        std::fs::create_dir_all(auth_dir)
            .map_err(|e| BridgeError::Connection(e.to_string()))?;

        if !self.in_session.swap(true, Ordering::SeqCst) {
            self.gauge.enter();
        }
        Ok(script.into_stream())
    }

    async fn request_pairing_code(&self, phone: &str) -> Result<String, BridgeError> {
        self.state().pairing_requests.push(phone.to_string());
        Ok(self.pairing_code.to_string())
    }

    async fn send_message(
        &self,
        jid: &str,
        content: OutgoingContent,
    ) -> Result<SendReceipt, BridgeError> {
        let mut state = self.state();
        let id = format!("SENT{}", state.sent.len() + 1);
        state.sent.push((jid.to_string(), content));
        Ok(SendReceipt::new(jid, id))
    }

    async fn fetch_groups(&self) -> Result<Vec<GroupMetadata>, BridgeError> {
        Ok(self.groups.as_ref().clone())
    }

    async fn download_media(&self, _message: &WireMessage) -> Result<Vec<u8>, BridgeError> {
        self.state().downloads += 1;
        match self.media.as_ref() {
            MediaMode::Bytes(bytes) => Ok(bytes.clone()),
            MediaMode::Fail => Err(BridgeError::Media("scripted failure".to_string())),
        }
    }

    async fn end(&self) -> Result<(), BridgeError> {
        self.state().end_calls += 1;
        if self.in_session.swap(false, Ordering::SeqCst) {
            self.gauge.leave();
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use futures::StreamExt;
    use wa_bridge::ProviderEvent;

    #[tokio::test]
    async fn test_plays_scripts_in_order() {
        let dir = std::env::temp_dir().join(format!("mock-provider-{}", std::process::id()));
        let provider = ScriptedProvider::new(vec![
            Script::new().close(515).end(),
            Script::new().open().end(),
        ]);

        let first: Vec<_> = provider.connect(&dir).await.unwrap().collect().await;
        assert!(matches!(
            first[0].as_ref().unwrap(),
            ProviderEvent::Connection(u) if u.status_code() == Some(515)
        ));

        let second: Vec<_> = provider.connect(&dir).await.unwrap().collect().await;
        assert_eq!(second.len(), 1);

        assert!(provider.connect(&dir).await.is_err());
        assert_eq!(provider.connect_count(), 3);
        assert!(provider.connects()[1].auth_existed);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_records_sends_and_media() {
        let provider = ScriptedProvider::new(vec![]).with_media(MediaMode::Fail);

        let receipt = provider
            .send_message("4917@s.whatsapp.net", OutgoingContent::text("hi"))
            .await
            .unwrap();
        assert_eq!(receipt.key.id.as_deref(), Some("SENT1"));
        assert_eq!(provider.sent().len(), 1);

        let msg = fixtures::image("IMG1", "4917@s.whatsapp.net", None, 1);
        assert!(provider.download_media(&msg).await.is_err());
        assert_eq!(provider.download_count(), 1);
    }

    #[tokio::test]
    async fn test_gauge_tracks_open_sessions() {
        let gauge = SessionGauge::new();
        let dir = std::env::temp_dir().join(format!("mock-provider-gauge-{}", std::process::id()));
        let a = ScriptedProvider::new(vec![Script::new()]).with_gauge(gauge.clone());
        let b = ScriptedProvider::new(vec![Script::new()]).with_gauge(gauge.clone());

        let _sa = a.connect(&dir).await.unwrap();
        let _sb = b.connect(&dir).await.unwrap();
        assert_eq!(gauge.active(), 2);

        a.end().await.unwrap();
        b.end().await.unwrap();
        assert_eq!(gauge.active(), 0);
        assert_eq!(gauge.peak(), 2);

        std::fs::remove_dir_all(&dir).ok();
    }
}
