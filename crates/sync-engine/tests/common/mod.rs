//! Shared helpers for the session engine integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use coordination::DevicePaths;
use message_cache::Database;
use mock_provider::ScriptedProvider;
use sync_engine::{EngineConfig, SessionContext};
use tempfile::TempDir;

/// Normalized device number used by every test.
pub const DEVICE: &str = "491511234567";

/// Ticks of 10ms, completion after 5 quiet ticks, 20 while pairing.
pub fn fast_config() -> EngineConfig {
    EngineConfig::default()
        .with_tick(Duration::from_millis(10))
        .with_thresholds(5, 20)
}

/// A device in a scratch data directory with an open, migrated cache.
pub struct Harness {
    pub dir: TempDir,
    pub paths: DevicePaths,
    pub provider: ScriptedProvider,
    pub db: Database,
    pub ctx: SessionContext,
}

impl Harness {
    pub async fn new(provider: ScriptedProvider) -> Self {
        Self::with_config(provider, fast_config()).await
    }

    pub async fn with_config(provider: ScriptedProvider, config: EngineConfig) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let paths = DevicePaths::new(dir.path(), DEVICE);

        let db = Database::open(paths.cache_path()).await.unwrap();
        db.migrate().await.unwrap();

        let ctx = SessionContext::new(
            paths.clone(),
            Arc::new(provider.clone()),
            db.clone(),
            config,
        );

        Self {
            dir,
            paths,
            provider,
            db,
            ctx,
        }
    }

    pub async fn count(&self) -> i64 {
        message_cache::message::count_messages(self.db.pool())
            .await
            .unwrap()
    }
}

/// A JID in the personal domain.
pub fn user(number: &str) -> String {
    format!("{}@s.whatsapp.net", number)
}
