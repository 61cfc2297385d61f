//! History-sync completion detection.
//!
//! The provider never says when history sync is done. Instead a counter
//! advances once per tick and every ingested event resets it; when it reaches
//! the threshold the sync is considered complete. Completion is sticky: once
//! flagged the detector stops counting, and later resets do not undo it.
//!
//! A sync that pauses for exactly the threshold is misclassified as
//! complete. That imprecision is accepted.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info, trace};

#[derive(Debug)]
struct DetectorState {
    count: u32,
    threshold: u32,
    complete: bool,
}

/// Shared inactivity counter with named transitions.
#[derive(Debug, Clone)]
pub struct InactivityDetector {
    state: Arc<Mutex<DetectorState>>,
    default_threshold: u32,
    pairing_threshold: u32,
}

impl InactivityDetector {
    /// Create a detector using `default_threshold` ticks normally and
    /// `pairing_threshold` ticks while a device is being paired.
    pub fn new(default_threshold: u32, pairing_threshold: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(DetectorState {
                count: 0,
                threshold: default_threshold,
                complete: false,
            })),
            default_threshold,
            pairing_threshold,
        }
    }

    fn lock(&self) -> MutexGuard<'_, DetectorState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Advance one tick. Returns whether the sync is complete.
    pub fn tick(&self) -> bool {
        let mut state = self.lock();
        if state.complete {
            return true;
        }

        state.count += 1;
        trace!("Inactivity {}/{}", state.count, state.threshold);

        if state.count >= state.threshold {
            state.complete = true;
            info!("No new messages for {} ticks; sync complete", state.count);
        }
        state.complete
    }

    /// An event arrived; start counting from zero.
    pub fn reset(&self) {
        self.lock().count = 0;
    }

    /// Switch to the pairing threshold and restart the count.
    pub fn raise_threshold(&self) {
        let mut state = self.lock();
        state.count = 0;
        state.threshold = self.pairing_threshold;
        debug!("Inactivity threshold raised to {}", state.threshold);
    }

    /// Switch back to the default threshold and restart the count.
    pub fn restore_threshold(&self) {
        let mut state = self.lock();
        state.count = 0;
        state.threshold = self.default_threshold;
        debug!("Inactivity threshold restored to {}", state.threshold);
    }

    /// Shut down: threshold zero, flagged complete so every waiter returns.
    pub fn finish(&self) {
        let mut state = self.lock();
        state.threshold = 0;
        state.complete = true;
    }

    pub fn is_complete(&self) -> bool {
        self.lock().complete
    }

    /// Ticks since the last reset.
    pub fn count(&self) -> u32 {
        self.lock().count
    }

    pub fn threshold(&self) -> u32 {
        self.lock().threshold
    }

    /// Wait until completion is flagged, polling every `tick`.
    pub async fn wait_complete(&self, tick: Duration) {
        while !self.is_complete() {
            tokio::time::sleep(tick).await;
        }
    }

    /// Drive [`InactivityDetector::tick`] every `tick` until complete.
    ///
    /// The task stops on its own at completion and is aborted when the
    /// returned handle is dropped.
    pub fn spawn_ticker(&self, tick: Duration) -> TickerHandle {
        let detector = self.clone();
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + tick, tick);
            loop {
                interval.tick().await;
                if detector.tick() {
                    break;
                }
            }
        });
        TickerHandle(handle)
    }
}

/// Aborts the ticker task on drop.
#[derive(Debug)]
pub struct TickerHandle(JoinHandle<()>);

impl Drop for TickerHandle {
    fn drop(&mut self) {
        self.0.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completes_at_threshold() {
        let detector = InactivityDetector::new(3, 6);
        assert!(!detector.tick());
        assert!(!detector.tick());
        assert!(detector.tick());
        assert!(detector.is_complete());
    }

    #[test]
    fn test_reset_restarts_count() {
        let detector = InactivityDetector::new(3, 6);
        detector.tick();
        detector.tick();
        detector.reset();
        assert_eq!(detector.count(), 0);
        assert!(!detector.tick());
        assert!(!detector.tick());
        assert!(detector.tick());
    }

    #[test]
    fn test_completion_is_sticky() {
        let detector = InactivityDetector::new(1, 6);
        assert!(detector.tick());
        detector.reset();
        assert!(detector.is_complete());
        assert!(detector.tick());
    }

    #[test]
    fn test_pairing_threshold() {
        let detector = InactivityDetector::new(2, 4);
        detector.tick();
        detector.raise_threshold();
        assert_eq!(detector.threshold(), 4);
        assert_eq!(detector.count(), 0);

        for _ in 0..3 {
            assert!(!detector.tick());
        }
        detector.restore_threshold();
        assert_eq!(detector.threshold(), 2);
        assert!(!detector.tick());
        assert!(detector.tick());
    }

    #[test]
    fn test_finish_completes_immediately() {
        let detector = InactivityDetector::new(10, 60);
        detector.finish();
        assert!(detector.is_complete());
        assert_eq!(detector.threshold(), 0);
    }

    #[tokio::test]
    async fn test_ticker_and_wait() {
        let detector = InactivityDetector::new(3, 60);
        let _ticker = detector.spawn_ticker(Duration::from_millis(10));

        tokio::time::timeout(
            Duration::from_secs(2),
            detector.wait_complete(Duration::from_millis(5)),
        )
        .await
        .unwrap();
        assert!(detector.is_complete());
        assert!(detector.count() >= 3);
    }

    #[tokio::test]
    async fn test_resets_delay_completion() {
        let detector = InactivityDetector::new(20, 60);
        let _ticker = detector.spawn_ticker(Duration::from_millis(10));

        for _ in 0..5 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            detector.reset();
            assert!(!detector.is_complete());
        }
    }
}
