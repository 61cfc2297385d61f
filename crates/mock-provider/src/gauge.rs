//! Concurrency gauge shared between providers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Counts sessions that are open at the same time, across every provider
/// holding a clone.
#[derive(Debug, Clone, Default)]
pub struct SessionGauge {
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl SessionGauge {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn enter(&self) {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    pub(crate) fn leave(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }

    /// Sessions open right now.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Most sessions ever open at once.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}
