//! Engine configuration.

use std::time::Duration;

use coordination::DEFAULT_COUNTRY_CODE;

/// Ticks of silence after which history sync counts as complete.
pub const DEFAULT_INACTIVITY_TICKS: u32 = 10;

/// Ticks of silence tolerated while the user is pairing a device.
pub const DEFAULT_PAIRING_TICKS: u32 = 60;

/// Settings for one worker run.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Length of one tick. Every poll-wait in the engine uses it.
    pub tick: Duration,

    /// Inactivity threshold in ticks.
    pub inactivity_ticks: u32,

    /// Inactivity threshold in ticks while pairing.
    pub pairing_ticks: u32,

    /// Country code used to normalize numbers.
    pub country_code: String,

    /// Never request a pairing code; stop instead.
    pub automation: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            inactivity_ticks: DEFAULT_INACTIVITY_TICKS,
            pairing_ticks: DEFAULT_PAIRING_TICKS,
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
            automation: false,
        }
    }
}

impl EngineConfig {
    /// Set the tick length.
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Set both inactivity thresholds.
    pub fn with_thresholds(mut self, inactivity_ticks: u32, pairing_ticks: u32) -> Self {
        self.inactivity_ticks = inactivity_ticks;
        self.pairing_ticks = pairing_ticks;
        self
    }

    pub fn with_automation(mut self, automation: bool) -> Self {
        self.automation = automation;
        self
    }

    pub fn with_country_code(mut self, country_code: impl Into<String>) -> Self {
        self.country_code = country_code.into();
        self
    }
}
