//! Engine configuration.

use std::time::Duration;

/// Default outer tick, in seconds.
pub const DEFAULT_TICK_INTERVAL_SECS: u32 = 10;

/// Default real duration of one sub-tick.
pub const DEFAULT_SUB_TICK: Duration = Duration::from_secs(1);

/// Configuration for the background processing loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Outer tick in seconds. Each event is processed for this many sub-ticks.
    pub tick_interval_secs: u32,
    /// Real duration of one sub-tick. Shortened in demos and tests.
    pub sub_tick: Duration,
    /// Minutes subtracted from every event per cycle. `None` derives it from
    /// the tick interval (`tick_interval_secs / 60`, rounded down).
    pub decay_minutes: Option<u32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_INTERVAL_SECS)
    }
}

impl EngineConfig {
    /// Create a config with the given outer tick and one-second sub-ticks.
    #[must_use]
    pub fn new(tick_interval_secs: u32) -> Self {
        Self {
            tick_interval_secs,
            sub_tick: DEFAULT_SUB_TICK,
            decay_minutes: None,
        }
    }

    /// Override the real duration of a sub-tick.
    #[must_use]
    pub fn with_sub_tick(mut self, sub_tick: Duration) -> Self {
        self.sub_tick = sub_tick;
        self
    }

    /// Override the per-cycle decay.
    #[must_use]
    pub fn with_decay_minutes(mut self, minutes: u32) -> Self {
        self.decay_minutes = Some(minutes);
        self
    }

    /// Minutes of remaining time removed from every event each cycle.
    #[must_use]
    pub fn decay_per_cycle(&self) -> u32 {
        self.decay_minutes.unwrap_or(self.tick_interval_secs / 60)
    }

    /// Number of sub-ticks an event is processed for.
    #[must_use]
    pub fn sub_ticks_per_event(&self) -> u32 {
        self.tick_interval_secs
    }

    /// How long the loop waits between polls while idle: one outer tick, and
    /// never less than one sub-tick. Saturates at [`Duration::MAX`].
    #[must_use]
    pub fn idle_wait(&self) -> Duration {
        self.sub_tick.saturating_mul(self.tick_interval_secs.max(1))
    }
}
