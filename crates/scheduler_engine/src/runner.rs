//! Background processing loop.
//!
//! Each cycle of the loop:
//!
//! 1. If the engine is idle, wait one outer tick (or until woken) and retry.
//!    The first cycle after a start publishes [`EngineReport::Started`].
//! 2. Decay every event's remaining time and recompute priorities.
//! 3. Publish a snapshot of the store.
//! 4. Pop the next event; if there is none, go idle.
//! 5. Process the event for one sub-tick per second of the outer tick,
//!    abandoning it as soon as a halt is observed.
//!
//! The stop flag is only checked at step 1, so an event already being
//! processed finishes its sub-ticks before the loop exits.

use scheduler_core::Event;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::report::EngineReport;
use crate::scheduler::{Cycle, Outcome, Scheduler};

/// The scheduler's processing loop.
///
/// [`run`](Self::run) consumes the loop, and the [`Scheduler`] it drives can
/// only be obtained from it, so a scheduler never has more than one loop.
#[derive(Debug)]
pub struct EngineLoop {
    scheduler: Scheduler,
    config: EngineConfig,
    reports: mpsc::UnboundedSender<EngineReport>,
    /// Events popped so far.
    dispatched: u64,
    /// Whether `Started` has been published for the current run of cycles.
    active: bool,
}

impl EngineLoop {
    /// Create a loop, its scheduler, and the receiving end of its report
    /// channel.
    #[must_use]
    pub fn new(config: EngineConfig) -> (Self, mpsc::UnboundedReceiver<EngineReport>) {
        let (reports, rx) = mpsc::unbounded_channel();
        let engine = Self {
            scheduler: Scheduler::new(),
            config,
            reports,
            dispatched: 0,
            active: false,
        };
        (engine, rx)
    }

    /// A handle to the scheduler this loop drives.
    #[must_use]
    pub fn scheduler(&self) -> Scheduler {
        self.scheduler.clone()
    }

    /// Run until the scheduler is stopped. Returns the number of events
    /// dispatched.
    pub async fn run(mut self) -> u64 {
        info!(
            tick_interval_secs = self.config.tick_interval_secs,
            sub_tick = ?self.config.sub_tick,
            decay_minutes = self.config.decay_per_cycle(),
            "processing loop starting"
        );

        loop {
            match self.scheduler.begin_cycle(self.config.decay_per_cycle()).await {
                Cycle::Stopped => break,
                Cycle::Idle => self.scheduler.wait_for_wake(self.config.idle_wait()).await,
                Cycle::Exhausted { snapshot } => {
                    self.mark_active();
                    self.report(EngineReport::Snapshot { events: snapshot });
                    info!("queue exhausted, going idle");
                    self.report(EngineReport::QueueExhausted);
                    self.active = false;
                }
                Cycle::Dispatched { snapshot, event } => {
                    self.mark_active();
                    self.dispatched += 1;
                    self.report(EngineReport::Snapshot { events: snapshot });
                    self.process(event).await;
                }
            }
        }

        info!(dispatched = self.dispatched, "processing loop stopped");
        self.report(EngineReport::Stopped);
        self.dispatched
    }

    /// Simulate work on `event`, one sub-tick at a time.
    async fn process(&mut self, event: Event) {
        info!(
            id = %event.id,
            name = %event.name,
            priority = event.priority,
            time_remaining = event.time_remaining,
            "processing event"
        );
        self.report(EngineReport::Processing { event: event.clone() });

        for sub_tick in 0..self.config.sub_ticks_per_event() {
            if self.scheduler.wait_sub_tick(self.config.sub_tick).await {
                debug!(name = %event.name, sub_tick, "halt observed");
                break;
            }
        }

        match self.scheduler.conclude(&event).await {
            Outcome::Halted { duplicates_removed } => {
                warn!(
                    id = %event.id,
                    name = %event.name,
                    duplicates_removed,
                    "event processing halted"
                );
                self.report(EngineReport::Halted {
                    event,
                    duplicates_removed,
                });
            }
            Outcome::Completed => {
                info!(id = %event.id, name = %event.name, "event completed");
                self.report(EngineReport::Completed { event });
            }
        }
    }

    /// Publish `Started` on the first active cycle after an idle period.
    fn mark_active(&mut self) {
        if !self.active {
            self.active = true;
            info!("processing started");
            self.report(EngineReport::Started);
        }
    }

    fn report(&self, report: EngineReport) {
        // Nobody listening is fine; the loop keeps running without observers.
        let _ = self.reports.send(report);
    }
}
