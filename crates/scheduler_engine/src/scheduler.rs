//! Shared scheduler context.
//!
//! A [`Scheduler`] is a cheap, cloneable handle to the one piece of shared
//! mutable state in the system: the [`EventStore`] plus the engine flags
//! (`running`, `stopped`, `halt_requested`). Both sit behind a single mutex,
//! so every store operation is atomic with respect to every other store
//! operation and to the flag updates that accompany it.
//!
//! The handle is used from two sides:
//!
//! - callers (console, tests) add/remove/list events and start/stop/halt;
//! - the [`EngineLoop`](crate::EngineLoop) drives cycles through the
//!   crate-private methods at the bottom of this file.
//!
//! A [`Notify`] wakes the loop out of its idle wait and sub-tick wait, so no
//! state change has to wait for a poll interval to be noticed.

use std::sync::Arc;
use std::time::Duration;

use scheduler_core::{Event, EventId, EventSpec, EventStore};
use serde::Serialize;
use tokio::sync::{Mutex, Notify};
use tracing::{debug, info};

/// Coarse lifecycle state of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    /// Not consuming events; waiting for [`Scheduler::start`].
    Idle,
    /// Consuming events.
    Running,
    /// Terminal. The loop has exited or will exit at its next cycle.
    Stopped,
}

/// Result of [`Scheduler::add`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Added {
    /// Snapshot of the stored event.
    pub event: Event,
    /// Whether the insert also halted the event being processed.
    pub preempted: bool,
}

/// What the loop should do next, decided atomically under the lock.
#[derive(Debug)]
pub(crate) enum Cycle {
    Stopped,
    Idle,
    Exhausted { snapshot: Vec<Event> },
    Dispatched { snapshot: Vec<Event>, event: Event },
}

/// How an in-flight event ended, decided when its bookkeeping is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Completed,
    Halted { duplicates_removed: usize },
}

#[derive(Debug, Default)]
struct SchedulerState {
    store: EventStore,
    running: bool,
    stopped: bool,
    halt_requested: bool,
    /// The event currently in its sub-tick wait, if any.
    in_flight: Option<EventId>,
}

impl SchedulerState {
    fn engine_state(&self) -> EngineState {
        if self.stopped {
            EngineState::Stopped
        } else if self.running {
            EngineState::Running
        } else {
            EngineState::Idle
        }
    }

    /// Latch the halt flag if an event is being processed.
    fn request_halt(&mut self) -> bool {
        if self.in_flight.is_some() {
            self.halt_requested = true;
        }
        self.halt_requested
    }
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<SchedulerState>,
    wake: Notify,
}

/// Handle to the event store and engine flags.
#[derive(Debug, Clone)]
pub struct Scheduler {
    shared: Arc<Shared>,
}

impl Scheduler {
    /// Only [`EngineLoop::new`](crate::EngineLoop::new) creates schedulers, so
    /// each one has exactly one loop.
    pub(crate) fn new() -> Self {
        Self {
            shared: Arc::new(Shared::default()),
        }
    }

    // ---------------------------------------------------------------------
    // Store operations
    // ---------------------------------------------------------------------

    /// Insert an event.
    ///
    /// If the engine is running and an event is mid-processing, the insert
    /// also halts that event so priorities are rechecked against the new one.
    pub async fn add(&self, spec: EventSpec) -> Added {
        let mut state = self.shared.state.lock().await;
        let event = state.store.add(spec);
        let preempted = state.running && state.request_halt();
        drop(state);

        info!(
            id = %event.id,
            name = %event.name,
            priority = event.priority,
            time_remaining = event.time_remaining,
            preempted,
            "event added"
        );
        if preempted {
            self.shared.wake.notify_one();
        }
        Added { event, preempted }
    }

    /// Remove every event called `name`. Returns how many were removed.
    pub async fn remove_by_name(&self, name: &str) -> usize {
        let removed = self.shared.state.lock().await.store.remove_by_name(name);
        info!(name, removed, "events removed by name");
        removed
    }

    /// Apply the urgency formula to every stored event.
    pub async fn recompute_priorities(&self) {
        self.shared.state.lock().await.store.recompute_priorities();
    }

    /// Subtract `minutes` from every stored event, clamping at zero.
    pub async fn decay_time(&self, minutes: u32) {
        self.shared.state.lock().await.store.decay_time(minutes);
    }

    /// Remove and return the lowest-priority event.
    pub async fn pop_next(&self) -> Option<Event> {
        self.shared.state.lock().await.store.pop_next()
    }

    /// The lowest-priority event, left in place.
    pub async fn peek_next(&self) -> Option<Event> {
        self.shared.state.lock().await.store.peek_next().cloned()
    }

    /// Snapshots of all events in insertion order.
    pub async fn list(&self) -> Vec<Event> {
        self.shared.state.lock().await.store.list().to_vec()
    }

    // ---------------------------------------------------------------------
    // Engine control
    // ---------------------------------------------------------------------

    /// Begin consuming events.
    ///
    /// Returns `true` on an `Idle -> Running` transition; `false` if already
    /// running or stopped.
    pub async fn start(&self) -> bool {
        let mut state = self.shared.state.lock().await;
        if state.stopped || state.running {
            debug!(state = ?state.engine_state(), "start ignored");
            return false;
        }
        state.running = true;
        drop(state);

        info!("scheduler started");
        self.shared.wake.notify_one();
        true
    }

    /// Stop the engine permanently.
    ///
    /// The loop notices at its next cycle boundary; an event already in its
    /// sub-tick wait runs to completion first. Returns `false` if already
    /// stopped.
    pub async fn stop(&self) -> bool {
        let mut state = self.shared.state.lock().await;
        if state.stopped {
            return false;
        }
        state.stopped = true;
        state.running = false;
        drop(state);

        info!("scheduler stopping");
        self.shared.wake.notify_one();
        true
    }

    /// Abandon the event currently being processed.
    ///
    /// Advisory: returns `false` and changes nothing when no event is in
    /// flight.
    pub async fn halt(&self) -> bool {
        let halted = self.shared.state.lock().await.request_halt();
        if halted {
            info!("halt requested");
            self.shared.wake.notify_one();
        } else {
            debug!("halt ignored, no event in flight");
        }
        halted
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> EngineState {
        self.shared.state.lock().await.engine_state()
    }

    /// The event currently being processed, if any.
    pub async fn in_flight(&self) -> Option<EventId> {
        self.shared.state.lock().await.in_flight
    }

    // ---------------------------------------------------------------------
    // Loop side
    // ---------------------------------------------------------------------

    /// Decay, recompute, snapshot and pop in one critical section.
    pub(crate) async fn begin_cycle(&self, decay_minutes: u32) -> Cycle {
        let mut state = self.shared.state.lock().await;
        if state.stopped {
            return Cycle::Stopped;
        }
        if !state.running {
            return Cycle::Idle;
        }

        state.store.decay_time(decay_minutes);
        state.store.recompute_priorities();
        let snapshot = state.store.list().to_vec();

        match state.store.pop_next() {
            Some(event) => {
                state.in_flight = Some(event.id);
                state.halt_requested = false;
                Cycle::Dispatched { snapshot, event }
            }
            None => {
                state.running = false;
                Cycle::Exhausted { snapshot }
            }
        }
    }

    /// Wait until woken or until `timeout` elapses.
    pub(crate) async fn wait_for_wake(&self, timeout: Duration) {
        let _ = tokio::time::timeout(timeout, self.shared.wake.notified()).await;
    }

    /// Wait out one sub-tick. Returns `true` as soon as a halt is seen.
    ///
    /// Wake-ups for anything other than a halt (start, stop) do not cut the
    /// sub-tick short.
    pub(crate) async fn wait_sub_tick(&self, sub_tick: Duration) -> bool {
        let deadline = tokio::time::sleep(sub_tick);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                () = &mut deadline => return self.halt_requested().await,
                () = self.shared.wake.notified() => {
                    if self.halt_requested().await {
                        return true;
                    }
                }
            }
        }
    }

    /// Clear in-flight bookkeeping once the sub-tick wait is over.
    ///
    /// The halt flag is read in the same critical section that clears
    /// `in_flight`, so every halt accepted while the event was in flight
    /// yields [`Outcome::Halted`], including one that arrives after the last
    /// sub-tick. For a halted event, same-named events still queued are
    /// removed as well.
    pub(crate) async fn conclude(&self, event: &Event) -> Outcome {
        let mut state = self.shared.state.lock().await;
        let outcome = if state.halt_requested {
            Outcome::Halted {
                duplicates_removed: state.store.remove_by_name(&event.name),
            }
        } else {
            Outcome::Completed
        };
        state.halt_requested = false;
        state.in_flight = None;
        outcome
    }

    async fn halt_requested(&self) -> bool {
        self.shared.state.lock().await.halt_requested
    }
}
