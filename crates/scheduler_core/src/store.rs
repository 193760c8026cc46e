//! Two-view event store.
//!
//! The store keeps the same set of events in two shapes:
//!
//! - an insertion-ordered `Vec<Event>`, which owns the event data and backs
//!   bulk operations (decay, recompute, listing, removal by name);
//! - a `BinaryHeap` of lightweight keys, ordered so the lowest priority pops
//!   first and equal priorities pop in insertion order.
//!
//! Every `&mut self` method leaves both views holding exactly the same
//! events. Callers that share a store across tasks must wrap it in a single
//! lock; the store does no locking of its own.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::event::{Event, EventId, EventIdAllocator, EventSpec};

/// Heap key for one stored event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct QueueKey {
    priority: u32,
    id: EventId,
}

impl From<&Event> for QueueKey {
    fn from(event: &Event) -> Self {
        Self {
            priority: event.priority,
            id: event.id,
        }
    }
}

// `BinaryHeap` is a max-heap, so both comparisons are reversed: the smallest
// priority, then the oldest id, compares greatest.
impl Ord for QueueKey {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for QueueKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The authoritative set of pending events.
#[derive(Debug, Default)]
pub struct EventStore {
    /// Insertion-ordered events.
    events: Vec<Event>,
    /// Priority-ordered keys into `events`.
    queue: BinaryHeap<QueueKey>,
    /// Id source for newly added events.
    ids: EventIdAllocator,
}

impl EventStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new event into both views and return a snapshot of it.
    ///
    /// Names are not checked for uniqueness.
    pub fn add(&mut self, spec: EventSpec) -> Event {
        let event = Event::from_spec(self.ids.allocate(), spec);
        self.queue.push(QueueKey::from(&event));
        self.events.push(event.clone());
        event
    }

    /// Remove every event called `name`. Returns how many were removed.
    pub fn remove_by_name(&mut self, name: &str) -> usize {
        let before = self.events.len();
        self.events.retain(|event| event.name != name);
        let removed = before - self.events.len();
        if removed > 0 {
            self.rebuild_queue();
        }
        removed
    }

    /// Set every priority to [`priority_for`](crate::priority_for) of its
    /// remaining time, then restore heap order.
    pub fn recompute_priorities(&mut self) {
        for event in &mut self.events {
            event.recompute_priority();
        }
        self.rebuild_queue();
    }

    /// Subtract `minutes` from every event's remaining time, clamping at zero.
    ///
    /// Priorities are left alone until the next recompute, so heap order is
    /// unaffected.
    pub fn decay_time(&mut self, minutes: u32) {
        for event in &mut self.events {
            event.decay(minutes);
        }
    }

    /// Remove and return the event with the lowest priority.
    pub fn pop_next(&mut self) -> Option<Event> {
        while let Some(key) = self.queue.pop() {
            if let Some(pos) = self.position(key.id) {
                return Some(self.events.remove(pos));
            }
        }
        None
    }

    /// The event [`pop_next`](Self::pop_next) would return, without removing it.
    #[must_use]
    pub fn peek_next(&self) -> Option<&Event> {
        let key = self.queue.peek()?;
        self.position(key.id).map(|pos| &self.events[pos])
    }

    /// All events in insertion order.
    #[must_use]
    pub fn list(&self) -> &[Event] {
        &self.events
    }

    /// Number of stored events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` if no events are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    fn position(&self, id: EventId) -> Option<usize> {
        self.events.iter().position(|event| event.id == id)
    }

    fn rebuild_queue(&mut self) {
        self.queue = self.events.iter().map(QueueKey::from).collect();
    }
}
