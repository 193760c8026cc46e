//! Event type, identity allocation and the urgency formula.
//!
//! An [`Event`] is a named unit of pending work. Names are labels, not keys:
//! several events may share one. The store tells them apart with an
//! [`EventId`] handed out by an [`EventIdAllocator`].

use serde::{Deserialize, Serialize};

use crate::error::EventError;

/// The lowest (most urgent) priority an event can hold.
pub const MIN_PRIORITY: u32 = 1;

/// The priority given to an event with less than ten minutes remaining.
pub const PRIORITY_CEILING: u32 = 10;

/// Priority derived from remaining time: `max(1, 10 - floor(t / 10))`.
///
/// | minutes | priority |
/// |---------|----------|
/// | 0..=9   | 10       |
/// | 10..=19 | 9        |
/// | 90..    | 1        |
#[must_use]
pub const fn priority_for(time_remaining: u32) -> u32 {
    let priority = PRIORITY_CEILING.saturating_sub(time_remaining / 10);
    if priority < MIN_PRIORITY {
        MIN_PRIORITY
    } else {
        priority
    }
}

/// Store-internal identity of an event.
///
/// Ids are never reused within one store, so they also record insertion
/// order and serve as the FIFO tie-breaker between equal priorities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

impl EventId {
    /// Returns the raw `u64` identifier.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Allocates monotonically increasing event ids, starting at 1.
#[derive(Debug)]
pub struct EventIdAllocator {
    next_id: u64,
}

impl EventIdAllocator {
    /// Creates a new allocator.
    #[must_use]
    pub fn new() -> Self {
        Self { next_id: 1 }
    }

    /// Allocates a fresh id.
    pub fn allocate(&mut self) -> EventId {
        let id = self.next_id;
        self.next_id += 1;
        EventId(id)
    }

    /// Returns the number of ids allocated so far.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.next_id - 1
    }
}

impl Default for EventIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// A validated request to create an event.
///
/// Construction is the only fallible step in the event lifecycle; once a spec
/// exists, adding it to a store always succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSpec {
    name: String,
    priority: u32,
    time_remaining: u32,
}

impl EventSpec {
    /// Validate raw values into a spec.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::PriorityOutOfRange`] if `priority < 1`, and
    /// [`EventError::TimeRemainingOutOfRange`] if `time_remaining < 0`.
    /// Values that overflow `u32` are rejected with the same variants.
    pub fn new(
        name: impl Into<String>,
        priority: i64,
        time_remaining: i64,
    ) -> Result<Self, EventError> {
        let priority = u32::try_from(priority)
            .ok()
            .filter(|p| *p >= MIN_PRIORITY)
            .ok_or(EventError::PriorityOutOfRange(priority))?;
        let time_remaining = u32::try_from(time_remaining)
            .map_err(|_| EventError::TimeRemainingOutOfRange(time_remaining))?;

        Ok(Self {
            name: name.into(),
            priority,
            time_remaining,
        })
    }

    /// The event label.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The caller-supplied priority.
    #[must_use]
    pub fn priority(&self) -> u32 {
        self.priority
    }

    /// Remaining simulated work, in minutes.
    #[must_use]
    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }
}

/// A named unit of pending work.
///
/// Values handed out by the store are snapshots; changing one has no effect
/// on the stored event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Store-internal identity.
    pub id: EventId,
    /// Label; not unique.
    pub name: String,
    /// Lower values are processed first. Never below [`MIN_PRIORITY`].
    pub priority: u32,
    /// Minutes of simulated work left.
    pub time_remaining: u32,
}

impl Event {
    pub(crate) fn from_spec(id: EventId, spec: EventSpec) -> Self {
        Self {
            id,
            name: spec.name,
            priority: spec.priority,
            time_remaining: spec.time_remaining,
        }
    }

    /// Subtract `minutes` of remaining time, clamping at zero.
    pub(crate) fn decay(&mut self, minutes: u32) {
        self.time_remaining = self.time_remaining.saturating_sub(minutes);
    }

    /// Overwrite the priority from the remaining time.
    pub(crate) fn recompute_priority(&mut self) {
        self.priority = priority_for(self.time_remaining);
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Event: {}, Priority: {}, Time remaining: {} mins",
            self.name, self.priority, self.time_remaining
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_formula_table() {
        let cases = [(0, 10), (5, 10), (10, 9), (15, 9), (95, 1), (100, 1)];
        for (minutes, expected) in cases {
            assert_eq!(priority_for(minutes), expected, "minutes = {minutes}");
        }
    }

    #[test]
    fn test_priority_never_below_floor() {
        assert_eq!(priority_for(u32::MAX), MIN_PRIORITY);
        assert_eq!(priority_for(1_000), MIN_PRIORITY);
    }

    #[test]
    fn test_allocator_produces_unique_ids() {
        let mut alloc = EventIdAllocator::new();
        let a = alloc.allocate();
        let b = alloc.allocate();
        assert_eq!(a.id(), 1);
        assert_eq!(b.id(), 2);
        assert!(a < b);
        assert_eq!(alloc.count(), 2);
    }

    #[test]
    fn test_spec_accepts_valid_values() {
        let spec = EventSpec::new("deploy", 3, 0).unwrap();
        assert_eq!(spec.name(), "deploy");
        assert_eq!(spec.priority(), 3);
        assert_eq!(spec.time_remaining(), 0);
    }

    #[test]
    fn test_spec_rejects_priority_below_one() {
        assert_eq!(EventSpec::new("x", 0, 10), Err(EventError::PriorityOutOfRange(0)));
        assert_eq!(EventSpec::new("x", -4, 10), Err(EventError::PriorityOutOfRange(-4)));
    }

    #[test]
    fn test_spec_rejects_negative_time() {
        assert_eq!(
            EventSpec::new("x", 1, -1),
            Err(EventError::TimeRemainingOutOfRange(-1))
        );
    }

    #[test]
    fn test_spec_rejects_overflowing_values() {
        let big = i64::from(u32::MAX) + 1;
        assert_eq!(EventSpec::new("x", big, 1), Err(EventError::PriorityOutOfRange(big)));
        assert_eq!(
            EventSpec::new("x", 1, big),
            Err(EventError::TimeRemainingOutOfRange(big))
        );
    }

    #[test]
    fn test_spec_allows_empty_name() {
        assert!(EventSpec::new("", 1, 1).is_ok());
    }

    #[test]
    fn test_decay_clamps_at_zero() {
        let mut event = Event::from_spec(EventId(1), EventSpec::new("a", 1, 5).unwrap());
        event.decay(10);
        assert_eq!(event.time_remaining, 0);
    }

    #[test]
    fn test_event_display() {
        let event = Event::from_spec(EventId(7), EventSpec::new("backup", 2, 45).unwrap());
        assert_eq!(event.to_string(), "Event: backup, Priority: 2, Time remaining: 45 mins");
    }

    #[test]
    fn test_event_serializes_fields() {
        let event = Event::from_spec(EventId(3), EventSpec::new("a", 4, 12).unwrap());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["name"], "a");
        assert_eq!(json["priority"], 4);
        assert_eq!(json["time_remaining"], 12);
    }
}
