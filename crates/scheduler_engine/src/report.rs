//! Observable output of the processing loop.

use std::fmt;

use scheduler_core::Event;
use serde::Serialize;

/// Something the processing loop did, published on the report channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineReport {
    /// The loop picked up work after a start.
    Started,
    /// Store contents after decay and recompute, before the next pop.
    Snapshot {
        /// Events in insertion order.
        events: Vec<Event>,
    },
    /// An event was popped and its sub-tick wait has begun.
    Processing {
        /// The popped event.
        event: Event,
    },
    /// All sub-ticks elapsed without a halt.
    Completed {
        /// The finished event.
        event: Event,
    },
    /// A halt arrived during the sub-tick wait; the event was discarded.
    Halted {
        /// The abandoned event.
        event: Event,
        /// Same-named events still queued that were removed with it.
        duplicates_removed: usize,
    },
    /// The store was empty; the engine went idle.
    QueueExhausted,
    /// The loop observed the stop flag and exited.
    Stopped,
}

impl fmt::Display for EngineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started => write!(f, "Event processing started."),
            Self::Snapshot { events } => write!(f, "{}", EventListing(events)),
            Self::Processing { event } => write!(
                f,
                "Processing event: {} with priority {} (time remaining: {} mins)",
                event.name, event.priority, event.time_remaining
            ),
            Self::Completed { event } => write!(f, "Completed event: {}", event.name),
            Self::Halted { event, .. } => write!(f, "Event {} processing halted.", event.name),
            Self::QueueExhausted => write!(f, "No more events to process."),
            Self::Stopped => write!(f, "Event scheduler stopped."),
        }
    }
}

/// Text rendering of a list of events, one per line.
pub struct EventListing<'a>(pub &'a [Event]);

impl fmt::Display for EventListing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "No events in the system.");
        }
        write!(f, "Current events in the system:")?;
        for event in self.0 {
            write!(f, "\n{event}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use scheduler_core::{EventSpec, EventStore};

    use super::*;

    fn event(name: &str, priority: i64, minutes: i64) -> Event {
        EventStore::new().add(EventSpec::new(name, priority, minutes).unwrap())
    }

    #[test]
    fn test_empty_listing() {
        assert_eq!(EventListing(&[]).to_string(), "No events in the system.");
    }

    #[test]
    fn test_listing_one_line_per_event() {
        let events = vec![event("a", 1, 10), event("b", 2, 20)];
        let text = EventListing(&events).to_string();
        assert_eq!(
            text,
            "Current events in the system:\n\
             Event: a, Priority: 1, Time remaining: 10 mins\n\
             Event: b, Priority: 2, Time remaining: 20 mins"
        );
    }

    #[test]
    fn test_report_text() {
        let e = event("sync", 4, 30);
        assert_eq!(
            EngineReport::Processing { event: e.clone() }.to_string(),
            "Processing event: sync with priority 4 (time remaining: 30 mins)"
        );
        assert_eq!(
            EngineReport::Completed { event: e.clone() }.to_string(),
            "Completed event: sync"
        );
        assert_eq!(
            EngineReport::Halted {
                event: e,
                duplicates_removed: 0
            }
            .to_string(),
            "Event sync processing halted."
        );
    }

    #[test]
    fn test_report_json_is_tagged() {
        let json = serde_json::to_value(EngineReport::QueueExhausted).unwrap();
        assert_eq!(json["kind"], "queue_exhausted");

        let json = serde_json::to_value(EngineReport::Started).unwrap();
        assert_eq!(json["kind"], "started");
        assert_eq!(EngineReport::Started.to_string(), "Event processing started.");

        let json = serde_json::to_value(EngineReport::Completed {
            event: event("a", 1, 1),
        })
        .unwrap();
        assert_eq!(json["kind"], "completed");
        assert_eq!(json["event"]["name"], "a");
    }
}
