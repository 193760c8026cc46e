//! # scheduler_core
//!
//! The data half of the event scheduler: what an event is and how the set of
//! pending events is stored.
//!
//! This crate provides:
//!
//! - [`Event`]: a named unit of pending work with a priority and remaining
//!   simulated duration.
//! - [`EventSpec`]: a validated request to create an event.
//! - [`EventId`] / [`EventIdAllocator`]: store-internal identity, so that
//!   events sharing a name can still be told apart.
//! - [`EventStore`]: the heap-ordered and insertion-ordered views over the
//!   same set of events.
//! - [`priority_for`]: the linear urgency formula used on recompute.
//!
//! Nothing here locks. The owner of an [`EventStore`] is responsible for
//! serialising access to it.

pub mod error;
pub mod event;
pub mod store;

pub use error::EventError;
pub use event::{
    Event, EventId, EventIdAllocator, EventSpec, MIN_PRIORITY, PRIORITY_CEILING, priority_for,
};
pub use store::EventStore;
