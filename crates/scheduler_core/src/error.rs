//! Event validation errors.

/// Errors raised when building an [`EventSpec`](crate::EventSpec) from raw
/// values.
///
/// Store operations themselves never fail; only construction does.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventError {
    /// Priority was below the floor of 1 or did not fit in a `u32`.
    #[error("priority must be at least 1, got {0}")]
    PriorityOutOfRange(i64),

    /// Remaining time was negative or did not fit in a `u32`.
    #[error("time remaining must be zero or more minutes, got {0}")]
    TimeRemainingOutOfRange(i64),
}
