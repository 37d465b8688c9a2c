//! Latest-request-wins guard for view state slots.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic request counter for one state slot.
///
/// Every load takes a [`Ticket`] before awaiting the backend and applies its
/// response only if no newer load began in the meantime.
#[derive(Debug, Default)]
pub struct Generation(AtomicU64);

/// Identifies one in-flight load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

impl Generation {
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Start a load, superseding every earlier ticket.
    pub fn begin(&self) -> Ticket {
        Ticket(self.0.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Whether `ticket` belongs to the most recent load.
    #[must_use]
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.0.load(Ordering::Acquire) == ticket.0
    }
}
