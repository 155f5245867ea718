//! Identifiers for in-flight lane submissions.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies one submission to a [`Lane`](crate::lane::Lane) for its entire
/// lifetime, from admission through completion or cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    /// The raw, process-local sequence number backing this ticket.
    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ticket-{}", self.0)
    }
}

/// Issues strictly increasing [`Ticket`]s, starting at 1.
#[derive(Debug)]
pub struct TicketGenerator {
    next: AtomicU64,
}

impl Default for TicketGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl TicketGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self { next: AtomicU64::new(1) }
    }

    /// Issues the next ticket. Never returns the same value twice.
    pub fn next(&self) -> Ticket {
        Ticket(self.next.fetch_add(1, Ordering::Relaxed))
    }
}
