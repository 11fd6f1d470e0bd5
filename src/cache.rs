//! Concurrency-safe holder of the latest known ticket.

use parking_lot::RwLock;

use crate::ticket::Ticket;

/// Shared cache for the single latest ticket.
///
/// Any number of readers; the refresh coordinator is the only writer.
/// Reads never wait behind an in-flight fetch: the cache performs no I/O.
#[derive(Debug)]
pub struct TicketCache {
    inner: RwLock<Ticket>,
}

impl TicketCache {
    /// Create a cache holding the empty sentinel.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Ticket::empty()),
        }
    }

    /// Snapshot of the last stored ticket.
    pub fn get(&self) -> Ticket {
        self.inner.read().clone()
    }

    /// Overwrite the stored ticket unconditionally. Last write wins.
    pub fn put(&self, ticket: Ticket) {
        *self.inner.write() = ticket;
    }
}

impl Default for TicketCache {
    fn default() -> Self {
        Self::new()
    }
}
