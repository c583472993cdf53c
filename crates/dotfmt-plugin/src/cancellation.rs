//! Cooperative cancellation of in-flight format jobs.
//!
//! The reading loop registers a token for every format request before the job
//! starts, and `CancelFormat` takes it back out. Whoever takes a ticket first
//! owns it: the job removes its own ticket when it finishes, so a late cancel
//! finds nothing and is a no-op.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

const CANCEL_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::cancellation");

/// Shared flag a format job polls between units of work.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Returns whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Request id to token map.
#[derive(Debug, Default)]
pub struct CancellationRegistry {
    tickets: Mutex<HashMap<u32, CancellationToken>>,
}

impl CancellationRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `token` for the request `id`, replacing any stale ticket.
    pub fn register(&self, id: u32, token: CancellationToken) {
        self.tickets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, token);
    }

    /// Atomically removes and returns the ticket for `id`.
    pub fn take(&self, id: u32) -> Option<CancellationToken> {
        self.tickets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
    }

    /// Cancels the request `id` if it is still in flight.
    ///
    /// Returns whether a ticket was found.
    pub fn cancel(&self, id: u32) -> bool {
        let found = self.take(id).inspect(CancellationToken::cancel).is_some();
        debug!(target: CANCEL_TARGET, id, found, "cancel requested");
        found
    }

    /// Number of registered tickets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tickets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns whether no tickets are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn registry() -> CancellationRegistry {
        CancellationRegistry::new()
    }

    #[rstest]
    fn cancel_flips_the_registered_token(registry: CancellationRegistry) {
        let token = CancellationToken::new();
        registry.register(4, token.clone());

        assert!(registry.cancel(4));
        assert!(token.is_cancelled());
        assert!(registry.is_empty());
    }

    #[rstest]
    fn cancelling_an_unknown_id_is_a_no_op(registry: CancellationRegistry) {
        let token = CancellationToken::new();
        registry.register(1, token.clone());

        assert!(!registry.cancel(2));
        assert!(!token.is_cancelled());
        assert_eq!(registry.len(), 1);
    }

    #[rstest]
    fn take_hands_the_ticket_to_one_caller(registry: CancellationRegistry) {
        registry.register(9, CancellationToken::new());
        assert!(registry.take(9).is_some());
        assert!(registry.take(9).is_none());
        assert!(!registry.cancel(9));
    }

    #[test]
    fn clones_share_state() {
        let token = CancellationToken::new();
        let observer = token.clone();
        token.cancel();
        token.cancel();
        assert!(observer.is_cancelled());
    }
}
