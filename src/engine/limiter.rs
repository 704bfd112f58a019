use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::shutdown::ShutdownReceiver;

/// Counting admission gate for in-flight requests.
///
/// Waiters are served in FIFO order. A slot is returned by dropping its
/// [`SlotPermit`], which wakes the oldest waiter.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    permits: Arc<Semaphore>,
    capacity: usize,
}

/// One occupied slot. Dropping it releases the slot.
#[derive(Debug)]
pub struct SlotPermit {
    _permit: OwnedSemaphorePermit,
}

impl ConcurrencyLimiter {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wait for a free slot.
    ///
    /// Returns `None` when shutdown is signalled first or the gate was closed.
    pub async fn acquire(&self, shutdown_rx: &mut ShutdownReceiver) -> Option<SlotPermit> {
        let permits = Arc::clone(&self.permits);
        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => None,
            permit = permits.acquire_owned() => permit.ok().map(|permit| SlotPermit { _permit: permit }),
        }
    }

    /// Take a slot only if one is free right now.
    #[must_use]
    pub fn try_acquire(&self) -> Option<SlotPermit> {
        Arc::clone(&self.permits)
            .try_acquire_owned()
            .ok()
            .map(|permit| SlotPermit { _permit: permit })
    }

    /// Refuse all current and future waiters.
    pub fn close(&self) {
        self.permits.close();
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.capacity
            .saturating_sub(self.permits.available_permits())
    }
}
