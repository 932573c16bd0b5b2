//! Bounded slots for external encoder processes.
//!
//! A [`RateLimiter`] hands out at most `capacity` [`Slot`]s at a time. A slot
//! is held for the lifetime of one encoder process and returned when dropped,
//! so every exit path of the owning task (success, failure, panic) frees it.
//!
//! [`RateLimiter::drain_all`] acquires every slot at once. It completes only
//! when nothing is running, which is how a run waits for in-flight work.

use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// One occupied encoder slot. Dropping it releases the slot.
pub type Slot = OwnedSemaphorePermit;

#[derive(Debug, Clone)]
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
    capacity: u32,
}

impl RateLimiter {
    /// Create a limiter with `capacity` slots (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, Semaphore::MAX_PERMITS.min(u32::MAX as usize));
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity: capacity as u32,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity as usize
    }

    /// Wait for a free slot.
    ///
    /// Fails only if the limiter has been closed, which this crate never does.
    pub async fn acquire(&self) -> Result<Slot, AcquireError> {
        Arc::clone(&self.semaphore).acquire_owned().await
    }

    /// Wait until every slot is free, then release them again.
    pub async fn drain_all(&self) -> Result<(), AcquireError> {
        let all = self.semaphore.acquire_many(self.capacity).await?;
        drop(all);
        Ok(())
    }
}
