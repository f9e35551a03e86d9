use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::Error;

/// Sequence generator that starts over from 0 once `u64::MAX` has been handed out.
///
/// Used to stamp buffer entries so iteration order equals insertion order.
#[derive(Debug, Default)]
pub struct RotaryIdGenerator {
    next: AtomicU64,
}

impl RotaryIdGenerator {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
        }
    }

    pub fn next_id(&self) -> u64 {
        // fetch_add wraps on overflow, which is exactly the rotation we want
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.next.store(0, Ordering::Relaxed);
    }
}

/// Sequence generator that refuses to wrap.
#[derive(Debug, Default)]
pub struct LongIdGenerator {
    next: AtomicU64,
}

impl LongIdGenerator {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
        }
    }

    pub fn next_id(&self) -> Result<u64, Error> {
        self.next
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |id| id.checked_add(1))
            .map_err(|_| Error::IdGeneratorExhausted)
    }

    pub fn reset(&self) {
        self.next.store(0, Ordering::Relaxed);
    }

    #[cfg(test)]
    fn starting_at(id: u64) -> Self {
        Self {
            next: AtomicU64::new(id),
        }
    }
}
