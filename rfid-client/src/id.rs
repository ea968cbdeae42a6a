//! Command id generation

use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out command ids, starting at 1
///
/// Owned by one channel. Id 0 is the wildcard and is never returned.
#[derive(Debug)]
pub struct CommandIdGenerator {
    next: AtomicU64,
}

impl CommandIdGenerator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    pub fn next_id(&self) -> u64 {
        loop {
            let id = self.next.fetch_add(1, Ordering::Relaxed);
            if id != 0 {
                return id;
            }
        }
    }
}

impl Default for CommandIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
