use crossbeam_utils::CachePadded;
use std::sync::atomic::{AtomicU32, Ordering};

/// Thread-safe counter of outstanding owners or pending items.
///
/// Padded to a cache line so counters embedded next to each other do not
/// false-share.
pub struct AtomicCounter {
    value: CachePadded<AtomicU32>,
}

impl AtomicCounter {
    pub fn new(value: u32) -> Self {
        Self {
            value: CachePadded::new(AtomicU32::new(value)),
        }
    }

    /// Overwrite the value. Only valid while no other thread holds a reference
    /// to whatever the counter tracks.
    pub fn set(&self, value: u32) {
        self.value.store(value, Ordering::Relaxed);
    }

    /// Add `increment` and return the previous value.
    pub fn add(&self, increment: u32) -> u32 {
        self.value.fetch_add(increment, Ordering::Relaxed)
    }

    /// Subtract `decrement`. Returns `false` once the counter reaches zero.
    pub fn sub(&self, decrement: u32) -> bool {
        let old = self.value.fetch_sub(decrement, Ordering::Release);
        debug_assert!(old >= decrement, "AtomicCounter underflow");
        if old == decrement {
            // Synchronize with every release of the other owners before the
            // caller tears down the shared object.
            std::sync::atomic::fence(Ordering::Acquire);
            return false;
        }
        true
    }

    pub fn get(&self) -> u32 {
        self.value.load(Ordering::Acquire)
    }
}

impl Default for AtomicCounter {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn sub_reports_zero() {
        let c = AtomicCounter::new(1);
        assert_eq!(c.add(1), 1);
        assert!(c.sub(1));
        assert!(!c.sub(1));
        assert_eq!(c.get(), 0);

        c.set(3);
        assert_eq!(c.get(), 3);
        assert!(c.sub(2));
    }

    #[test]
    fn concurrent_add_sub_balances() {
        let c = Arc::new(AtomicCounter::new(1));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let c = c.clone();
                thread::spawn(move || {
                    for _ in 0..10_000 {
                        c.add(1);
                        assert!(c.sub(1));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(c.get(), 1);
    }
}
