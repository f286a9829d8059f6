//! Counting semaphore bounding in-flight queries
//!
//! Permits are RAII guards: a slot returns to the pool when its `Permit`
//! is dropped, so the holder decides exactly when the slot is released.

use parking_lot::{Condvar, Mutex};

pub struct Semaphore {
    permits: Mutex<usize>,
    available: Condvar,
    capacity: usize,
}

impl Semaphore {
    pub fn new(capacity: usize) -> Self {
        Self {
            permits: Mutex::new(capacity),
            available: Condvar::new(),
            capacity,
        }
    }

    /// Block until a slot is free, then take it
    pub fn acquire(&self) -> Permit<'_> {
        let mut permits = self.permits.lock();
        while *permits == 0 {
            self.available.wait(&mut permits);
        }
        *permits -= 1;
        Permit { semaphore: self }
    }

    /// Slots currently free
    pub fn available(&self) -> usize {
        *self.permits.lock()
    }

    fn release(&self) {
        let mut permits = self.permits.lock();
        *permits += 1;
        debug_assert!(*permits <= self.capacity);
        drop(permits);
        self.available.notify_one();
    }
}

/// One occupied slot; released on drop
#[must_use = "dropping a permit releases the slot immediately"]
pub struct Permit<'a> {
    semaphore: &'a Semaphore,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.semaphore.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_available_tracks_permits() {
        let sem = Semaphore::new(2);
        let a = sem.acquire();
        let b = sem.acquire();
        assert_eq!(sem.available(), 0);

        drop(a);
        assert_eq!(sem.available(), 1);
        drop(b);
        assert_eq!(sem.available(), 2);
    }

    #[test]
    fn test_acquire_blocks_until_release() {
        let sem = Semaphore::new(1);
        let held = sem.acquire();
        let acquired = AtomicUsize::new(0);

        thread::scope(|s| {
            s.spawn(|| {
                let _p = sem.acquire();
                acquired.store(1, Ordering::SeqCst);
            });

            thread::sleep(Duration::from_millis(50));
            assert_eq!(acquired.load(Ordering::SeqCst), 0);
            drop(held);
        });

        assert_eq!(acquired.load(Ordering::SeqCst), 1);
        assert_eq!(sem.available(), 1);
    }

    #[test]
    fn test_concurrent_holders_bounded() {
        let sem = Semaphore::new(3);
        let current = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);

        thread::scope(|s| {
            for _ in 0..16 {
                s.spawn(|| {
                    let _p = sem.acquire();
                    let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(2));
                    current.fetch_sub(1, Ordering::SeqCst);
                });
            }
        });

        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(sem.available(), 3);
    }
}
