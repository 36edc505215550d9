use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic id source that can be shared across threads.
///
/// Ids are never reused for the lifetime of the allocator, so two values
/// handed out by the same allocator always compare unequal.
#[derive(Debug)]
pub struct IdAllocator {
    next: AtomicU64,
}

impl IdAllocator {
    pub const fn new(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::IdAllocator;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    #[test]
    fn ids_are_sequential_from_first() {
        let ids = IdAllocator::new(10);
        assert_eq!(ids.next_id(), 10);
        assert_eq!(ids.next_id(), 11);
    }

    #[test]
    fn ids_are_unique_across_threads() {
        let ids = Arc::new(IdAllocator::default());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ids = Arc::clone(&ids);
                std::thread::spawn(move || (0..100).map(|_| ids.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = BTreeSet::new();
        for h in handles {
            for id in h.join().unwrap() {
                assert!(seen.insert(id), "duplicate id {id}");
            }
        }
        assert_eq!(seen.len(), 400);
    }
}
