//! Identity allocation for non-root nodes.
//!
//! Every node other than the root gets a freshly generated identity at
//! activation time. Allocators are shared by all activations in a process,
//! so implementations synchronize internally and callers never lock.

use crate::identity::Identity;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Source of unique identities.
///
/// # Guarantees
///
/// - Never returns a value previously returned by the same instance
/// - Never returns [`Identity::root`]
/// - Safe to call concurrently from any thread
pub trait IdentityAllocator: Send + Sync {
    fn new_identity(&self) -> Identity;
}

/// Allocates identities named by a random UUID v4, with an empty category.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidAllocator;

impl IdentityAllocator for UuidAllocator {
    fn new_identity(&self) -> Identity {
        // A hyphenated UUID can never spell "RootDir".
        Identity::new(Uuid::new_v4().to_string(), "")
    }
}

/// Deterministic allocator producing `prefix0`, `prefix1`, ...
///
/// Handy in tests and demos where stable identities make logs readable.
#[derive(Debug)]
pub struct SequentialAllocator {
    prefix: String,
    next: AtomicU64,
}

impl SequentialAllocator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(0),
        }
    }
}

impl Default for SequentialAllocator {
    fn default() -> Self {
        Self::new("node-")
    }
}

impl IdentityAllocator for SequentialAllocator {
    fn new_identity(&self) -> Identity {
        // The numeric suffix keeps every value distinct from "RootDir".
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        Identity::new(format!("{}{}", self.prefix, n), "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_uuid_allocator_unique() {
        let allocator = UuidAllocator;
        let ids: HashSet<_> = (0..1000).map(|_| allocator.new_identity()).collect();
        assert_eq!(ids.len(), 1000);
        assert!(!ids.contains(&Identity::root()));
        assert!(ids.iter().all(|id| id.category.is_empty()));
    }

    #[test]
    fn test_sequential_allocator_order() {
        let allocator = SequentialAllocator::new("n");
        assert_eq!(allocator.new_identity(), Identity::new("n0", ""));
        assert_eq!(allocator.new_identity(), Identity::new("n1", ""));
    }

    #[test]
    fn test_sequential_allocator_never_root() {
        let allocator = SequentialAllocator::new("RootDir");
        for _ in 0..10 {
            assert!(!allocator.new_identity().is_root());
        }
    }

    #[test]
    fn test_sequential_allocator_concurrent() {
        let allocator = Arc::new(SequentialAllocator::default());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let allocator = Arc::clone(&allocator);
                thread::spawn(move || {
                    (0..100).map(|_| allocator.new_identity()).collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(all.insert(id), "identity handed out twice");
            }
        }
        assert_eq!(all.len(), 800);
    }
}
