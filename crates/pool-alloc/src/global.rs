//! Process-wide pool registry.
//!
//! The global registry uses the default [`RegistryConfig`] and is created on
//! first use. It is never dropped, so its slabs live until the process exits
//! and chunks taken from it can never outlive their pool.
//!
//! Rust statics must be `Sync`, so the registry sits behind a [`spin::Mutex`].
//! The pools themselves are still single-threaded; the lock only serializes
//! access to them.
//!
//! [`RegistryConfig`]: crate::RegistryConfig

use core::ptr::NonNull;

use spin::{Lazy, Mutex};

use crate::{
    registry::PoolRegistry,
    slab_pool::{PoolStats, SlabPool},
    source::PoolSource,
};

static GLOBAL_POOLS: Lazy<Mutex<PoolRegistry>> =
    Lazy::new(|| Mutex::new(PoolRegistry::default()));

/// Zero-sized handle to the process-wide registry.
///
/// This is the default pool source of
/// [`SizeClassAllocator`](crate::SizeClassAllocator). All handles are equal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct GlobalPools;

impl GlobalPools {
    /// Returns the counters of the global pool for `size`, if it has been
    /// created.
    #[must_use]
    pub fn pool_stats(size: usize) -> Option<PoolStats> {
        GLOBAL_POOLS.lock().pool_stats(size)
    }

    /// Returns the size class whose global pool owns `ptr`.
    #[must_use]
    pub fn owner_of(ptr: NonNull<u8>) -> Option<usize> {
        GLOBAL_POOLS.lock().owner_of(ptr)
    }
}

impl PoolSource for GlobalPools {
    fn supports(&self, size: usize) -> bool {
        GLOBAL_POOLS.lock().supports(size)
    }

    fn with_pool<R>(&self, size: usize, f: impl FnOnce(&mut SlabPool) -> R) -> Option<R> {
        GLOBAL_POOLS.lock().with_pool(size, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DEFAULT_SIZE_CLASSES;

    #[test]
    fn test_serves_default_classes() {
        for size in DEFAULT_SIZE_CLASSES {
            assert!(GlobalPools.supports(size));
        }
        assert!(!GlobalPools.supports(32));
    }

    #[test]
    fn test_global_chunks_are_owned_by_their_class() {
        let ptr = GlobalPools.with_pool(20, SlabPool::allocate).unwrap();
        assert_eq!(GlobalPools::owner_of(ptr), Some(20));
        assert!(GlobalPools::pool_stats(20).unwrap().slab_count >= 1);
        GlobalPools.with_pool(20, |pool| unsafe { pool.deallocate(ptr) });
    }
}
