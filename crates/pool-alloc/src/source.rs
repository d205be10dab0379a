//! Handles through which allocators reach a [`PoolRegistry`].

use alloc::rc::Rc;

use crate::{registry::PoolRegistry, slab_pool::SlabPool};

/// A cheap, clonable handle to a set of size-class pools.
///
/// All clones of a source must reach the same pools, so that memory handed
/// out through one clone can be returned through another.
pub trait PoolSource: Clone {
    /// Returns `true` if `size` is exactly one of the served size classes.
    fn supports(&self, size: usize) -> bool;

    /// Runs `f` on the pool serving exactly `size` bytes, or returns `None`
    /// if there is no such pool.
    fn with_pool<R>(&self, size: usize, f: impl FnOnce(&mut SlabPool) -> R) -> Option<R>;
}

impl PoolSource for &PoolRegistry {
    fn supports(&self, size: usize) -> bool {
        PoolRegistry::supports(self, size)
    }

    fn with_pool<R>(&self, size: usize, f: impl FnOnce(&mut SlabPool) -> R) -> Option<R> {
        PoolRegistry::with_pool(self, size, f)
    }
}

/// Reference-counted registry shared by every allocator cloned from it.
///
/// The registry, and with it every slab, lives until the last handle is
/// dropped. Containers holding a handle therefore never outlive their pools.
/// Two handles compare equal when they share the same registry.
///
/// # Examples
///
/// ```
/// use pool_alloc::{PoolSource, SharedPools};
///
/// let pools = SharedPools::default();
/// let other = pools.clone();
/// let ptr = pools.with_pool(8, |pool| pool.allocate()).unwrap();
/// assert_eq!(other.registry().owner_of(ptr), Some(8));
/// assert_eq!(pools, other);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SharedPools(Rc<PoolRegistry>);

impl SharedPools {
    /// Takes ownership of `registry` and shares it.
    #[must_use]
    pub fn new(registry: PoolRegistry) -> Self {
        Self(Rc::new(registry))
    }

    /// Returns the shared registry.
    #[must_use]
    pub fn registry(&self) -> &PoolRegistry {
        &self.0
    }
}

impl From<PoolRegistry> for SharedPools {
    fn from(registry: PoolRegistry) -> Self {
        Self::new(registry)
    }
}

impl PartialEq for SharedPools {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for SharedPools {}

impl PoolSource for SharedPools {
    fn supports(&self, size: usize) -> bool {
        self.0.supports(size)
    }

    fn with_pool<R>(&self, size: usize, f: impl FnOnce(&mut SlabPool) -> R) -> Option<R> {
        self.0.with_pool(size, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryConfig;

    #[test]
    fn test_clones_share_pools() {
        let pools = SharedPools::default();
        let clone = pools.clone();
        let ptr = pools.with_pool(16, SlabPool::allocate).unwrap();
        clone.with_pool(16, |pool| unsafe { pool.deallocate(ptr) });
        assert_eq!(pools.with_pool(16, SlabPool::allocate), Some(ptr));
    }

    #[test]
    fn test_equality_is_identity() {
        let a = SharedPools::default();
        let b = SharedPools::default();
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_borrowed_registry() {
        let config = RegistryConfig::new().with_size_classes([40]).unwrap();
        let registry = PoolRegistry::new(config).unwrap();
        let source = &registry;
        assert!(source.supports(40));
        assert!(!PoolSource::supports(&source, 8));
        assert!(source.with_pool(40, SlabPool::allocate).is_some());
        assert_eq!(registry.pool_stats(40).unwrap().in_use, 1);
    }
}
