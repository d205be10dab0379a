//! Size-class dispatch.
//!
//! [`SizeClassAllocator`] computes the byte size of a request as
//! `size_of::<T>() * count`. If that total is exactly one of the size classes
//! of its [`PoolSource`], the request is served by the matching slab pool;
//! every other total, including multi-element requests that do not add up to
//! a class, goes to the global allocator.

use core::{fmt, marker::PhantomData, ptr::NonNull};

use derive_more::{Display, IsVariant};

use crate::{
    element::{self, ElementAllocator},
    error::AllocError,
    global::GlobalPools,
    slab_pool::{self, SlabPool},
    source::PoolSource,
};

/// Where a request of a given size is served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IsVariant)]
pub enum Route {
    /// The slab pool of this many bytes.
    #[display("pool({_0})")]
    Pool(usize),
    /// The global allocator.
    #[display("fallback")]
    Fallback,
}

/// Allocator routing exact size-class requests to slab pools.
///
/// The allocator itself owns no memory: it is a typed proxy to the pools of
/// its [`PoolSource`]. Clones and rebound copies share those pools, so memory
/// obtained through one may be released through any other.
///
/// The allocator does not propagate on copy assignment: a container assigned
/// from another keeps its own pools.
///
/// # Examples
///
/// ```
/// use pool_alloc::{ElementAllocator, Route, SizeClassAllocator};
///
/// let alloc = SizeClassAllocator::<u32>::new();
/// assert_eq!(alloc.route(1), Route::Pool(4));
/// assert_eq!(alloc.route(5), Route::Pool(20));
/// assert_eq!(alloc.route(3), Route::Fallback);
///
/// let ptr = alloc.try_allocate(2).unwrap();
/// unsafe {
///     alloc.deallocate(ptr, 2);
/// }
/// ```
pub struct SizeClassAllocator<T, P = GlobalPools> {
    pools: P,
    _marker: PhantomData<fn() -> T>,
}

impl<T> SizeClassAllocator<T> {
    /// Creates an allocator backed by the process-wide pools.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_pools(GlobalPools)
    }
}

impl<T, P> SizeClassAllocator<T, P> {
    /// Creates an allocator backed by `pools`.
    #[must_use]
    pub const fn with_pools(pools: P) -> Self {
        Self {
            pools,
            _marker: PhantomData,
        }
    }

    /// Returns the pool source backing this allocator.
    #[must_use]
    pub fn pools(&self) -> &P {
        &self.pools
    }
}

impl<T, P> SizeClassAllocator<T, P>
where
    P: PoolSource,
{
    /// Returns an allocator for `U` sharing this allocator's pools.
    #[must_use]
    pub fn rebind<U>(&self) -> SizeClassAllocator<U, P> {
        SizeClassAllocator::with_pools(self.pools.clone())
    }

    /// Returns where a request for `count` values of `T` would be served.
    #[must_use]
    pub fn route(&self, count: usize) -> Route {
        match size_of::<T>().checked_mul(count) {
            Some(size) if self.pools.supports(size) => Route::Pool(size),
            _ => Route::Fallback,
        }
    }
}

impl<T, P> Default for SizeClassAllocator<T, P>
where
    P: Default,
{
    fn default() -> Self {
        Self::with_pools(P::default())
    }
}

impl<T, P> Clone for SizeClassAllocator<T, P>
where
    P: Clone,
{
    fn clone(&self) -> Self {
        Self::with_pools(self.pools.clone())
    }
}

impl<T, P> Copy for SizeClassAllocator<T, P> where P: Copy {}

impl<T, P> PartialEq for SizeClassAllocator<T, P>
where
    P: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.pools == other.pools
    }
}

impl<T, P> Eq for SizeClassAllocator<T, P> where P: Eq {}

impl<T, P> fmt::Debug for SizeClassAllocator<T, P>
where
    P: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SizeClassAllocator")
            .field("elem_size", &size_of::<T>())
            .field("pools", &self.pools)
            .finish()
    }
}

impl<T, U, P> From<&SizeClassAllocator<U, P>> for SizeClassAllocator<T, P>
where
    P: PoolSource,
{
    fn from(other: &SizeClassAllocator<U, P>) -> Self {
        other.rebind()
    }
}

unsafe impl<T, P> ElementAllocator<T> for SizeClassAllocator<T, P>
where
    P: PoolSource,
{
    type Rebind<U> = SizeClassAllocator<U, P>;

    fn rebind<U>(&self) -> Self::Rebind<U> {
        Self::rebind(self)
    }

    fn try_allocate(&self, count: usize) -> Result<NonNull<T>, AllocError> {
        if let Some(size) = size_of::<T>().checked_mul(count) {
            if let Some(result) = self.pools.with_pool(size, SlabPool::try_allocate) {
                debug_assert!(align_of::<T>() <= slab_pool::slot_align(size));
                return result.map(NonNull::cast);
            }
        }
        element::fallback_allocate(count)
    }

    unsafe fn deallocate(&self, ptr: NonNull<T>, count: usize) {
        if let Some(size) = size_of::<T>().checked_mul(count) {
            let released = self
                .pools
                .with_pool(size, |pool| unsafe { pool.deallocate(ptr.cast()) });
            if released.is_some() {
                return;
            }
        }
        unsafe { element::fallback_deallocate(ptr, count) }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::{
        registry::{PoolRegistry, RegistryConfig},
        source::SharedPools,
    };

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::TRACE)
            .try_init();
    }

    fn shared<T>() -> SizeClassAllocator<T, SharedPools> {
        SizeClassAllocator::with_pools(SharedPools::default())
    }

    #[test]
    fn test_routes_exact_sizes_only() {
        let bytes = shared::<u8>();
        assert_eq!(bytes.route(4), Route::Pool(4));
        assert_eq!(bytes.route(20), Route::Pool(20));
        assert_eq!(bytes.route(5), Route::Fallback);
        assert_eq!(bytes.route(0), Route::Fallback);

        let triples = bytes.rebind::<[u64; 3]>();
        assert_eq!(triples.route(1), Route::Pool(24));
        assert!(triples.route(2).is_fallback());

        let words = bytes.rebind::<u64>();
        assert_eq!(words.route(usize::MAX), Route::Fallback);
        assert_eq!(Route::Pool(16).to_string(), "pool(16)");
        assert_eq!(Route::Fallback.to_string(), "fallback");
    }

    #[test]
    fn test_pooled_allocation_reuses_lifo() {
        init_tracing();
        let alloc = shared::<u64>();
        let ptr = alloc.try_allocate(1).unwrap();
        assert_eq!(alloc.pools().registry().owner_of(ptr.cast()), Some(8));
        unsafe {
            alloc.deallocate(ptr, 1);
        }
        assert_eq!(alloc.try_allocate(1).unwrap(), ptr);
    }

    #[test]
    fn test_fallback_addresses_are_not_pooled() {
        init_tracing();
        let alloc = shared::<u64>();
        let pooled = alloc.try_allocate(2).unwrap();
        let fallback = alloc.try_allocate(4).unwrap();
        let registry = alloc.pools().registry();

        assert_eq!(registry.owner_of(pooled.cast()), Some(16));
        assert_eq!(registry.owner_of(fallback.cast()), None);
        assert_eq!(registry.pool_stats(32), None);

        unsafe {
            fallback.write(7);
            alloc.deallocate(fallback, 4);
            alloc.deallocate(pooled, 2);
        }
        assert_eq!(registry.pool_stats(16).unwrap().in_use, 0);
    }

    #[test]
    fn test_rebound_copies_share_pools() {
        let alloc = shared::<u32>();
        let words = SizeClassAllocator::<[u32; 2], _>::from(&alloc);
        assert_eq!(words.pools(), alloc.pools());

        // 8 bytes through two different element types hit the same pool.
        let ptr = words.try_allocate(1).unwrap();
        unsafe {
            alloc.deallocate(ptr.cast::<u32>(), 2);
        }
        assert_eq!(alloc.try_allocate(2).unwrap(), ptr.cast());
    }

    #[test]
    fn test_growth_past_one_slab() {
        let config = RegistryConfig::new().with_slots_per_slab(32);
        let pools = SharedPools::new(PoolRegistry::new(config).unwrap());
        let alloc = SizeClassAllocator::<u32, _>::with_pools(pools);

        let ptrs = (0..100)
            .map(|i| {
                let ptr = alloc.try_allocate(1).unwrap();
                unsafe {
                    ptr.write(i);
                }
                ptr
            })
            .collect::<Vec<_>>();
        let stats = alloc.pools().registry().pool_stats(4).unwrap();
        assert_eq!(stats.slab_count, 4);
        assert_eq!(stats.in_use, 100);

        let unique = ptrs.iter().copied().collect::<HashSet<_>>();
        assert_eq!(unique.len(), 100);
        for (i, ptr) in ptrs.iter().enumerate() {
            assert_eq!(unsafe { ptr.read() }, u32::try_from(i).unwrap());
        }
        for ptr in ptrs {
            unsafe {
                alloc.deallocate(ptr, 1);
            }
        }
    }

    #[test]
    fn test_churn_scenario() {
        let alloc = shared::<u64>();
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            let ptr = alloc.try_allocate(1).unwrap();
            seen.insert(ptr);
            unsafe {
                alloc.deallocate(ptr, 1);
            }
        }
        let stats = alloc.pools().registry().pool_stats(8).unwrap();
        assert_eq!(stats.slab_count, 1);
        assert!(seen.len() <= stats.slots_per_slab);
    }

    #[test]
    fn test_zero_sized_types_never_touch_pools() {
        let alloc = shared::<()>();
        assert_eq!(alloc.route(10), Route::Fallback);
        let ptr = alloc.try_allocate(10).unwrap();
        assert_eq!(ptr, NonNull::dangling());
        unsafe {
            alloc.deallocate(ptr, 10);
        }
        assert!(
            alloc
                .pools()
                .registry()
                .size_classes()
                .iter()
                .all(|&size| alloc.pools().registry().pool_stats(size).is_none())
        );
    }

    #[test]
    fn test_global_allocator_is_default() {
        let alloc = SizeClassAllocator::<u16>::default();
        assert_eq!(alloc, SizeClassAllocator::new());
        let ptr = alloc.try_allocate(2).unwrap();
        assert_eq!(GlobalPools::owner_of(ptr.cast()), Some(4));
        unsafe {
            alloc.deallocate(ptr, 2);
        }
    }
}
