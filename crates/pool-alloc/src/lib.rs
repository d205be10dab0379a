//! Size-class slab pools for many small, same-sized allocations.
//!
//! This crate serves containers that allocate large numbers of equally sized,
//! short-lived nodes. Such requests are routed to per-size slab pools that
//! recycle freed chunks, while every other request falls back to the global
//! allocator.
//!
//! # Components
//!
//! ## [`SlabPool`]
//!
//! Hands out chunks of one fixed size. Chunks are carved from large slabs
//! obtained from the global allocator; freed chunks go onto a LIFO free list
//! and are reused first.
//!
//! **Performance**: O(1) allocation and deallocation, no per-chunk header, no
//! fragmentation within a size class.
//!
//! ## [`PoolRegistry`]
//!
//! Owns one lazily created pool per size class (by default 4, 8, 16, 20 and
//! 24 bytes, 2048 slots per slab; see [`RegistryConfig`]). A registry is
//! reached through a [`PoolSource`]:
//!
//! - [`GlobalPools`]: the process-wide registry, created on first use
//! - [`SharedPools`]: a reference-counted registry owned by its handles
//! - `&PoolRegistry`: a borrowed registry
//!
//! ## [`SizeClassAllocator`]
//!
//! A typed, clonable, rebindable allocator. A request for `count` values of
//! `T` is served by the pool of exactly `size_of::<T>() * count` bytes, or by
//! the global allocator when no class matches. Containers are generic over
//! the [`ElementAllocator`] trait, which [`SystemAllocator`] also implements.
//!
//! # Usage Examples
//!
//! ```rust
//! use pool_alloc::{ElementAllocator, PoolRegistry, SharedPools, SizeClassAllocator};
//!
//! let pools = SharedPools::new(PoolRegistry::default());
//! let alloc = SizeClassAllocator::<u64, _>::with_pools(pools.clone());
//!
//! let ptr = alloc.try_allocate(1).unwrap();
//! assert_eq!(pools.registry().owner_of(ptr.cast()), Some(8));
//!
//! unsafe {
//!     alloc.deallocate(ptr, 1);
//! }
//! // The most recently freed chunk is handed out again.
//! assert_eq!(alloc.try_allocate(1).unwrap(), ptr);
//! ```
//!
//! # Memory Safety
//!
//! Deallocation is `unsafe` and unchecked in release builds. Callers must
//! ensure that:
//!
//! - memory is released to the allocator (or pool) it came from, with the
//!   same element count
//! - no chunk is released twice
//! - no chunk is accessed after its release
//!
//! Pools live as long as their registry, so chunks cannot outlive them as
//! long as the registry handle is kept alive.
//!
//! # Thread Safety
//!
//! Pools and registries are single-threaded. [`SharedPools`] is `!Send`; the
//! global registry serializes access with a spin lock.

#![cfg_attr(not(test), no_std)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

pub mod element;
pub mod error;
pub mod global;
pub mod registry;
pub mod size_class;
pub mod slab_pool;
pub mod source;

pub use self::{
    element::{ElementAllocator, SystemAllocator},
    error::{AllocError, ConfigError},
    global::GlobalPools,
    registry::{DEFAULT_SIZE_CLASSES, MAX_SIZE_CLASSES, PoolRegistry, RegistryConfig},
    size_class::{Route, SizeClassAllocator},
    slab_pool::{DEFAULT_SLOTS_PER_SLAB, PoolStats, SlabPool},
    source::{PoolSource, SharedPools},
};
