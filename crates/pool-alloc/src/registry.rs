//! Explicitly owned set of slab pools, one per size class.

use core::{
    cell::{OnceCell, RefCell},
    ptr::NonNull,
};

use arrayvec::ArrayVec;
use snafu::{OptionExt as _, ensure};
use tracing::debug;

use crate::{
    error::{
        ConfigError, DuplicateSizeClassSnafu, TooManySizeClassesSnafu, ZeroSlabCapacitySnafu,
        ZeroSlotSizeSnafu,
    },
    slab_pool::{self, DEFAULT_SLOTS_PER_SLAB, PoolStats, SlabPool},
};

/// Maximum number of size classes a registry can serve.
pub const MAX_SIZE_CLASSES: usize = 16;

/// Size classes served when no other set is configured.
///
/// They match the node sizes of small element types in a doubly-linked list.
pub const DEFAULT_SIZE_CLASSES: [usize; 5] = [4, 8, 16, 20, 24];

/// Configuration of a [`PoolRegistry`].
///
/// # Examples
///
/// ```
/// use pool_alloc::{PoolRegistry, RegistryConfig};
///
/// let config = RegistryConfig::new()
///     .with_size_classes([32, 48])
///     .unwrap()
///     .with_slots_per_slab(512);
/// let registry = PoolRegistry::new(config).unwrap();
/// assert!(registry.supports(48));
/// assert!(!registry.supports(24));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    size_classes: ArrayVec<usize, MAX_SIZE_CLASSES>,
    slots_per_slab: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            size_classes: DEFAULT_SIZE_CLASSES.into_iter().collect(),
            slots_per_slab: DEFAULT_SLOTS_PER_SLAB,
        }
    }
}

impl RegistryConfig {
    /// Returns the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the set of size classes.
    pub fn with_size_classes<I>(mut self, classes: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = usize>,
    {
        self.size_classes.clear();
        for size in classes {
            self.size_classes.try_push(size).ok().context(TooManySizeClassesSnafu {
                max: MAX_SIZE_CLASSES,
            })?;
        }
        Ok(self)
    }

    /// Sets the number of slots carved from each slab.
    #[must_use]
    pub fn with_slots_per_slab(mut self, slots_per_slab: usize) -> Self {
        self.slots_per_slab = slots_per_slab;
        self
    }

    /// Returns the configured size classes in the order given.
    #[must_use]
    pub fn size_classes(&self) -> &[usize] {
        &self.size_classes
    }

    /// Returns the number of slots per slab.
    #[must_use]
    pub fn slots_per_slab(&self) -> usize {
        self.slots_per_slab
    }

    /// Checks that every class can back a slab pool.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure!(self.slots_per_slab > 0, ZeroSlabCapacitySnafu);
        for (i, &size) in self.size_classes.iter().enumerate() {
            ensure!(size > 0, ZeroSlotSizeSnafu);
            ensure!(
                !self.size_classes[..i].contains(&size),
                DuplicateSizeClassSnafu { size }
            );
            slab_pool::slab_layout(size, self.slots_per_slab)?;
        }
        Ok(())
    }
}

/// One slab pool per configured size class.
///
/// Pools are created lazily, together with their first slab, the first time
/// their class is requested. All allocators pointing at the same registry
/// share its pools. Dropping the registry releases every slab, so it must
/// outlive all chunks handed out from it; [`SharedPools`] and borrowed
/// registries enforce this through ownership and lifetimes.
///
/// The registry is single-threaded: pools sit behind [`RefCell`]s.
///
/// [`SharedPools`]: crate::SharedPools
#[derive(Debug)]
pub struct PoolRegistry {
    config: RegistryConfig,
    pools: ArrayVec<OnceCell<RefCell<SlabPool>>, MAX_SIZE_CLASSES>,
}

impl Default for PoolRegistry {
    fn default() -> Self {
        Self::from_validated(RegistryConfig::default())
    }
}

impl PoolRegistry {
    /// Builds a registry after validating `config`.
    pub fn new(config: RegistryConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_validated(config))
    }

    fn from_validated(config: RegistryConfig) -> Self {
        debug!(
            size_classes = ?config.size_classes(),
            slots_per_slab = config.slots_per_slab(),
            "created pool registry"
        );
        let pools = config.size_classes.iter().map(|_| OnceCell::new()).collect();
        Self { config, pools }
    }

    /// Returns the configuration the registry was built from.
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Returns the size classes served by this registry.
    #[must_use]
    pub fn size_classes(&self) -> &[usize] {
        self.config.size_classes()
    }

    /// Returns `true` if `size` is exactly one of the size classes.
    #[must_use]
    pub fn supports(&self, size: usize) -> bool {
        self.class_index(size).is_some()
    }

    fn class_index(&self, size: usize) -> Option<usize> {
        self.config.size_classes.iter().position(|&s| s == size)
    }

    fn pool(&self, index: usize) -> &RefCell<SlabPool> {
        self.pools[index].get_or_init(|| {
            let size = self.config.size_classes[index];
            match SlabPool::new(size, self.config.slots_per_slab) {
                Ok(pool) => RefCell::new(pool),
                Err(err) => unreachable!("validated size class {size} was rejected: {err}"),
            }
        })
    }

    /// Runs `f` on the pool serving exactly `size` bytes.
    ///
    /// Returns `None` without creating anything if `size` is not a size
    /// class.
    ///
    /// # Panics
    ///
    /// Panics if `f` re-enters the same pool.
    pub fn with_pool<R>(&self, size: usize, f: impl FnOnce(&mut SlabPool) -> R) -> Option<R> {
        let index = self.class_index(size)?;
        let mut pool = self.pool(index).borrow_mut();
        Some(f(&mut *pool))
    }

    /// Returns the counters of the pool for `size`, if it has been created.
    #[must_use]
    pub fn pool_stats(&self, size: usize) -> Option<PoolStats> {
        let index = self.class_index(size)?;
        self.pools[index].get().map(|pool| pool.borrow().stats())
    }

    /// Returns the size class whose pool owns `ptr`.
    #[must_use]
    pub fn owner_of(&self, ptr: NonNull<u8>) -> Option<usize> {
        self.config
            .size_classes
            .iter()
            .zip(&self.pools)
            .find(|(_, pool)| pool.get().is_some_and(|pool| pool.borrow().owns(ptr)))
            .map(|(&size, _)| size)
    }
}
