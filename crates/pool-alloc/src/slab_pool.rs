//! Fixed-size slab pool.
//!
//! A [`SlabPool`] hands out chunks of exactly one size. Storage is obtained
//! from the global allocator in large blocks ("slabs") that are carved into
//! slots from front to back. Freed slots are kept on a LIFO free list and are
//! handed out again before any fresh slot is carved.
//!
//! # Memory Layout
//!
//! ```text
//! slabs[0]: [slot 0][slot 1] ... [slot N-1]      (full)
//! slabs[1]: [slot 0][slot 1][slot 2] ...         (current)
//!                           ^ cursor
//! free list: [slabs[0][5], slabs[1][1], ...]     (top = last entry)
//! ```
//!
//! Slabs are never moved or released while the pool is alive, so every chunk
//! address stays valid until the pool itself is dropped. There is no per-chunk
//! header: the slot size is fixed, so the only bookkeeping is the slab list and
//! the free list.
//!
//! # Thread Safety
//!
//! The pool is `Send` but not `Sync`. Shared use requires external
//! synchronization, see [`global`](crate::global).

use alloc::{
    alloc::{alloc, dealloc},
    vec::Vec,
};
use core::{alloc::Layout, ptr::NonNull};

use snafu::{OptionExt as _, ensure};
use tracing::debug;

use crate::error::{
    AllocError, ConfigError, OutOfMemorySnafu, SlabTooLargeSnafu, ZeroSlabCapacitySnafu,
    ZeroSlotSizeSnafu,
};

/// Number of slots carved from each slab unless configured otherwise.
pub const DEFAULT_SLOTS_PER_SLAB: usize = 2048;

/// Returns the alignment every slot of the given size is guaranteed to have.
///
/// This is the largest power of two dividing `slot_size`. Any type whose size
/// is a divisor of `slot_size` has an alignment no larger than this, because a
/// type's size is always a multiple of its alignment.
pub(crate) fn slot_align(slot_size: usize) -> usize {
    debug_assert_ne!(slot_size, 0);
    1 << slot_size.trailing_zeros()
}

pub(crate) fn slab_layout(slot_size: usize, slots_per_slab: usize) -> Result<Layout, ConfigError> {
    slot_size
        .checked_mul(slots_per_slab)
        .and_then(|size| Layout::from_size_align(size, slot_align(slot_size)).ok())
        .context(SlabTooLargeSnafu {
            slot_size,
            slots_per_slab,
        })
}

/// Snapshot of a pool's bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolStats {
    /// Size of every chunk in bytes.
    pub slot_size: usize,
    /// Number of slots per slab.
    pub slots_per_slab: usize,
    /// Number of slabs owned by the pool.
    pub slab_count: usize,
    /// Number of chunks waiting on the free list.
    pub free_count: usize,
    /// Number of slots ever carved from slabs.
    pub issued: usize,
    /// Number of chunks currently handed out.
    pub in_use: usize,
}

/// A growable pool of equally sized chunks.
#[derive(Debug)]
pub struct SlabPool {
    slot_size: usize,
    slots_per_slab: usize,
    slab_layout: Layout,
    slabs: Vec<NonNull<u8>>,
    /// Next never-used slot in the last slab.
    cursor: usize,
    free_list: Vec<NonNull<u8>>,
}

// The pool exclusively owns its slabs; the raw pointers never alias memory
// owned by anyone else.
unsafe impl Send for SlabPool {}

impl SlabPool {
    /// Creates a pool of `slot_size`-byte chunks with its first slab.
    ///
    /// Failure to obtain the first slab is fatal and is reported through
    /// [`handle_alloc_error`](alloc::alloc::handle_alloc_error).
    ///
    /// # Examples
    ///
    /// ```
    /// use pool_alloc::SlabPool;
    ///
    /// let mut pool = SlabPool::new(16, 64).unwrap();
    /// let ptr = pool.allocate();
    /// unsafe {
    ///     pool.deallocate(ptr);
    /// }
    /// assert_eq!(pool.allocate(), ptr);
    /// ```
    pub fn new(slot_size: usize, slots_per_slab: usize) -> Result<Self, ConfigError> {
        ensure!(slot_size > 0, ZeroSlotSizeSnafu);
        ensure!(slots_per_slab > 0, ZeroSlabCapacitySnafu);
        let slab_layout = slab_layout(slot_size, slots_per_slab)?;

        let mut pool = Self {
            slot_size,
            slots_per_slab,
            slab_layout,
            slabs: Vec::new(),
            cursor: 0,
            free_list: Vec::new(),
        };
        if let Err(err) = pool.try_grow() {
            err.report();
        }
        debug!(slot_size, slots_per_slab, "created slab pool");
        Ok(pool)
    }

    /// Returns the size of every chunk in bytes.
    #[must_use]
    pub fn slot_size(&self) -> usize {
        self.slot_size
    }

    /// Returns the number of slots carved from each slab.
    #[must_use]
    pub fn slots_per_slab(&self) -> usize {
        self.slots_per_slab
    }

    /// Returns the current bookkeeping counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        let issued = self.slabs.len().saturating_sub(1) * self.slots_per_slab + self.cursor;
        PoolStats {
            slot_size: self.slot_size,
            slots_per_slab: self.slots_per_slab,
            slab_count: self.slabs.len(),
            free_count: self.free_list.len(),
            issued,
            in_use: issued - self.free_list.len(),
        }
    }

    /// Hands out one chunk.
    ///
    /// The most recently freed chunk is reused first. Otherwise the next slot
    /// of the current slab is carved, appending a new slab when the current
    /// one is exhausted. Fails only if a new slab cannot be obtained.
    pub fn try_allocate(&mut self) -> Result<NonNull<u8>, AllocError> {
        if let Some(ptr) = self.free_list.pop() {
            return Ok(ptr);
        }

        let slab = match self.slabs.last() {
            Some(&slab) if self.cursor < self.slots_per_slab => slab,
            _ => self.try_grow()?,
        };

        // SAFETY: `cursor < slots_per_slab`, so the offset stays inside the slab.
        let ptr = unsafe { slab.add(self.cursor * self.slot_size) };
        self.cursor += 1;
        Ok(ptr)
    }

    /// Hands out one chunk, treating slab exhaustion as fatal.
    pub fn allocate(&mut self) -> NonNull<u8> {
        match self.try_allocate() {
            Ok(ptr) => ptr,
            Err(err) => err.report(),
        }
    }

    /// Returns a chunk to the free list.
    ///
    /// # Safety
    ///
    /// The caller must ensure that:
    ///
    /// - `ptr` was returned by [`allocate`](Self::allocate) or
    ///   [`try_allocate`](Self::try_allocate) on this pool
    /// - `ptr` has not been deallocated since it was last handed out
    /// - the chunk is not accessed after this call
    pub unsafe fn deallocate(&mut self, ptr: NonNull<u8>) {
        debug_assert!(
            self.owns(ptr),
            "{ptr:p} was not issued by the {}-byte pool",
            self.slot_size
        );
        self.free_list.push(ptr);
    }

    /// Returns `true` if `ptr` is the start of a slot in one of this pool's
    /// slabs.
    ///
    /// This says nothing about whether the slot is currently handed out.
    #[must_use]
    pub fn owns(&self, ptr: NonNull<u8>) -> bool {
        let addr = ptr.addr().get();
        self.slabs.iter().any(|slab| {
            let start = slab.addr().get();
            addr >= start
                && addr - start < self.slab_layout.size()
                && (addr - start).is_multiple_of(self.slot_size)
        })
    }

    /// Appends a slab and rewinds the cursor to its first slot.
    fn try_grow(&mut self) -> Result<NonNull<u8>, AllocError> {
        // SAFETY: the slab layout has a non-zero size, checked in `new`.
        let slab = unsafe { alloc(self.slab_layout) };
        let slab = NonNull::new(slab).context(OutOfMemorySnafu {
            layout: self.slab_layout,
        })?;
        self.slabs.push(slab);
        self.cursor = 0;
        debug!(
            slot_size = self.slot_size,
            slab_count = self.slabs.len(),
            "appended slab"
        );
        Ok(slab)
    }
}

impl Drop for SlabPool {
    fn drop(&mut self) {
        let stats = self.stats();
        if stats.in_use > 0 {
            debug!(
                slot_size = self.slot_size,
                in_use = stats.in_use,
                "releasing slab pool with chunks still handed out"
            );
        }
        for slab in self.slabs.drain(..) {
            // SAFETY: every slab was allocated in `try_grow` with `slab_layout`.
            unsafe {
                dealloc(slab.as_ptr(), self.slab_layout);
            }
        }
    }
}
