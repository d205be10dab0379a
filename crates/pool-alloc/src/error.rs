//! Error types for pool construction and allocation.

use alloc::alloc::handle_alloc_error;
use core::alloc::Layout;

use derive_more::IsVariant;
use snafu::{Location, Snafu};

/// Errors raised while obtaining storage.
///
/// Both variants are unrecoverable for the pool that produced them: nothing
/// is retried internally, the error is handed straight back to the caller.
///
/// The context selectors are public so that other [`ElementAllocator`]
/// implementations can report failures the same way.
///
/// [`ElementAllocator`]: crate::ElementAllocator
#[derive(Debug, Snafu, IsVariant)]
#[snafu(visibility(pub))]
pub enum AllocError {
    /// The global allocator could not satisfy `layout`.
    #[snafu(display(
        "out of memory allocating {} bytes (align {})",
        layout.size(),
        layout.align()
    ))]
    OutOfMemory {
        layout: Layout,
        #[snafu(implicit)]
        location: Location,
    },
    /// The byte size of the request does not fit in `isize`.
    #[snafu(display("allocation of {count} elements of {elem_size} bytes overflows `isize`"))]
    CapacityOverflow {
        elem_size: usize,
        count: usize,
        #[snafu(implicit)]
        location: Location,
    },
}

impl AllocError {
    /// Returns the layout that could not be satisfied, if there was one.
    #[must_use]
    pub fn layout(&self) -> Option<Layout> {
        match self {
            Self::OutOfMemory { layout, .. } => Some(*layout),
            Self::CapacityOverflow { .. } => None,
        }
    }

    /// Escalates the error the same way the standard collections do.
    ///
    /// Memory exhaustion goes through [`handle_alloc_error`], size overflow
    /// panics.
    #[track_caller]
    pub fn report(self) -> ! {
        match self {
            Self::OutOfMemory { layout, .. } => handle_alloc_error(layout),
            Self::CapacityOverflow { .. } => panic!("capacity overflow: {self}"),
        }
    }
}

/// Errors raised when a pool or registry configuration is rejected.
#[derive(Debug, Snafu, IsVariant)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigError {
    /// A pool was asked for zero-byte slots.
    #[snafu(display("slot size must be non-zero"))]
    ZeroSlotSize {
        #[snafu(implicit)]
        location: Location,
    },
    /// A pool was asked for slabs without slots.
    #[snafu(display("a slab must hold at least one slot"))]
    ZeroSlabCapacity {
        #[snafu(implicit)]
        location: Location,
    },
    /// The same size class appears twice in a configuration.
    #[snafu(display("size class {size} is listed more than once"))]
    DuplicateSizeClass {
        size: usize,
        #[snafu(implicit)]
        location: Location,
    },
    /// A configuration lists more than [`MAX_SIZE_CLASSES`] classes.
    ///
    /// [`MAX_SIZE_CLASSES`]: crate::MAX_SIZE_CLASSES
    #[snafu(display("at most {max} size classes are supported"))]
    TooManySizeClasses {
        max: usize,
        #[snafu(implicit)]
        location: Location,
    },
    /// A slab's byte size overflows or is not a valid layout.
    #[snafu(display("slab of {slots_per_slab} slots of {slot_size} bytes is too large"))]
    SlabTooLarge {
        slot_size: usize,
        slots_per_slab: usize,
        #[snafu(implicit)]
        location: Location,
    },
}
