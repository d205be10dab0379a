//! Typed allocator interface used by containers.

use alloc::alloc::{alloc, dealloc};
use core::{alloc::Layout, fmt, marker::PhantomData, ptr::NonNull};

use snafu::OptionExt as _;
use tracing::trace;

use crate::error::{AllocError, CapacityOverflowSnafu, OutOfMemorySnafu};

/// An allocator of arrays of `T` that can be rebound to other element types.
///
/// This is the allocator shape containers are generic over. A container
/// holding an allocator for its element type rebinds it to allocate its
/// internal node type, and both allocators share one allocation policy.
///
/// Allocators only hand out raw storage; they never construct or drop
/// values.
///
/// # Safety
///
/// Implementors must return storage that is valid for `count` values of `T`
/// and properly aligned, and must accept that storage back through
/// [`deallocate`](Self::deallocate) on any clone or rebound copy of the
/// allocator.
pub unsafe trait ElementAllocator<T>: Clone {
    /// The same allocator, handing out storage for `U`.
    type Rebind<U>: ElementAllocator<U>;

    /// Whether copy assignment of a container also copies the source's
    /// allocator.
    const PROPAGATE_ON_COPY_ASSIGNMENT: bool = false;

    /// Returns the same allocator for elements of type `U`.
    ///
    /// Memory allocated through the result may be released through any
    /// other rebound copy.
    fn rebind<U>(&self) -> Self::Rebind<U>;

    /// Allocates storage for `count` values of `T`.
    fn try_allocate(&self, count: usize) -> Result<NonNull<T>, AllocError>;

    /// Releases storage obtained from [`try_allocate`](Self::try_allocate).
    ///
    /// # Safety
    ///
    /// The caller must ensure that:
    ///
    /// - `ptr` was allocated by this allocator, a clone of it, or a rebound
    ///   copy of it, for exactly `count` values of `T`
    /// - `ptr` has not already been released
    /// - any values stored there have already been dropped or moved out
    unsafe fn deallocate(&self, ptr: NonNull<T>, count: usize);

    /// Allocates storage for `count` values of `T`, treating failure as fatal.
    fn allocate(&self, count: usize) -> NonNull<T> {
        match self.try_allocate(count) {
            Ok(ptr) => ptr,
            Err(err) => err.report(),
        }
    }

    /// Returns the allocator a copy-constructed container should use.
    #[must_use]
    fn select_on_copy(&self) -> Self {
        self.clone()
    }
}

fn array_layout<T>(count: usize) -> Result<Layout, AllocError> {
    Layout::array::<T>(count)
        .ok()
        .context(CapacityOverflowSnafu {
            elem_size: size_of::<T>(),
            count,
        })
}

/// Allocates `count` values of `T` from the global allocator.
///
/// Zero-sized requests return a dangling, well-aligned pointer without
/// touching the global allocator.
pub(crate) fn fallback_allocate<T>(count: usize) -> Result<NonNull<T>, AllocError> {
    let layout = array_layout::<T>(count)?;
    if layout.size() == 0 {
        return Ok(NonNull::dangling());
    }
    trace!(
        size = layout.size(),
        align = layout.align(),
        "fallback allocation"
    );
    // SAFETY: the layout has a non-zero size.
    let ptr = unsafe { alloc(layout) };
    NonNull::new(ptr)
        .map(NonNull::cast)
        .context(OutOfMemorySnafu { layout })
}

/// Releases storage obtained from [`fallback_allocate`].
///
/// # Safety
///
/// `ptr` must come from `fallback_allocate::<T>(count)` and must not have
/// been released already.
pub(crate) unsafe fn fallback_deallocate<T>(ptr: NonNull<T>, count: usize) {
    let layout = Layout::array::<T>(count);
    debug_assert!(layout.is_ok(), "no allocation of {count} elements can exist");
    if let Ok(layout) = layout {
        if layout.size() != 0 {
            // SAFETY: guaranteed by the caller.
            unsafe {
                dealloc(ptr.as_ptr().cast(), layout);
            }
        }
    }
}

/// Allocator that always uses the global allocator.
///
/// This is the plain counterpart of
/// [`SizeClassAllocator`](crate::SizeClassAllocator): it has no pools and no
/// size classes.
pub struct SystemAllocator<T>(PhantomData<fn() -> T>);

impl<T> SystemAllocator<T> {
    /// Creates the allocator.
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for SystemAllocator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for SystemAllocator<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SystemAllocator<T> {}

impl<T> PartialEq for SystemAllocator<T> {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl<T> Eq for SystemAllocator<T> {}

impl<T> fmt::Debug for SystemAllocator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SystemAllocator")
    }
}

unsafe impl<T> ElementAllocator<T> for SystemAllocator<T> {
    type Rebind<U> = SystemAllocator<U>;

    fn rebind<U>(&self) -> Self::Rebind<U> {
        SystemAllocator::new()
    }

    fn try_allocate(&self, count: usize) -> Result<NonNull<T>, AllocError> {
        fallback_allocate(count)
    }

    unsafe fn deallocate(&self, ptr: NonNull<T>, count: usize) {
        unsafe { fallback_deallocate(ptr, count) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_allocator_round_trip() {
        let alloc = SystemAllocator::<u64>::new();
        let ptr = alloc.try_allocate(3).unwrap();
        assert!(ptr.as_ptr().is_aligned());
        unsafe {
            for i in 0..3 {
                ptr.add(i).write(i as u64 * 10);
            }
            assert_eq!(ptr.add(2).read(), 20);
            alloc.deallocate(ptr, 3);
        }
    }

    #[test]
    fn test_zero_sized_requests_are_dangling() {
        let alloc = SystemAllocator::<u32>::new();
        let ptr = alloc.try_allocate(0).unwrap();
        assert_eq!(ptr, NonNull::dangling());
        unsafe {
            alloc.deallocate(ptr, 0);
        }

        let unit = SystemAllocator::<()>::new();
        let ptr = unit.try_allocate(100).unwrap();
        assert_eq!(ptr, NonNull::dangling());
        unsafe {
            unit.deallocate(ptr, 100);
        }
    }

    #[test]
    fn test_overflowing_request_fails() {
        let alloc = SystemAllocator::<u64>::new();
        let err = alloc.try_allocate(usize::MAX).unwrap_err();
        assert!(err.is_capacity_overflow());
    }

    #[test]
    fn test_rebind_is_stateless() {
        let alloc = SystemAllocator::<u8>::new();
        let rebound: SystemAllocator<[u64; 4]> = alloc.rebind();
        let ptr = rebound.try_allocate(1).unwrap();
        unsafe {
            rebound.deallocate(ptr, 1);
        }
        assert_eq!(rebound, SystemAllocator::new());
    }
}
