//! Doubly-linked list backed by size-class slab pools.
//!
//! [`NodeList`] stores each element in its own node and obtains those nodes
//! from an [`ElementAllocator`](pool_alloc::ElementAllocator). By default that is a
//! [`SizeClassAllocator`](pool_alloc::SizeClassAllocator), so for small element
//! types the nodes come from the process-wide slab pools and are recycled as
//! the list shrinks and grows.
//!
//! The nodes form a ring closed by a sentinel node that holds no value. The
//! sentinel is the past-the-end position of [`Cursor`] and [`CursorMut`], and
//! an empty list is a sentinel linked to itself.
//!
//! # Examples
//!
//! ```
//! use node_list::NodeList;
//! use pool_alloc::{SharedPools, SizeClassAllocator};
//!
//! let pools = SharedPools::default();
//! let mut list = NodeList::new_in(SizeClassAllocator::with_pools(pools.clone()));
//! list.extend([1_u64, 2, 3]);
//!
//! let mut cursor = list.cursor_front_mut();
//! cursor.move_next();
//! assert_eq!(cursor.remove_current(), Some(2));
//! assert_eq!(cursor.current(), Some(&3));
//!
//! let copy = list.clone();
//! assert_eq!(copy.iter().copied().collect::<Vec<_>>(), [1, 3]);
//! assert_eq!(copy.allocator(), list.allocator());
//! ```

#![cfg_attr(not(test), no_std)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod cursor;
pub mod iter;
mod list;


pub use self::{
    cursor::{Cursor, CursorMut},
    iter::{IntoIter, Iter, IterMut},
    list::NodeList,
};
