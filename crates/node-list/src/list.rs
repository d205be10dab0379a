//! The list type and its node ring.

use core::{
    fmt,
    hash::{Hash, Hasher},
    iter,
    marker::PhantomData,
    mem::MaybeUninit,
    ptr::NonNull,
};

use pool_alloc::{AllocError, ElementAllocator, SizeClassAllocator};

use crate::{
    cursor::{Cursor, CursorMut},
    iter::{IntoIter, Iter, IterMut},
};

pub(crate) type Link<T> = NonNull<Node<T>>;

/// A link in the ring.
///
/// The sentinel is a `Node` whose `value` is never initialized.
pub(crate) struct Node<T> {
    next: Link<T>,
    prev: Link<T>,
    value: MaybeUninit<T>,
}

impl<T> Node<T> {
    /// # Safety
    ///
    /// `node` must point to a live node.
    pub(crate) unsafe fn next(node: Link<T>) -> Link<T> {
        unsafe { (*node.as_ptr()).next }
    }

    /// # Safety
    ///
    /// `node` must point to a live node.
    pub(crate) unsafe fn prev(node: Link<T>) -> Link<T> {
        unsafe { (*node.as_ptr()).prev }
    }

    /// # Safety
    ///
    /// `node` must point to a live value node (not a sentinel), and no
    /// mutable reference to its value may exist for `'a`.
    pub(crate) unsafe fn value<'a>(node: Link<T>) -> &'a T {
        unsafe { (*node.as_ptr()).value.assume_init_ref() }
    }

    /// # Safety
    ///
    /// `node` must point to a live value node (not a sentinel), and no other
    /// reference to its value may exist for `'a`.
    pub(crate) unsafe fn value_mut<'a>(node: Link<T>) -> &'a mut T {
        unsafe { (*node.as_ptr()).value.assume_init_mut() }
    }
}

/// A doubly-linked list whose nodes are obtained from an
/// [`ElementAllocator`].
///
/// The nodes form a circular ring closed by a sentinel node. The sentinel
/// holds no value; it is the past-the-end position and joins the last node
/// back to the first. An empty list is a sentinel linked to itself.
///
/// With the default [`SizeClassAllocator`], the nodes of small element types
/// (for instance `u32` or `u64` on 64-bit targets) come from the 24-byte slab
/// pool, so pushing and popping recycles the same chunks instead of going to
/// the global allocator.
///
/// # Examples
///
/// ```
/// use node_list::NodeList;
///
/// let mut list = NodeList::<u32>::new();
/// list.push_back(1);
/// list.push_back(2);
/// list.push_front(0);
/// assert_eq!(list.iter().copied().collect::<Vec<_>>(), [0, 1, 2]);
///
/// assert_eq!(list.pop_back(), Some(2));
/// assert_eq!(list.len(), 2);
/// ```
pub struct NodeList<T, A = SizeClassAllocator<T>>
where
    A: ElementAllocator<T>,
{
    sentinel: Link<T>,
    len: usize,
    alloc: A,
    _marker: PhantomData<T>,
}

unsafe impl<T, A> Send for NodeList<T, A>
where
    T: Send,
    A: ElementAllocator<T> + Send,
{
}

unsafe impl<T, A> Sync for NodeList<T, A>
where
    T: Sync,
    A: ElementAllocator<T> + Sync,
{
}

impl<T, A> NodeList<T, A>
where
    A: ElementAllocator<T> + Default,
{
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::new_in(A::default())
    }

    /// Creates a list of `count` clones of `value`.
    #[must_use]
    pub fn from_elem(count: usize, value: T) -> Self
    where
        T: Clone,
    {
        Self::from_elem_in(count, value, A::default())
    }

    /// Creates a list of `count` default values.
    #[must_use]
    pub fn with_len(count: usize) -> Self
    where
        T: Default,
    {
        Self::with_len_in(count, A::default())
    }
}

impl<T, A> NodeList<T, A>
where
    A: ElementAllocator<T>,
{
    /// Creates an empty list using `alloc` for its nodes.
    ///
    /// Only the sentinel is allocated.
    #[must_use]
    pub fn new_in(alloc: A) -> Self {
        match Self::try_new_in(alloc) {
            Ok(list) => list,
            Err(err) => err.report(),
        }
    }

    /// Creates an empty list, returning an error if the sentinel cannot be
    /// allocated.
    pub fn try_new_in(alloc: A) -> Result<Self, AllocError> {
        let sentinel = Self::new_sentinel(&alloc)?;
        Ok(Self {
            sentinel,
            len: 0,
            alloc,
            _marker: PhantomData,
        })
    }

    /// Creates a list of `count` clones of `value`, appended one by one.
    #[must_use]
    pub fn from_elem_in(count: usize, value: T, alloc: A) -> Self
    where
        T: Clone,
    {
        let mut list = Self::new_in(alloc);
        list.extend(iter::repeat_n(value, count));
        list
    }

    /// Creates a list of `count` default values.
    ///
    /// The nodes are linked directly behind each other instead of going
    /// through [`push_back`](Self::push_back).
    #[must_use]
    pub fn with_len_in(count: usize, alloc: A) -> Self
    where
        T: Default,
    {
        let mut list = Self::new_in(alloc);
        let node_alloc = list.alloc.rebind::<Node<T>>();
        let mut prev = list.sentinel;
        for _ in 0..count {
            let value = T::default();
            let node = node_alloc.allocate(1);
            // SAFETY: `node` is fresh storage and `prev` is the current tail.
            unsafe {
                node.write(Node {
                    next: list.sentinel,
                    prev,
                    value: MaybeUninit::new(value),
                });
                (*prev.as_ptr()).next = node;
                (*list.sentinel.as_ptr()).prev = node;
            }
            list.len += 1;
            prev = node;
        }
        list
    }

    fn new_sentinel(alloc: &A) -> Result<Link<T>, AllocError> {
        let node = alloc.rebind::<Node<T>>().try_allocate(1)?;
        // SAFETY: `node` is fresh storage for one node.
        unsafe {
            node.write(Node {
                next: node,
                prev: node,
                value: MaybeUninit::uninit(),
            });
        }
        Ok(node)
    }

    /// Returns the allocator the list was created with.
    #[must_use]
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the list holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn sentinel(&self) -> Link<T> {
        self.sentinel
    }

    /// First node, or the sentinel if the list is empty.
    pub(crate) fn head(&self) -> Link<T> {
        // SAFETY: the sentinel lives as long as the list.
        unsafe { Node::next(self.sentinel) }
    }

    /// Last node, or the sentinel if the list is empty.
    pub(crate) fn tail(&self) -> Link<T> {
        // SAFETY: the sentinel lives as long as the list.
        unsafe { Node::prev(self.sentinel) }
    }

    /// Returns the first element.
    #[must_use]
    pub fn front(&self) -> Option<&T> {
        // SAFETY: a non-empty list has a value node at its head.
        (!self.is_empty()).then(|| unsafe { Node::value(self.head()) })
    }

    /// Returns the last element.
    #[must_use]
    pub fn back(&self) -> Option<&T> {
        // SAFETY: a non-empty list has a value node at its tail.
        (!self.is_empty()).then(|| unsafe { Node::value(self.tail()) })
    }

    /// Returns the first element mutably.
    pub fn front_mut(&mut self) -> Option<&mut T> {
        let head = self.head();
        // SAFETY: as in `front`, and `&mut self` makes the reference unique.
        (!self.is_empty()).then(|| unsafe { Node::value_mut(head) })
    }

    /// Returns the last element mutably.
    pub fn back_mut(&mut self) -> Option<&mut T> {
        let tail = self.tail();
        // SAFETY: as in `back`, and `&mut self` makes the reference unique.
        (!self.is_empty()).then(|| unsafe { Node::value_mut(tail) })
    }

    /// Allocates a node for `value` and splices it in before `pos`.
    ///
    /// # Safety
    ///
    /// `pos` must be a node of this list (the sentinel included).
    pub(crate) unsafe fn try_insert_before(
        &mut self,
        pos: Link<T>,
        value: T,
    ) -> Result<Link<T>, AllocError> {
        let node = self.alloc.rebind::<Node<T>>().try_allocate(1)?;
        unsafe {
            let prev = Node::prev(pos);
            node.write(Node {
                next: pos,
                prev,
                value: MaybeUninit::new(value),
            });
            (*prev.as_ptr()).next = node;
            (*pos.as_ptr()).prev = node;
        }
        self.len += 1;
        Ok(node)
    }

    /// Unlinks `node`, releases its storage and returns its value.
    ///
    /// # Safety
    ///
    /// `node` must be a value node of this list; it must not be the sentinel.
    pub(crate) unsafe fn erase(&mut self, node: Link<T>) -> T {
        debug_assert_ne!(node, self.sentinel, "the sentinel cannot be erased");
        unsafe {
            let Node { next, prev, value } = node.read();
            (*prev.as_ptr()).next = next;
            (*next.as_ptr()).prev = prev;
            self.alloc.rebind::<Node<T>>().deallocate(node, 1);
            self.len -= 1;
            value.assume_init()
        }
    }

    /// Appends `value`, treating allocation failure as fatal.
    pub fn push_back(&mut self, value: T) {
        if let Err(err) = self.try_push_back(value) {
            err.report();
        }
    }

    /// Prepends `value`, treating allocation failure as fatal.
    pub fn push_front(&mut self, value: T) {
        if let Err(err) = self.try_push_front(value) {
            err.report();
        }
    }

    /// Appends `value`, returning an error if no node can be allocated.
    ///
    /// The value is dropped on failure.
    pub fn try_push_back(&mut self, value: T) -> Result<(), AllocError> {
        // SAFETY: the sentinel belongs to this list.
        unsafe { self.try_insert_before(self.sentinel, value) }?;
        Ok(())
    }

    /// Prepends `value`, returning an error if no node can be allocated.
    ///
    /// The value is dropped on failure.
    pub fn try_push_front(&mut self, value: T) -> Result<(), AllocError> {
        // SAFETY: the head (or the sentinel, if empty) belongs to this list.
        unsafe { self.try_insert_before(self.head(), value) }?;
        Ok(())
    }

    /// Removes the last element and releases its node.
    ///
    /// Returns `None` if the list is empty.
    pub fn pop_back(&mut self) -> Option<T> {
        let tail = self.tail();
        // SAFETY: a non-empty list has a value node at its tail.
        (!self.is_empty()).then(|| unsafe { self.erase(tail) })
    }

    /// Removes the first element and releases its node.
    ///
    /// Returns `None` if the list is empty.
    pub fn pop_front(&mut self) -> Option<T> {
        let head = self.head();
        // SAFETY: a non-empty list has a value node at its head.
        (!self.is_empty()).then(|| unsafe { self.erase(head) })
    }

    /// Removes every element, last to first.
    ///
    /// The sentinel is kept, so the list stays usable.
    pub fn clear(&mut self) {
        while self.pop_back().is_some() {}
    }

    /// Returns an iterator over the elements, front to back.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self.head(), self.tail(), self.len)
    }

    /// Returns an iterator over mutable references to the elements.
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut::new(self.head(), self.tail(), self.len)
    }

    /// Returns a cursor at the first element, or at the end if the list is
    /// empty.
    #[must_use]
    pub fn cursor_front(&self) -> Cursor<'_, T, A> {
        Cursor::new(self, self.head())
    }

    /// Returns a cursor at the last element, or at the end if the list is
    /// empty.
    #[must_use]
    pub fn cursor_back(&self) -> Cursor<'_, T, A> {
        Cursor::new(self, self.tail())
    }

    /// Returns a cursor at the past-the-end position.
    #[must_use]
    pub fn cursor_end(&self) -> Cursor<'_, T, A> {
        Cursor::new(self, self.sentinel)
    }

    /// Returns an editing cursor at the first element, or at the end if the
    /// list is empty.
    pub fn cursor_front_mut(&mut self) -> CursorMut<'_, T, A> {
        let head = self.head();
        CursorMut::new(self, head)
    }

    /// Returns an editing cursor at the last element, or at the end if the
    /// list is empty.
    pub fn cursor_back_mut(&mut self) -> CursorMut<'_, T, A> {
        let tail = self.tail();
        CursorMut::new(self, tail)
    }

    /// Returns an editing cursor at the past-the-end position.
    ///
    /// Inserting there appends to the list.
    pub fn cursor_end_mut(&mut self) -> CursorMut<'_, T, A> {
        let sentinel = self.sentinel;
        CursorMut::new(self, sentinel)
    }
}

impl<T, A> Drop for NodeList<T, A>
where
    A: ElementAllocator<T>,
{
    fn drop(&mut self) {
        self.clear();
        // SAFETY: the sentinel was allocated by a rebound copy of `alloc` and
        // holds no value.
        unsafe {
            self.alloc.rebind::<Node<T>>().deallocate(self.sentinel, 1);
        }
    }
}

impl<T, A> Default for NodeList<T, A>
where
    A: ElementAllocator<T> + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, A> Clone for NodeList<T, A>
where
    T: Clone,
    A: ElementAllocator<T>,
{
    /// Copies every element, in order, into a list using the allocator
    /// selected by [`ElementAllocator::select_on_copy`].
    fn clone(&self) -> Self {
        let mut list = Self::new_in(self.alloc.select_on_copy());
        list.extend(self.iter().cloned());
        list
    }

    /// Replaces the contents of `self` with copies of `source`'s elements.
    ///
    /// If the allocator propagates on copy assignment, `self` adopts
    /// `source`'s allocator, moving its sentinel over to it.
    fn clone_from(&mut self, source: &Self) {
        self.clear();
        if A::PROPAGATE_ON_COPY_ASSIGNMENT {
            let sentinel = match Self::new_sentinel(&source.alloc) {
                Ok(sentinel) => sentinel,
                Err(err) => err.report(),
            };
            // SAFETY: the old sentinel holds no value and the list is empty.
            unsafe {
                self.alloc.rebind::<Node<T>>().deallocate(self.sentinel, 1);
            }
            self.sentinel = sentinel;
            self.alloc = source.alloc.clone();
        }
        self.extend(source.iter().cloned());
    }
}

impl<T, A> Extend<T> for NodeList<T, A>
where
    A: ElementAllocator<T>,
{
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = T>,
    {
        for value in iter {
            self.push_back(value);
        }
    }
}

impl<'a, T, A> Extend<&'a T> for NodeList<T, A>
where
    T: Copy + 'a,
    A: ElementAllocator<T>,
{
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = &'a T>,
    {
        self.extend(iter.into_iter().copied());
    }
}

impl<T, A> FromIterator<T> for NodeList<T, A>
where
    A: ElementAllocator<T> + Default,
{
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let mut list = Self::new();
        list.extend(iter);
        list
    }
}

impl<T, A> IntoIterator for NodeList<T, A>
where
    A: ElementAllocator<T>,
{
    type Item = T;
    type IntoIter = IntoIter<T, A>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self)
    }
}

impl<'a, T, A> IntoIterator for &'a NodeList<T, A>
where
    A: ElementAllocator<T>,
{
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, A> IntoIterator for &'a mut NodeList<T, A>
where
    A: ElementAllocator<T>,
{
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T, A> PartialEq for NodeList<T, A>
where
    T: PartialEq,
    A: ElementAllocator<T>,
{
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other)
    }
}

impl<T, A> Eq for NodeList<T, A>
where
    T: Eq,
    A: ElementAllocator<T>,
{
}

impl<T, A> Hash for NodeList<T, A>
where
    T: Hash,
    A: ElementAllocator<T>,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len.hash(state);
        for value in self {
            value.hash(state);
        }
    }
}

impl<T, A> fmt::Debug for NodeList<T, A>
where
    T: fmt::Debug,
    A: ElementAllocator<T>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self).finish()
    }
}
