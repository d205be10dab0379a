//! Positions within a [`NodeList`].
//!
//! A cursor points either at an element or at the past-the-end position,
//! which is the list's sentinel. Moving past either end wraps through the
//! past-the-end position, since the nodes form a ring.

use core::fmt;

use pool_alloc::{AllocError, ElementAllocator, SizeClassAllocator};

use crate::list::{Link, Node, NodeList};

/// A read-only position in a [`NodeList`].
pub struct Cursor<'a, T, A = SizeClassAllocator<T>>
where
    A: ElementAllocator<T>,
{
    current: Link<T>,
    list: &'a NodeList<T, A>,
}

impl<'a, T, A> Cursor<'a, T, A>
where
    A: ElementAllocator<T>,
{
    pub(crate) fn new(list: &'a NodeList<T, A>, current: Link<T>) -> Self {
        Self { current, list }
    }

    /// Returns `true` if the cursor is at the past-the-end position.
    #[must_use]
    pub fn is_end(&self) -> bool {
        self.current == self.list.sentinel()
    }

    /// Returns the element under the cursor, or `None` at the end.
    #[must_use]
    pub fn current(&self) -> Option<&'a T> {
        // SAFETY: every node other than the sentinel holds a value.
        (!self.is_end()).then(|| unsafe { Node::value(self.current) })
    }

    /// Moves to the next position, from the last element to the end and
    /// from the end to the first element.
    pub fn move_next(&mut self) {
        // SAFETY: the cursor always points at a node of its list.
        self.current = unsafe { Node::next(self.current) };
    }

    /// Moves to the previous position, wrapping through the end like
    /// [`move_next`](Self::move_next).
    pub fn move_prev(&mut self) {
        // SAFETY: the cursor always points at a node of its list.
        self.current = unsafe { Node::prev(self.current) };
    }

    /// Returns the element after the cursor without moving it.
    #[must_use]
    pub fn peek_next(&self) -> Option<&'a T> {
        let mut next = self.clone();
        next.move_next();
        next.current()
    }

    /// Returns the element before the cursor without moving it.
    #[must_use]
    pub fn peek_prev(&self) -> Option<&'a T> {
        let mut prev = self.clone();
        prev.move_prev();
        prev.current()
    }
}

impl<T, A> Clone for Cursor<'_, T, A>
where
    A: ElementAllocator<T>,
{
    fn clone(&self) -> Self {
        Self::new(self.list, self.current)
    }
}

impl<T, A> PartialEq for Cursor<'_, T, A>
where
    A: ElementAllocator<T>,
{
    fn eq(&self, other: &Self) -> bool {
        self.current == other.current
    }
}

impl<T, A> Eq for Cursor<'_, T, A> where A: ElementAllocator<T> {}

impl<T, A> fmt::Debug for Cursor<'_, T, A>
where
    T: fmt::Debug,
    A: ElementAllocator<T>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cursor").field(&self.current()).finish()
    }
}

/// A position in a [`NodeList`] that can insert and remove elements.
pub struct CursorMut<'a, T, A = SizeClassAllocator<T>>
where
    A: ElementAllocator<T>,
{
    current: Link<T>,
    list: &'a mut NodeList<T, A>,
}

impl<'a, T, A> CursorMut<'a, T, A>
where
    A: ElementAllocator<T>,
{
    pub(crate) fn new(list: &'a mut NodeList<T, A>, current: Link<T>) -> Self {
        Self { current, list }
    }

    /// Returns a read-only cursor at the same position.
    #[must_use]
    pub fn as_cursor(&self) -> Cursor<'_, T, A> {
        Cursor::new(self.list, self.current)
    }

    /// Returns `true` if the cursor is at the past-the-end position.
    #[must_use]
    pub fn is_end(&self) -> bool {
        self.current == self.list.sentinel()
    }

    /// Returns the element under the cursor, or `None` at the end.
    #[must_use]
    pub fn current(&self) -> Option<&T> {
        // SAFETY: every node other than the sentinel holds a value.
        (!self.is_end()).then(|| unsafe { Node::value(self.current) })
    }

    /// Returns the element under the cursor mutably, or `None` at the end.
    pub fn current_mut(&mut self) -> Option<&mut T> {
        // SAFETY: as in `current`, and `&mut self` makes the reference unique.
        (!self.is_end()).then(|| unsafe { Node::value_mut(self.current) })
    }

    /// Moves to the next position, wrapping through the end.
    pub fn move_next(&mut self) {
        // SAFETY: the cursor always points at a node of its list.
        self.current = unsafe { Node::next(self.current) };
    }

    /// Moves to the previous position, wrapping through the end.
    pub fn move_prev(&mut self) {
        // SAFETY: the cursor always points at a node of its list.
        self.current = unsafe { Node::prev(self.current) };
    }

    /// Returns the element after the cursor without moving it.
    #[must_use]
    pub fn peek_next(&self) -> Option<&T> {
        self.as_cursor().peek_next()
    }

    /// Returns the element before the cursor without moving it.
    #[must_use]
    pub fn peek_prev(&self) -> Option<&T> {
        self.as_cursor().peek_prev()
    }

    /// Inserts `value` before the cursor, treating allocation failure as
    /// fatal.
    ///
    /// The cursor stays on its element. At the end position this appends.
    pub fn insert_before(&mut self, value: T) {
        if let Err(err) = self.try_insert_before(value) {
            err.report();
        }
    }

    /// Inserts `value` before the cursor, returning an error if no node can
    /// be allocated.
    pub fn try_insert_before(&mut self, value: T) -> Result<(), AllocError> {
        // SAFETY: the cursor always points at a node of its list.
        unsafe { self.list.try_insert_before(self.current, value) }?;
        Ok(())
    }

    /// Removes the element under the cursor and moves to its successor.
    ///
    /// Returns `None`, leaving the list untouched, at the end position.
    pub fn remove_current(&mut self) -> Option<T> {
        if self.is_end() {
            return None;
        }
        let node = self.current;
        // SAFETY: `node` is a value node of this list.
        unsafe {
            self.current = Node::next(node);
            Some(self.list.erase(node))
        }
    }
}

impl<T, A> fmt::Debug for CursorMut<'_, T, A>
where
    T: fmt::Debug,
    A: ElementAllocator<T>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CursorMut").field(&self.current()).finish()
    }
}
