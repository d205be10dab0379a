//! Iterators over [`NodeList`].

use core::{fmt, iter::FusedIterator, marker::PhantomData};

use pool_alloc::{ElementAllocator, SizeClassAllocator};

use crate::list::{Link, Node, NodeList};

/// Borrowing iterator over the elements of a [`NodeList`].
///
/// Created by [`NodeList::iter`].
pub struct Iter<'a, T> {
    head: Link<T>,
    tail: Link<T>,
    len: usize,
    _marker: PhantomData<&'a Node<T>>,
}

impl<T> Iter<'_, T> {
    pub(crate) fn new(head: Link<T>, tail: Link<T>, len: usize) -> Self {
        Self {
            head,
            tail,
            len,
            _marker: PhantomData,
        }
    }
}

unsafe impl<T: Sync> Send for Iter<'_, T> {}
unsafe impl<T: Sync> Sync for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self::new(self.head, self.tail, self.len)
    }
}

impl<T: fmt::Debug> fmt::Debug for Iter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Iter").field(&self.len).finish()
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        let node = self.head;
        // SAFETY: `len` counts the value nodes left between `head` and `tail`.
        unsafe {
            self.head = Node::next(node);
            Some(Node::value(node))
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }

    fn last(mut self) -> Option<Self::Item> {
        self.next_back()
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        let node = self.tail;
        // SAFETY: `len` counts the value nodes left between `head` and `tail`.
        unsafe {
            self.tail = Node::prev(node);
            Some(Node::value(node))
        }
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

/// Mutable iterator over the elements of a [`NodeList`].
///
/// Created by [`NodeList::iter_mut`].
pub struct IterMut<'a, T> {
    head: Link<T>,
    tail: Link<T>,
    len: usize,
    _marker: PhantomData<&'a mut Node<T>>,
}

impl<T> IterMut<'_, T> {
    pub(crate) fn new(head: Link<T>, tail: Link<T>, len: usize) -> Self {
        Self {
            head,
            tail,
            len,
            _marker: PhantomData,
        }
    }
}

unsafe impl<T: Send> Send for IterMut<'_, T> {}
unsafe impl<T: Sync> Sync for IterMut<'_, T> {}

impl<T: fmt::Debug> fmt::Debug for IterMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IterMut").field(&self.len).finish()
    }
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        let node = self.head;
        // SAFETY: each value node is yielded at most once.
        unsafe {
            self.head = Node::next(node);
            Some(Node::value_mut(node))
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }

    fn last(mut self) -> Option<Self::Item> {
        self.next_back()
    }
}

impl<T> DoubleEndedIterator for IterMut<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        let node = self.tail;
        // SAFETY: each value node is yielded at most once.
        unsafe {
            self.tail = Node::prev(node);
            Some(Node::value_mut(node))
        }
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}
impl<T> FusedIterator for IterMut<'_, T> {}

/// Owning iterator over the elements of a [`NodeList`].
///
/// Each element's node is released as the element is yielded.
pub struct IntoIter<T, A = SizeClassAllocator<T>>
where
    A: ElementAllocator<T>,
{
    list: NodeList<T, A>,
}

impl<T, A> IntoIter<T, A>
where
    A: ElementAllocator<T>,
{
    pub(crate) fn new(list: NodeList<T, A>) -> Self {
        Self { list }
    }
}

impl<T, A> fmt::Debug for IntoIter<T, A>
where
    T: fmt::Debug,
    A: ElementAllocator<T>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.list).finish()
    }
}

impl<T, A> Iterator for IntoIter<T, A>
where
    A: ElementAllocator<T>,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.list.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.list.len(), Some(self.list.len()))
    }
}

impl<T, A> DoubleEndedIterator for IntoIter<T, A>
where
    A: ElementAllocator<T>,
{
    fn next_back(&mut self) -> Option<T> {
        self.list.pop_back()
    }
}

impl<T, A> ExactSizeIterator for IntoIter<T, A> where A: ElementAllocator<T> {}
impl<T, A> FusedIterator for IntoIter<T, A> where A: ElementAllocator<T> {}

#[cfg(test)]
mod tests {
    use crate::NodeList;

    #[test]
    fn test_iter_both_ends() {
        let list = (1..=5).collect::<NodeList<u32>>();
        let mut iter = list.iter();
        assert_eq!(iter.len(), 5);
        assert_eq!(iter.next(), Some(&1));
        assert_eq!(iter.next_back(), Some(&5));
        assert_eq!(iter.len(), 3);
        assert_eq!(iter.clone().collect::<Vec<_>>(), [&2, &3, &4]);
        assert_eq!(iter.next_back(), Some(&4));
        assert_eq!(iter.next(), Some(&2));
        assert_eq!(iter.next(), Some(&3));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);
    }

    #[test]
    fn test_iter_rev_and_last() {
        let list = ['a', 'b', 'c'].into_iter().collect::<NodeList<char>>();
        assert_eq!(list.iter().rev().copied().collect::<String>(), "cba");
        assert_eq!(list.iter().last(), Some(&'c'));
        assert_eq!((&list).into_iter().count(), 3);
    }

    #[test]
    fn test_iter_mut_updates_in_place() {
        let mut list = (0..4).collect::<NodeList<i64>>();
        for value in &mut list {
            *value *= -1;
        }
        if let Some(last) = list.iter_mut().next_back() {
            *last = 42;
        }
        assert_eq!(list.iter().copied().collect::<Vec<_>>(), [0, -1, -2, 42]);
    }

    #[test]
    fn test_into_iter_releases_nodes() {
        let list = ["x", "y", "z"]
            .into_iter()
            .map(String::from)
            .collect::<NodeList<String>>();
        let mut iter = list.into_iter();
        assert_eq!(iter.len(), 3);
        assert_eq!(iter.next_back().as_deref(), Some("z"));
        assert_eq!(iter.next().as_deref(), Some("x"));
        assert_eq!(iter.len(), 1);
        assert_eq!(format!("{iter:?}"), r#"IntoIter(["y"])"#);
    }
}
