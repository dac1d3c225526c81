//! Append-only list of match candidates.
//!
//! Elements are tagged as borrowed or owned. Dropping the list drops owned
//! elements only; borrowed ones stay with whoever owns them (for suffix
//! rules, the dictionary store).

use std::ops::Deref;

/// Number of elements the list grows by whenever it fills up.
pub const BLOCK_SIZE: usize = 16;

/// A list element, either borrowed or owned.
#[derive(Debug)]
pub enum Candidate<'a, T> {
    Borrowed(&'a T),
    Owned(T),
}

impl<'a, T> Candidate<'a, T> {
    /// Check if the element is borrowed
    pub fn is_borrowed(&self) -> bool {
        matches!(self, Candidate::Borrowed(_))
    }
}

impl<T> Deref for Candidate<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self {
            Candidate::Borrowed(item) => item,
            Candidate::Owned(item) => item,
        }
    }
}

/// Growable sequence of candidates, kept in insertion order.
#[derive(Debug)]
pub struct CandidateList<'a, T> {
    items: Vec<Candidate<'a, T>>,
}

impl<'a, T> CandidateList<'a, T> {
    /// Create an empty list with room for one block.
    pub fn new() -> Self {
        Self {
            items: Vec::with_capacity(BLOCK_SIZE),
        }
    }

    /// Append an element.
    pub fn push(&mut self, candidate: Candidate<'a, T>) {
        if self.items.len() == self.items.capacity() {
            self.items.reserve_exact(BLOCK_SIZE);
        }
        self.items.push(candidate);
    }

    /// Append a borrowed reference.
    pub fn push_borrowed(&mut self, item: &'a T) {
        self.push(Candidate::Borrowed(item));
    }

    /// Append an owned value.
    pub fn push_owned(&mut self, item: T) {
        self.push(Candidate::Owned(item));
    }

    /// Element at `index`.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index).map(|c| c.deref())
    }

    /// Iterate over the elements in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.items.iter().map(|c| c.deref())
    }

    /// Iterate over the tagged elements.
    pub fn candidates(&self) -> std::slice::Iter<'_, Candidate<'a, T>> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }
}

impl<T> Default for CandidateList<'_, T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_insertion_order() {
        let values = [3, 1, 2];
        let mut list = CandidateList::new();
        for v in &values {
            list.push_borrowed(v);
        }
        assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![3, 1, 2]);
        assert_eq!(list.get(1), Some(&1));
        assert_eq!(list.get(3), None);
    }

    #[test]
    fn test_grows_by_block() {
        let mut list = CandidateList::new();
        assert!(list.capacity() >= BLOCK_SIZE);
        for i in 0..BLOCK_SIZE * 3 + 1 {
            list.push_owned(i);
        }
        assert_eq!(list.len(), BLOCK_SIZE * 3 + 1);
        assert!(list.capacity() >= list.len());
        assert_eq!(list.iter().sum::<usize>(), (0..BLOCK_SIZE * 3 + 1).sum::<usize>());
    }

    #[test]
    fn test_drop_leaves_borrowed_elements() {
        let shared = Rc::new("rule".to_string());
        let kept = Rc::clone(&shared);
        {
            let mut list = CandidateList::new();
            list.push_borrowed(&kept);
            list.push_owned(Rc::clone(&shared));
            assert_eq!(Rc::strong_count(&shared), 3);
            assert!(list.candidates().next().unwrap().is_borrowed());
        }
        // the owned clone is gone, the borrowed one is untouched
        assert_eq!(Rc::strong_count(&shared), 2);
        assert_eq!(*kept, "rule");
    }

    #[test]
    fn test_empty_list() {
        let list: CandidateList<'_, u8> = CandidateList::default();
        assert!(list.is_empty());
        assert_eq!(list.iter().count(), 0);
    }
}
