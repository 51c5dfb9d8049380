use std::fmt::Debug;
use crate::core::types::DocId;

/// Forward-only cursor over an ascending set of document ids.
///
/// An iterator starts unpositioned. `next` moves to the following id and
/// returns `None` once the cursor is exhausted, which is terminal. `doc_id`
/// reports the current id, or 0 when unpositioned or exhausted.
pub trait PostingIterator: Debug {
    fn next(&mut self) -> Option<DocId>;

    fn doc_id(&self) -> DocId;

    /// Moves to the first id >= `target`. Never moves backwards: if the
    /// cursor already sits on such an id it stays there.
    fn skip_to(&mut self, target: DocId) -> Option<DocId> {
        let current = self.doc_id();
        if current != 0 && current >= target {
            return Some(current);
        }
        while let Some(id) = self.next() {
            if id >= target {
                return Some(id);
            }
        }
        None
    }

    /// Term positions inside the current document. Empty for iterators
    /// that carry no position data.
    fn positions(&self) -> &[u32] {
        &[]
    }
}

/// Leaf iterator over a decoded posting list.
#[derive(Debug, Clone)]
pub struct VectorPostingIterator {
    ids: Vec<DocId>,
    next_index: usize,
    current: DocId,
}

impl VectorPostingIterator {
    pub fn new(ids: Vec<DocId>) -> Self {
        VectorPostingIterator {
            ids,
            next_index: 0,
            current: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl PostingIterator for VectorPostingIterator {
    fn next(&mut self) -> Option<DocId> {
        match self.ids.get(self.next_index) {
            Some(&id) => {
                self.next_index += 1;
                self.current = id;
                Some(id)
            }
            None => {
                self.current = 0;
                None
            }
        }
    }

    fn doc_id(&self) -> DocId {
        self.current
    }

    fn skip_to(&mut self, target: DocId) -> Option<DocId> {
        if self.current != 0 && self.current >= target {
            return Some(self.current);
        }
        let remaining = &self.ids[self.next_index..];
        self.next_index += remaining.partition_point(|&id| id < target);
        self.next()
    }
}

/// Drains `iter` into a vector, stopping after `limit` ids when given.
pub fn collect_ids(iter: &mut dyn PostingIterator, limit: Option<usize>) -> Vec<DocId> {
    let mut ids = Vec::new();
    if limit == Some(0) {
        return ids;
    }
    while let Some(id) = iter.next() {
        ids.push(id);
        if limit.is_some_and(|limit| ids.len() >= limit) {
            break;
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_list_then_stays_exhausted() {
        let mut it = VectorPostingIterator::new(vec![2, 4, 9]);
        assert_eq!(it.doc_id(), 0);
        assert_eq!(it.next(), Some(2));
        assert_eq!(it.doc_id(), 2);
        assert_eq!(it.next(), Some(4));
        assert_eq!(it.next(), Some(9));
        assert_eq!(it.next(), None);
        assert_eq!(it.doc_id(), 0);
        assert_eq!(it.next(), None);
    }

    #[test]
    fn skip_to_never_goes_back() {
        let mut it = VectorPostingIterator::new(vec![1, 3, 5, 7, 11]);
        assert_eq!(it.skip_to(4), Some(5));
        assert_eq!(it.skip_to(2), Some(5));
        assert_eq!(it.skip_to(5), Some(5));
        assert_eq!(it.skip_to(8), Some(11));
        assert_eq!(it.skip_to(12), None);
        assert_eq!(it.doc_id(), 0);
    }

    #[test]
    fn collect_respects_limit() {
        let mut it = VectorPostingIterator::new(vec![1, 2, 3, 4]);
        assert_eq!(collect_ids(&mut it, Some(2)), vec![1, 2]);

        let mut it = VectorPostingIterator::new(vec![1, 2, 3, 4]);
        assert_eq!(collect_ids(&mut it, None), vec![1, 2, 3, 4]);

        let mut it = VectorPostingIterator::new(vec![1]);
        assert!(collect_ids(&mut it, Some(0)).is_empty());
    }
}
