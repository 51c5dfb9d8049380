use crate::core::types::DocId;
use crate::search::and_iterator::next_common;
use crate::search::posting_iterator::PostingIterator;

/// Documents in which the terms occur consecutively, in order.
///
/// Sub-iterators must carry positions, one per phrase term. Candidates come
/// from the plain intersection of their documents and are kept only when
/// some start position `p` has term `i` at `p + i` for every term.
#[derive(Debug)]
pub struct PhraseAndIterator {
    iterators: Vec<Box<dyn PostingIterator>>,
    current: DocId,
    exhausted: bool,
}

impl PhraseAndIterator {
    pub fn new(iterators: Vec<Box<dyn PostingIterator>>) -> Self {
        let exhausted = iterators.is_empty();
        PhraseAndIterator {
            iterators,
            current: 0,
            exhausted,
        }
    }

    fn terms_are_adjacent(&self) -> bool {
        let Some((first, rest)) = self.iterators.split_first() else {
            return false;
        };

        let mut starts: Vec<u32> = first.positions().to_vec();
        for (offset, it) in rest.iter().enumerate() {
            let offset = offset as u32 + 1;
            let positions = it.positions();
            starts.retain(|&start| {
                start
                    .checked_add(offset)
                    .is_some_and(|pos| positions.binary_search(&pos).is_ok())
            });
            if starts.is_empty() {
                return false;
            }
        }
        !starts.is_empty()
    }
}

impl PostingIterator for PhraseAndIterator {
    fn next(&mut self) -> Option<DocId> {
        if self.exhausted {
            return None;
        }
        while let Some(candidate) = next_common(&mut self.iterators) {
            if self.terms_are_adjacent() {
                self.current = candidate;
                return Some(candidate);
            }
        }
        self.exhausted = true;
        self.current = 0;
        None
    }

    fn doc_id(&self) -> DocId {
        self.current
    }
}
