use crate::core::types::DocId;
use crate::search::posting_iterator::PostingIterator;

/// Union of its sub-iterators, ascending and without duplicates.
#[derive(Debug)]
pub struct OrPostingIterator {
    iterators: Vec<Box<dyn PostingIterator>>,
    current: DocId,
    started: bool,
}

impl OrPostingIterator {
    pub fn new(iterators: Vec<Box<dyn PostingIterator>>) -> Self {
        OrPostingIterator {
            iterators,
            current: 0,
            started: false,
        }
    }

    /// Builds the cheapest iterator for a union: nothing for no inputs,
    /// the input itself for one, an `OrPostingIterator` otherwise.
    pub fn combine(mut iterators: Vec<Box<dyn PostingIterator>>) -> Option<Box<dyn PostingIterator>> {
        match iterators.len() {
            0 => None,
            1 => iterators.pop(),
            _ => Some(Box::new(OrPostingIterator::new(iterators))),
        }
    }

    fn settle(&mut self) -> Option<DocId> {
        let min = self
            .iterators
            .iter()
            .map(|it| it.doc_id())
            .filter(|&id| id != 0)
            .min();
        self.current = min.unwrap_or(0);
        min
    }
}

impl PostingIterator for OrPostingIterator {
    fn next(&mut self) -> Option<DocId> {
        if !self.started {
            self.started = true;
            for it in &mut self.iterators {
                it.next();
            }
        } else {
            if self.current == 0 {
                return None;
            }
            let current = self.current;
            for it in &mut self.iterators {
                if it.doc_id() == current {
                    it.next();
                }
            }
        }
        self.settle()
    }

    fn doc_id(&self) -> DocId {
        self.current
    }

    fn skip_to(&mut self, target: DocId) -> Option<DocId> {
        if self.current != 0 && self.current >= target {
            return Some(self.current);
        }
        if self.started && self.current == 0 {
            return None;
        }
        self.started = true;
        for it in &mut self.iterators {
            it.skip_to(target);
        }
        self.settle()
    }
}
