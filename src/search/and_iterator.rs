use crate::core::types::DocId;
use crate::search::posting_iterator::PostingIterator;

/// Advances `iterators` to the next id they all share.
///
/// The first iterator leads: each candidate comes from it, every other
/// iterator is skipped forward to the candidate, and a miss moves the lead
/// up to the id that overshot. Returns `None` as soon as any iterator runs
/// dry.
pub(crate) fn next_common(iterators: &mut [Box<dyn PostingIterator>]) -> Option<DocId> {
    let (lead, rest) = iterators.split_first_mut()?;
    let mut candidate = lead.next()?;

    'align: loop {
        for it in rest.iter_mut() {
            let id = it.skip_to(candidate)?;
            if id > candidate {
                candidate = lead.skip_to(id)?;
                continue 'align;
            }
        }
        return Some(candidate);
    }
}

/// Intersection of its sub-iterators, ascending.
#[derive(Debug)]
pub struct AndPostingIterator {
    iterators: Vec<Box<dyn PostingIterator>>,
    current: DocId,
    exhausted: bool,
}

impl AndPostingIterator {
    pub fn new(iterators: Vec<Box<dyn PostingIterator>>) -> Self {
        let exhausted = iterators.is_empty();
        AndPostingIterator {
            iterators,
            current: 0,
            exhausted,
        }
    }
}

impl PostingIterator for AndPostingIterator {
    fn next(&mut self) -> Option<DocId> {
        if self.exhausted {
            return None;
        }
        match next_common(&mut self.iterators) {
            Some(id) => {
                self.current = id;
                Some(id)
            }
            None => {
                self.exhausted = true;
                self.current = 0;
                None
            }
        }
    }

    fn doc_id(&self) -> DocId {
        self.current
    }
}
