use crate::compression::position_codec::PositionInfo;
use crate::core::types::DocId;
use crate::search::posting_iterator::PostingIterator;

/// Leaf iterator over a decoded position list, ascending by document id.
#[derive(Debug, Clone)]
pub struct VectorPositionInfoIterator {
    entries: Vec<PositionInfo>,
    next_index: usize,
    current: Option<usize>,
}

impl VectorPositionInfoIterator {
    pub fn new(entries: Vec<PositionInfo>) -> Self {
        VectorPositionInfoIterator {
            entries,
            next_index: 0,
            current: None,
        }
    }

    /// The entry under the cursor.
    pub fn current(&self) -> Option<&PositionInfo> {
        self.current.and_then(|idx| self.entries.get(idx))
    }
}

impl PostingIterator for VectorPositionInfoIterator {
    fn next(&mut self) -> Option<DocId> {
        if self.next_index < self.entries.len() {
            self.current = Some(self.next_index);
            self.next_index += 1;
            Some(self.entries[self.next_index - 1].doc_id)
        } else {
            self.current = None;
            None
        }
    }

    fn doc_id(&self) -> DocId {
        self.current().map_or(0, |info| info.doc_id)
    }

    fn skip_to(&mut self, target: DocId) -> Option<DocId> {
        let current = self.doc_id();
        if current != 0 && current >= target {
            return Some(current);
        }
        let remaining = &self.entries[self.next_index..];
        self.next_index += remaining.partition_point(|info| info.doc_id < target);
        self.next()
    }

    fn positions(&self) -> &[u32] {
        self.current().map(|info| info.positions.as_slice()).unwrap_or(&[])
    }
}
