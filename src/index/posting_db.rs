use std::collections::BTreeMap;
use heed::{RoTxn, RwTxn};
use tracing::warn;
use crate::compression::posting_codec::PostingCodec;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::stats::SubDatabaseSize;
use crate::core::types::DocId;
use crate::index::{logical_size, Comparator};
use crate::search::{OrPostingIterator, PostingIterator, VectorPostingIterator};
use crate::storage::env::TermDbi;

/// Inverted index: term -> ascending document ids.
#[derive(Debug, Clone, Copy)]
pub struct PostingDb {
    dbi: TermDbi,
}

impl PostingDb {
    pub fn new(dbi: TermDbi) -> Self {
        PostingDb { dbi }
    }

    /// Stores `list` under `term`. An empty list removes the term.
    pub fn put(&self, wtxn: &mut RwTxn, term: &[u8], list: &[DocId]) -> Result<()> {
        if term.is_empty() {
            return Err(Error::invalid_argument("Posting term must not be empty"));
        }
        if list.is_empty() {
            return self.del(wtxn, term);
        }
        let data = PostingCodec::encode(list);
        self.dbi.put(wtxn, term, &data[..])?;
        Ok(())
    }

    pub fn get(&self, rtxn: &RoTxn, term: &[u8]) -> Result<Vec<DocId>> {
        if term.is_empty() {
            return Ok(Vec::new());
        }
        match self.dbi.get(rtxn, term)? {
            Some(data) => decode_or_empty(term, data),
            None => Ok(Vec::new()),
        }
    }

    pub fn del(&self, wtxn: &mut RwTxn, term: &[u8]) -> Result<()> {
        if !term.is_empty() {
            self.dbi.delete(wtxn, term)?;
        }
        Ok(())
    }

    /// Leaf iterator for `term`, `None` when the term has no postings.
    pub fn iter(&self, rtxn: &RoTxn, term: &[u8]) -> Result<Option<VectorPostingIterator>> {
        let list = self.get(rtxn, term)?;
        if list.is_empty() {
            return Ok(None);
        }
        Ok(Some(VectorPostingIterator::new(list)))
    }

    /// Union of the postings of every term starting with `prefix`.
    pub fn prefix_iter(&self, rtxn: &RoTxn, prefix: &[u8]) -> Result<Option<Box<dyn PostingIterator>>> {
        self.filtered_iter(rtxn, prefix, |_| true)
    }

    /// Union of the postings of `prefix<number>` terms whose number
    /// satisfies `comparator` against `value`. Terms whose suffix is not a
    /// number are skipped.
    pub fn comp_iter(
        &self,
        rtxn: &RoTxn,
        prefix: &[u8],
        value: i64,
        comparator: Comparator,
    ) -> Result<Option<Box<dyn PostingIterator>>> {
        self.filtered_iter(rtxn, prefix, |suffix| {
            parse_number(suffix).is_some_and(|num| comparator.matches(num, value))
        })
    }

    fn filtered_iter<F>(&self, rtxn: &RoTxn, prefix: &[u8], keep: F) -> Result<Option<Box<dyn PostingIterator>>>
    where
        F: Fn(&[u8]) -> bool,
    {
        let mut iterators: Vec<Box<dyn PostingIterator>> = Vec::new();
        for entry in self.dbi.prefix_iter(rtxn, prefix)? {
            let (term, data) = entry?;
            if !keep(&term[prefix.len()..]) {
                continue;
            }
            let list = decode_or_empty(term, data)?;
            if !list.is_empty() {
                iterators.push(Box::new(VectorPostingIterator::new(list)));
            }
        }
        Ok(OrPostingIterator::combine(iterators))
    }

    pub fn fetch_terms_starting_with(&self, rtxn: &RoTxn, prefix: &[u8]) -> Result<Vec<Vec<u8>>> {
        let mut terms = Vec::new();
        for entry in self.dbi.prefix_iter(rtxn, prefix)? {
            let (term, _) = entry?;
            terms.push(term.to_vec());
        }
        Ok(terms)
    }

    /// Every term with its decoded postings.
    pub fn to_map(&self, rtxn: &RoTxn) -> Result<BTreeMap<Vec<u8>, Vec<DocId>>> {
        let mut map = BTreeMap::new();
        for entry in self.dbi.iter(rtxn)? {
            let (term, data) = entry?;
            map.insert(term.to_vec(), decode_or_empty(term, data)?);
        }
        Ok(map)
    }

    pub fn db_size(&self, rtxn: &RoTxn) -> Result<SubDatabaseSize> {
        logical_size(self.dbi, rtxn)
    }
}

fn decode_or_empty(term: &[u8], data: &[u8]) -> Result<Vec<DocId>> {
    match PostingCodec::decode(data) {
        Ok(list) => Ok(list),
        Err(err) if err.kind == ErrorKind::Parse => {
            warn!(term = %String::from_utf8_lossy(term), error = %err, "corrupt posting list");
            Ok(Vec::new())
        }
        Err(err) => Err(err),
    }
}

fn parse_number(suffix: &[u8]) -> Option<i64> {
    std::str::from_utf8(suffix).ok()?.parse().ok()
}
