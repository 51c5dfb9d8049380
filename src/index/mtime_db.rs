use std::ops::Bound;
use heed::{RoTxn, RwTxn};
use crate::core::error::{Error, Result};
use crate::core::stats::SubDatabaseSize;
use crate::core::types::DocId;
use crate::index::{logical_size, Comparator};
use crate::search::VectorPostingIterator;
use crate::storage::env::KeySetDbi;

type MTimeKey = [u8; 16];

/// Ordered (mtime, id) index answering modification-time queries.
///
/// Keys are `mtime ++ id`, both big-endian, so a cursor walks them by time
/// first and id second.
#[derive(Debug, Clone, Copy)]
pub struct MTimeDb {
    dbi: KeySetDbi,
}

fn key(mtime: u64, id: DocId) -> MTimeKey {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&mtime.to_be_bytes());
    key[8..].copy_from_slice(&id.to_be_bytes());
    key
}

fn key_id(key: &[u8]) -> Option<DocId> {
    let bytes: [u8; 8] = key.get(8..16)?.try_into().ok()?;
    Some(DocId::from_be_bytes(bytes))
}

impl MTimeDb {
    pub fn new(dbi: KeySetDbi) -> Self {
        MTimeDb { dbi }
    }

    pub fn put(&self, wtxn: &mut RwTxn, mtime: u64, id: DocId) -> Result<()> {
        if id == 0 {
            return Err(Error::invalid_argument("Document id must be non-zero"));
        }
        self.dbi.put(wtxn, &key(mtime, id)[..], &())?;
        Ok(())
    }

    pub fn del(&self, wtxn: &mut RwTxn, mtime: u64, id: DocId) -> Result<()> {
        self.dbi.delete(wtxn, &key(mtime, id)[..])?;
        Ok(())
    }

    /// Ids modified exactly at `mtime`.
    pub fn get(&self, rtxn: &RoTxn, mtime: u64) -> Result<Vec<DocId>> {
        self.iter_range(rtxn, mtime, mtime)
    }

    /// Ids whose mtime compares to `mtime` as asked, ascending by id.
    pub fn iter(&self, rtxn: &RoTxn, mtime: u64, comparator: Comparator) -> Result<Option<VectorPostingIterator>> {
        let (lower, upper) = match comparator {
            Comparator::Less => match mtime.checked_sub(1) {
                Some(end) => (0, end),
                None => return Ok(None),
            },
            Comparator::LessEqual => (0, mtime),
            Comparator::Equal => (mtime, mtime),
            Comparator::GreaterEqual => (mtime, u64::MAX),
            Comparator::Greater => match mtime.checked_add(1) {
                Some(begin) => (begin, u64::MAX),
                None => return Ok(None),
            },
        };

        let ids = self.iter_range(rtxn, lower, upper)?;
        if ids.is_empty() {
            return Ok(None);
        }
        Ok(Some(VectorPostingIterator::new(ids)))
    }

    /// Ids with `begin <= mtime <= end`, ascending by id.
    pub fn iter_range(&self, rtxn: &RoTxn, begin: u64, end: u64) -> Result<Vec<DocId>> {
        if begin > end {
            return Ok(Vec::new());
        }

        let lower = key(begin, 0);
        let upper = key(end, DocId::MAX);
        let range = (Bound::Included(&lower[..]), Bound::Included(&upper[..]));

        let mut ids = Vec::new();
        for entry in self.dbi.range(rtxn, &range)? {
            let (key, ()) = entry?;
            if let Some(id) = key_id(key) {
                ids.push(id);
            }
        }
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }

    pub fn db_size(&self, rtxn: &RoTxn) -> Result<SubDatabaseSize> {
        logical_size(self.dbi, rtxn)
    }
}
