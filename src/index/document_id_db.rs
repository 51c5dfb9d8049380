use heed::{RoTxn, RwTxn};
use crate::core::error::{Error, Result};
use crate::core::stats::SubDatabaseSize;
use crate::core::types::DocId;
use crate::index::logical_size;
use crate::storage::env::IdSetDbi;

/// A plain set of document ids (content-indexing queue, failed ids).
#[derive(Debug, Clone, Copy)]
pub struct DocumentIdDb {
    dbi: IdSetDbi,
}

impl DocumentIdDb {
    pub fn new(dbi: IdSetDbi) -> Self {
        DocumentIdDb { dbi }
    }

    pub fn put(&self, wtxn: &mut RwTxn, id: DocId) -> Result<()> {
        if id == 0 {
            return Err(Error::invalid_argument("Document id must be non-zero"));
        }
        self.dbi.put(wtxn, &id, &())?;
        Ok(())
    }

    pub fn del(&self, wtxn: &mut RwTxn, id: DocId) -> Result<()> {
        self.dbi.delete(wtxn, &id)?;
        Ok(())
    }

    pub fn contains(&self, rtxn: &RoTxn, id: DocId) -> Result<bool> {
        Ok(self.dbi.get(rtxn, &id)?.is_some())
    }

    /// Up to `limit` ids, ascending.
    pub fn fetch_items(&self, rtxn: &RoTxn, limit: usize) -> Result<Vec<DocId>> {
        let mut ids = Vec::new();
        for entry in self.dbi.iter(rtxn)?.take(limit) {
            let (id, ()) = entry?;
            ids.push(id);
        }
        Ok(ids)
    }

    pub fn size(&self, rtxn: &RoTxn) -> Result<u64> {
        Ok(self.dbi.len(rtxn)?)
    }

    pub fn db_size(&self, rtxn: &RoTxn) -> Result<SubDatabaseSize> {
        logical_size(self.dbi, rtxn)
    }
}
