use heed::{RoTxn, RwTxn};
use crate::core::error::{Error, Result};
use crate::core::stats::SubDatabaseSize;
use crate::core::types::{DocId, TimeInfo};
use crate::index::logical_size;
use crate::storage::env::IdDbi;

/// Document id -> (mtime, ctime).
#[derive(Debug, Clone, Copy)]
pub struct DocumentTimeDb {
    dbi: IdDbi,
}

impl DocumentTimeDb {
    pub fn new(dbi: IdDbi) -> Self {
        DocumentTimeDb { dbi }
    }

    pub fn put(&self, wtxn: &mut RwTxn, id: DocId, info: TimeInfo) -> Result<()> {
        if id == 0 {
            return Err(Error::invalid_argument("Document id must be non-zero"));
        }
        self.dbi.put(wtxn, &id, &bincode::serialize(&info)?[..])?;
        Ok(())
    }

    pub fn get(&self, rtxn: &RoTxn, id: DocId) -> Result<Option<TimeInfo>> {
        match self.dbi.get(rtxn, &id)? {
            Some(data) => Ok(Some(bincode::deserialize(data)?)),
            None => Ok(None),
        }
    }

    pub fn del(&self, wtxn: &mut RwTxn, id: DocId) -> Result<()> {
        self.dbi.delete(wtxn, &id)?;
        Ok(())
    }

    pub fn contains(&self, rtxn: &RoTxn, id: DocId) -> Result<bool> {
        Ok(self.dbi.get(rtxn, &id)?.is_some())
    }

    pub fn size(&self, rtxn: &RoTxn) -> Result<u64> {
        Ok(self.dbi.len(rtxn)?)
    }

    pub fn db_size(&self, rtxn: &RoTxn) -> Result<SubDatabaseSize> {
        logical_size(self.dbi, rtxn)
    }
}
