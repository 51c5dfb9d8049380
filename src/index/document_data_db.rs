use heed::{RoTxn, RwTxn};
use crate::core::error::{Error, Result};
use crate::core::stats::SubDatabaseSize;
use crate::core::types::DocId;
use crate::index::logical_size;
use crate::storage::env::IdDbi;

/// Document id -> opaque payload owned by the indexer.
#[derive(Debug, Clone, Copy)]
pub struct DocumentDataDb {
    dbi: IdDbi,
}

impl DocumentDataDb {
    pub fn new(dbi: IdDbi) -> Self {
        DocumentDataDb { dbi }
    }

    /// Stores `data` for `id`; empty data removes the entry.
    pub fn put(&self, wtxn: &mut RwTxn, id: DocId, data: &[u8]) -> Result<()> {
        if id == 0 {
            return Err(Error::invalid_argument("Document id must be non-zero"));
        }
        if data.is_empty() {
            return self.del(wtxn, id);
        }
        self.dbi.put(wtxn, &id, data)?;
        Ok(())
    }

    pub fn get(&self, rtxn: &RoTxn, id: DocId) -> Result<Vec<u8>> {
        Ok(self.dbi.get(rtxn, &id)?.map(|data| data.to_vec()).unwrap_or_default())
    }

    pub fn del(&self, wtxn: &mut RwTxn, id: DocId) -> Result<()> {
        self.dbi.delete(wtxn, &id)?;
        Ok(())
    }

    pub fn contains(&self, rtxn: &RoTxn, id: DocId) -> Result<bool> {
        Ok(self.dbi.get(rtxn, &id)?.is_some())
    }

    pub fn db_size(&self, rtxn: &RoTxn) -> Result<SubDatabaseSize> {
        logical_size(self.dbi, rtxn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::env::testing::temp_env;

    #[test]
    fn payload_round_trip() {
        let (_dir, env, dbis) = temp_env();
        let db = DocumentDataDb::new(dbis.doc_data);

        let mut wtxn = env.write_txn().unwrap();
        db.put(&mut wtxn, 3, b"payload").unwrap();
        assert_eq!(db.get(&wtxn, 3).unwrap(), b"payload".to_vec());
        assert!(db.get(&wtxn, 4).unwrap().is_empty());

        db.put(&mut wtxn, 3, b"").unwrap();
        assert!(!db.contains(&wtxn, 3).unwrap());
    }
}
