use std::collections::BTreeMap;
use heed::{RoTxn, RwTxn};
use tracing::warn;
use crate::compression::terms_codec::TermsCodec;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::stats::SubDatabaseSize;
use crate::core::types::DocId;
use crate::index::logical_size;
use crate::storage::env::IdDbi;

/// Document id -> term set. One instance each for content terms, file
/// name terms and xattr terms; used to retract postings on removal.
#[derive(Debug, Clone, Copy)]
pub struct DocumentDb {
    dbi: IdDbi,
}

impl DocumentDb {
    pub fn new(dbi: IdDbi) -> Self {
        DocumentDb { dbi }
    }

    /// Stores the term set of `id`. An empty set removes the entry.
    pub fn put(&self, wtxn: &mut RwTxn, id: DocId, terms: &[Vec<u8>]) -> Result<()> {
        if id == 0 {
            return Err(Error::invalid_argument("Document id must be non-zero"));
        }
        if terms.is_empty() {
            return self.del(wtxn, id);
        }
        let data = TermsCodec::encode(terms);
        self.dbi.put(wtxn, &id, &data[..])?;
        Ok(())
    }

    pub fn get(&self, rtxn: &RoTxn, id: DocId) -> Result<Vec<Vec<u8>>> {
        let Some(data) = self.dbi.get(rtxn, &id)? else {
            return Ok(Vec::new());
        };
        match TermsCodec::decode(data) {
            Ok(terms) => Ok(terms),
            Err(err) if err.kind == ErrorKind::Parse => {
                warn!(id, error = %err, "corrupt document term set");
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }

    pub fn del(&self, wtxn: &mut RwTxn, id: DocId) -> Result<()> {
        self.dbi.delete(wtxn, &id)?;
        Ok(())
    }

    pub fn contains(&self, rtxn: &RoTxn, id: DocId) -> Result<bool> {
        Ok(self.dbi.get(rtxn, &id)?.is_some())
    }

    /// Number of documents with a stored term set.
    pub fn size(&self, rtxn: &RoTxn) -> Result<u64> {
        Ok(self.dbi.len(rtxn)?)
    }

    /// Every document with its term set.
    pub fn to_map(&self, rtxn: &RoTxn) -> Result<BTreeMap<DocId, Vec<Vec<u8>>>> {
        let mut map = BTreeMap::new();
        for entry in self.dbi.iter(rtxn)? {
            let (id, data) = entry?;
            map.insert(id, TermsCodec::decode(data)?);
        }
        Ok(map)
    }

    pub fn db_size(&self, rtxn: &RoTxn) -> Result<SubDatabaseSize> {
        logical_size(self.dbi, rtxn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::env::testing::temp_env;

    fn terms(list: &[&str]) -> Vec<Vec<u8>> {
        list.iter().map(|t| t.as_bytes().to_vec()).collect()
    }

    #[test]
    fn term_sets_round_trip() {
        let (_dir, env, dbis) = temp_env();
        let db = DocumentDb::new(dbis.doc_terms);

        let mut wtxn = env.write_txn().unwrap();
        db.put(&mut wtxn, 1, &terms(&["fire", "ice", "Mtext"])).unwrap();
        db.put(&mut wtxn, 2, &terms(&["water"])).unwrap();
        wtxn.commit().unwrap();

        let rtxn = env.read_txn().unwrap();
        assert_eq!(db.get(&rtxn, 1).unwrap(), terms(&["Mtext", "fire", "ice"]));
        assert!(db.contains(&rtxn, 2).unwrap());
        assert!(db.get(&rtxn, 3).unwrap().is_empty());
        assert_eq!(db.size(&rtxn).unwrap(), 2);
        assert_eq!(db.to_map(&rtxn).unwrap().len(), 2);
    }

    #[test]
    fn zero_id_is_rejected() {
        let (_dir, env, dbis) = temp_env();
        let db = DocumentDb::new(dbis.doc_terms);

        let mut wtxn = env.write_txn().unwrap();
        assert!(db.put(&mut wtxn, 0, &terms(&["a"])).is_err());
    }

    #[test]
    fn delete_removes_entry() {
        let (_dir, env, dbis) = temp_env();
        let db = DocumentDb::new(dbis.doc_xattr_terms);

        let mut wtxn = env.write_txn().unwrap();
        db.put(&mut wtxn, 5, &terms(&["TAfoo"])).unwrap();
        db.del(&mut wtxn, 5).unwrap();
        assert!(!db.contains(&wtxn, 5).unwrap());
        assert_eq!(db.size(&wtxn).unwrap(), 0);
    }
}
