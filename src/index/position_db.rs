use heed::{RoTxn, RwTxn};
use tracing::warn;
use crate::compression::position_codec::{PositionCodec, PositionInfo};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::stats::SubDatabaseSize;
use crate::index::logical_size;
use crate::search::VectorPositionInfoIterator;
use crate::storage::env::TermDbi;

/// term -> per-document position lists, used by phrase queries.
#[derive(Debug, Clone, Copy)]
pub struct PositionDb {
    dbi: TermDbi,
}

impl PositionDb {
    pub fn new(dbi: TermDbi) -> Self {
        PositionDb { dbi }
    }

    pub fn put(&self, wtxn: &mut RwTxn, term: &[u8], list: &[PositionInfo]) -> Result<()> {
        if term.is_empty() {
            return Err(Error::invalid_argument("Position term must not be empty"));
        }
        if list.is_empty() {
            return self.del(wtxn, term);
        }
        let data = PositionCodec::encode(list);
        self.dbi.put(wtxn, term, &data[..])?;
        Ok(())
    }

    pub fn get(&self, rtxn: &RoTxn, term: &[u8]) -> Result<Vec<PositionInfo>> {
        if term.is_empty() {
            return Ok(Vec::new());
        }
        let Some(data) = self.dbi.get(rtxn, term)? else {
            return Ok(Vec::new());
        };
        match PositionCodec::decode(data) {
            Ok(list) => Ok(list),
            Err(err) if err.kind == ErrorKind::Parse => {
                warn!(term = %String::from_utf8_lossy(term), error = %err, "corrupt position list");
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }

    pub fn del(&self, wtxn: &mut RwTxn, term: &[u8]) -> Result<()> {
        if !term.is_empty() {
            self.dbi.delete(wtxn, term)?;
        }
        Ok(())
    }

    pub fn contains(&self, rtxn: &RoTxn, term: &[u8]) -> Result<bool> {
        Ok(!term.is_empty() && self.dbi.get(rtxn, term)?.is_some())
    }

    pub fn iter(&self, rtxn: &RoTxn, term: &[u8]) -> Result<Option<VectorPositionInfoIterator>> {
        let list = self.get(rtxn, term)?;
        if list.is_empty() {
            return Ok(None);
        }
        Ok(Some(VectorPositionInfoIterator::new(list)))
    }

    pub fn db_size(&self, rtxn: &RoTxn) -> Result<SubDatabaseSize> {
        logical_size(self.dbi, rtxn)
    }
}
