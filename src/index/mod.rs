pub mod posting_db;
pub mod position_db;
pub mod document_db;
pub mod document_url_db;
pub mod document_time_db;
pub mod mtime_db;
pub mod document_data_db;
pub mod document_id_db;

pub use document_data_db::DocumentDataDb;
pub use document_db::DocumentDb;
pub use document_id_db::DocumentIdDb;
pub use document_time_db::DocumentTimeDb;
pub use document_url_db::{DocumentUrlDb, FilePath};
pub use mtime_db::MTimeDb;
pub use position_db::PositionDb;
pub use posting_db::PostingDb;

use heed::types::Bytes;
use heed::{Database as HeedDatabase, RoTxn};
use serde::{Deserialize, Serialize};
use crate::core::error::Result;
use crate::core::stats::SubDatabaseSize;

/// Ordering filter for numeric scans (ratings, modification times).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparator {
    Less,
    LessEqual,
    Equal,
    GreaterEqual,
    Greater,
}

impl Comparator {
    /// Whether `value <op> reference` holds.
    pub fn matches<T: PartialOrd>(&self, value: T, reference: T) -> bool {
        match self {
            Comparator::Less => value < reference,
            Comparator::LessEqual => value <= reference,
            Comparator::Equal => value == reference,
            Comparator::GreaterEqual => value >= reference,
            Comparator::Greater => value > reference,
        }
    }
}

/// Walks every entry of `dbi` and sums key and value lengths.
pub(crate) fn logical_size<KC, DC>(dbi: HeedDatabase<KC, DC>, txn: &RoTxn) -> Result<SubDatabaseSize> {
    let raw = dbi.remap_types::<Bytes, Bytes>();
    let mut size = SubDatabaseSize::default();
    for entry in raw.iter(txn)? {
        let (key, value) = entry?;
        size.add_entry(key.len(), value.len());
    }
    Ok(size)
}
