use serde::{Deserialize, Serialize};
use crate::core::error::Result;
use crate::core::types::DocId;

/// Logical footprint of one sub-database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubDatabaseSize {
    pub entries: u64,
    /// Key plus value bytes of every entry
    pub bytes: u64,
}

impl SubDatabaseSize {
    pub fn add_entry(&mut self, key_len: usize, value_len: usize) {
        self.entries += 1;
        self.bytes += (key_len + value_len) as u64;
    }
}

/// Database size accounting, as reported by `Transaction::db_size`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseSize {
    pub posting_db: SubDatabaseSize,
    pub position_db: SubDatabaseSize,

    pub doc_terms: SubDatabaseSize,
    pub doc_filename_terms: SubDatabaseSize,
    pub doc_xattr_terms: SubDatabaseSize,

    pub id_tree: SubDatabaseSize,
    pub id_filename: SubDatabaseSize,

    pub doc_time: SubDatabaseSize,
    pub doc_data: SubDatabaseSize,
    pub mtime_db: SubDatabaseSize,

    pub content_indexing_db: SubDatabaseSize,
    pub failed_ids_db: SubDatabaseSize,

    /// Sum of the logical sizes above
    pub expected_size: u64,
    /// Bytes used by the environment file on disk
    pub actual_size: u64,
}

impl DatabaseSize {
    fn parts(&self) -> [&SubDatabaseSize; 12] {
        [
            &self.posting_db,
            &self.position_db,
            &self.doc_terms,
            &self.doc_filename_terms,
            &self.doc_xattr_terms,
            &self.id_tree,
            &self.id_filename,
            &self.doc_time,
            &self.doc_data,
            &self.mtime_db,
            &self.content_indexing_db,
            &self.failed_ids_db,
        ]
    }

    /// Recomputes `expected_size` from the per-database sizes.
    pub fn sum_expected(&mut self) {
        self.expected_size = self.parts().iter().map(|p| p.bytes).sum();
    }

    pub fn total_entries(&self) -> u64 {
        self.parts().iter().map(|p| p.entries).sum()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A single inconsistency found between the term sets and the postings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsistencyIssue {
    /// The document lists `term` but the term's posting list lacks the id
    MissingPosting { doc_id: DocId, term: Vec<u8> },
    /// The posting list of `term` holds the id but none of the document's
    /// term sets contain it
    MissingTerm { doc_id: DocId, term: Vec<u8> },
    /// A posting list references an id with no path entry
    MissingUrl { doc_id: DocId },
}

/// Result of a consistency pass over the index
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub checked: u64,
    pub issues: Vec<ConsistencyIssue>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.issues.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_size_sums_parts() {
        let mut size = DatabaseSize::default();
        size.posting_db.add_entry(3, 10);
        size.doc_time.add_entry(8, 16);
        size.sum_expected();

        assert_eq!(size.expected_size, 37);
        assert_eq!(size.total_entries(), 2);

        let json = size.to_json().unwrap();
        assert!(json.contains("\"expected_size\": 37"));
    }

    #[test]
    fn empty_report_is_consistent() {
        let mut report = ConsistencyReport::default();
        assert!(report.is_consistent());
        report.issues.push(ConsistencyIssue::MissingTerm { doc_id: 1, term: b"a".to_vec() });
        assert!(!report.is_consistent());
    }
}
