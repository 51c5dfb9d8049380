use std::collections::BTreeMap;
use bitflags::bitflags;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque, non-zero document identifier (device + inode, see `id_utils`).
/// Zero means "no document" throughout the engine.
pub type DocId = u64;

/// Term -> ascending positions. An empty position list marks an
/// unpositioned term (posting index only).
pub type TermMap = BTreeMap<Vec<u8>, Vec<u32>>;

bitflags! {
    /// Parts of a document overwritten by `replace_document`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DocumentOperations: u32 {
        const DOCUMENT_TERMS  = 1;
        const FILE_NAME_TERMS = 2;
        const XATTR_TERMS     = 4;
        const DOCUMENT_DATA   = 8;
        const DOCUMENT_URL    = 16;
        const DOCUMENT_TIME   = 32;
        const EVERYTHING = Self::DOCUMENT_TERMS.bits()
            | Self::FILE_NAME_TERMS.bits()
            | Self::XATTR_TERMS.bits()
            | Self::DOCUMENT_DATA.bits()
            | Self::DOCUMENT_URL.bits()
            | Self::DOCUMENT_TIME.bits();
    }
}

/// Modification and status-change times in epoch seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeInfo {
    pub m_time: u64,
    pub c_time: u64,
}

impl TimeInfo {
    pub fn new(m_time: u64, c_time: u64) -> Self {
        TimeInfo { m_time, c_time }
    }

    pub fn modified(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(i64::try_from(self.m_time).ok()?, 0)
    }

    pub fn changed(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(i64::try_from(self.c_time).ok()?, 0)
    }
}

/// A file or directory as produced by an indexing job, committed through
/// `Transaction::add_document` / `replace_document`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub url: Vec<u8>,
    pub m_time: u64,
    pub c_time: u64,
    pub content_indexing: bool,
    pub data: Vec<u8>,

    pub terms: TermMap,
    pub file_name_terms: TermMap,
    pub xattr_terms: TermMap,
}

impl Document {
    pub fn new(id: DocId) -> Self {
        Document {
            id,
            ..Document::default()
        }
    }

    pub fn set_url(&mut self, url: impl Into<Vec<u8>>) {
        self.url = url.into();
    }

    pub fn time_info(&self) -> TimeInfo {
        TimeInfo::new(self.m_time, self.c_time)
    }

    pub fn add_term(&mut self, term: impl Into<Vec<u8>>) {
        self.terms.entry(term.into()).or_default();
    }

    pub fn add_position_term(&mut self, term: impl Into<Vec<u8>>, position: u32) {
        insert_position(&mut self.terms, term.into(), position);
    }

    pub fn add_file_name_term(&mut self, term: impl Into<Vec<u8>>) {
        self.file_name_terms.entry(term.into()).or_default();
    }

    pub fn add_file_name_position_term(&mut self, term: impl Into<Vec<u8>>, position: u32) {
        insert_position(&mut self.file_name_terms, term.into(), position);
    }

    pub fn add_xattr_term(&mut self, term: impl Into<Vec<u8>>) {
        self.xattr_terms.entry(term.into()).or_default();
    }

    pub fn add_xattr_position_term(&mut self, term: impl Into<Vec<u8>>, position: u32) {
        insert_position(&mut self.xattr_terms, term.into(), position);
    }
}

fn insert_position(map: &mut TermMap, term: Vec<u8>, position: u32) {
    let positions = map.entry(term).or_default();
    if let Err(idx) = positions.binary_search(&position) {
        positions.insert(idx, position);
    }
}
