use std::collections::{BTreeMap, BTreeSet};
use heed::{RoTxn, RwTxn};
use roaring::RoaringTreemap;
use tracing::{debug, warn};
use crate::compression::position_codec::PositionInfo;
use crate::compression::posting_codec::{sorted_id_insert, sorted_id_remove};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::id_utils::PathIdResolver;
use crate::core::types::{DocId, Document, DocumentOperations, TermMap};
use crate::index::document_url_db::{PendingPath, MAX_PATH_DEPTH};
use crate::index::{
    DocumentDataDb, DocumentDb, DocumentIdDb, DocumentTimeDb, DocumentUrlDb, MTimeDb, PositionDb, PostingDb,
};
use crate::storage::env::DatabaseDbis;

/// A posting change waiting for commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    AddId(PositionInfo),
    RemoveId(DocId),
}

/// How a replaced url lands in the path tree, worked out before any write.
enum UrlChange<'u> {
    Rename(&'u [u8]),
    Move { from_parent: DocId, to: PendingPath<'u> },
    Insert(PendingPath<'u>),
}

/// Write side of a ReadWrite transaction.
///
/// Document term sets, paths, times and payloads are written straight
/// into the transaction. Posting and position changes are collected per
/// term and merged into the stored lists once, on commit.
pub struct WriteTransaction<'r> {
    dbis: DatabaseDbis,
    resolver: &'r dyn PathIdResolver,
    pending: BTreeMap<Vec<u8>, Vec<Operation>>,
}

impl<'r> WriteTransaction<'r> {
    pub fn new(dbis: DatabaseDbis, resolver: &'r dyn PathIdResolver) -> Self {
        WriteTransaction {
            dbis,
            resolver,
            pending: BTreeMap::new(),
        }
    }

    fn url_db(&self) -> DocumentUrlDb {
        DocumentUrlDb::new(self.dbis.id_tree, self.dbis.id_filename)
    }

    fn term_dbs(&self) -> [(DocumentOperations, DocumentDb); 3] {
        [
            (DocumentOperations::DOCUMENT_TERMS, DocumentDb::new(self.dbis.doc_terms)),
            (DocumentOperations::FILE_NAME_TERMS, DocumentDb::new(self.dbis.doc_filename_terms)),
            (DocumentOperations::XATTR_TERMS, DocumentDb::new(self.dbis.doc_xattr_terms)),
        ]
    }

    pub fn has_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn add_document(&mut self, wtxn: &mut RwTxn, doc: &Document) -> Result<()> {
        let id = doc.id;
        if id == 0 {
            return Err(Error::invalid_argument("Document id must be non-zero"));
        }
        let time_db = DocumentTimeDb::new(self.dbis.doc_time);
        if time_db.contains(wtxn, id)? {
            return Err(Error::new(ErrorKind::InvalidState, format!("Document {} already exists", id)));
        }

        if !self.url_db().put(wtxn, id, &doc.url, self.resolver)? {
            return Err(unresolved(&doc.url));
        }

        time_db.put(wtxn, id, doc.time_info())?;
        MTimeDb::new(self.dbis.mtime).put(wtxn, doc.m_time, id)?;

        for (op, db) in self.term_dbs() {
            let terms = document_terms(doc, op);
            if terms.is_empty() {
                continue;
            }
            self.add_terms(id, terms);
            db.put(wtxn, id, &terms.keys().cloned().collect::<Vec<_>>())?;
        }

        if doc.content_indexing {
            DocumentIdDb::new(self.dbis.content_indexing).put(wtxn, id)?;
        }
        if !doc.data.is_empty() {
            DocumentDataDb::new(self.dbis.doc_data).put(wtxn, id, &doc.data)?;
        }

        Ok(())
    }

    /// Drops every trace of `id`: postings, term sets, path entry, time
    /// and payload, and queue membership.
    pub fn remove_document(&mut self, wtxn: &mut RwTxn, id: DocId) -> Result<()> {
        if id == 0 {
            return Err(Error::invalid_argument("Document id must be non-zero"));
        }

        for (_, db) in self.term_dbs() {
            let terms = db.get(wtxn, id)?;
            self.remove_terms(id, &terms);
            db.del(wtxn, id)?;
        }

        let time_db = DocumentTimeDb::new(self.dbis.doc_time);
        self.url_db().del(wtxn, id, |txn, parent| Ok(!time_db.contains(txn, parent)?))?;

        DocumentIdDb::new(self.dbis.content_indexing).del(wtxn, id)?;
        DocumentIdDb::new(self.dbis.failed_ids).del(wtxn, id)?;

        if let Some(info) = time_db.get(wtxn, id)? {
            MTimeDb::new(self.dbis.mtime).del(wtxn, info.m_time, id)?;
        }
        time_db.del(wtxn, id)?;
        DocumentDataDb::new(self.dbis.doc_data).del(wtxn, id)?;

        Ok(())
    }

    /// Removes `id` and everything below it, children before parents.
    pub fn remove_recursively(&mut self, wtxn: &mut RwTxn, id: DocId) -> Result<()> {
        if id == 0 {
            return Err(Error::invalid_argument("Document id must be non-zero"));
        }

        let url_db = self.url_db();
        let mut visited = RoaringTreemap::new();
        visited.insert(id);
        let mut order = Vec::new();
        let mut stack = vec![(id, 0usize)];
        while let Some((current, depth)) = stack.pop() {
            order.push(current);
            if depth >= MAX_PATH_DEPTH {
                warn!(id = current, "subtree exceeds depth limit");
                continue;
            }
            for child in url_db.get_children(wtxn, current)? {
                if child != 0 && visited.insert(child) {
                    stack.push((child, depth + 1));
                }
            }
        }

        // Pre-order reversed: every child comes before its parent
        for doc_id in order.into_iter().rev() {
            self.remove_document(wtxn, doc_id)?;
        }
        Ok(())
    }

    /// Overwrites the parts of an existing document named by `operations`.
    ///
    /// A new url is resolved first, so an unresolvable parent fails with
    /// `NotFound` before anything is written.
    pub fn replace_document(&mut self, wtxn: &mut RwTxn, doc: &Document, operations: DocumentOperations) -> Result<()> {
        let id = doc.id;
        if id == 0 {
            return Err(Error::invalid_argument("Document id must be non-zero"));
        }

        let url_change = if operations.contains(DocumentOperations::DOCUMENT_URL) {
            Some(self.plan_url_change(wtxn, id, &doc.url)?)
        } else {
            None
        };

        // Terms also held by an untouched field keep their posting. The
        // others are retracted and re-added from the new sets, which
        // resets their positions.
        let mut kept = BTreeSet::new();
        let mut dropped = BTreeSet::new();
        for (op, db) in self.term_dbs() {
            let stored = db.get(wtxn, id)?;
            if operations.contains(op) {
                dropped.extend(stored);
            } else {
                kept.extend(stored);
            }
        }
        let dropped: Vec<Vec<u8>> = dropped.into_iter().filter(|t| !kept.contains(t)).collect();
        self.remove_terms(id, &dropped);

        for (op, db) in self.term_dbs() {
            if !operations.contains(op) {
                continue;
            }
            let terms = document_terms(doc, op);
            self.add_terms(id, terms);
            db.put(wtxn, id, &terms.keys().cloned().collect::<Vec<_>>())?;
        }

        if let Some(change) = url_change {
            self.apply_url_change(wtxn, id, change)?;
        }

        if operations.contains(DocumentOperations::DOCUMENT_TIME) {
            let time_db = DocumentTimeDb::new(self.dbis.doc_time);
            let mtime_db = MTimeDb::new(self.dbis.mtime);
            if let Some(previous) = time_db.get(wtxn, id)? {
                mtime_db.del(wtxn, previous.m_time, id)?;
            }
            time_db.put(wtxn, id, doc.time_info())?;
            mtime_db.put(wtxn, doc.m_time, id)?;
        }

        if operations.contains(DocumentOperations::DOCUMENT_DATA) {
            DocumentDataDb::new(self.dbis.doc_data).put(wtxn, id, &doc.data)?;
        }

        Ok(())
    }

    /// A rename inside the same directory only touches the leaf name; a
    /// move relinks `id` under the new parent.
    fn plan_url_change<'u>(&self, rtxn: &RoTxn, id: DocId, url: &'u [u8]) -> Result<UrlChange<'u>> {
        let url_db = self.url_db();
        let Some(to) = url_db.resolve(rtxn, id, url, self.resolver)? else {
            return Err(unresolved(url));
        };

        Ok(match url_db.file_path(rtxn, id)? {
            Some(current) if current.parent_id == to.parent_id => UrlChange::Rename(to.name),
            Some(current) => UrlChange::Move { from_parent: current.parent_id, to },
            None => {
                debug!(id, "replacing url of a document without a path entry");
                UrlChange::Insert(to)
            }
        })
    }

    fn apply_url_change(&self, wtxn: &mut RwTxn, id: DocId, change: UrlChange<'_>) -> Result<()> {
        let url_db = self.url_db();
        match change {
            UrlChange::Rename(name) => url_db.rename(wtxn, id, name),
            UrlChange::Insert(to) => url_db.insert(wtxn, &to),
            UrlChange::Move { from_parent, to } => {
                // Ancestors the new path anchors on must survive the unlink
                url_db.detach(wtxn, id, |_, _| Ok(false))?;
                url_db.insert(wtxn, &to)?;

                let time_db = DocumentTimeDb::new(self.dbis.doc_time);
                if from_parent != 0 && !time_db.contains(wtxn, from_parent)? {
                    url_db.del(wtxn, from_parent, |txn, folder| Ok(!time_db.contains(txn, folder)?))?;
                }
                Ok(())
            }
        }
    }

    fn add_terms(&mut self, id: DocId, terms: &TermMap) {
        for (term, positions) in terms {
            self.pending
                .entry(term.clone())
                .or_default()
                .push(Operation::AddId(PositionInfo::new(id, positions.clone())));
        }
    }

    fn remove_terms(&mut self, id: DocId, terms: &[Vec<u8>]) {
        for term in terms {
            self.pending.entry(term.clone()).or_default().push(Operation::RemoveId(id));
        }
    }

    /// Merges the pending operations into the posting and position lists.
    pub fn commit(&mut self, wtxn: &mut RwTxn) -> Result<()> {
        let posting_db = PostingDb::new(self.dbis.posting);
        let position_db = PositionDb::new(self.dbis.position);

        let pending = std::mem::take(&mut self.pending);
        debug!(terms = pending.len(), "applying posting changes");

        for (term, operations) in pending {
            let mut list = posting_db.get(wtxn, &term)?;
            let mut positions = position_db.get(wtxn, &term)?;

            for op in operations {
                match op {
                    Operation::AddId(info) => {
                        sorted_id_insert(&mut list, info.doc_id);
                        let idx = positions.partition_point(|p| p.doc_id < info.doc_id);
                        let present = positions.get(idx).is_some_and(|p| p.doc_id == info.doc_id);
                        if info.positions.is_empty() {
                            continue;
                        }
                        if present {
                            // Same term positioned by another field
                            let merged = &mut positions[idx].positions;
                            merged.extend_from_slice(&info.positions);
                            merged.sort_unstable();
                            merged.dedup();
                        } else {
                            positions.insert(idx, info);
                        }
                    }
                    Operation::RemoveId(id) => {
                        sorted_id_remove(&mut list, id);
                        positions.retain(|p| p.doc_id != id);
                    }
                }
            }

            posting_db.put(wtxn, &term, &list)?;
            position_db.put(wtxn, &term, &positions)?;
        }

        Ok(())
    }
}

fn unresolved(url: &[u8]) -> Error {
    Error::new(
        ErrorKind::NotFound,
        format!("cannot resolve parent of {}", String::from_utf8_lossy(url)),
    )
}

fn document_terms(doc: &Document, op: DocumentOperations) -> &TermMap {
    if op == DocumentOperations::FILE_NAME_TERMS {
        &doc.file_name_terms
    } else if op == DocumentOperations::XATTR_TERMS {
        &doc.xattr_terms
    } else {
        &doc.terms
    }
}
