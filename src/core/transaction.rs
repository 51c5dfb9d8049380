use std::collections::BTreeSet;
use heed::{RoTxn, RwTxn};
use parking_lot::MutexGuard;
use roaring::RoaringTreemap;
use tracing::{debug, error, warn};
use crate::compression::position_codec::PositionInfo;
use crate::core::database::Database;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::stats::{ConsistencyIssue, ConsistencyReport, DatabaseSize};
use crate::core::types::{DocId, Document, DocumentOperations, TimeInfo};
use crate::core::write_transaction::WriteTransaction;
use crate::index::{
    Comparator, DocumentDataDb, DocumentDb, DocumentIdDb, DocumentTimeDb, DocumentUrlDb, MTimeDb, PositionDb,
    PostingDb,
};
use crate::query::ast::{CompositeOp, EngineQuery, LeafOp};
use crate::search::{
    collect_ids, AndPostingIterator, OrPostingIterator, PhraseAndIterator, PostingIterator, VectorPostingIterator,
};
use crate::storage::env::DatabaseDbis;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionType {
    ReadOnly,
    ReadWrite,
}

enum Txn<'db> {
    Read(RoTxn<'db>),
    // Field order matters: the LMDB txn must end before the writer lock is released
    Write {
        txn: RwTxn<'db>,
        writer: WriteTransaction<'db>,
        _guard: MutexGuard<'db, ()>,
    },
}

/// A unit of work over every sub-database of a `Database`.
///
/// ReadOnly transactions see a snapshot taken when they begin. A ReadWrite
/// transaction holds the database's single writer slot until it is
/// committed or aborted; dropping it while open aborts it with a warning.
pub struct Transaction<'db> {
    db: &'db Database,
    dbis: DatabaseDbis,
    txn: Option<Txn<'db>>,
}

impl<'db> Transaction<'db> {
    pub(crate) fn read_only(db: &'db Database) -> Result<Self> {
        let txn = db.env().read_txn().map_err(|err| {
            debug!(error = %err, "failed to begin read transaction");
            Error::from(err)
        })?;
        Ok(Transaction {
            db,
            dbis: *db.dbis(),
            txn: Some(Txn::Read(txn)),
        })
    }

    pub(crate) fn read_write(db: &'db Database, guard: MutexGuard<'db, ()>) -> Result<Self> {
        let txn = db.env().write_txn().map_err(|err| {
            debug!(error = %err, "failed to begin write transaction");
            Error::from(err)
        })?;
        Ok(Transaction {
            db,
            dbis: *db.dbis(),
            txn: Some(Txn::Write {
                txn,
                writer: WriteTransaction::new(*db.dbis(), db.resolver()),
                _guard: guard,
            }),
        })
    }

    pub fn transaction_type(&self) -> TransactionType {
        match self.txn {
            Some(Txn::Write { .. }) => TransactionType::ReadWrite,
            _ => TransactionType::ReadOnly,
        }
    }

    fn ro(&self) -> Result<&RoTxn<'db>> {
        match &self.txn {
            Some(Txn::Read(txn)) => Ok(txn),
            Some(Txn::Write { txn, .. }) => Ok(&**txn),
            None => Err(Error::invalid_state("Transaction is closed")),
        }
    }

    fn rw(&mut self) -> Result<(&mut RwTxn<'db>, &mut WriteTransaction<'db>)> {
        match &mut self.txn {
            Some(Txn::Write { txn, writer, .. }) => Ok((txn, writer)),
            Some(Txn::Read(_)) => Err(Error::invalid_state("Write operation on a read-only transaction")),
            None => Err(Error::invalid_state("Transaction is closed")),
        }
    }

    fn url_db(&self) -> DocumentUrlDb {
        DocumentUrlDb::new(self.dbis.id_tree, self.dbis.id_filename)
    }

    //
    // Lookups
    //

    /// Whether `id` was added as a document (path-only ancestors are not).
    pub fn has_document(&self, id: DocId) -> Result<bool> {
        DocumentTimeDb::new(self.dbis.doc_time).contains(self.ro()?, id)
    }

    pub fn in_phase_one(&self, id: DocId) -> Result<bool> {
        DocumentIdDb::new(self.dbis.content_indexing).contains(self.ro()?, id)
    }

    pub fn has_failed(&self, id: DocId) -> Result<bool> {
        DocumentIdDb::new(self.dbis.failed_ids).contains(self.ro()?, id)
    }

    pub fn failed_ids(&self, limit: usize) -> Result<Vec<DocId>> {
        DocumentIdDb::new(self.dbis.failed_ids).fetch_items(self.ro()?, limit)
    }

    pub fn fetch_phase_one_ids(&self, limit: usize) -> Result<Vec<DocId>> {
        DocumentIdDb::new(self.dbis.content_indexing).fetch_items(self.ro()?, limit)
    }

    pub fn phase_one_size(&self) -> Result<u64> {
        DocumentIdDb::new(self.dbis.content_indexing).size(self.ro()?)
    }

    /// Number of documents with indexed content terms.
    pub fn size(&self) -> Result<u64> {
        DocumentDb::new(self.dbis.doc_terms).size(self.ro()?)
    }

    pub fn document_url(&self, id: DocId) -> Result<Vec<u8>> {
        self.url_db().get(self.ro()?, id)
    }

    /// Id of the entry at `path`, 0 when any component is unknown.
    pub fn document_id(&self, path: &[u8]) -> Result<DocId> {
        self.url_db().id_for_url(self.ro()?, path)
    }

    pub fn children_document_id(&self, parent_id: DocId) -> Result<Vec<DocId>> {
        self.url_db().get_children(self.ro()?, parent_id)
    }

    pub fn document_time_info(&self, id: DocId) -> Result<Option<TimeInfo>> {
        DocumentTimeDb::new(self.dbis.doc_time).get(self.ro()?, id)
    }

    pub fn document_data(&self, id: DocId) -> Result<Vec<u8>> {
        DocumentDataDb::new(self.dbis.doc_data).get(self.ro()?, id)
    }

    pub fn document_terms(&self, id: DocId) -> Result<Vec<Vec<u8>>> {
        DocumentDb::new(self.dbis.doc_terms).get(self.ro()?, id)
    }

    pub fn document_file_name_terms(&self, id: DocId) -> Result<Vec<Vec<u8>>> {
        DocumentDb::new(self.dbis.doc_filename_terms).get(self.ro()?, id)
    }

    pub fn document_xattr_terms(&self, id: DocId) -> Result<Vec<Vec<u8>>> {
        DocumentDb::new(self.dbis.doc_xattr_terms).get(self.ro()?, id)
    }

    pub fn fetch_terms_starting_with(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>> {
        PostingDb::new(self.dbis.posting).fetch_terms_starting_with(self.ro()?, prefix)
    }

    //
    // Queries
    //

    /// Lowers `query` into an iterator tree. `None` means the query cannot
    /// match anything.
    pub fn posting_iterator(&self, query: &EngineQuery) -> Result<Option<Box<dyn PostingIterator>>> {
        let rtxn = self.ro()?;
        let posting_db = PostingDb::new(self.dbis.posting);

        match query {
            EngineQuery::Leaf { term, op: LeafOp::Equal } => Ok(posting_db
                .iter(rtxn, term)?
                .map(|it| Box::new(it) as Box<dyn PostingIterator>)),
            EngineQuery::Leaf { term, op: LeafOp::StartsWith } => posting_db.prefix_iter(rtxn, term),
            EngineQuery::Composite { subqueries, .. } if subqueries.is_empty() => Ok(None),
            EngineQuery::Composite { op: CompositeOp::Phrase, subqueries } => self.phrase_iterator(subqueries),
            EngineQuery::Composite { op, subqueries } => {
                let mut iterators = Vec::with_capacity(subqueries.len());
                for subquery in subqueries {
                    match self.posting_iterator(subquery)? {
                        Some(it) => iterators.push(it),
                        // One missing term empties the whole conjunction
                        None if *op == CompositeOp::And => return Ok(None),
                        None => {}
                    }
                }

                if iterators.len() <= 1 {
                    return Ok(iterators.pop());
                }
                Ok(Some(match op {
                    CompositeOp::And => Box::new(AndPostingIterator::new(iterators)),
                    _ => Box::new(OrPostingIterator::new(iterators)),
                }))
            }
        }
    }

    fn phrase_iterator(&self, subqueries: &[EngineQuery]) -> Result<Option<Box<dyn PostingIterator>>> {
        let terms = subqueries
            .iter()
            .map(|subquery| match subquery {
                EngineQuery::Leaf { term, op: LeafOp::Equal } => Ok(term),
                _ => Err(Error::new(
                    ErrorKind::UnsupportedQuery,
                    "Phrase queries must contain exact term leaves".to_string(),
                )),
            })
            .collect::<Result<Vec<_>>>()?;

        if let [single] = subqueries {
            debug!(query = ?single, "phrase with a single term");
            return self.posting_iterator(single);
        }

        let rtxn = self.ro()?;
        let position_db = PositionDb::new(self.dbis.position);

        let mut iterators: Vec<Box<dyn PostingIterator>> = Vec::with_capacity(terms.len());
        for term in terms {
            match position_db.iter(rtxn, term)? {
                Some(it) => iterators.push(Box::new(it)),
                None => return Ok(None),
            }
        }

        Ok(Some(Box::new(PhraseAndIterator::new(iterators))))
    }

    /// Documents carrying a `prefix<number>` term whose number compares to
    /// `value` as asked.
    pub fn posting_comp_iterator(
        &self,
        prefix: &[u8],
        value: i64,
        comparator: Comparator,
    ) -> Result<Option<Box<dyn PostingIterator>>> {
        PostingDb::new(self.dbis.posting).comp_iter(self.ro()?, prefix, value, comparator)
    }

    pub fn mtime_iter(&self, mtime: u64, comparator: Comparator) -> Result<Option<VectorPostingIterator>> {
        MTimeDb::new(self.dbis.mtime).iter(self.ro()?, mtime, comparator)
    }

    pub fn mtime_range_iter(&self, begin: u64, end: u64) -> Result<Option<VectorPostingIterator>> {
        let ids = MTimeDb::new(self.dbis.mtime).iter_range(self.ro()?, begin, end)?;
        Ok((!ids.is_empty()).then(|| VectorPostingIterator::new(ids)))
    }

    /// `id` and all of its descendants in the path tree.
    pub fn doc_url_iter(&self, id: DocId) -> Result<Option<VectorPostingIterator>> {
        let ids = self.url_db().iter(self.ro()?, id)?;
        Ok((!ids.is_empty()).then(|| VectorPostingIterator::new(ids)))
    }

    /// Runs `query`, returning at most `limit` ids in ascending order.
    pub fn exec(&self, query: &EngineQuery, limit: Option<usize>) -> Result<Vec<DocId>> {
        match self.posting_iterator(query)? {
            Some(mut it) => Ok(collect_ids(it.as_mut(), limit)),
            None => Ok(Vec::new()),
        }
    }

    //
    // Write operations
    //

    pub fn add_document(&mut self, doc: &Document) -> Result<()> {
        let (txn, writer) = self.rw()?;
        writer.add_document(txn, doc)
    }

    pub fn remove_document(&mut self, id: DocId) -> Result<()> {
        let (txn, writer) = self.rw()?;
        writer.remove_document(txn, id)
    }

    pub fn remove_recursively(&mut self, id: DocId) -> Result<()> {
        let (txn, writer) = self.rw()?;
        writer.remove_recursively(txn, id)
    }

    pub fn replace_document(&mut self, doc: &Document, operations: DocumentOperations) -> Result<()> {
        if !self.has_document(doc.id)? {
            debug!(id = doc.id, "replacing a document that does not exist");
        }
        let (txn, writer) = self.rw()?;
        writer.replace_document(txn, doc, operations)
    }

    /// Applies a rename or move: new file name terms and new url.
    pub fn rename_file_path(&mut self, doc: &Document) -> Result<()> {
        self.replace_document(doc, DocumentOperations::FILE_NAME_TERMS | DocumentOperations::DOCUMENT_URL)
    }

    pub fn set_phase_one(&mut self, id: DocId) -> Result<()> {
        let db = DocumentIdDb::new(self.dbis.content_indexing);
        let (txn, _) = self.rw()?;
        db.put(txn, id)
    }

    pub fn remove_phase_one(&mut self, id: DocId) -> Result<()> {
        let db = DocumentIdDb::new(self.dbis.content_indexing);
        let (txn, _) = self.rw()?;
        db.del(txn, id)
    }

    pub fn add_failed(&mut self, id: DocId) -> Result<()> {
        let db = DocumentIdDb::new(self.dbis.failed_ids);
        let (txn, _) = self.rw()?;
        db.put(txn, id)
    }

    pub fn remove_failed(&mut self, id: DocId) -> Result<()> {
        let db = DocumentIdDb::new(self.dbis.failed_ids);
        let (txn, _) = self.rw()?;
        db.del(txn, id)
    }

    /// Whether posting changes are waiting for commit. Always false for
    /// read-only transactions.
    pub fn has_changes(&self) -> bool {
        match &self.txn {
            Some(Txn::Write { writer, .. }) => writer.has_changes(),
            _ => false,
        }
    }

    /// Flushes pending changes and commits. A read-only transaction just
    /// releases its snapshot.
    pub fn commit(mut self) -> Result<()> {
        match self.txn.take() {
            Some(Txn::Write { mut txn, mut writer, _guard }) => {
                writer.commit(&mut txn)?;
                txn.commit().map_err(|err| {
                    error!(error = %err, "commit failed");
                    Error::from(err)
                })
            }
            Some(Txn::Read(txn)) => {
                txn.commit()?;
                Ok(())
            }
            None => Err(Error::invalid_state("Transaction is closed")),
        }
    }

    /// Discards every change made in this transaction.
    pub fn abort(mut self) {
        if let Some(Txn::Write { txn, .. }) = self.txn.take() {
            txn.abort();
        }
    }

    //
    // Introspection
    //

    pub fn db_size(&self) -> Result<DatabaseSize> {
        let rtxn = self.ro()?;
        let url_db = self.url_db();

        let mut size = DatabaseSize {
            posting_db: PostingDb::new(self.dbis.posting).db_size(rtxn)?,
            position_db: PositionDb::new(self.dbis.position).db_size(rtxn)?,
            doc_terms: DocumentDb::new(self.dbis.doc_terms).db_size(rtxn)?,
            doc_filename_terms: DocumentDb::new(self.dbis.doc_filename_terms).db_size(rtxn)?,
            doc_xattr_terms: DocumentDb::new(self.dbis.doc_xattr_terms).db_size(rtxn)?,
            id_tree: url_db.tree_size(rtxn)?,
            id_filename: url_db.filename_size(rtxn)?,
            doc_time: DocumentTimeDb::new(self.dbis.doc_time).db_size(rtxn)?,
            doc_data: DocumentDataDb::new(self.dbis.doc_data).db_size(rtxn)?,
            mtime_db: MTimeDb::new(self.dbis.mtime).db_size(rtxn)?,
            content_indexing_db: DocumentIdDb::new(self.dbis.content_indexing).db_size(rtxn)?,
            failed_ids_db: DocumentIdDb::new(self.dbis.failed_ids).db_size(rtxn)?,
            expected_size: 0,
            actual_size: self.db.env().real_disk_size()?,
        };
        size.sum_expected();
        Ok(size)
    }

    /// Every term stored for a document must list the document in its
    /// posting list.
    pub fn check_terms_in_postings(&self) -> Result<ConsistencyReport> {
        let rtxn = self.ro()?;
        let posting_db = PostingDb::new(self.dbis.posting);
        let mut report = ConsistencyReport::default();

        for dbi in [self.dbis.doc_terms, self.dbis.doc_filename_terms, self.dbis.doc_xattr_terms] {
            for (id, terms) in DocumentDb::new(dbi).to_map(rtxn)? {
                report.checked += 1;
                for term in terms {
                    if posting_db.get(rtxn, &term)?.binary_search(&id).is_err() {
                        report.issues.push(ConsistencyIssue::MissingPosting { doc_id: id, term });
                    }
                }
            }
        }
        Ok(report)
    }

    /// Every id in a posting list must list the term in one of its term
    /// sets.
    pub fn check_postings_in_terms(&self) -> Result<ConsistencyReport> {
        let rtxn = self.ro()?;
        let term_dbs = [
            DocumentDb::new(self.dbis.doc_terms),
            DocumentDb::new(self.dbis.doc_filename_terms),
            DocumentDb::new(self.dbis.doc_xattr_terms),
        ];
        let mut report = ConsistencyReport::default();

        let postings = PostingDb::new(self.dbis.posting).to_map(rtxn)?;
        let mut all_ids = RoaringTreemap::new();
        for ids in postings.values() {
            all_ids.extend(ids.iter().copied());
        }

        for id in all_ids.iter() {
            report.checked += 1;
            let mut terms = BTreeSet::new();
            for db in &term_dbs {
                terms.extend(db.get(rtxn, id)?);
            }
            for (term, ids) in &postings {
                if ids.binary_search(&id).is_ok() && !terms.contains(term) {
                    report.issues.push(ConsistencyIssue::MissingTerm { doc_id: id, term: term.clone() });
                }
            }
        }
        Ok(report)
    }

    /// Every id found in a posting list must resolve to a path.
    pub fn check_fs_tree(&self) -> Result<ConsistencyReport> {
        let rtxn = self.ro()?;
        let url_db = self.url_db();
        let mut report = ConsistencyReport::default();

        let mut all_ids = RoaringTreemap::new();
        for ids in PostingDb::new(self.dbis.posting).to_map(rtxn)?.into_values() {
            all_ids.extend(ids);
        }

        for id in all_ids.iter() {
            report.checked += 1;
            if url_db.get(rtxn, id)?.is_empty() {
                report.issues.push(ConsistencyIssue::MissingUrl { doc_id: id });
            }
        }
        Ok(report)
    }

    /// Position entries for `term`, mainly for diagnostics.
    pub fn term_positions(&self, term: &[u8]) -> Result<Vec<PositionInfo>> {
        PositionDb::new(self.dbis.position).get(self.ro()?, term)
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if let Some(Txn::Write { txn, .. }) = self.txn.take() {
            warn!("closing an active write transaction without commit or abort");
            txn.abort();
        }
    }
}
