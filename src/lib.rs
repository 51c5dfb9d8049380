pub mod core;
pub mod storage;
pub mod analysis;
pub mod compression;
pub mod index;
pub mod search;
pub mod query;

pub use crate::core::config::{Config, OpenMode};
pub use crate::core::database::Database;
pub use crate::core::error::{Error, ErrorKind, Result};
pub use crate::core::transaction::{Transaction, TransactionType};
pub use crate::core::types::{DocId, Document, DocumentOperations, TimeInfo};
pub use crate::analysis::TermGenerator;
pub use crate::query::{CompositeOp, EngineQuery, LeafOp};

/*
┌──────────────────────────────────────────────────────────────────────────────┐
│                           INODEX STRUCT ARCHITECTURE                          │
└──────────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────── CORE LAYER ──────────────────────────────────┐
│                                                                              │
│  ┌────────────────────────────────────────────────────────────────────┐     │
│  │ struct Database                                                    │     │
│  │ config: Config                 // path, open mode, LMDB limits     │     │
│  │ env: heed::Env                 // one environment, 12 sub-dbs      │     │
│  │ dbis: DatabaseDbis             // copied into every transaction    │     │
│  │ write_lock: Mutex<()>          // single writer                    │     │
│  │ resolver: Box<PathIdResolver>  // path -> id for missing ancestors │     │
│  └────────────────────────────────────────────────────────────────────┘     │
│                                                                              │
│  ┌────────────────────────────────┐   ┌──────────────────────────────────┐  │
│  │ struct Transaction<'db>        │   │ struct WriteTransaction          │  │
│  │ Read(RoTxn) | Write{RwTxn,..}  │──▶│ pending: term -> [Add|Remove]    │  │
│  │ lookups, exec, db_size, checks │   │ merged into postings on commit   │  │
│  └────────────────────────────────┘   └──────────────────────────────────┘  │
└──────────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────── INDEX LAYER ─────────────────────────────────┐
│  PostingDb     term -> [DocId]              PositionDb  term -> [PositionInfo]│
│  DocumentDb    id -> {term} (x3 fields)     DocumentUrlDb id -> (parent,name) │
│  DocumentTimeDb id -> TimeInfo              MTimeDb     (mtime,id) keys       │
│  DocumentDataDb id -> bytes                 DocumentIdDb id set (x2 queues)   │
└──────────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────── SEARCH LAYER ────────────────────────────────┐
│  EngineQuery ──▶ Transaction::posting_iterator ──▶ Box<dyn PostingIterator>  │
│     Leaf(Equal)      VectorPostingIterator                                   │
│     Leaf(StartsWith) OrPostingIterator over matching terms                   │
│     And / Or         AndPostingIterator / OrPostingIterator                  │
│     Phrase           PhraseAndIterator over VectorPositionInfoIterator       │
└──────────────────────────────────────────────────────────────────────────────┘
*/
