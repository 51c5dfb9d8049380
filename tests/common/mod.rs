#![allow(dead_code)]

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use inodex::{Config, Database, DocId, Document, TermGenerator};
use tempfile::TempDir;

/// Deterministic ids for directories that only exist in the index. The
/// top bit keeps them clear of the small ids used for documents. Paths
/// under `/gone` behave like deleted directories and resolve to 0.
pub fn path_id(path: &[u8]) -> DocId {
    if path.starts_with(b"/gone") {
        return 0;
    }
    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    hasher.finish() | (1 << 63)
}

pub fn open_temp() -> (TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open_with_resolver(Config::new(dir.path()), Box::new(path_id)).unwrap();
    (dir, db)
}

pub fn document(id: DocId, url: &str, text: &str) -> Document {
    let mut doc = Document::new(id);
    doc.set_url(url);
    doc.m_time = id * 10;
    doc.c_time = id * 10;

    let file_name = url.rsplit('/').next().unwrap_or_default().to_string();
    let mut tg = TermGenerator::new(&mut doc);
    tg.index_text(text);
    tg.index_file_name_text(&file_name);
    doc
}

pub const CORPUS: [(DocId, &str, &str); 4] = [
    (100, "/home/docs/fox.txt", "The quick brown foxed jumped over the crazy dog"),
    (110, "/home/docs/night.txt", "The night is dark and full of terror"),
    (120, "/home/docs/sorry.txt", "Don't feel sorry for yourself. Only assholes do that"),
    (130, "/home/docs/dead.txt", "Only the dead stay 17 forever. crazy"),
];

pub fn add_corpus(db: &Database) {
    let mut tr = db.write_transaction().unwrap();
    for (id, url, text) in CORPUS {
        tr.add_document(&document(id, url, text)).unwrap();
    }
    tr.commit().unwrap();
}
