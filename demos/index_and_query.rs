//! Indexes a few real files and runs queries against them.
//!
//! Logs at debug level through tracing-subscriber. The index lives in a
//! temporary directory and is discarded afterwards.

use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::time::UNIX_EPOCH;
use inodex::core::id_utils::file_path_to_id;
use inodex::{Config, Database, Document, EngineQuery, TermGenerator};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    // 1. Create some files to index
    let workspace = tempfile::tempdir()?;
    let files = [
        ("fox.txt", "The quick brown foxed jumped over the crazy dog"),
        ("night.txt", "The night is dark and full of terror"),
        ("dead.txt", "Only the dead stay 17 forever. crazy"),
    ];
    for (name, text) in files {
        fs::write(workspace.path().join(name), text)?;
    }

    // 2. Open the index
    let index_dir = tempfile::tempdir()?;
    let db = Database::open(Config::new(index_dir.path()))?;

    // 3. Add one document per file, ids come from device + inode
    let mut tr = db.write_transaction()?;
    for (name, text) in files {
        let path = workspace.path().join(name);
        let url = path.as_os_str().as_bytes();

        let mut doc = Document::new(file_path_to_id(url));
        doc.set_url(url);
        doc.m_time = fs::metadata(&path)?.modified()?.duration_since(UNIX_EPOCH)?.as_secs();

        let mut tg = TermGenerator::new(&mut doc);
        tg.index_text(text);
        tg.index_file_name_text(name);
        tr.add_document(&doc)?;
    }
    tr.commit()?;

    // 4. Query
    let tr = db.read_transaction()?;
    let queries = [
        EngineQuery::term("crazy"),
        EngineQuery::starts_with("for"),
        EngineQuery::phrase_of(["the", "crazy"])?,
        EngineQuery::or(vec![EngineQuery::term("night"), EngineQuery::term("dead")])?,
    ];
    for query in &queries {
        println!("{:?}", query);
        for id in tr.exec(query, None)? {
            println!("  {}", String::from_utf8_lossy(&tr.document_url(id)?));
        }
    }

    // 5. Statistics
    let size = tr.db_size()?;
    println!("{}", size.to_json()?);

    Ok(())
}
