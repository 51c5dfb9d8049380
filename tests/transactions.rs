mod common;

use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use common::{add_corpus, document, open_temp, path_id};
use inodex::{Config, Database, EngineQuery, ErrorKind, TransactionType};

#[test]
fn readers_keep_their_snapshot() {
    let (_dir, db) = open_temp();
    add_corpus(&db);

    let before = db.read_transaction().unwrap();

    let mut tr = db.write_transaction().unwrap();
    tr.remove_document(100).unwrap();
    tr.commit().unwrap();

    assert_eq!(before.exec(&EngineQuery::term("the"), None).unwrap(), vec![100, 110, 130]);

    // A thread holds at most one read transaction
    thread::scope(|s| {
        s.spawn(|| {
            let after = db.read_transaction().unwrap();
            assert_eq!(after.exec(&EngineQuery::term("the"), None).unwrap(), vec![110, 130]);
        });
    });
}

#[test]
fn uncommitted_changes_are_private() {
    let (_dir, db) = open_temp();
    add_corpus(&db);

    let mut tr = db.write_transaction().unwrap();
    tr.add_document(&document(140, "/home/docs/new.txt", "the newest")).unwrap();

    let reader = db.read_transaction().unwrap();
    assert!(!reader.has_document(140).unwrap());
    assert_eq!(reader.exec(&EngineQuery::term("newest"), None).unwrap(), Vec::<u64>::new());
    drop(reader);

    // Postings are merged on commit; lookups on other stores are immediate
    assert!(tr.has_document(140).unwrap());
    assert!(tr.exec(&EngineQuery::term("newest"), None).unwrap().is_empty());
    tr.commit().unwrap();

    let reader = db.read_transaction().unwrap();
    assert_eq!(reader.exec(&EngineQuery::term("newest"), None).unwrap(), vec![140]);
}

#[test]
fn abort_discards_changes() {
    let (_dir, db) = open_temp();
    add_corpus(&db);

    let mut tr = db.write_transaction().unwrap();
    tr.remove_document(110).unwrap();
    tr.abort();

    let tr = db.read_transaction().unwrap();
    assert!(tr.has_document(110).unwrap());
    assert_eq!(tr.exec(&EngineQuery::term("night"), None).unwrap(), vec![110]);
}

#[test]
fn dropping_a_write_transaction_aborts_it() {
    let (_dir, db) = open_temp();

    {
        let mut tr = db.write_transaction().unwrap();
        tr.add_document(&document(1, "/a/file", "dropped")).unwrap();
    }

    let tr = db.read_transaction().unwrap();
    assert!(!tr.has_document(1).unwrap());
    drop(tr);

    // The writer slot is free again
    assert!(db.try_write_transaction().unwrap().is_some());
}

#[test]
fn only_one_writer_at_a_time() {
    let (_dir, db) = open_temp();

    let first = db.write_transaction().unwrap();
    assert!(db.try_write_transaction().unwrap().is_none());
    first.commit().unwrap();

    let second = db.try_write_transaction().unwrap();
    assert!(second.is_some());
}

#[test]
fn blocked_writer_resumes_after_commit() {
    let (_dir, db) = open_temp();
    let (tx, rx) = mpsc::channel();

    thread::scope(|s| {
        let mut first = db.write_transaction().unwrap();
        first.add_document(&document(1, "/a/one", "first")).unwrap();

        s.spawn(|| {
            let mut second = db.write_transaction().unwrap();
            tx.send(()).unwrap();
            second.add_document(&document(2, "/a/two", "second")).unwrap();
            second.commit().unwrap();
        });

        thread::sleep(Duration::from_millis(50));
        assert!(rx.try_recv().is_err());
        first.commit().unwrap();
    });

    rx.recv().unwrap();
    let tr = db.read_transaction().unwrap();
    assert!(tr.has_document(1).unwrap());
    assert!(tr.has_document(2).unwrap());
    assert_eq!(tr.children_document_id(path_id(b"/a")).unwrap(), vec![1, 2]);
}

#[test]
fn writes_on_read_transaction_fail() {
    let (_dir, db) = open_temp();

    let mut tr = db.transaction(TransactionType::ReadOnly).unwrap();
    assert_eq!(tr.transaction_type(), TransactionType::ReadOnly);
    let err = tr.add_document(&document(1, "/a/b", "x")).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidState);
    assert!(!tr.has_changes());
    tr.commit().unwrap();
}

#[test]
fn data_survives_reopen_and_read_only_mode() {
    let dir = tempfile::tempdir().unwrap();

    {
        let db = Database::open_with_resolver(Config::new(dir.path()), Box::new(path_id)).unwrap();
        add_corpus(&db);
    }

    let db = Database::open_with_resolver(Config::new(dir.path()).read_only(), Box::new(path_id)).unwrap();
    let tr = db.read_transaction().unwrap();
    assert_eq!(tr.exec(&EngineQuery::term("crazy"), None).unwrap(), vec![100, 130]);
    drop(tr);

    let err = db.write_transaction().err().unwrap();
    assert_eq!(err.kind, ErrorKind::InvalidState);
    assert!(db.try_write_transaction().is_err());
}

#[test]
fn read_only_open_requires_existing_index() {
    let dir = tempfile::tempdir().unwrap();
    let err = Database::open(Config::new(dir.path().join("none")).read_only()).err().unwrap();
    assert_eq!(err.kind, ErrorKind::NotFound);
}
