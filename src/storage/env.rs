use heed::byteorder::BigEndian;
use heed::types::{Bytes, U64, Unit};
use heed::{Database as HeedDatabase, Env, EnvOpenOptions, RoTxn};
use tracing::{debug, error};
use crate::core::config::Config;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::fs_utils;
use crate::storage::layout::StorageLayout;

/// Big-endian ids so cursor order is numeric order.
pub type IdKey = U64<BigEndian>;

pub type TermDbi = HeedDatabase<Bytes, Bytes>;
pub type IdDbi = HeedDatabase<IdKey, Bytes>;
pub type IdSetDbi = HeedDatabase<IdKey, Unit>;
pub type KeySetDbi = HeedDatabase<Bytes, Unit>;

pub const POSTING_DB: &str = "postingdb";
pub const POSITION_DB: &str = "positiondb";
pub const DOC_TERMS_DB: &str = "documenttermsdb";
pub const DOC_FILENAME_TERMS_DB: &str = "documentfilenametermsdb";
pub const DOC_XATTR_TERMS_DB: &str = "documentxattrtermsdb";
pub const ID_TREE_DB: &str = "idtreedb";
pub const ID_FILENAME_DB: &str = "idfilenamedb";
pub const DOC_TIME_DB: &str = "documenttimedb";
pub const DOC_DATA_DB: &str = "documentdatadb";
pub const CONTENT_INDEXING_DB: &str = "contentindexingdb";
pub const FAILED_ID_DB: &str = "faileddb";
pub const MTIME_DB: &str = "mtimedb";

/// Handles of every named sub-database. Handles are plain values; each
/// transaction copies the set and binds it to its own txn.
#[derive(Debug, Clone, Copy)]
pub struct DatabaseDbis {
    pub posting: TermDbi,
    pub position: TermDbi,

    pub doc_terms: IdDbi,
    pub doc_filename_terms: IdDbi,
    pub doc_xattr_terms: IdDbi,

    pub id_tree: IdDbi,
    pub id_filename: IdDbi,

    pub doc_time: IdDbi,
    pub doc_data: IdDbi,
    pub content_indexing: IdSetDbi,
    pub failed_ids: IdSetDbi,

    pub mtime: KeySetDbi,
}

impl DatabaseDbis {
    pub fn create(env: &Env) -> Result<Self> {
        let mut wtxn = env.write_txn()?;
        let dbis = DatabaseDbis {
            posting: env.create_database(&mut wtxn, Some(POSTING_DB))?,
            position: env.create_database(&mut wtxn, Some(POSITION_DB))?,
            doc_terms: env.create_database(&mut wtxn, Some(DOC_TERMS_DB))?,
            doc_filename_terms: env.create_database(&mut wtxn, Some(DOC_FILENAME_TERMS_DB))?,
            doc_xattr_terms: env.create_database(&mut wtxn, Some(DOC_XATTR_TERMS_DB))?,
            id_tree: env.create_database(&mut wtxn, Some(ID_TREE_DB))?,
            id_filename: env.create_database(&mut wtxn, Some(ID_FILENAME_DB))?,
            doc_time: env.create_database(&mut wtxn, Some(DOC_TIME_DB))?,
            doc_data: env.create_database(&mut wtxn, Some(DOC_DATA_DB))?,
            content_indexing: env.create_database(&mut wtxn, Some(CONTENT_INDEXING_DB))?,
            failed_ids: env.create_database(&mut wtxn, Some(FAILED_ID_DB))?,
            mtime: env.create_database(&mut wtxn, Some(MTIME_DB))?,
        };
        wtxn.commit()?;
        Ok(dbis)
    }

    /// Opens existing sub-databases without creating anything.
    pub fn open(env: &Env) -> Result<Self> {
        let rtxn = env.read_txn()?;
        let dbis = DatabaseDbis {
            posting: open_existing(env, &rtxn, POSTING_DB)?,
            position: open_existing(env, &rtxn, POSITION_DB)?,
            doc_terms: open_existing(env, &rtxn, DOC_TERMS_DB)?,
            doc_filename_terms: open_existing(env, &rtxn, DOC_FILENAME_TERMS_DB)?,
            doc_xattr_terms: open_existing(env, &rtxn, DOC_XATTR_TERMS_DB)?,
            id_tree: open_existing(env, &rtxn, ID_TREE_DB)?,
            id_filename: open_existing(env, &rtxn, ID_FILENAME_DB)?,
            doc_time: open_existing(env, &rtxn, DOC_TIME_DB)?,
            doc_data: open_existing(env, &rtxn, DOC_DATA_DB)?,
            content_indexing: open_existing(env, &rtxn, CONTENT_INDEXING_DB)?,
            failed_ids: open_existing(env, &rtxn, FAILED_ID_DB)?,
            mtime: open_existing(env, &rtxn, MTIME_DB)?,
        };
        // Handles opened in a read txn only outlive it once it commits
        rtxn.commit()?;
        Ok(dbis)
    }
}

fn open_existing<KC: 'static, DC: 'static>(
    env: &Env,
    rtxn: &RoTxn,
    name: &str,
) -> Result<HeedDatabase<KC, DC>> {
    env.open_database(rtxn, Some(name))?
        .ok_or_else(|| Error::new(ErrorKind::NotFound, format!("sub-database '{}' does not exist", name)))
}

/// Opens (and if needed creates) the LMDB environment under `layout`.
pub fn open_env(config: &Config, layout: &StorageLayout) -> Result<Env> {
    let fresh = !layout.exists();

    // SAFETY: the environment is opened once per Database and the data
    // file is only ever modified through LMDB.
    let env = unsafe {
        EnvOpenOptions::new()
            .map_size(config.map_size)
            .max_dbs(config.max_dbs)
            .max_readers(config.max_readers)
            .open(&layout.index_dir)
    };

    let env = env.map_err(|err| {
        error!(path = %layout.index_dir.display(), error = %err, "failed to open environment");
        Error::from(err)
    })?;

    if fresh {
        debug!(path = %layout.data_path().display(), "created new index");
        fs_utils::disable_cow(&layout.data_path());
    }

    Ok(env)
}


#[cfg(test)]
mod tests {
    use super::testing::temp_env;
    use super::*;

    #[test]
    fn created_databases_can_be_reopened() {
        let (_dir, env, dbis) = temp_env();

        let mut wtxn = env.write_txn().unwrap();
        dbis.posting.put(&mut wtxn, &b"term"[..], &b"\x01"[..]).unwrap();
        wtxn.commit().unwrap();

        let reopened = DatabaseDbis::open(&env).unwrap();
        let rtxn = env.read_txn().unwrap();
        assert_eq!(reopened.posting.get(&rtxn, &b"term"[..]).unwrap(), Some(&b"\x01"[..]));
    }
}
