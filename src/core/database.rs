use std::path::Path;
use heed::Env;
use parking_lot::Mutex;
use tracing::{debug, info};
use crate::core::config::{Config, OpenMode};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::id_utils::{FilesystemIds, PathIdResolver};
use crate::core::transaction::{Transaction, TransactionType};
use crate::storage::env::{open_env, DatabaseDbis};
use crate::storage::layout::StorageLayout;

/// An open index: one LMDB environment plus the handles of its
/// sub-databases.
///
/// Readers never block each other or the writer. At most one ReadWrite
/// transaction exists at a time; `write_transaction` waits for the slot,
/// `try_write_transaction` does not. LMDB keeps reader slots per thread,
/// so a thread should hold at most one read transaction at a time.
pub struct Database {
    config: Config,
    layout: StorageLayout,
    env: Env,
    dbis: DatabaseDbis,

    write_lock: Mutex<()>,
    resolver: Box<dyn PathIdResolver>,
}

impl Database {
    /// Opens the index at `config.storage_path`, deriving ancestor ids
    /// from the live filesystem.
    pub fn open(config: Config) -> Result<Self> {
        Self::open_with_resolver(config, Box::new(FilesystemIds))
    }

    pub fn open_with_resolver(config: Config, resolver: Box<dyn PathIdResolver>) -> Result<Self> {
        let layout = StorageLayout::new(config.storage_path.clone())?;

        let (env, dbis) = match config.open_mode {
            OpenMode::ReadWrite => {
                layout.prepare()?;
                let env = open_env(&config, &layout)?;
                let dbis = DatabaseDbis::create(&env)?;
                (env, dbis)
            }
            OpenMode::ReadOnly => {
                if !layout.exists() {
                    return Err(Error::new(
                        ErrorKind::NotFound,
                        format!("No index at {}", layout.base_dir().display()),
                    ));
                }
                let env = open_env(&config, &layout)?;
                let dbis = DatabaseDbis::open(&env)?;
                (env, dbis)
            }
        };

        info!(path = %layout.base_dir().display(), mode = ?config.open_mode, "database opened");

        Ok(Database {
            config,
            layout,
            env,
            dbis,
            write_lock: Mutex::new(()),
            resolver,
        })
    }

    pub fn transaction(&self, kind: TransactionType) -> Result<Transaction<'_>> {
        match kind {
            TransactionType::ReadOnly => self.read_transaction(),
            TransactionType::ReadWrite => self.write_transaction(),
        }
    }

    pub fn read_transaction(&self) -> Result<Transaction<'_>> {
        Transaction::read_only(self)
    }

    /// Begins the write transaction, waiting for the current one to end.
    pub fn write_transaction(&self) -> Result<Transaction<'_>> {
        self.check_writable()?;
        let guard = self.write_lock.lock();
        Transaction::read_write(self, guard)
    }

    /// Like `write_transaction`, but returns `None` while another write
    /// transaction is open.
    pub fn try_write_transaction(&self) -> Result<Option<Transaction<'_>>> {
        self.check_writable()?;
        match self.write_lock.try_lock() {
            Some(guard) => Transaction::read_write(self, guard).map(Some),
            None => {
                debug!("write transaction already in progress");
                Ok(None)
            }
        }
    }

    fn check_writable(&self) -> Result<()> {
        if self.config.open_mode == OpenMode::ReadOnly {
            return Err(Error::new(
                ErrorKind::InvalidState,
                "Database was opened read-only".to_string(),
            ));
        }
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn path(&self) -> &Path {
        self.layout.base_dir()
    }

    pub(crate) fn env(&self) -> &Env {
        &self.env
    }

    pub(crate) fn dbis(&self) -> &DatabaseDbis {
        &self.dbis
    }

    pub(crate) fn resolver(&self) -> &dyn PathIdResolver {
        self.resolver.as_ref()
    }
}
