use std::path::{Path, PathBuf};
use std::fs;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::fs_utils;

/// Directory structure for the index files
#[derive(Debug, Clone)]
pub struct StorageLayout {
    pub base_dir: PathBuf,      // Root directory, must be writable
    pub index_dir: PathBuf,     // LMDB environment (data.mdb + lock.mdb)
}

impl StorageLayout {
    pub fn new(base_dir: PathBuf) -> Result<Self> {
        let index_dir = base_dir.join("index");
        Ok(StorageLayout { base_dir, index_dir })
    }

    /// Creates the directories and checks that the environment can be
    /// written before LMDB gets a chance to fail on it.
    pub fn prepare(&self) -> Result<()> {
        fs::create_dir_all(&self.index_dir)?;

        if !fs_utils::is_writable_dir(&self.base_dir) {
            return Err(Error::new(
                ErrorKind::Io,
                format!("{} does not have write permissions", self.base_dir.display()),
            ));
        }

        Ok(())
    }

    pub fn data_path(&self) -> PathBuf {
        self.index_dir.join("data.mdb")
    }

    pub fn exists(&self) -> bool {
        self.data_path().exists()
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}
