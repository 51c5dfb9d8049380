use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::MetadataExt;
use std::path::Path;
use tracing::debug;
use crate::core::types::DocId;

/// Document ids pack the device id in the low 32 bits and the inode in the
/// high 32 bits.
pub fn dev_inode_to_id(device_id: u32, inode: u32) -> DocId {
    ((inode as u64) << 32) | device_id as u64
}

pub fn id_to_device_id(id: DocId) -> u32 {
    (id & 0xFFFF_FFFF) as u32
}

pub fn id_to_inode(id: DocId) -> u32 {
    (id >> 32) as u32
}

/// Stat-based id for a path; 0 when the path cannot be stat'ed.
/// Symlinks are not followed.
pub fn file_path_to_id(path: &[u8]) -> DocId {
    let path = Path::new(std::ffi::OsStr::from_bytes(path));
    match fs::symlink_metadata(path) {
        Ok(meta) => dev_inode_to_id(meta.dev() as u32, meta.ino() as u32),
        Err(err) => {
            debug!(path = %path.display(), error = %err, "cannot derive document id");
            0
        }
    }
}

/// Maps an absolute path to the id of the filesystem object it names.
/// `DocumentUrlDb::put` uses it to derive ancestor ids.
pub trait PathIdResolver: Send + Sync {
    fn id_for_path(&self, path: &[u8]) -> DocId;
}

/// Resolves ids from the live filesystem (device + inode).
#[derive(Debug, Clone, Copy, Default)]
pub struct FilesystemIds;

impl PathIdResolver for FilesystemIds {
    fn id_for_path(&self, path: &[u8]) -> DocId {
        file_path_to_id(path)
    }
}

impl<F> PathIdResolver for F
where
    F: Fn(&[u8]) -> DocId + Send + Sync,
{
    fn id_for_path(&self, path: &[u8]) -> DocId {
        self(path)
    }
}
