use std::path::PathBuf;

/// How the environment is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Create missing sub-databases; read and write transactions allowed.
    ReadWrite,
    /// Open existing sub-databases only; write transactions are refused.
    ReadOnly,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub storage_path: PathBuf,
    pub open_mode: OpenMode,

    pub map_size: usize,    // reserved address space for the memory map
    pub max_dbs: u32,       // named sub-databases the environment may hold
    pub max_readers: u32,   // concurrent read transactions
}

impl Config {
    pub fn new(storage_path: impl Into<PathBuf>) -> Self {
        Config {
            storage_path: storage_path.into(),
            ..Config::default()
        }
    }

    pub fn read_only(mut self) -> Self {
        self.open_mode = OpenMode::ReadOnly;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage_path: PathBuf::from("./data"),
            open_mode: OpenMode::ReadWrite,
            map_size: 1_048_576_000,   // ~1GB, multiple of the 4K page size
            max_dbs: 16,
            max_readers: 126,
        }
    }
}
