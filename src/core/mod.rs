pub mod types;
pub mod config;
pub mod error;
pub mod id_utils;
pub mod fs_utils;
pub mod stats;
pub mod write_transaction;
pub mod transaction;
pub mod database;
