pub mod layout;
pub mod env;

pub use env::DatabaseDbis;
pub use layout::StorageLayout;
