//! Local database: connection setup and the JSON key-value store

pub mod init;
pub mod kv;
pub mod models;

pub use init::*;
pub use kv::KvStore;
pub use models::*;
