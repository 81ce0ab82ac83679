//! # sealshare-database
//!
//! Persistence for share records: the [`ShareStore`] abstraction, an
//! in-memory backend for single-node use, and a PostgreSQL repository.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryShareStore;
pub use repositories::ShareRepository;
pub use store::{ShareStore, open_store};
