//! Local durable store for Fushigi

mod connection;
mod memory;
mod migrations;
mod store;

pub use connection::Database;
pub use memory::MemoryStore;
pub use store::{LocalStore, SqlRecord, SqliteStore, SubsetStore};
