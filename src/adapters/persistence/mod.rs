//! QueueStore adapters. SQLite for durable deployments, in-memory for tests and embedding.

pub mod memory_store;
pub mod sqlite_store;

pub use memory_store::MemoryStore;
pub use sqlite_store::SqliteStore;
