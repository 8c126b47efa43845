//! Memory store backends.
//!
//! Provides:
//! - `SqliteMemoryStore` - durable on-disk store shared with external readers (feature: sqlite)
//! - `InMemoryStore` - process-local store for tests and embedding (feature: memory)

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "memory")]
pub use memory::InMemoryStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteMemoryStore;
