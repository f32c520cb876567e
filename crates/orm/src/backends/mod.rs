//! Store Backends
//!
//! The engine is written against the traits in `core`; `postgres` is the
//! production backend and `memory` keeps everything in process memory.

pub mod core;
pub mod memory;
pub mod postgres;

pub use self::core::{MigrationStore, StoreTransaction};
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
