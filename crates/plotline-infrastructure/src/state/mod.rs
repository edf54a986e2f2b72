//! State store implementations.
//!
//! # Module Structure
//!
//! - `toml_store`: disk-backed store with atomic writes and file locking
//! - `memory_store`: in-memory store with matching TTL semantics

mod memory_store;
mod toml_store;

pub use memory_store::MemoryStateStore;
pub use toml_store::TomlStateStore;
