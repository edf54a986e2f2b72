pub mod config_loader;
pub mod grant_store;
pub mod paths;
pub mod state;

pub use crate::config_loader::ConfigLoader;
pub use crate::grant_store::GrantStore;
pub use crate::state::{MemoryStateStore, TomlStateStore};
