pub mod base;
pub mod file_store;
pub mod memory_store;

// Re-export the primary storage items so code outside can do
// "use crate::store::{Storage, create_storage};"
pub use base::{create_storage, Storage, StorageError, PROFILE_KEY, THEME_KEY, TOKEN_KEY};
pub use file_store::FileStorage;
pub use memory_store::MemoryStorage;
