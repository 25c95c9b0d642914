pub mod backend;
pub mod client;
pub mod memory;
pub mod valkey;

pub use backend::CacheBackend;
pub use client::{CacheClient, CacheError};
pub use memory::MemoryCache;
pub use valkey::ValkeyClient;
