//! Currency registry implementations

pub mod caching;
pub mod memory;

pub use caching::CachingRegistry;
pub use memory::MemoryRegistry;
