//! Storage interfaces for the hosted backend and an in-memory implementation

pub mod memory;
pub mod traits;

// Re-export the storage surface
pub use memory::{MemoryStorage, PausedOp, StoreOp};
pub use traits::*;
