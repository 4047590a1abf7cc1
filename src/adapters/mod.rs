//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with the outside world:
//! - `fs`: artifact directory on the local filesystem
//! - `memory`: in-memory artifact store
//! - `dataset`: CSV dataset loading

pub mod dataset;
pub mod fs;
pub mod memory;

// Re-export storage error for lib.rs
pub use fs::{FsArtifactStore, StorageError};
pub use memory::MemoryArtifactStore;
