//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the pipeline and external systems (artifact persistence).

mod artifact_store;

pub use artifact_store::{names, ArtifactStore};
