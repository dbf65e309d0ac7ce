//! Infrastructure layer for the OCCI Registry module.
//!
//! Contains document store implementations.

pub mod storage;

pub use storage::InMemoryDocumentStore;
