//! Document store implementations for the OCCI Registry module.

mod in_memory_store;

pub use in_memory_store::InMemoryDocumentStore;
