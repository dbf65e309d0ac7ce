//! OCCI Registry Module Implementation
//!
//! This module validates and persists OCCI categories (kinds, mixins,
//! actions) and entities (resources, links) over a document store.
//! The public API is defined in `occi-registry-sdk` and re-exported here.
//!
//! ## Architecture
//!
//! - **Snapshot per request**: each operation reads the store once and
//!   validates against that immutable snapshot
//! - **All-or-nothing composites**: prepared documents are committed in one
//!   atomic batch, or not at all
//! - **Pluggable store**: `DocumentStore` is the only storage seam; the
//!   in-memory store is the default

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

// === PUBLIC API (from SDK) ===
pub use occi_registry_sdk::{
    ActionDescription, CategoryDescription, CategoryDocument, CategoryFilter, CategoryListing,
    CreateRequest, DeleteRequest, EntityDocument, FilterRequest, LinkDescription, LinkReference,
    OcciRegistryApi, OcciRegistryError, RegistryResponse, ResourceDescription, ResourceOutcome,
    ResponseBody, StatusCode, UpdateRequest,
};

// === MODULE DEFINITION ===
pub mod module;
pub use module::OcciRegistryModule;

// === CONFIGURATION ===
pub mod config;
pub use config::OcciRegistryConfig;

// === LOCAL CLIENT ===
pub mod local_client;

// === INTERNAL MODULES ===
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
