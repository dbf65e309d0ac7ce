//! OCCI Registry SDK
//!
//! This crate provides the public API for the `occi-registry` module:
//! - `OcciRegistryApi` trait for inter-module communication
//! - Category models (`CategoryDescription`, `ActionDescription`, `CategoryDocument`)
//! - Entity models (`ResourceDescription`, `LinkDescription`, `EntityDocument`)
//! - Composite request shapes and the `StatusCode` vocabulary
//! - `OcciRegistryError` for error handling
//!
//! ## Usage
//!
//! ```ignore
//! use occi_registry_sdk::{CategoryDescription, CreateRequest, OcciRegistryApi};
//!
//! let request = CreateRequest {
//!     kinds: Some(vec![CategoryDescription::new("compute", "http://x/#")]),
//!     ..CreateRequest::default()
//! };
//! client.register_categories("alice", request).await?;
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

pub mod api;
pub mod error;
pub mod models;

// Re-export main types at crate root for convenience
pub use api::OcciRegistryApi;
pub use error::OcciRegistryError;
pub use models::{
    ActionDescription, CategoryBody, CategoryDescription, CategoryDocument, CategoryFields,
    CategoryFilter, CategoryListing, CategoryType, CreateRequest, DeleteRequest, Description,
    EntityBody, EntityDocument, EntityType, FilterRequest, LinkDescription, LinkReference,
    Provider, ProviderUpdate, ProviderUpdateEntry, RegistryResponse, ResourceDescription,
    ResourceOutcome, ResponseBody, StatusCode, UpdateRequest,
};
