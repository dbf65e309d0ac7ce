//! `OcciRegistryApi` trait definition.
//!
//! This trait defines the public API for the `occi-registry` module. Every
//! mutating method takes the identity of the issuing principal; ownership of
//! documents is checked against it.

use async_trait::async_trait;

use crate::error::OcciRegistryError;
use crate::models::{
    CategoryListing, CreateRequest, DeleteRequest, FilterRequest, ResourceDescription,
    ResourceOutcome, UpdateRequest,
};

/// Public API trait for the `occi-registry` module.
///
/// ```ignore
/// let client: Arc<dyn OcciRegistryApi> = module.client()?;
/// client.register_categories("alice", request).await?;
/// ```
#[async_trait]
pub trait OcciRegistryApi: Send + Sync {
    /// Register kinds, mixins and actions in one all-or-nothing request.
    ///
    /// # Errors
    ///
    /// * `BadRequest` - If any description in the request is rejected
    /// * `Conflict` - If the store rejects the batch write on a collision
    /// * `Internal` - If the store cannot be queried or written
    async fn register_categories(
        &self,
        user_id: &str,
        request: CreateRequest,
    ) -> Result<(), OcciRegistryError>;

    /// List every registered category description, grouped by type.
    ///
    /// # Errors
    ///
    /// * `Internal` - If the store cannot be queried
    async fn get_all_categories(&self) -> Result<CategoryListing, OcciRegistryError>;

    /// List category descriptions matching at least one filter of their type.
    ///
    /// Types absent from the request come back empty.
    ///
    /// # Errors
    ///
    /// * `BadRequest` - If a filter sub-request fails
    /// * `Internal` - If the store cannot be queried
    async fn get_filtered_categories(
        &self,
        request: FilterRequest,
    ) -> Result<CategoryListing, OcciRegistryError>;

    /// Update category descriptions and kind providers owned by `user_id`.
    ///
    /// # Errors
    ///
    /// * `BadRequest` - If any update is rejected
    /// * `Internal` - If the store cannot be queried or written
    async fn update_categories(
        &self,
        user_id: &str,
        request: UpdateRequest,
    ) -> Result<(), OcciRegistryError>;

    /// Delete categories owned by `user_id`.
    ///
    /// Deleting a mixin strips it from every entity that references it.
    ///
    /// # Errors
    ///
    /// * `BadRequest` - If any deletion is rejected, including kinds still in use
    /// * `Internal` - If the store cannot be queried or written
    async fn delete_categories(
        &self,
        user_id: &str,
        request: DeleteRequest,
    ) -> Result<(), OcciRegistryError>;

    /// Register resources under the kind living at `kind_location`.
    ///
    /// Each description is admitted independently; the returned outcomes
    /// follow the input order.
    ///
    /// # Errors
    ///
    /// * `NotFound` - If no kind lives at `kind_location`
    /// * `Internal` - If the store cannot be queried
    async fn register_resources(
        &self,
        user_id: &str,
        kind_location: &str,
        descriptions: Vec<ResourceDescription>,
    ) -> Result<Vec<ResourceOutcome>, OcciRegistryError>;
}
