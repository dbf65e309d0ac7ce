//! Document store interface consumed by the registry.

use async_trait::async_trait;
use occi_registry_sdk::{CategoryDocument, EntityDocument};
use thiserror::Error;
use uuid::Uuid;

/// Named views the registry queries.
///
/// Each view emits `(key, value)` rows; the row contract is listed per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    /// key: `occiId`, value: category location or `null` for actions.
    ForRegisterCategories,
    /// key: category type name, value: category description.
    ForGetCategories,
    /// key: `occiId`, value: the full category document.
    ForUpdateCategories,
    /// key: `occiId`, value: `{ "id", "creator", "type" }`.
    ForDeleteCategories,
    /// key: `occiId`, value: `{ "type", "location" }`.
    CategoryIndex,
    /// key: kind `occiId` of an entity, value: entity id.
    EntitiesOfKind,
    /// key: mixin `occiId` attached to an entity, value: the full entity document.
    EntitiesOfMixin,
    /// key: resource location, value: creator.
    ResourceByLocation,
    /// key: link location, value: creator.
    LinkByLocation,
}

impl View {
    /// Design-document name of the view.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ForRegisterCategories => "for_register_categories",
            Self::ForGetCategories => "for_get_categories",
            Self::ForUpdateCategories => "for_update_categories",
            Self::ForDeleteCategories => "for_delete_categories",
            Self::CategoryIndex => "category_index",
            Self::EntitiesOfKind => "entities_of_kind",
            Self::EntitiesOfMixin => "entities_of_mixin",
            Self::ResourceByLocation => "resource_by_location",
            Self::LinkByLocation => "link_by_location",
        }
    }
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row emitted by a view.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewRow {
    pub key: String,
    pub value: serde_json::Value,
}

impl ViewRow {
    #[must_use]
    pub fn new(key: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// A document as written to the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Category(CategoryDocument),
    Entity(EntityDocument),
}

impl Document {
    #[must_use]
    pub const fn id(&self) -> Uuid {
        match self {
            Self::Category(doc) => doc.id,
            Self::Entity(doc) => doc.id,
        }
    }
}

impl From<CategoryDocument> for Document {
    fn from(doc: CategoryDocument) -> Self {
        Self::Category(doc)
    }
}

impl From<EntityDocument> for Document {
    fn from(doc: EntityDocument) -> Self {
        Self::Entity(doc)
    }
}

/// Failures reported by a document store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store refused a write that would duplicate a unique key.
    #[error("write conflict on {0}")]
    Conflict(String),

    /// A document addressed by a delete does not exist.
    #[error("document {0} not found")]
    MissingDocument(Uuid),

    /// A view row could not be produced.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Storage interface used by the category router.
///
/// Implementations must honor `atomic = true` as all-or-nothing: on error,
/// none of the documents in the batch is written.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns the rows of `view`, restricted to `key` when given.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store cannot be queried.
    async fn query_by_view(
        &self,
        view: View,
        key: Option<&str>,
    ) -> Result<Vec<ViewRow>, StoreError>;

    /// Saves (inserts or replaces by id) the given documents.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the write fails or is refused.
    async fn save_documents(&self, docs: Vec<Document>, atomic: bool) -> Result<(), StoreError>;

    /// Deletes the documents with the given ids.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if any document is missing or the store fails.
    async fn delete_documents(&self, ids: Vec<Uuid>) -> Result<(), StoreError>;
}
