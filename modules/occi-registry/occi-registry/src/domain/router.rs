//! Category router: the entry point of every composite registry operation.
//!
//! Each operation reads its snapshot once, dispatches the sub-requests to the
//! per-type registries in dependency order and commits all prepared documents
//! in one atomic batch. Any validation failure rejects the whole request.

use std::collections::BTreeMap;
use std::sync::Arc;

use occi_registry_sdk::{
    ActionDescription, CategoryDescription, CategoryListing, CategoryType, CreateRequest,
    DeleteRequest, FilterRequest, ResourceDescription, ResourceOutcome, UpdateRequest,
};
use tracing::{debug, error, info, warn};

use super::action::ActionRegistry;
use super::entity::ResourceRegistry;
use super::error::DomainError;
use super::joker;
use super::kind::KindRegistry;
use super::mixin::MixinRegistry;
use super::repo::{Document, DocumentStore, View, ViewRow};
use super::snapshot::{CreateSnapshot, DeleteSnapshot, EntitySnapshot, UpdateSnapshot};

/// Message returned when a composite operation is rejected.
pub const GENERIC_ERROR_MESSAGE: &str = "An error has occurred, please check log for more details";

/// Routes composite category requests and resource registrations.
pub struct CategoryRouter {
    store: Arc<dyn DocumentStore>,
    kinds: KindRegistry,
    mixins: MixinRegistry,
    actions: ActionRegistry,
    resources: ResourceRegistry,
}

impl CategoryRouter {
    /// Creates a router over `store`; synthesized category locations live under `location_root`.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, location_root: &str) -> Self {
        Self {
            store,
            kinds: KindRegistry::new(location_root),
            mixins: MixinRegistry::new(location_root),
            actions: ActionRegistry,
            resources: ResourceRegistry::default(),
        }
    }

    /// Collapses a sub-registry failure into the composite outcome.
    fn composite_failure(operation: &str, e: DomainError) -> DomainError {
        if let DomainError::Internal(_) = e {
            return e;
        }
        error!(operation, status = %e.status(), "{e}");
        DomainError::bad_request(GENERIC_ERROR_MESSAGE)
    }

    async fn query(&self, view: View, key: Option<&str>) -> Result<Vec<ViewRow>, DomainError> {
        self.store.query_by_view(view, key).await.map_err(|e| {
            error!(%view, "Store query failed: {e}");
            DomainError::Internal(anyhow::Error::new(e).context(format!("querying view {view}")))
        })
    }

    async fn save(&self, docs: Vec<Document>) -> Result<(), DomainError> {
        if docs.is_empty() {
            return Ok(());
        }
        let count = docs.len();
        self.store.save_documents(docs, true).await.map_err(|e| {
            error!(count, "Batch write failed: {e}");
            DomainError::from(e)
        })?;
        debug!(count, "Batch write committed");
        Ok(())
    }

    /// Registers the actions, kinds and mixins of `request`, in that order.
    ///
    /// Categories created earlier in the request are visible to the ones
    /// validated after them.
    ///
    /// # Errors
    ///
    /// `BadRequest` if any description is rejected, `Conflict` if the store
    /// refuses the batch, `Internal` on store failure.
    pub async fn register_categories(
        &self,
        user_id: &str,
        request: &CreateRequest,
    ) -> Result<(), DomainError> {
        info!(user_id, "Registering categories");
        let rows = self.query(View::ForRegisterCategories, None).await?;
        let snapshot = CreateSnapshot::from_rows(&rows);

        let actions = self
            .actions
            .register(user_id, request.actions.as_deref().unwrap_or_default(), &snapshot)
            .map_err(|e| Self::composite_failure("register actions", e))?;
        let snapshot = snapshot.extended_with(&actions);

        let kinds = self
            .kinds
            .register(user_id, request.kinds.as_deref().unwrap_or_default(), &snapshot)
            .map_err(|e| Self::composite_failure("register kinds", e))?;
        let snapshot = snapshot.extended_with(&kinds);

        let mixins = self
            .mixins
            .register(user_id, request.mixins.as_deref().unwrap_or_default(), &snapshot)
            .map_err(|e| Self::composite_failure("register mixins", e))?;

        let docs = actions
            .into_iter()
            .chain(kinds)
            .chain(mixins)
            .map(Document::from)
            .collect();
        self.save(docs).await
    }

    /// Lists every category, grouped by type.
    ///
    /// # Errors
    ///
    /// `Internal` if the store cannot be queried or returns malformed rows.
    pub async fn get_all_categories(&self) -> Result<CategoryListing, DomainError> {
        let rows = self.query(View::ForGetCategories, None).await?;
        let mut listing = CategoryListing::default();
        for row in rows {
            let value = row.value;
            let decoded = match row.key.as_str() {
                "Kind" => serde_json::from_value(value).map(|d| listing.kinds.push(d)),
                "Mixin" => serde_json::from_value(value).map(|d| listing.mixins.push(d)),
                "Action" => serde_json::from_value(value).map(|d| listing.actions.push(d)),
                other => {
                    warn!(key = other, "Skipping row of unknown category type");
                    Ok(())
                }
            };
            decoded.map_err(|e| {
                DomainError::Internal(anyhow::Error::new(e).context("malformed category description"))
            })?;
        }
        Ok(listing)
    }

    async fn descriptions_of<D: serde::de::DeserializeOwned>(
        &self,
        category_type: CategoryType,
    ) -> Result<Vec<D>, DomainError> {
        self.query(View::ForGetCategories, Some(category_type.as_str()))
            .await?
            .into_iter()
            .map(|row| {
                serde_json::from_value(row.value).map_err(|e| {
                    DomainError::Internal(
                        anyhow::Error::new(e).context(format!("malformed {category_type} description")),
                    )
                })
            })
            .collect()
    }

    /// Returns, per type, the categories matching at least one of the type's filters.
    ///
    /// A type absent from `request` yields no categories.
    ///
    /// # Errors
    ///
    /// `Internal` if the store cannot be queried or returns malformed rows.
    pub async fn get_filtered_categories(
        &self,
        request: &FilterRequest,
    ) -> Result<CategoryListing, DomainError> {
        let mut listing = CategoryListing::default();

        if let Some(filters) = request.kinds.as_deref() {
            let candidates: Vec<CategoryDescription> =
                self.descriptions_of(CategoryType::Kind).await?;
            listing.kinds = self.kinds.filter(filters, &candidates);
        }
        if let Some(filters) = request.mixins.as_deref() {
            let candidates: Vec<CategoryDescription> =
                self.descriptions_of(CategoryType::Mixin).await?;
            listing.mixins = self.mixins.filter(filters, &candidates);
        }
        if let Some(filters) = request.actions.as_deref() {
            let candidates: Vec<ActionDescription> =
                self.descriptions_of(CategoryType::Action).await?;
            listing.actions = self.actions.filter(filters, &candidates);
        }

        Ok(listing)
    }

    /// Applies the kind, mixin, action and provider updates of `request`, in that order.
    ///
    /// Provider updates see the kinds as updated by the same request.
    ///
    /// # Errors
    ///
    /// `BadRequest` if any update is rejected, `Internal` on store failure.
    pub async fn update_categories(
        &self,
        user_id: &str,
        request: &UpdateRequest,
    ) -> Result<(), DomainError> {
        info!(user_id, "Updating categories");
        let rows = self.query(View::ForUpdateCategories, None).await?;
        let snapshot = UpdateSnapshot::from_rows(&rows)?;

        let kinds = self
            .kinds
            .update_description(user_id, request.kinds.as_deref().unwrap_or_default(), &snapshot)
            .map_err(|e| Self::composite_failure("update kinds", e))?;
        let mixins = self
            .mixins
            .update_description(
                user_id,
                request.mixins.as_deref().unwrap_or_default(),
                &snapshot.overlaid(&kinds),
            )
            .map_err(|e| Self::composite_failure("update mixins", e))?;
        let actions = self
            .actions
            .update_description(user_id, request.actions.as_deref().unwrap_or_default(), &snapshot)
            .map_err(|e| Self::composite_failure("update actions", e))?;
        let providers = self
            .kinds
            .update_provider(
                user_id,
                request.providers.as_deref().unwrap_or_default(),
                &snapshot.overlaid(&kinds),
            )
            .map_err(|e| Self::composite_failure("update providers", e))?;

        // Provider updates were applied on top of the kind updates; last one wins.
        let mut latest = BTreeMap::new();
        for doc in kinds.into_iter().chain(mixins).chain(actions).chain(providers) {
            latest.insert(doc.id, doc);
        }
        self.save(latest.into_values().map(Document::from).collect())
            .await
    }

    /// Deletes the kinds, mixins and actions of `request`, in that order.
    ///
    /// Entities referencing a deleted mixin are rewritten without it.
    ///
    /// # Errors
    ///
    /// `BadRequest` if any category cannot be deleted, `Internal` on store failure.
    pub async fn delete_categories(
        &self,
        user_id: &str,
        request: &DeleteRequest,
    ) -> Result<(), DomainError> {
        info!(user_id, "Deleting categories");
        let kinds = request.kinds.as_deref().unwrap_or_default();
        let mixins = request.mixins.as_deref().unwrap_or_default();
        let actions = request.actions.as_deref().unwrap_or_default();

        let rows = self.query(View::ForDeleteCategories, None).await?;
        let mut snapshot = DeleteSnapshot::from_rows(&rows)?;
        if !kinds.is_empty() {
            let rows = self.query(View::EntitiesOfKind, None).await?;
            snapshot = snapshot.with_kinds_in_use(&rows);
        }
        for mixin in mixins {
            let occi_id = joker::compute_occi_id(mixin);
            let rows = self.query(View::EntitiesOfMixin, Some(&occi_id)).await?;
            snapshot = snapshot.with_mixin_entities(&occi_id, &rows)?;
        }

        let kind_ids = self
            .kinds
            .delete(user_id, kinds, &snapshot)
            .map_err(|e| Self::composite_failure("delete kinds", e))?;
        let mixin_deletion = self
            .mixins
            .delete(user_id, mixins, &snapshot)
            .map_err(|e| Self::composite_failure("delete mixins", e))?;
        let action_ids = self
            .actions
            .delete(user_id, actions, &snapshot)
            .map_err(|e| Self::composite_failure("delete actions", e))?;

        let ids: Vec<_> = kind_ids
            .into_iter()
            .chain(mixin_deletion.ids)
            .chain(action_ids)
            .collect();
        if !ids.is_empty() {
            let count = ids.len();
            self.store.delete_documents(ids).await.map_err(|e| {
                error!(count, "Batch delete failed: {e}");
                DomainError::from(e)
            })?;
            debug!(count, "Batch delete committed");
        }

        self.save(
            mixin_deletion
                .entities
                .into_iter()
                .map(Document::from)
                .collect(),
        )
        .await
    }

    /// Admits each resource description under the Kind living at `kind_location`.
    ///
    /// Descriptions are admitted independently and in order; each admitted
    /// resource is persisted with its implicit links in one atomic batch.
    /// One outcome is returned per description.
    ///
    /// # Errors
    ///
    /// `NotFound` if no Kind lives at `kind_location`, `Internal` if the
    /// snapshot cannot be read.
    pub async fn register_resources(
        &self,
        user_id: &str,
        kind_location: &str,
        descriptions: &[ResourceDescription],
    ) -> Result<Vec<ResourceOutcome>, DomainError> {
        info!(user_id, kind_location, count = descriptions.len(), "Registering resources");
        let categories = self.query(View::CategoryIndex, None).await?;
        let resources = self.query(View::ResourceByLocation, None).await?;
        let links = self.query(View::LinkByLocation, None).await?;
        let mut snapshot = EntitySnapshot::from_rows(&categories, &resources, &links)?;

        let Some(kind_id) = snapshot.kind_at(kind_location).map(str::to_owned) else {
            error!(kind_location, "Register resources: no kind at this location");
            return Err(DomainError::not_found(format!("no kind at {kind_location}")));
        };

        let mut outcomes = Vec::with_capacity(descriptions.len());
        for description in descriptions {
            let admitted = match self.resources.admit(
                user_id,
                description,
                kind_location,
                &kind_id,
                &snapshot,
            ) {
                Ok(admitted) => admitted,
                Err(e) => {
                    outcomes.push(ResourceOutcome::Rejected {
                        id: description.id.clone(),
                        status: e.status(),
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            let location = admitted.resource.location.clone();
            let link_locations = admitted.link_locations();
            let docs = std::iter::once(admitted.resource)
                .chain(admitted.links)
                .map(Document::from)
                .collect();

            match self.save(docs).await {
                Ok(()) => {
                    debug!(%location, "Resource document has been successfully added");
                    snapshot = snapshot.with_admitted(&location, &link_locations);
                    outcomes.push(ResourceOutcome::Created {
                        location,
                        links: link_locations,
                    });
                }
                Err(e) => outcomes.push(ResourceOutcome::Rejected {
                    id: description.id.clone(),
                    status: e.status(),
                    message: GENERIC_ERROR_MESSAGE.to_owned(),
                }),
            }
        }

        Ok(outcomes)
    }
}
