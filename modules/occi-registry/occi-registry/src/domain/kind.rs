//! Kind registry.

use occi_registry_sdk::{
    CategoryBody, CategoryDescription, CategoryDocument, CategoryFilter, CategoryType,
    ProviderUpdateEntry,
};
use tracing::{debug, error};
use uuid::Uuid;

use super::category;
use super::error::DomainError;
use super::joker;
use super::merge;
use super::snapshot::{CreateSnapshot, DeleteSnapshot, UpdateSnapshot};

/// Validates create, update, delete and filter requests on Kinds.
#[derive(Debug, Clone)]
pub struct KindRegistry {
    location_root: String,
}

impl KindRegistry {
    #[must_use]
    pub fn new(location_root: impl Into<String>) -> Self {
        Self {
            location_root: location_root.into(),
        }
    }

    /// Kind descriptions matching any of `filters`.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn filter(
        &self,
        filters: &[CategoryFilter],
        candidates: &[CategoryDescription],
    ) -> Vec<CategoryDescription> {
        let matched = category::filter_matching(filters, candidates);
        debug!(count = matched.len(), "Kind filtered documents found");
        matched
    }

    /// Prepares one Kind document per description, with an empty provider.
    ///
    /// # Errors
    ///
    /// `Conflict` on a taken identifier or location, `NotFound` on a missing
    /// related category or action. Nothing is prepared on failure.
    pub fn register(
        &self,
        creator: &str,
        descriptions: &[CategoryDescription],
        snapshot: &CreateSnapshot,
    ) -> Result<Vec<CategoryDocument>, DomainError> {
        category::register_located(
            CategoryType::Kind,
            creator,
            descriptions,
            snapshot,
            &self.location_root,
            |description, location| CategoryBody::Kind {
                description,
                location,
                provider: occi_registry_sdk::Provider::default(),
            },
        )
    }

    /// Merges each update into the stored Kind description.
    ///
    /// A change of the declared location moves the Kind to the new location.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Forbidden`, `BadRequest` when the merge cannot fully apply,
    /// `Conflict` when the new location is taken.
    pub fn update_description(
        &self,
        user_id: &str,
        updates: &[CategoryDescription],
        snapshot: &UpdateSnapshot,
    ) -> Result<Vec<CategoryDocument>, DomainError> {
        category::update_each(
            CategoryType::Kind,
            user_id,
            updates,
            snapshot,
            joker::compute_occi_id,
            |stored, update, current| {
                let CategoryBody::Kind {
                    description,
                    location,
                    provider,
                } = &stored.body
                else {
                    return Err(DomainError::not_found(&stored.occi_id));
                };

                let (merged, location) = category::merge_located(
                    CategoryType::Kind,
                    &stored.occi_id,
                    description,
                    location,
                    update,
                    &self.location_root,
                    current,
                )?;

                Ok(CategoryDocument {
                    body: CategoryBody::Kind {
                        description: merged,
                        location,
                        provider: provider.clone(),
                    },
                    ..stored.clone()
                })
            },
        )
    }

    /// Merges each provider update into the stored Kind provider.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Forbidden`, or `BadRequest` when the update cannot fully apply.
    #[allow(clippy::unused_self)]
    pub fn update_provider(
        &self,
        user_id: &str,
        updates: &[ProviderUpdateEntry],
        snapshot: &UpdateSnapshot,
    ) -> Result<Vec<CategoryDocument>, DomainError> {
        category::update_each(
            CategoryType::Kind,
            user_id,
            updates,
            snapshot,
            |entry| entry.occi_id.clone(),
            |stored, entry, _| {
                let CategoryBody::Kind {
                    description,
                    location,
                    provider,
                } = &stored.body
                else {
                    return Err(DomainError::not_found(&stored.occi_id));
                };

                let merged = merge::merge_provider(provider, &entry.provider).map_err(|e| {
                    error!(occi_id = %stored.occi_id, "Kind provider has not been totally updated: {e}");
                    DomainError::bad_request(format!("{}: {e}", stored.occi_id))
                })?;

                Ok(CategoryDocument {
                    body: CategoryBody::Kind {
                        description: description.clone(),
                        location: location.clone(),
                        provider: merged,
                    },
                    ..stored.clone()
                })
            },
        )
    }

    /// Store ids of the Kind documents to delete.
    ///
    /// # Errors
    ///
    /// `BadRequest` if a Kind is absent, not owned by `user_id`, or still
    /// referenced by an entity. Nothing is deleted on failure.
    #[allow(clippy::unused_self)]
    pub fn delete(
        &self,
        user_id: &str,
        descriptions: &[CategoryDescription],
        snapshot: &DeleteSnapshot,
    ) -> Result<Vec<Uuid>, DomainError> {
        let resolved =
            category::resolve_for_delete(CategoryType::Kind, user_id, descriptions, snapshot)?;

        let mut ids = Vec::with_capacity(resolved.len());
        for (occi_id, id) in resolved {
            if snapshot.kind_in_use(&occi_id) {
                error!(%occi_id, "Delete kind: kind still has dependent entities");
                return Err(DomainError::bad_request(format!(
                    "Kind {occi_id} is still used by entities"
                )));
            }
            debug!(%occi_id, "Kind document is sent for delete");
            ids.push(id);
        }
        Ok(ids)
    }
}
