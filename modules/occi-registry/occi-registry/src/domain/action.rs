//! Action registry. Actions have neither location nor provider.

use std::collections::HashSet;

use occi_registry_sdk::{
    ActionDescription, CategoryBody, CategoryDocument, CategoryFilter, CategoryType,
};
use tracing::{debug, error};
use uuid::Uuid;

use super::category;
use super::error::DomainError;
use super::joker;
use super::merge;
use super::snapshot::{CreateSnapshot, DeleteSnapshot, UpdateSnapshot};

/// Validates create, update, delete and filter requests on Actions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionRegistry;

// Stateless: the receiver only groups the operations.
#[allow(clippy::unused_self)]
impl ActionRegistry {
    /// Action descriptions matching any of `filters`.
    #[must_use]
    pub fn filter(
        self,
        filters: &[CategoryFilter],
        candidates: &[ActionDescription],
    ) -> Vec<ActionDescription> {
        let matched = category::filter_matching(filters, candidates);
        debug!(count = matched.len(), "Action filtered documents found");
        matched
    }

    /// Prepares one Action document per description.
    ///
    /// # Errors
    ///
    /// `Conflict` if an identifier is already taken, in the store or earlier
    /// in the same batch. Nothing is prepared on failure.
    pub fn register(
        self,
        creator: &str,
        descriptions: &[ActionDescription],
        snapshot: &CreateSnapshot,
    ) -> Result<Vec<CategoryDocument>, DomainError> {
        let mut batch_ids = HashSet::new();
        let mut prepared = Vec::with_capacity(descriptions.len());

        for description in descriptions {
            let occi_id = joker::compute_occi_id(description);
            if !joker::is_unique(&occi_id, &snapshot.ids) || !batch_ids.insert(occi_id.clone()) {
                error!(%occi_id, "Register action: description already exists");
                return Err(DomainError::conflict(format!(
                    "Action {occi_id} already exists"
                )));
            }
            debug!(%occi_id, "Action document prepared");
            prepared.push(category::new_document(
                creator,
                occi_id,
                CategoryBody::Action {
                    description: description.clone(),
                },
            ));
        }

        Ok(prepared)
    }

    /// Merges each update into the stored Action description.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Forbidden`, or `BadRequest` when the merge cannot fully apply.
    pub fn update_description(
        self,
        user_id: &str,
        updates: &[ActionDescription],
        snapshot: &UpdateSnapshot,
    ) -> Result<Vec<CategoryDocument>, DomainError> {
        category::update_each(
            CategoryType::Action,
            user_id,
            updates,
            snapshot,
            joker::compute_occi_id,
            |stored, update, _| {
                let CategoryBody::Action { description } = &stored.body else {
                    return Err(DomainError::not_found(&stored.occi_id));
                };
                let merged = merge::merge_action_description(description, update).map_err(|e| {
                    error!(occi_id = %stored.occi_id, "Action description has not been totally updated: {e}");
                    DomainError::bad_request(format!("{}: {e}", stored.occi_id))
                })?;
                Ok(CategoryDocument {
                    body: CategoryBody::Action {
                        description: merged,
                    },
                    ..stored.clone()
                })
            },
        )
    }

    /// Store ids of the Action documents to delete.
    ///
    /// # Errors
    ///
    /// `BadRequest` if an Action is absent or not owned by `user_id`.
    pub fn delete(
        self,
        user_id: &str,
        descriptions: &[ActionDescription],
        snapshot: &DeleteSnapshot,
    ) -> Result<Vec<Uuid>, DomainError> {
        let resolved =
            category::resolve_for_delete(CategoryType::Action, user_id, descriptions, snapshot)?;
        Ok(resolved
            .into_iter()
            .map(|(occi_id, id)| {
                debug!(%occi_id, "Action document is sent for delete");
                id
            })
            .collect())
    }
}
