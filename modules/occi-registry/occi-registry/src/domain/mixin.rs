//! Mixin registry.

use std::collections::BTreeMap;

use chrono::Utc;
use occi_registry_sdk::{
    CategoryBody, CategoryDescription, CategoryDocument, CategoryFilter, CategoryType,
    EntityDocument,
};
use tracing::debug;
use uuid::Uuid;

use super::category;
use super::error::DomainError;
use super::joker;
use super::snapshot::{CreateSnapshot, DeleteSnapshot, UpdateSnapshot};

/// Outcome of a Mixin delete: documents to remove and entities to rewrite.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MixinDeletion {
    pub ids: Vec<Uuid>,
    /// Entities that referenced a deleted mixin, with the reference stripped.
    pub entities: Vec<EntityDocument>,
}

/// Validates create, update, delete and filter requests on Mixins.
#[derive(Debug, Clone)]
pub struct MixinRegistry {
    location_root: String,
}

impl MixinRegistry {
    #[must_use]
    pub fn new(location_root: impl Into<String>) -> Self {
        Self {
            location_root: location_root.into(),
        }
    }

    /// Mixin descriptions matching any of `filters`.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn filter(
        &self,
        filters: &[CategoryFilter],
        candidates: &[CategoryDescription],
    ) -> Vec<CategoryDescription> {
        let matched = category::filter_matching(filters, candidates);
        debug!(count = matched.len(), "Mixin filtered documents found");
        matched
    }

    /// Prepares one Mixin document per description.
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
            CategoryType::Mixin,
            creator,
            descriptions,
            snapshot,
            &self.location_root,
            |description, location| CategoryBody::Mixin {
                description,
                location,
            },
        )
    }

    /// Merges each update into the stored Mixin description.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Forbidden`, `BadRequest` when the merge cannot fully apply,
    /// `Conflict` when a new declared location is taken.
    pub fn update_description(
        &self,
        user_id: &str,
        updates: &[CategoryDescription],
        snapshot: &UpdateSnapshot,
    ) -> Result<Vec<CategoryDocument>, DomainError> {
        category::update_each(
            CategoryType::Mixin,
            user_id,
            updates,
            snapshot,
            joker::compute_occi_id,
            |stored, update, current| {
                let CategoryBody::Mixin {
                    description,
                    location,
                } = &stored.body
                else {
                    return Err(DomainError::not_found(&stored.occi_id));
                };

                let (merged, location) = category::merge_located(
                    CategoryType::Mixin,
                    &stored.occi_id,
                    description,
                    location,
                    update,
                    &self.location_root,
                    current,
                )?;

                Ok(CategoryDocument {
                    body: CategoryBody::Mixin {
                        description: merged,
                        location,
                    },
                    ..stored.clone()
                })
            },
        )
    }

    /// Resolves the Mixins to delete and strips them from every referencing entity.
    ///
    /// # Errors
    ///
    /// `BadRequest` if a Mixin is absent or not owned by `user_id`.
    #[allow(clippy::unused_self)]
    pub fn delete(
        &self,
        user_id: &str,
        descriptions: &[CategoryDescription],
        snapshot: &DeleteSnapshot,
    ) -> Result<MixinDeletion, DomainError> {
        let resolved =
            category::resolve_for_delete(CategoryType::Mixin, user_id, descriptions, snapshot)?;

        let mut ids = Vec::with_capacity(resolved.len());
        let mut touched: BTreeMap<Uuid, EntityDocument> = BTreeMap::new();

        for (occi_id, id) in resolved {
            for entity in snapshot.entities_of_mixin(&occi_id) {
                let current = touched
                    .entry(entity.id)
                    .or_insert_with(|| entity.clone());
                if current.dissociate_mixin(&occi_id) {
                    current.last_update = Some(Utc::now());
                    debug!(%occi_id, entity = %current.location, "Mixin dissociated from entity");
                }
            }
            debug!(%occi_id, "Mixin document is sent for delete");
            ids.push(id);
        }

        Ok(MixinDeletion {
            ids,
            entities: touched.into_values().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repo::ViewRow;
    use chrono::DateTime;
    use occi_registry_sdk::{EntityBody, ResourceDescription, StatusCode};
    use serde_json::json;

    fn registry() -> MixinRegistry {
        MixinRegistry::new("/")
    }

    fn small() -> CategoryDescription {
        CategoryDescription::new("small", "http://x/templates#")
            .with_related(vec!["http://x/#os_tpl".to_owned()])
    }

    fn entity(local_id: &str, mixins: &[&str]) -> EntityDocument {
        EntityDocument {
            id: Uuid::new_v4(),
            creator: "alice".to_owned(),
            creation_date: DateTime::<Utc>::UNIX_EPOCH,
            last_update: None,
            location: format!("/alice/compute/{local_id}"),
            body: EntityBody::Resource {
                description: ResourceDescription::new(local_id, "http://x/#compute")
                    .with_mixins(mixins.iter().map(|m| (*m).to_owned()).collect()),
            },
        }
    }

    fn delete_snapshot(mixin_id: &str, entities: &[EntityDocument]) -> DeleteSnapshot {
        let rows = vec![ViewRow::new(
            mixin_id,
            json!({"id": Uuid::new_v4(), "creator": "alice", "type": "Mixin"}),
        )];
        let entity_rows: Vec<_> = entities
            .iter()
            .map(|e| ViewRow::new(mixin_id, serde_json::to_value(e).unwrap()))
            .collect();
        DeleteSnapshot::from_rows(&rows)
            .unwrap()
            .with_mixin_entities(mixin_id, &entity_rows)
            .unwrap()
    }

    #[test]
    fn test_register_related_must_exist() {
        let err = registry()
            .register("alice", &[small()], &CreateSnapshot::default())
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NotFound);

        let mut snapshot = CreateSnapshot::default();
        snapshot.ids.insert("http://x/#os_tpl".to_owned());
        let docs = registry().register("alice", &[small()], &snapshot).unwrap();
        assert_eq!(docs[0].occi_id, "http://x/templates#small");
        assert_eq!(docs[0].category_type(), CategoryType::Mixin);
        assert!(docs[0].provider().is_none());
    }

    #[test]
    fn test_register_one_bad_mixin_rejects_batch() {
        let mut snapshot = CreateSnapshot::default();
        snapshot.ids.insert("http://x/#os_tpl".to_owned());
        let bad = CategoryDescription::new("large", "http://x/templates#")
            .with_related(vec!["http://x/#ghost".to_owned()]);

        let err = registry()
            .register("alice", &[small(), bad], &snapshot)
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NotFound);
    }

    #[test]
    fn test_delete_strips_mixin_from_every_entity() {
        let mixin_id = "http://x/templates#small";
        let entities = vec![
            entity("vm1", &[mixin_id, "http://x/#gpu"]),
            entity("vm2", &[mixin_id]),
        ];
        let snapshot = delete_snapshot(mixin_id, &entities);

        let deletion = registry().delete("alice", &[small()], &snapshot).unwrap();
        assert_eq!(deletion.ids.len(), 1);
        assert_eq!(deletion.entities.len(), 2);
        for mutated in &deletion.entities {
            assert!(!mutated.mixins().iter().any(|m| m == mixin_id));
            assert!(mutated.last_update.is_some());
        }
    }

    #[test]
    fn test_delete_without_dependents_rewrites_nothing() {
        let snapshot = delete_snapshot("http://x/templates#small", &[]);
        let deletion = registry().delete("alice", &[small()], &snapshot).unwrap();
        assert_eq!(deletion.ids.len(), 1);
        assert!(deletion.entities.is_empty());
    }

    #[test]
    fn test_delete_foreign_mixin_is_bad_request() {
        let snapshot = delete_snapshot("http://x/templates#small", &[]);
        let err = registry().delete("bob", &[small()], &snapshot).unwrap_err();
        assert_eq!(err.status(), StatusCode::BadRequest);
    }

    #[test]
    fn test_update_description_forbidden_for_non_creator() {
        let mut snapshot = CreateSnapshot::default();
        snapshot.ids.insert("http://x/#os_tpl".to_owned());
        let stored = registry()
            .register("alice", &[small().with_title("Small")], &snapshot)
            .unwrap();
        let rows: Vec<_> = stored
            .iter()
            .map(|d| ViewRow::new(d.occi_id.clone(), serde_json::to_value(d).unwrap()))
            .collect();
        let snapshot = UpdateSnapshot::from_rows(&rows).unwrap();
        let update = CategoryDescription::new("small", "http://x/templates#").with_title("Tiny");

        let err = registry()
            .update_description("bob", &[update.clone()], &snapshot)
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::Forbidden);

        let updated = registry()
            .update_description("alice", &[update], &snapshot)
            .unwrap();
        assert_eq!(updated[0].location(), Some("/small/"));
    }
}
