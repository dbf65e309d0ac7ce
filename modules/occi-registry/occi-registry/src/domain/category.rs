//! Building blocks shared by the Kind, Mixin and Action registries.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use occi_registry_sdk::{
    CategoryBody, CategoryDescription, CategoryDocument, CategoryFields, CategoryFilter,
    CategoryType,
};
use tracing::{debug, error};
use uuid::Uuid;

use super::error::DomainError;
use super::joker;
use super::merge;
use super::snapshot::{CreateSnapshot, DeleteSnapshot, UpdateSnapshot};

/// Candidates matching at least one filter, in candidate order.
///
/// An empty filter set matches nothing.
#[must_use]
pub fn filter_matching<D: CategoryFields + Clone>(
    filters: &[CategoryFilter],
    candidates: &[D],
) -> Vec<D> {
    candidates
        .iter()
        .filter(|candidate| filters.iter().any(|f| f.matches(*candidate)))
        .cloned()
        .collect()
}

/// Stamps a freshly prepared category document.
#[must_use]
pub fn new_document(creator: &str, occi_id: String, body: CategoryBody) -> CategoryDocument {
    CategoryDocument {
        id: Uuid::new_v4(),
        occi_id,
        creator: creator.to_owned(),
        creation_date: Utc::now(),
        last_update: None,
        body,
    }
}

/// Registration of located categories (Kinds and Mixins).
///
/// Validates each description in list order against `snapshot` and against
/// the descriptions already accepted from the same batch.
///
/// # Errors
///
/// Returns `Conflict` on a taken identifier or location and `NotFound` on a
/// missing related category or action. The first failure aborts the batch.
pub fn register_located<F>(
    category_type: CategoryType,
    creator: &str,
    descriptions: &[CategoryDescription],
    snapshot: &CreateSnapshot,
    location_root: &str,
    make_body: F,
) -> Result<Vec<CategoryDocument>, DomainError>
where
    F: Fn(CategoryDescription, String) -> CategoryBody,
{
    let mut batch_ids = HashSet::new();
    let mut batch_locations = HashSet::new();
    let mut prepared = Vec::with_capacity(descriptions.len());

    for description in descriptions {
        let occi_id = joker::compute_occi_id(description);
        if !joker::is_unique(&occi_id, &snapshot.ids) || !batch_ids.insert(occi_id.clone()) {
            error!(%occi_id, "Register {category_type}: description already exists");
            return Err(DomainError::conflict(format!(
                "{category_type} {occi_id} already exists"
            )));
        }

        let location = joker::compute_location(description, location_root);
        if !joker::is_unique(&location, &snapshot.locations)
            || !batch_locations.insert(location.clone())
        {
            error!(%occi_id, %location, "Register {category_type}: location conflict");
            return Err(DomainError::conflict(format!(
                "location {location} is already taken"
            )));
        }

        if let Some(missing) = joker::missing_related(description, &snapshot.ids)
            .or_else(|| joker::missing_action(description, &snapshot.ids))
        {
            error!(%occi_id, %missing, "Register {category_type}: missing action or related category");
            return Err(DomainError::not_found(format!(
                "{occi_id} references unknown category {missing}"
            )));
        }

        debug!(%occi_id, %location, "{category_type} document prepared");
        prepared.push(new_document(
            creator,
            occi_id,
            make_body(description.clone(), location),
        ));
    }

    Ok(prepared)
}

/// Documents updated so far within one batch, in first-touch order.
///
/// Later updates of the same `occiId` apply on top of the earlier result.
#[derive(Default)]
struct UpdateBatch {
    docs: Vec<CategoryDocument>,
    index: HashMap<String, usize>,
}

impl UpdateBatch {
    fn put(&mut self, doc: CategoryDocument) {
        if let Some(&i) = self.index.get(&doc.occi_id) {
            self.docs[i] = doc;
        } else {
            self.index.insert(doc.occi_id.clone(), self.docs.len());
            self.docs.push(doc);
        }
    }
}

/// Looks up, authorizes and rewrites one document per update.
///
/// `apply` sees the snapshot with every earlier update of the batch already
/// in place.
///
/// # Errors
///
/// Returns `NotFound` for an absent document or one of another type,
/// `Forbidden` for a document created by someone else, or whatever `apply`
/// reports. The first failure aborts the batch.
pub fn update_each<U, K, F>(
    category_type: CategoryType,
    user_id: &str,
    updates: &[U],
    snapshot: &UpdateSnapshot,
    occi_id_of: K,
    apply: F,
) -> Result<Vec<CategoryDocument>, DomainError>
where
    K: Fn(&U) -> String,
    F: Fn(&CategoryDocument, &U, &UpdateSnapshot) -> Result<CategoryDocument, DomainError>,
{
    let mut batch = UpdateBatch::default();
    let mut current = snapshot.clone();

    for update in updates {
        let occi_id = occi_id_of(update);
        let Some(stored) = current
            .get(&occi_id)
            .filter(|doc| doc.category_type() == category_type)
        else {
            error!(%occi_id, "Update {category_type}: document couldn't be found");
            return Err(DomainError::not_found(format!(
                "{category_type} document {occi_id} couldn't be found"
            )));
        };

        if !stored.is_owned_by(user_id) {
            error!(%occi_id, user_id, "Update {category_type}: caller is not the creator");
            return Err(DomainError::forbidden(format!(
                "no right to update {category_type} document {occi_id}"
            )));
        }

        let mut updated = apply(stored, update, &current)?;
        updated.last_update = Some(Utc::now());
        debug!(%occi_id, "{category_type} document updated");
        current.replace(updated.clone());
        batch.put(updated);
    }

    Ok(batch.docs)
}

/// Merges `update` into a located description.
///
/// The location is recomputed when the declared location changes.
///
/// # Errors
///
/// `BadRequest` when the merge cannot fully apply, `Conflict` when the new
/// location belongs to another category.
pub fn merge_located(
    category_type: CategoryType,
    occi_id: &str,
    description: &CategoryDescription,
    location: &str,
    update: &CategoryDescription,
    location_root: &str,
    snapshot: &UpdateSnapshot,
) -> Result<(CategoryDescription, String), DomainError> {
    let merged = merge::merge_category_description(description, update).map_err(|e| {
        error!(%occi_id, "{category_type} description has not been totally updated: {e}");
        DomainError::bad_request(format!("{occi_id}: {e}"))
    })?;

    if merged.location == description.location {
        return Ok((merged, location.to_owned()));
    }

    let moved = joker::compute_location(&merged, location_root);
    if snapshot.location_taken(&moved, occi_id) {
        error!(%occi_id, location = %moved, "Update {category_type}: location conflict");
        return Err(DomainError::conflict(format!(
            "location {moved} is already taken"
        )));
    }
    Ok((merged, moved))
}

/// Resolves every description to the store id of a document the caller owns.
///
/// Returns `(occiId, id)` pairs without duplicates.
///
/// # Errors
///
/// Returns `BadRequest` if a document is absent, foreign or of another type.
pub fn resolve_for_delete<D: CategoryFields>(
    category_type: CategoryType,
    user_id: &str,
    descriptions: &[D],
    snapshot: &DeleteSnapshot,
) -> Result<Vec<(String, Uuid)>, DomainError> {
    let mut seen = HashSet::new();
    let mut resolved = Vec::with_capacity(descriptions.len());

    for description in descriptions {
        let occi_id = joker::compute_occi_id(description);
        let Some(id) = snapshot.resolve_owned(&occi_id, user_id, category_type) else {
            error!(%occi_id, user_id, "Delete {category_type}: no such document owned by caller");
            return Err(DomainError::bad_request(format!(
                "{category_type} document {occi_id} cannot be deleted"
            )));
        };
        if seen.insert(id) {
            resolved.push((occi_id, id));
        }
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use occi_registry_sdk::ActionDescription;

    #[test]
    fn test_filter_is_disjunctive_across_filters() {
        let candidates = vec![
            ActionDescription::new("start", "http://x/action#"),
            ActionDescription::new("stop", "http://x/action#"),
            ActionDescription::new("restart", "http://y/action#"),
        ];
        let filters = vec![
            CategoryFilter::by_term("start"),
            CategoryFilter::by_scheme("http://y/action#"),
        ];

        let matched = filter_matching(&filters, &candidates);
        let terms: Vec<_> = matched.iter().map(|a| a.term.as_str()).collect();
        assert_eq!(terms, vec!["start", "restart"]);

        assert_eq!(filter_matching(&filters, &candidates), matched);
    }

    #[test]
    fn test_empty_filter_set_matches_nothing() {
        let candidates = vec![ActionDescription::new("start", "http://x/action#")];
        assert!(filter_matching::<ActionDescription>(&[], &candidates).is_empty());
    }

    #[test]
    fn test_new_document_stamps() {
        let doc = new_document(
            "alice",
            "http://x/action#start".to_owned(),
            CategoryBody::Action {
                description: ActionDescription::new("start", "http://x/action#"),
            },
        );
        assert_eq!(doc.creator, "alice");
        assert!(doc.last_update.is_none());
        assert_ne!(doc.id, Uuid::nil());
    }
}
