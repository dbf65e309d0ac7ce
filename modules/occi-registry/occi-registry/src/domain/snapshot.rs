//! Request-scoped snapshots of store state.
//!
//! Each composite operation reads the views it needs once, decodes them into
//! one of these snapshots and hands it to the registries by reference.
//! Snapshots are never mutated; extension produces a new value.

use std::collections::{HashMap, HashSet};

use occi_registry_sdk::{CategoryDocument, CategoryType, EntityDocument};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use super::error::DomainError;
use super::repo::ViewRow;

fn decode<T: DeserializeOwned>(row: &ViewRow, what: &str) -> Result<T, DomainError> {
    serde_json::from_value(row.value.clone()).map_err(|e| {
        DomainError::Internal(anyhow::Error::new(e).context(format!(
            "malformed {what} row for key {}",
            row.key
        )))
    })
}

// =============================================================================
// Create
// =============================================================================

/// Identifiers and locations of every category in the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateSnapshot {
    pub ids: HashSet<String>,
    pub locations: HashSet<String>,
}

impl CreateSnapshot {
    /// Builds the snapshot from `for_register_categories` rows.
    #[must_use]
    pub fn from_rows(rows: &[ViewRow]) -> Self {
        let mut snapshot = Self::default();
        for row in rows {
            snapshot.ids.insert(row.key.clone());
            if let Some(location) = row.value.as_str() {
                snapshot.locations.insert(location.to_owned());
            }
        }
        snapshot
    }

    /// Returns a new snapshot that also contains the given prepared documents.
    #[must_use]
    pub fn extended_with(&self, docs: &[CategoryDocument]) -> Self {
        let mut extended = self.clone();
        for doc in docs {
            extended.ids.insert(doc.occi_id.clone());
            if let Some(location) = doc.location() {
                extended.locations.insert(location.to_owned());
            }
        }
        extended
    }
}

// =============================================================================
// Update
// =============================================================================

/// Full category documents keyed by `occiId`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateSnapshot {
    docs: HashMap<String, CategoryDocument>,
}

impl UpdateSnapshot {
    /// Builds the snapshot from `for_update_categories` rows.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Internal` if a row does not hold a category document.
    pub fn from_rows(rows: &[ViewRow]) -> Result<Self, DomainError> {
        let docs = rows
            .iter()
            .map(|row| decode(row, "category document").map(|value| (row.key.clone(), value)))
            .collect::<Result<_, _>>()?;
        Ok(Self { docs })
    }

    #[must_use]
    pub fn get(&self, occi_id: &str) -> Option<&CategoryDocument> {
        self.docs.get(occi_id)
    }

    /// Returns `true` if a located category other than `occi_id` lives at `location`.
    #[must_use]
    pub fn location_taken(&self, location: &str, occi_id: &str) -> bool {
        self.docs
            .values()
            .any(|doc| doc.occi_id != occi_id && doc.location() == Some(location))
    }

    /// Puts `doc` in place of the stored version.
    pub fn replace(&mut self, doc: CategoryDocument) {
        self.docs.insert(doc.occi_id.clone(), doc);
    }

    /// Returns a new snapshot where `docs` replace the stored versions.
    #[must_use]
    pub fn overlaid(&self, docs: &[CategoryDocument]) -> Self {
        let mut overlaid = self.clone();
        for doc in docs {
            overlaid.replace(doc.clone());
        }
        overlaid
    }
}

// =============================================================================
// Delete
// =============================================================================

/// Ownership projection of a category document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CategoryRef {
    pub id: Uuid,
    pub creator: String,
    #[serde(rename = "type")]
    pub category_type: CategoryType,
}

/// Ownership projections plus the entity cross-references a delete must honor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteSnapshot {
    owners: HashMap<String, CategoryRef>,
    kinds_in_use: HashSet<String>,
    mixin_entities: HashMap<String, Vec<EntityDocument>>,
}

impl DeleteSnapshot {
    /// Builds the snapshot from `for_delete_categories` rows.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Internal` if a row cannot be decoded.
    pub fn from_rows(rows: &[ViewRow]) -> Result<Self, DomainError> {
        let owners = rows
            .iter()
            .map(|row| decode(row, "category reference").map(|value| (row.key.clone(), value)))
            .collect::<Result<_, _>>()?;
        Ok(Self {
            owners,
            ..Self::default()
        })
    }

    /// Adds the kind identifiers referenced by entities (`entities_of_kind` keys).
    #[must_use]
    pub fn with_kinds_in_use(mut self, rows: &[ViewRow]) -> Self {
        self.kinds_in_use
            .extend(rows.iter().map(|row| row.key.clone()));
        self
    }

    /// Adds the entities referencing `mixin_id` (`entities_of_mixin` rows for that key).
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Internal` if a row does not hold an entity document.
    pub fn with_mixin_entities(
        mut self,
        mixin_id: &str,
        rows: &[ViewRow],
    ) -> Result<Self, DomainError> {
        let entities = rows
            .iter()
            .map(|row| decode(row, "entity document"))
            .collect::<Result<Vec<EntityDocument>, _>>()?;
        self.mixin_entities.insert(mixin_id.to_owned(), entities);
        Ok(self)
    }

    /// Store id of the document `occi_id` of type `category_type` created by `user_id`.
    #[must_use]
    pub fn resolve_owned(
        &self,
        occi_id: &str,
        user_id: &str,
        category_type: CategoryType,
    ) -> Option<Uuid> {
        self.owners
            .get(occi_id)
            .filter(|r| r.creator == user_id && r.category_type == category_type)
            .map(|r| r.id)
    }

    #[must_use]
    pub fn kind_in_use(&self, occi_id: &str) -> bool {
        self.kinds_in_use.contains(occi_id)
    }

    #[must_use]
    pub fn entities_of_mixin(&self, mixin_id: &str) -> &[EntityDocument] {
        self.mixin_entities
            .get(mixin_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

// =============================================================================
// Entities
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct CategoryIndexEntry {
    #[serde(rename = "type")]
    category_type: CategoryType,
    #[serde(default)]
    location: Option<String>,
}

/// Category index plus the entity locations already taken.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntitySnapshot {
    categories: HashMap<String, CategoryIndexEntry>,
    resource_locations: HashSet<String>,
    link_locations: HashSet<String>,
}

impl EntitySnapshot {
    /// Builds the snapshot from `category_index`, `resource_by_location`
    /// and `link_by_location` rows.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Internal` if a category index row cannot be decoded.
    pub fn from_rows(
        categories: &[ViewRow],
        resources: &[ViewRow],
        links: &[ViewRow],
    ) -> Result<Self, DomainError> {
        let categories = categories
            .iter()
            .map(|row| decode(row, "category index").map(|value| (row.key.clone(), value)))
            .collect::<Result<_, _>>()?;
        Ok(Self {
            categories,
            resource_locations: resources.iter().map(|row| row.key.clone()).collect(),
            link_locations: links.iter().map(|row| row.key.clone()).collect(),
        })
    }

    /// `occiId` of the Kind living at `location`.
    #[must_use]
    pub fn kind_at(&self, location: &str) -> Option<&str> {
        self.categories.iter().find_map(|(id, entry)| {
            (entry.category_type == CategoryType::Kind
                && entry.location.as_deref() == Some(location))
            .then_some(id.as_str())
        })
    }

    /// Location of the Kind `occi_id`.
    #[must_use]
    pub fn kind_location(&self, occi_id: &str) -> Option<&str> {
        self.categories
            .get(occi_id)
            .filter(|entry| entry.category_type == CategoryType::Kind)
            .and_then(|entry| entry.location.as_deref())
    }

    fn is_of_type(&self, occi_id: &str, category_type: CategoryType) -> bool {
        self.categories
            .get(occi_id)
            .is_some_and(|entry| entry.category_type == category_type)
    }

    #[must_use]
    pub fn is_kind(&self, occi_id: &str) -> bool {
        self.is_of_type(occi_id, CategoryType::Kind)
    }

    #[must_use]
    pub fn is_mixin(&self, occi_id: &str) -> bool {
        self.is_of_type(occi_id, CategoryType::Mixin)
    }

    #[must_use]
    pub fn is_action(&self, occi_id: &str) -> bool {
        self.is_of_type(occi_id, CategoryType::Action)
    }

    #[must_use]
    pub fn has_resource(&self, location: &str) -> bool {
        self.resource_locations.contains(location)
    }

    #[must_use]
    pub fn has_link(&self, location: &str) -> bool {
        self.link_locations.contains(location)
    }

    /// Returns a new snapshot in which a just-persisted resource and its links exist.
    #[must_use]
    pub fn with_admitted(&self, resource_location: &str, link_locations: &[String]) -> Self {
        let mut extended = self.clone();
        extended
            .resource_locations
            .insert(resource_location.to_owned());
        extended
            .link_locations
            .extend(link_locations.iter().cloned());
        extended
    }
}
