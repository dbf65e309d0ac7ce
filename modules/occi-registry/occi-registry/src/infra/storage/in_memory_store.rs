//! In-memory document store.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use occi_registry_sdk::EntityType;
use parking_lot::Mutex;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::domain::repo::{Document, DocumentStore, StoreError, View, ViewRow};

/// Document store keeping every document in memory.
///
/// Views are computed on each query. With `enforce_unique` set, a write that
/// would give two documents the same `occiId`, category location or entity
/// location is refused with `StoreError::Conflict`.
pub struct InMemoryDocumentStore {
    docs: Mutex<BTreeMap<Uuid, Document>>,
    enforce_unique: bool,
    /// Simulated outage: every call fails while set.
    unavailable: AtomicBool,
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new(true)
    }
}

impl InMemoryDocumentStore {
    #[must_use]
    pub fn new(enforce_unique: bool) -> Self {
        Self {
            docs: Mutex::new(BTreeMap::new()),
            enforce_unique,
            unavailable: AtomicBool::new(false),
        }
    }

    /// Makes every subsequent call fail with `StoreError::Unavailable`, or recover.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.lock().is_empty()
    }

    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<Document> {
        self.docs.lock().get(&id).cloned()
    }

    /// Every stored document, ordered by id.
    #[must_use]
    pub fn documents(&self) -> Vec<Document> {
        self.docs.lock().values().cloned().collect()
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store is offline".to_owned()));
        }
        Ok(())
    }

    /// Unique keys a document occupies.
    fn claims(doc: &Document) -> Vec<String> {
        match doc {
            Document::Category(category) => {
                let mut claims = vec![format!("occi-id:{}", category.occi_id)];
                if let Some(location) = category.location() {
                    claims.push(format!("category-location:{location}"));
                }
                claims
            }
            Document::Entity(entity) => vec![format!("entity-location:{}", entity.location)],
        }
    }

    fn emit(view: View, doc: &Document) -> Result<Vec<ViewRow>, StoreError> {
        let rows = match (view, doc) {
            (View::ForRegisterCategories, Document::Category(c)) => {
                vec![ViewRow::new(c.occi_id.clone(), json!(c.location()))]
            }
            (View::ForGetCategories, Document::Category(c)) => {
                let description = serde_json::to_value(c.description())?
                    .get_mut("description")
                    .map_or(Value::Null, Value::take);
                vec![ViewRow::new(c.category_type().as_str(), description)]
            }
            (View::ForUpdateCategories, Document::Category(c)) => {
                vec![ViewRow::new(c.occi_id.clone(), serde_json::to_value(c)?)]
            }
            (View::ForDeleteCategories, Document::Category(c)) => vec![ViewRow::new(
                c.occi_id.clone(),
                json!({"id": c.id, "creator": c.creator, "type": c.category_type()}),
            )],
            (View::CategoryIndex, Document::Category(c)) => vec![ViewRow::new(
                c.occi_id.clone(),
                json!({"type": c.category_type(), "location": c.location()}),
            )],
            (View::EntitiesOfKind, Document::Entity(e)) => {
                vec![ViewRow::new(e.kind(), json!(e.id))]
            }
            (View::EntitiesOfMixin, Document::Entity(e)) => {
                let value = serde_json::to_value(e)?;
                e.mixins()
                    .iter()
                    .map(|mixin| ViewRow::new(mixin.clone(), value.clone()))
                    .collect()
            }
            (View::ResourceByLocation | View::LinkByLocation, Document::Entity(e)) => {
                let wanted = if view == View::ResourceByLocation {
                    EntityType::Resource
                } else {
                    EntityType::Link
                };
                if e.entity_type() == wanted {
                    vec![ViewRow::new(e.location.clone(), Value::String(e.creator.clone()))]
                } else {
                    Vec::new()
                }
            }
            _ => Vec::new(),
        };
        Ok(rows)
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn query_by_view(
        &self,
        view: View,
        key: Option<&str>,
    ) -> Result<Vec<ViewRow>, StoreError> {
        self.ensure_available()?;
        let docs = self.docs.lock();
        let mut rows = Vec::new();
        for doc in docs.values() {
            rows.extend(
                Self::emit(view, doc)?
                    .into_iter()
                    .filter(|row| key.is_none_or(|k| row.key == k)),
            );
        }
        // Stable: rows with equal keys stay in document id order.
        rows.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(rows)
    }

    async fn save_documents(&self, docs: Vec<Document>, atomic: bool) -> Result<(), StoreError> {
        self.ensure_available()?;
        let mut stored = self.docs.lock();

        if !self.enforce_unique {
            for doc in docs {
                stored.insert(doc.id(), doc);
            }
            return Ok(());
        }

        let incoming: HashSet<Uuid> = docs.iter().map(Document::id).collect();
        let mut taken: HashMap<String, Uuid> = stored
            .values()
            .filter(|doc| !incoming.contains(&doc.id()))
            .flat_map(|doc| Self::claims(doc).into_iter().map(move |k| (k, doc.id())))
            .collect();

        let mut accepted = Vec::with_capacity(docs.len());
        let mut first_conflict = None;
        for doc in docs {
            let claims = Self::claims(&doc);
            let clash = claims
                .iter()
                .find(|claim| taken.get(*claim).is_some_and(|owner| *owner != doc.id()));
            if let Some(claim) = clash {
                if atomic {
                    return Err(StoreError::Conflict(claim.clone()));
                }
                first_conflict.get_or_insert_with(|| claim.clone());
                continue;
            }
            for claim in claims {
                taken.insert(claim, doc.id());
            }
            accepted.push(doc);
        }

        for doc in accepted {
            stored.insert(doc.id(), doc);
        }
        if let Some(claim) = first_conflict {
            return Err(StoreError::Conflict(claim));
        }
        Ok(())
    }

    async fn delete_documents(&self, ids: Vec<Uuid>) -> Result<(), StoreError> {
        self.ensure_available()?;
        let mut stored = self.docs.lock();
        if let Some(missing) = ids.iter().find(|id| !stored.contains_key(*id)) {
            return Err(StoreError::MissingDocument(*missing));
        }
        for id in ids {
            stored.remove(&id);
        }
        Ok(())
    }
}
