//! Shared harness for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use occi_registry::domain::repo::Document;
use occi_registry::domain::router::CategoryRouter;
use occi_registry::infra::InMemoryDocumentStore;
use occi_registry::{
    ActionDescription, CategoryDescription, CategoryDocument, CreateRequest, EntityDocument,
};

pub const COMPUTE: &str = "http://x/#compute";
pub const NETWORK_INTERFACE: &str = "http://x/#networkinterface";
pub const SMALL: &str = "http://x/#small";
pub const START: &str = "http://x/compute/action#start";

/// Router over a fresh in-memory store, with the store kept for inspection.
pub fn create_router() -> (CategoryRouter, Arc<InMemoryDocumentStore>) {
    let store = Arc::new(InMemoryDocumentStore::default());
    (CategoryRouter::new(store.clone(), "/"), store)
}

pub fn compute() -> CategoryDescription {
    CategoryDescription::new("compute", "http://x/#").with_title("Compute")
}

pub fn network_interface() -> CategoryDescription {
    CategoryDescription::new("networkinterface", "http://x/#").with_location("/link/")
}

pub fn small() -> CategoryDescription {
    CategoryDescription::new("small", "http://x/#")
}

pub fn start() -> ActionDescription {
    ActionDescription::new("start", "http://x/compute/action#").with_title("Start")
}

/// Kinds `compute` and `networkinterface`, mixin `small` and action `start`, all by alice.
pub async fn seed_categories(router: &CategoryRouter) {
    let request = CreateRequest {
        kinds: Some(vec![
            compute().with_actions(vec![START.to_owned()]),
            network_interface(),
        ]),
        mixins: Some(vec![small().with_related(vec![COMPUTE.to_owned()])]),
        actions: Some(vec![start()]),
    };
    router.register_categories("alice", &request).await.unwrap();
}

pub fn category_docs(store: &InMemoryDocumentStore) -> Vec<CategoryDocument> {
    store
        .documents()
        .into_iter()
        .filter_map(|doc| match doc {
            Document::Category(category) => Some(category),
            Document::Entity(_) => None,
        })
        .collect()
}

pub fn entity_docs(store: &InMemoryDocumentStore) -> Vec<EntityDocument> {
    store
        .documents()
        .into_iter()
        .filter_map(|doc| match doc {
            Document::Entity(entity) => Some(entity),
            Document::Category(_) => None,
        })
        .collect()
}

pub fn category(store: &InMemoryDocumentStore, occi_id: &str) -> CategoryDocument {
    category_docs(store)
        .into_iter()
        .find(|doc| doc.occi_id == occi_id)
        .unwrap()
}
