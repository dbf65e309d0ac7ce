#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Integration tests for category updates and deletions

mod common;

use std::sync::Arc;

use common::{
    COMPUTE, SMALL, START, category, category_docs, compute, create_router, entity_docs,
    seed_categories, small, start,
};
use occi_registry::domain::router::CategoryRouter;
use occi_registry::infra::InMemoryDocumentStore;
use occi_registry::{
    ActionDescription, CategoryDescription, CreateRequest, DeleteRequest, ResourceDescription,
    StatusCode, UpdateRequest,
};
use occi_registry_sdk::{CategoryBody, ProviderUpdate, ProviderUpdateEntry};

fn provider_update(local: &[&str]) -> ProviderUpdateEntry {
    ProviderUpdateEntry {
        occi_id: COMPUTE.to_owned(),
        provider: ProviderUpdate {
            local: Some(local.iter().map(|s| (*s).to_owned()).collect()),
            remote: None,
        },
    }
}

// =============================================================================
// Updates
// =============================================================================

#[tokio::test]
async fn test_update_kind_description_and_provider() {
    let (router, store) = create_router();
    seed_categories(&router).await;
    let before = category(&store, COMPUTE);

    let request = UpdateRequest {
        kinds: Some(vec![compute().with_title("Compute resource")]),
        providers: Some(vec![provider_update(&["nova", "ironic"])]),
        ..UpdateRequest::default()
    };
    router.update_categories("alice", &request).await.unwrap();

    let after = category(&store, COMPUTE);
    assert_eq!(after.id, before.id);
    assert_eq!(after.creation_date, before.creation_date);
    assert!(after.last_update.is_some());
    let CategoryBody::Kind {
        description,
        provider,
        ..
    } = &after.body
    else {
        panic!("Expected kind body");
    };
    assert_eq!(description.title.as_deref(), Some("Compute resource"));
    assert_eq!(description.declared_actions(), &[START.to_owned()]);
    assert_eq!(
        provider.local.iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["ironic", "nova"]
    );
}

#[tokio::test]
async fn test_provider_merge_deduplicates() {
    let (router, store) = create_router();
    seed_categories(&router).await;

    for local in [&["nova"][..], &["nova", "ironic"][..]] {
        router
            .update_categories(
                "alice",
                &UpdateRequest {
                    providers: Some(vec![provider_update(local)]),
                    ..UpdateRequest::default()
                },
            )
            .await
            .unwrap();
    }

    let provider = category(&store, COMPUTE).provider().cloned().unwrap();
    assert_eq!(provider.local.len(), 2);
    assert!(provider.remote.is_empty());
}

#[tokio::test]
async fn test_update_by_non_creator_changes_nothing() {
    let (router, store) = create_router();
    seed_categories(&router).await;
    let before = category_docs(&store);

    let request = UpdateRequest {
        kinds: Some(vec![compute().with_title("Taken over")]),
        actions: Some(vec![start().with_title("Boot")]),
        ..UpdateRequest::default()
    };
    let err = router.update_categories("bob", &request).await.unwrap_err();

    assert_eq!(err.status(), StatusCode::BadRequest);
    assert_eq!(category_docs(&store), before);
}

#[tokio::test]
async fn test_update_unknown_category_is_rejected() {
    let (router, _store) = create_router();
    seed_categories(&router).await;

    let request = UpdateRequest {
        actions: Some(vec![ActionDescription::new("stop", "http://x/compute/action#")]),
        ..UpdateRequest::default()
    };
    let err = router.update_categories("alice", &request).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::BadRequest);
}

#[tokio::test]
async fn test_empty_provider_update_is_rejected() {
    let (router, _store) = create_router();
    seed_categories(&router).await;

    let request = UpdateRequest {
        providers: Some(vec![ProviderUpdateEntry {
            occi_id: COMPUTE.to_owned(),
            provider: ProviderUpdate::default(),
        }]),
        ..UpdateRequest::default()
    };
    let err = router.update_categories("alice", &request).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::BadRequest);
}

#[tokio::test]
async fn test_moves_to_one_location_in_one_request_are_rejected() {
    // Without write-time uniqueness only the registry keeps locations apart.
    let store = Arc::new(InMemoryDocumentStore::new(false));
    let router = CategoryRouter::new(store.clone(), "/");
    let storage = CategoryDescription::new("storage", "http://x/#").with_title("Storage");
    let storage_id = "http://x/#storage";
    router
        .register_categories(
            "alice",
            &CreateRequest {
                kinds: Some(vec![compute().with_location("/a/"), storage.with_location("/b/")]),
                mixins: Some(vec![small().with_location("/m/")]),
                actions: None,
            },
        )
        .await
        .unwrap();

    let moved_kinds = UpdateRequest {
        kinds: Some(vec![
            compute().with_location("/c/"),
            CategoryDescription::new("storage", "http://x/#").with_location("/c/"),
        ]),
        ..UpdateRequest::default()
    };
    let err = router.update_categories("alice", &moved_kinds).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::BadRequest);

    let kind_and_mixin = UpdateRequest {
        kinds: Some(vec![compute().with_location("/c/")]),
        mixins: Some(vec![small().with_location("/c/")]),
        ..UpdateRequest::default()
    };
    let err = router.update_categories("alice", &kind_and_mixin).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::BadRequest);

    assert_eq!(category(&store, COMPUTE).location(), Some("/a/"));
    assert_eq!(category(&store, storage_id).location(), Some("/b/"));
    assert_eq!(category(&store, SMALL).location(), Some("/m/"));
}

// =============================================================================
// Deletions
// =============================================================================

#[tokio::test]
async fn test_delete_categories_of_owner() {
    let (router, store) = create_router();
    seed_categories(&router).await;

    let request = DeleteRequest {
        mixins: Some(vec![small()]),
        actions: Some(vec![start()]),
        ..DeleteRequest::default()
    };
    router.delete_categories("alice", &request).await.unwrap();

    let remaining: Vec<_> = category_docs(&store).into_iter().map(|d| d.occi_id).collect();
    assert_eq!(remaining.len(), 2);
    assert!(!remaining.contains(&SMALL.to_owned()));
    assert!(!remaining.contains(&START.to_owned()));
}

#[tokio::test]
async fn test_delete_by_non_creator_is_rejected() {
    let (router, store) = create_router();
    seed_categories(&router).await;

    let err = router
        .delete_categories(
            "bob",
            &DeleteRequest {
                actions: Some(vec![start()]),
                ..DeleteRequest::default()
            },
        )
        .await
        .unwrap_err();

    assert_eq!(err.status(), StatusCode::BadRequest);
    assert_eq!(store.len(), 4);
}

#[tokio::test]
async fn test_kind_in_use_cannot_be_deleted() {
    let (router, store) = create_router();
    seed_categories(&router).await;
    let outcomes = router
        .register_resources("alice", "/compute/", &[ResourceDescription::new("vm0", COMPUTE)])
        .await
        .unwrap();
    assert!(outcomes[0].is_created());

    let err = router
        .delete_categories(
            "alice",
            &DeleteRequest {
                kinds: Some(vec![compute()]),
                ..DeleteRequest::default()
            },
        )
        .await
        .unwrap_err();

    assert_eq!(err.status(), StatusCode::BadRequest);
    assert_eq!(category_docs(&store).len(), 4);
}

#[tokio::test]
async fn test_deleting_mixin_strips_it_from_every_entity() {
    let (router, store) = create_router();
    seed_categories(&router).await;
    let descriptions = [
        ResourceDescription::new("vm0", COMPUTE).with_mixins(vec![SMALL.to_owned()]),
        ResourceDescription::new("vm1", COMPUTE).with_mixins(vec![SMALL.to_owned()]),
        ResourceDescription::new("vm2", COMPUTE),
    ];
    let outcomes = router
        .register_resources("alice", "/compute/", &descriptions)
        .await
        .unwrap();
    assert!(outcomes.iter().all(occi_registry::ResourceOutcome::is_created));

    router
        .delete_categories(
            "alice",
            &DeleteRequest {
                mixins: Some(vec![small()]),
                ..DeleteRequest::default()
            },
        )
        .await
        .unwrap();

    let entities = entity_docs(&store);
    assert_eq!(entities.len(), 3);
    assert!(entities.iter().all(|e| e.mixins().is_empty()));
    assert_eq!(entities.iter().filter(|e| e.last_update.is_some()).count(), 2);
}
