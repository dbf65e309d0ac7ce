//! Local client implementing the `OcciRegistryApi` trait.

use std::sync::Arc;

use async_trait::async_trait;
use occi_registry_sdk::{
    CategoryListing, CreateRequest, DeleteRequest, FilterRequest, OcciRegistryApi,
    OcciRegistryError, ResourceDescription, ResourceOutcome, UpdateRequest,
};

use crate::domain::router::CategoryRouter;

/// Local client for the OCCI Registry module.
///
/// This client implements the `OcciRegistryApi` trait and delegates
/// to the category router.
pub struct OcciRegistryLocalClient {
    router: Arc<CategoryRouter>,
}

impl OcciRegistryLocalClient {
    /// Creates a new local client over the given router.
    #[must_use]
    pub fn new(router: Arc<CategoryRouter>) -> Self {
        Self { router }
    }
}

#[async_trait]
impl OcciRegistryApi for OcciRegistryLocalClient {
    async fn register_categories(
        &self,
        user_id: &str,
        request: CreateRequest,
    ) -> Result<(), OcciRegistryError> {
        self.router
            .register_categories(user_id, &request)
            .await
            .map_err(OcciRegistryError::from)
    }

    async fn get_all_categories(&self) -> Result<CategoryListing, OcciRegistryError> {
        self.router
            .get_all_categories()
            .await
            .map_err(OcciRegistryError::from)
    }

    async fn get_filtered_categories(
        &self,
        request: FilterRequest,
    ) -> Result<CategoryListing, OcciRegistryError> {
        self.router
            .get_filtered_categories(&request)
            .await
            .map_err(OcciRegistryError::from)
    }

    async fn update_categories(
        &self,
        user_id: &str,
        request: UpdateRequest,
    ) -> Result<(), OcciRegistryError> {
        self.router
            .update_categories(user_id, &request)
            .await
            .map_err(OcciRegistryError::from)
    }

    async fn delete_categories(
        &self,
        user_id: &str,
        request: DeleteRequest,
    ) -> Result<(), OcciRegistryError> {
        self.router
            .delete_categories(user_id, &request)
            .await
            .map_err(OcciRegistryError::from)
    }

    async fn register_resources(
        &self,
        user_id: &str,
        kind_location: &str,
        descriptions: Vec<ResourceDescription>,
    ) -> Result<Vec<ResourceOutcome>, OcciRegistryError> {
        self.router
            .register_resources(user_id, kind_location, &descriptions)
            .await
            .map_err(OcciRegistryError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::InMemoryDocumentStore;
    use occi_registry_sdk::{
        CategoryDescription, CategoryFilter, RegistryResponse, ResponseBody, StatusCode,
    };

    fn create_client() -> OcciRegistryLocalClient {
        let store = Arc::new(InMemoryDocumentStore::default());
        OcciRegistryLocalClient::new(Arc::new(CategoryRouter::new(store, "/")))
    }

    fn compute_request() -> CreateRequest {
        CreateRequest {
            kinds: Some(vec![CategoryDescription::new("compute", "http://x/#")]),
            ..CreateRequest::default()
        }
    }

    #[tokio::test]
    async fn test_register_and_list() {
        let client = create_client();
        client
            .register_categories("alice", compute_request())
            .await
            .unwrap();

        let all = client.get_all_categories().await.unwrap();
        assert_eq!(all.kinds.len(), 1);
        assert_eq!(all.kinds[0].term, "compute");

        let filtered = client
            .get_filtered_categories(FilterRequest {
                kinds: Some(vec![CategoryFilter::by_term("storage")]),
                ..FilterRequest::default()
            })
            .await
            .unwrap();
        assert!(filtered.kinds.is_empty());
    }

    #[tokio::test]
    async fn test_errors_map_to_sdk_errors() {
        let client = create_client();
        client
            .register_categories("alice", compute_request())
            .await
            .unwrap();

        let err = client
            .register_categories("alice", compute_request())
            .await
            .unwrap_err();
        assert!(err.is_bad_request());

        let err = client
            .register_resources("alice", "/storage/", Vec::new())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_results_convert_to_responses() {
        let client = create_client();
        let created = RegistryResponse::from(client.register_categories("alice", compute_request()).await);
        assert_eq!(created, RegistryResponse::ok(()));

        let listing = RegistryResponse::from(client.get_all_categories().await);
        assert_eq!(listing.status, StatusCode::Ok);
        let ResponseBody::Result(listing) = listing.body else {
            panic!("Expected a listing");
        };
        assert_eq!(listing.kinds.len(), 1);

        let duplicate = RegistryResponse::from(client.register_categories("bob", compute_request()).await);
        assert_eq!(duplicate.status, StatusCode::BadRequest);
        assert_eq!(
            duplicate.body,
            ResponseBody::ErrorMessage(crate::domain::router::GENERIC_ERROR_MESSAGE.to_owned())
        );
    }
}
