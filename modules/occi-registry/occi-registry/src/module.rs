//! Module declaration for the OCCI Registry module.

use std::sync::Arc;

use occi_registry_sdk::OcciRegistryApi;
use tracing::{debug, info};

use crate::config::{self, OcciRegistryConfig};
use crate::domain::repo::DocumentStore;
use crate::domain::router::CategoryRouter;
use crate::infra::InMemoryDocumentStore;
use crate::local_client::OcciRegistryLocalClient;

/// OCCI Registry module.
///
/// Owns the category router and the document store it runs on. Other
/// components reach the registry through [`OcciRegistryModule::client`].
pub struct OcciRegistryModule {
    config: OcciRegistryConfig,
    router: Arc<CategoryRouter>,
}

impl OcciRegistryModule {
    /// Initializes logging and wires the registry over an in-memory store.
    #[must_use]
    pub fn init(cfg: &OcciRegistryConfig) -> Self {
        if !config::init_logging(&cfg.log_filter) {
            debug!("Global tracing subscriber already installed");
        }
        let store = Arc::new(InMemoryDocumentStore::new(cfg.enforce_unique_on_write));
        Self::with_store(cfg.clone(), store)
    }

    /// Wires the registry over `store`.
    #[must_use]
    pub fn with_store(cfg: OcciRegistryConfig, store: Arc<dyn DocumentStore>) -> Self {
        info!("Initializing occi_registry module");
        debug!(
            location_root = %cfg.location_root,
            enforce_unique_on_write = cfg.enforce_unique_on_write,
            "Loaded occi_registry config"
        );

        let router = Arc::new(CategoryRouter::new(store, &cfg.location_root));

        info!("OCCI registry module initialized");
        Self {
            config: cfg,
            router,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &OcciRegistryConfig {
        &self.config
    }

    #[must_use]
    pub fn router(&self) -> Arc<CategoryRouter> {
        Arc::clone(&self.router)
    }

    /// Client handle for in-process callers.
    #[must_use]
    pub fn client(&self) -> Arc<dyn OcciRegistryApi> {
        Arc::new(OcciRegistryLocalClient::new(self.router()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use occi_registry_sdk::{CategoryDescription, CreateRequest};

    #[tokio::test]
    async fn test_client_uses_configured_location_root() {
        let cfg = OcciRegistryConfig {
            location_root: "/occi".to_owned(),
            ..OcciRegistryConfig::default()
        };
        let store = Arc::new(InMemoryDocumentStore::default());
        let module = OcciRegistryModule::with_store(cfg, store.clone());

        module
            .client()
            .register_categories(
                "alice",
                CreateRequest {
                    kinds: Some(vec![CategoryDescription::new("compute", "http://x/#")]),
                    ..CreateRequest::default()
                },
            )
            .await
            .unwrap();

        let outcomes = module
            .router()
            .register_resources("alice", "/occi/compute/", &[])
            .await
            .unwrap();
        assert!(outcomes.is_empty());
        assert_eq!(store.len(), 1);
        assert_eq!(module.config().location_root, "/occi");
    }

    #[tokio::test]
    async fn test_init_builds_in_memory_registry() {
        let module = OcciRegistryModule::init(&OcciRegistryConfig::default());
        let listing = module.client().get_all_categories().await.unwrap();
        assert!(listing.kinds.is_empty());
    }
}
