pub mod auth;
pub mod automation;
pub mod catalog;
pub mod config;
pub mod documents;
pub mod grants;
pub mod health;
pub mod rest;
pub mod seed;
pub mod storage;
pub mod whatsapp;

use anyhow::Result;
use std::sync::Arc;

use auth::AuthKeys;
use catalog::{ServiceCatalog, SupplierDirectory};
use config::PortalConfig;
use documents::{DocumentStore, LocalDiskStore};
use storage::Storage;
use whatsapp::{transport, ChatRouter, InMemorySessionStore};

/// Shared application state passed to every route handler and background task.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<PortalConfig>,
    pub storage: Arc<Storage>,
    pub auth: Arc<AuthKeys>,
    pub catalog: Arc<ServiceCatalog>,
    pub suppliers: Arc<SupplierDirectory>,
    pub documents: Arc<dyn DocumentStore>,
    pub chat: Arc<ChatRouter>,
    pub started_at: std::time::Instant,
}

impl AppContext {
    /// Wire the portal together: storage, auth keys, catalog, blob store,
    /// and the chat router with its in-memory session store.
    pub async fn initialize(config: PortalConfig) -> Result<Arc<Self>> {
        let storage = Arc::new(Storage::new(&config.data_dir).await?);
        let auth = Arc::new(AuthKeys::new(&config.auth));
        let catalog = Arc::new(ServiceCatalog::default_catalog());
        let suppliers = Arc::new(SupplierDirectory::embedded()?);
        let documents: Arc<dyn DocumentStore> =
            Arc::new(LocalDiskStore::new(config.uploads_dir.clone()));

        let chat = Arc::new(ChatRouter::new(
            catalog.clone(),
            Arc::new(InMemorySessionStore::new()),
            transport::from_config(&config.whatsapp),
        ));

        Ok(Arc::new(Self {
            config: Arc::new(config),
            storage,
            auth,
            catalog,
            suppliers,
            documents,
            chat,
            started_at: std::time::Instant::now(),
        }))
    }
}
