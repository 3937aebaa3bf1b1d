use crate::catalog::CatalogStore;
use crate::content::{ContentRepository, ContentStore};
use crate::server_store::ServerStore;
use crate::user::UserStore;
use axum::extract::FromRef;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone)]
pub struct ServerState {
    pub start_time: Instant,
    pub user_store: Arc<dyn UserStore>,
    pub catalog_store: Arc<dyn CatalogStore>,
    pub content_store: Arc<dyn ContentStore>,
    pub server_store: Arc<dyn ServerStore>,
    pub uploads_dir: PathBuf,
}

impl ServerState {
    pub fn content_repository(&self) -> ContentRepository {
        ContentRepository::new(self.content_store.clone())
    }
}

impl FromRef<ServerState> for Arc<dyn UserStore> {
    fn from_ref(input: &ServerState) -> Self {
        input.user_store.clone()
    }
}

impl FromRef<ServerState> for Arc<dyn CatalogStore> {
    fn from_ref(input: &ServerState) -> Self {
        input.catalog_store.clone()
    }
}

impl FromRef<ServerState> for Arc<dyn ContentStore> {
    fn from_ref(input: &ServerState) -> Self {
        input.content_store.clone()
    }
}

impl FromRef<ServerState> for Arc<dyn ServerStore> {
    fn from_ref(input: &ServerState) -> Self {
        input.server_store.clone()
    }
}
