use std::sync::Arc;

use tracing::info;

use shared_config::{AppConfig, StorageBackend};

use crate::memory::MemoryStore;
use crate::repository::Repositories;
use crate::supabase_store::SupabaseStore;

/// Router state shared by every cell.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub repos: Repositories,
}

impl AppState {
    /// Builds repositories for the configured storage backend.
    pub fn from_config(config: AppConfig) -> Self {
        let repos = match config.storage {
            StorageBackend::Memory => {
                info!("Using in-memory storage");
                Repositories::from_store(MemoryStore::new())
            }
            StorageBackend::Supabase => {
                info!("Using Supabase storage at {}", config.supabase_url);
                Repositories::from_store(SupabaseStore::new(&config))
            }
        };
        Self::with_repositories(config, repos)
    }

    pub fn with_repositories(config: AppConfig, repos: Repositories) -> Self {
        Self {
            config: Arc::new(config),
            repos,
        }
    }
}
