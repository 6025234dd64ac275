use crate::core::config::{Config, StoreBackend};
use crate::core::Result;
use crate::db::repository::{MenuItemRepository, RestaurantRepository};
use crate::db::{
    DocumentStore, LocalObjectStore, MemoryObjectStore, MemoryStore, ObjectStore, RedbStore,
};
use crate::migration::MigrationEngine;
use crate::services::ImageUploadService;
use shared::util::ServerClock;
use std::path::PathBuf;
use std::sync::Arc;

/// 服务器状态 - 所有 handler 共享
///
/// Cloning is cheap: every member is reference counted. The document store
/// is injected here and nowhere else.
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub restaurants: RestaurantRepository,
    pub menu_items: MenuItemRepository,
    pub images: ImageUploadService,
    pub migration: Arc<MigrationEngine>,
    /// Directory served under `/files` (local object store only)
    pub files_dir: Option<PathBuf>,
}

impl ServerState {
    /// Wire repositories and services onto the given stores
    pub fn with_stores(
        config: Config,
        store: Arc<dyn DocumentStore>,
        objects: Arc<dyn ObjectStore>,
        files_dir: Option<PathBuf>,
    ) -> Self {
        let clock = Arc::new(ServerClock::new());
        Self {
            restaurants: RestaurantRepository::new(store.clone(), clock.clone()),
            menu_items: MenuItemRepository::new(store.clone(), clock.clone(), config.menu_layout),
            images: ImageUploadService::new(objects, clock),
            migration: Arc::new(MigrationEngine::new(store, config.migration())),
            files_dir,
            config,
        }
    }

    /// 按配置初始化存储并构建状态
    pub fn initialize(config: &Config) -> Result<Self> {
        match config.store_backend {
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory store, data is lost on exit");
                Ok(Self::with_stores(
                    config.clone(),
                    Arc::new(MemoryStore::new()),
                    Arc::new(MemoryObjectStore::new(config.public_base_url.clone())),
                    None,
                ))
            }
            StoreBackend::Redb => {
                std::fs::create_dir_all(&config.data_dir)?;
                let objects_dir = config.objects_dir();
                std::fs::create_dir_all(&objects_dir)?;

                let db_path = config.database_path();
                let store = RedbStore::open(&db_path)?;
                tracing::info!(path = %db_path.display(), "Document store opened (redb)");

                Ok(Self::with_stores(
                    config.clone(),
                    Arc::new(store),
                    Arc::new(LocalObjectStore::new(
                        objects_dir.clone(),
                        config.public_base_url.clone(),
                    )),
                    Some(objects_dir),
                ))
            }
        }
    }
}
