use sqlx::SqlitePool;

use bucketdesk::config::AppConfig;
use bucketdesk::storage::StorageManager;

/// Shared application state / 应用共享状态
pub struct AppState {
    pub db: SqlitePool,
    pub storage_manager: StorageManager,
    pub config: AppConfig,
}
