use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{DriverInfo, StorageDriver, StorageError, StorageResult};
use crate::models::Credential;

pub type DriverBox = Arc<Box<dyn StorageDriver>>;

/// Driver factory trait / 驱动工厂 trait
pub trait DriverFactory: Send + Sync {
    /// Driver type name / 驱动类型名称
    fn driver_type(&self) -> &'static str;

    /// Connect form description / 连接表单描述
    fn driver_info(&self) -> DriverInfo;

    /// 创建驱动实例
    fn create_driver(&self, credential: &Credential) -> StorageResult<Box<dyn StorageDriver>>;
}

/// Storage manager (one driver instance per browser session) / 存储管理器
#[derive(Clone, Default)]
pub struct StorageManager {
    drivers: Arc<RwLock<HashMap<String, DriverBox>>>,
    factories: Arc<RwLock<HashMap<String, Arc<Box<dyn DriverFactory>>>>>,
}

impl StorageManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register driver factory / 注册驱动工厂
    pub async fn register_factory(&self, factory: Box<dyn DriverFactory>) {
        let driver_type = factory.driver_type().to_string();
        let mut factories = self.factories.write().await;
        factories.insert(driver_type.clone(), Arc::new(factory));
        tracing::info!("Driver factory registered: {}", driver_type);
    }

    /// Connect form descriptions of all registered drivers / 所有驱动的表单描述
    pub async fn driver_infos(&self) -> Vec<DriverInfo> {
        let factories = self.factories.read().await;
        let mut infos: Vec<DriverInfo> = factories.values().map(|f| f.driver_info()).collect();
        infos.sort_by(|a, b| a.driver_type.cmp(&b.driver_type));
        infos
    }

    /// Create driver instance and verify it by listing the bucket root / 创建驱动并验证
    ///
    /// A driver that fails verification is not kept.
    pub async fn create_driver(
        &self,
        id: &str,
        driver_type: &str,
        credential: &Credential,
    ) -> StorageResult<DriverBox> {
        let driver = {
            let factories = self.factories.read().await;
            let factory = factories
                .get(driver_type)
                .ok_or_else(|| StorageError::InvalidRequest(format!("driver type not found: {}", driver_type)))?;
            factory.create_driver(credential)?
        };

        if let Err(e) = driver.list("/").await {
            tracing::warn!("Driver verification failed: {} ({:?}) - {}", driver_type, credential, e);
            return Err(e);
        }

        tracing::info!("Driver created and verified: bucket={} ({})", credential.bucket, driver_type);
        Ok(self.insert_driver(id, driver).await)
    }

    /// Keep a driver instance under an id, replacing any previous one / 保存驱动实例
    pub async fn insert_driver(&self, id: &str, driver: Box<dyn StorageDriver>) -> DriverBox {
        let driver_box: DriverBox = Arc::new(driver);
        self.drivers.write().await.insert(id.to_string(), driver_box.clone());
        driver_box
    }

    /// Get driver instance / 获取驱动实例
    pub async fn get_driver(&self, id: &str) -> Option<DriverBox> {
        self.drivers.read().await.get(id).cloned()
    }

    /// Ids of all live driver instances / 所有驱动实例的ID
    pub async fn driver_ids(&self) -> Vec<String> {
        self.drivers.read().await.keys().cloned().collect()
    }

    /// Remove driver instance / 移除驱动实例
    pub async fn remove_driver(&self, id: &str) -> bool {
        self.drivers.write().await.remove(id).is_some()
    }
}
