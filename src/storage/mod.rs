use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::models::FileEntry;

/// Configuration item definition (rendered as a connect form field) / 配置项定义
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigItem {
    pub name: String,
    /// Display title (friendly name) / 显示标题
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl ConfigItem {
    pub fn new(name: &str, item_type: &str) -> Self {
        Self {
            name: name.to_string(),
            title: None,
            item_type: item_type.to_string(),
            default: None,
            required: false,
            help: None,
        }
    }

    pub fn title(mut self, val: &str) -> Self {
        self.title = Some(val.to_string());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default(mut self, val: &str) -> Self {
        self.default = Some(val.to_string());
        self
    }

    pub fn help(mut self, val: &str) -> Self {
        self.help = Some(val.to_string());
        self
    }
}

/// Connect form description of a driver type / 驱动连接表单信息
#[derive(Debug, Clone, Serialize)]
pub struct DriverInfo {
    pub driver_type: String,
    pub display_name: String,
    pub items: Vec<ConfigItem>,
}

/// Storage driver interface / 存储驱动接口
///
/// Paths are UI paths (`/`-rooted). Every call is a single request or a
/// sequential loop of requests against the backend; nothing is cached.
#[async_trait]
pub trait StorageDriver: Send + Sync {
    /// Driver name / 驱动名称
    fn name(&self) -> &str;

    /// List direct children of a folder / 列出目录内容
    async fn list(&self, path: &str) -> StorageResult<Vec<FileEntry>>;

    /// List every object below a folder / 递归列出目录下所有对象
    async fn list_recursive(&self, path: &str) -> StorageResult<Vec<FileEntry>>;

    /// Get a single entry / 获取单个条目
    async fn stat(&self, path: &str) -> StorageResult<FileEntry>;

    /// Read whole object / 读取对象内容
    async fn read(&self, path: &str) -> StorageResult<Bytes>;

    /// Read an object by its raw key, as returned in `FileEntry::key` / 按对象键读取
    async fn read_key(&self, key: &str) -> StorageResult<Bytes>;

    /// Put complete file data / 上传完整文件
    async fn put(&self, path: &str, data: Bytes, content_type: &str) -> StorageResult<FileEntry>;

    /// Delete file or folder, returns removed object count / 删除文件或目录
    async fn delete(&self, path: &str) -> StorageResult<u64>;

    /// Create folder / 创建目录
    async fn create_dir(&self, path: &str) -> StorageResult<FileEntry>;

    /// Rename file or folder in place / 重命名文件或目录
    async fn rename(&self, path: &str, new_name: &str) -> StorageResult<FileEntry>;

    /// Presigned download URL / 生成预签名下载链接
    async fn presign(&self, path: &str, expire_secs: u64) -> StorageResult<String>;
}

pub mod error;
pub mod manager;

pub use error::{StorageError, StorageResult};
pub use manager::{DriverBox, DriverFactory, StorageManager};
