//! S3驱动核心实现
//!
//! 设计原则：
//! - 目录由 `/` 分隔的前缀模拟，空目录用 `prefix/` 空对象占位
//! - 重命名 = 复制 + 删除，目录重命名逐个对象复制
//! - 所有批量操作都是顺序循环，遇到第一个错误即返回

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;

use super::client::ObjectClient;
use crate::models::FileEntry;
use crate::storage::{StorageDriver, StorageError, StorageResult};
use crate::utils::{
    file_name, join_path, normalize_path, parent_path, path_to_key, path_to_prefix,
    rename_target, validate_name,
};

/// S3 presigned URLs are valid for at most 7 days / 预签名URL最长7天
pub const MAX_PRESIGN_SECS: u64 = 7 * 24 * 3600;

const DIRECTORY_CONTENT_TYPE: &str = "application/x-directory";

/// S3驱动
pub struct S3Driver<C: ObjectClient> {
    client: C,
}

impl<C: ObjectClient> S3Driver<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Whether any key exists under the prefix / 前缀下是否存在对象
    async fn prefix_exists(&self, prefix: &str) -> StorageResult<bool> {
        let page = self.client.list(prefix, Some("/")).await?;
        Ok(!page.objects.is_empty() || !page.prefixes.is_empty())
    }

    /// A path is taken if either a file or a folder lives there / 路径是否已被占用
    async fn path_taken(&self, path: &str) -> StorageResult<bool> {
        if self.client.head(&path_to_key(path)).await?.is_some() {
            return Ok(true);
        }
        self.prefix_exists(&path_to_prefix(path)).await
    }

    /// Copy then verify the new object exists / 复制并验证
    async fn copy_verified(&self, src_key: &str, dst_key: &str) -> StorageResult<()> {
        self.client.copy(src_key, dst_key).await?;
        if self.client.head(dst_key).await?.is_none() {
            return Err(StorageError::Backend(format!(
                "copy {} -> {} finished but target is missing",
                src_key, dst_key
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl<C: ObjectClient + 'static> StorageDriver for S3Driver<C> {
    fn name(&self) -> &str {
        "S3"
    }

    async fn list(&self, path: &str) -> StorageResult<Vec<FileEntry>> {
        let prefix = path_to_prefix(path);
        let page = self.client.list(&prefix, Some("/")).await?;

        let mut has_marker = false;
        let mut entries = Vec::new();

        // 处理目录（公共前缀）
        for cp in &page.prefixes {
            if cp == &prefix || !cp.starts_with(&prefix) {
                continue;
            }
            // one level down; "data//" under "data/" is a folder with an empty name
            let rest = &cp[prefix.len()..];
            if rest.strip_suffix('/').unwrap_or(rest).contains('/') {
                continue;
            }
            entries.push(FileEntry::folder(cp, None));
        }

        // 处理文件
        for obj in &page.objects {
            if obj.key == prefix {
                has_marker = true;
                continue;
            }
            if !obj.key.starts_with(&prefix) || obj.key.ends_with('/') {
                continue;
            }
            if obj.key[prefix.len()..].contains('/') {
                continue;
            }
            entries.push(FileEntry::file(&obj.key, obj.size, obj.last_modified));
        }

        if entries.is_empty() && !has_marker && !prefix.is_empty() {
            return Err(StorageError::NotFound(normalize_path(path)));
        }

        tracing::debug!("S3 list: prefix={}, entries={}", prefix, entries.len());
        Ok(entries)
    }

    async fn list_recursive(&self, path: &str) -> StorageResult<Vec<FileEntry>> {
        let prefix = path_to_prefix(path);
        let page = self.client.list(&prefix, None).await?;

        let entries = page
            .objects
            .iter()
            .filter(|obj| obj.key != prefix && obj.key.starts_with(&prefix))
            .map(|obj| {
                if obj.key.ends_with('/') {
                    FileEntry::folder(&obj.key, obj.last_modified)
                } else {
                    FileEntry::file(&obj.key, obj.size, obj.last_modified)
                }
            })
            .collect();
        Ok(entries)
    }

    async fn stat(&self, path: &str) -> StorageResult<FileEntry> {
        let key = path_to_key(path);
        if key.is_empty() {
            return Ok(FileEntry::folder("", None));
        }

        if let Some(head) = self.client.head(&key).await? {
            return Ok(FileEntry::file(&key, head.size, head.last_modified));
        }

        let prefix = path_to_prefix(path);
        let marker = self.client.head(&prefix).await?;
        if marker.is_some() || self.prefix_exists(&prefix).await? {
            return Ok(FileEntry::folder(&prefix, marker.and_then(|m| m.last_modified)));
        }

        Err(StorageError::NotFound(normalize_path(path)))
    }

    async fn read(&self, path: &str) -> StorageResult<Bytes> {
        let key = path_to_key(path);
        if key.is_empty() {
            return Err(StorageError::InvalidRequest("cannot read the bucket root".to_string()));
        }
        self.read_key(&key).await
    }

    async fn read_key(&self, key: &str) -> StorageResult<Bytes> {
        self.client.get(key).await
    }

    async fn put(&self, path: &str, data: Bytes, content_type: &str) -> StorageResult<FileEntry> {
        let key = path_to_key(path);
        validate_name(&file_name(&key)).map_err(StorageError::InvalidName)?;

        self.client.put(&key, &data, content_type).await?;
        tracing::debug!("S3 put: key={}, size={}", key, data.len());
        Ok(FileEntry::file(&key, data.len() as u64, Some(Utc::now())))
    }

    async fn delete(&self, path: &str) -> StorageResult<u64> {
        let key = path_to_key(path);
        if key.is_empty() {
            return Err(StorageError::InvalidRequest("refusing to delete the bucket root".to_string()));
        }

        // 先尝试作为文件删除
        if self.client.head(&key).await?.is_some() {
            self.client.delete(&key).await?;
            tracing::debug!("S3 delete file: key={}", key);
            return Ok(1);
        }

        // 递归删除目录，包括占位对象
        let prefix = path_to_prefix(path);
        let page = self.client.list(&prefix, None).await?;
        if page.objects.is_empty() {
            return Err(StorageError::NotFound(normalize_path(path)));
        }

        let mut removed = 0u64;
        for obj in page.objects.iter().filter(|o| o.key.starts_with(&prefix)) {
            self.client.delete(&obj.key).await?;
            removed += 1;
        }
        tracing::debug!("S3 delete folder: prefix={}, objects={}", prefix, removed);
        Ok(removed)
    }

    async fn create_dir(&self, path: &str) -> StorageResult<FileEntry> {
        let prefix = path_to_prefix(path);
        if prefix.is_empty() {
            return Err(StorageError::AlreadyExists("/".to_string()));
        }
        validate_name(&file_name(&prefix)).map_err(StorageError::InvalidName)?;

        if self.path_taken(path).await? {
            return Err(StorageError::AlreadyExists(normalize_path(path)));
        }

        self.client.put(&prefix, &[], DIRECTORY_CONTENT_TYPE).await?;
        tracing::debug!("S3 create folder: marker={}", prefix);
        Ok(FileEntry::folder(&prefix, Some(Utc::now())))
    }

    async fn rename(&self, path: &str, new_name: &str) -> StorageResult<FileEntry> {
        let path = normalize_path(path);
        if path == "/" {
            return Err(StorageError::InvalidRequest("cannot rename the bucket root".to_string()));
        }

        let current = self.stat(&path).await?;
        let target_name = rename_target(&current.name, new_name, current.is_folder())
            .map_err(StorageError::InvalidName)?;
        if target_name == current.name {
            return Ok(current);
        }

        let new_path = join_path(&parent_path(&path), &target_name);
        if self.path_taken(&new_path).await? {
            return Err(StorageError::AlreadyExists(new_path));
        }

        if !current.is_folder() {
            let old_key = path_to_key(&path);
            let new_key = path_to_key(&new_path);
            tracing::debug!("S3重命名: old_key={}, new_key={}", old_key, new_key);

            self.copy_verified(&old_key, &new_key).await?;
            self.client.delete(&old_key).await?;
            return self.stat(&new_path).await;
        }

        let old_prefix = path_to_prefix(&path);
        let new_prefix = path_to_prefix(&new_path);
        let page = self.client.list(&old_prefix, None).await?;
        let keys: Vec<&str> = page
            .objects
            .iter()
            .map(|o| o.key.as_str())
            .filter(|k| k.starts_with(&old_prefix))
            .collect();

        tracing::debug!("S3目录重命名: {} -> {}, objects={}", old_prefix, new_prefix, keys.len());

        // 先全部复制，再删除源对象
        for key in &keys {
            let dst = format!("{}{}", new_prefix, &key[old_prefix.len()..]);
            self.copy_verified(key, &dst).await?;
        }
        for key in &keys {
            self.client.delete(key).await?;
        }

        self.stat(&new_path).await
    }

    async fn presign(&self, path: &str, expire_secs: u64) -> StorageResult<String> {
        let key = path_to_key(path);
        if key.is_empty() {
            return Err(StorageError::InvalidRequest("cannot share the bucket root".to_string()));
        }
        if self.client.head(&key).await?.is_none() {
            return Err(StorageError::NotFound(normalize_path(path)));
        }

        let expire_secs = expire_secs.clamp(1, MAX_PRESIGN_SECS) as u32;
        self.client.presign_get(&key, expire_secs).await
    }
}
