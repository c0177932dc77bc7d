//! In-memory `ObjectClient` / 内存对象存储
//!
//! Backs the driver and router tests; no network involved. Built for
//! `cfg(test)` and the `test-utils` feature only.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use parking_lot::Mutex;

use super::client::{ListPage, ObjectClient, ObjectHead, ObjectSummary};
use crate::storage::{StorageError, StorageResult};

#[derive(Clone, Default)]
pub struct MemoryClient {
    objects: Arc<Mutex<BTreeMap<String, Bytes>>>,
    fail_list: Arc<AtomicBool>,
}

impl MemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keys(keys: &[&str]) -> Self {
        let client = Self::new();
        for key in keys {
            client.insert(key, key.as_bytes());
        }
        client
    }

    pub fn insert(&self, key: &str, data: &[u8]) {
        self.objects
            .lock()
            .insert(key.to_string(), Bytes::copy_from_slice(data));
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().keys().cloned().collect()
    }

    pub fn data(&self, key: &str) -> Option<Bytes> {
        self.objects.lock().get(key).cloned()
    }

    /// Make the next list call fail like a rejected credential / 下一次列举失败
    pub fn fail_next_list(&self) {
        self.fail_list.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectClient for MemoryClient {
    async fn list(&self, prefix: &str, delimiter: Option<&str>) -> StorageResult<ListPage> {
        if self.fail_list.swap(false, Ordering::SeqCst) {
            return Err(StorageError::from_status("ListObjects", prefix, 403));
        }

        let objects = self.objects.lock();
        let mut page = ListPage::default();
        let mut prefixes = BTreeSet::new();

        for (key, data) in objects.range(prefix.to_string()..) {
            if !key.starts_with(prefix) {
                break;
            }
            let rest = &key[prefix.len()..];
            if let Some(delim) = delimiter {
                if let Some(pos) = rest.find(delim) {
                    prefixes.insert(format!("{}{}", prefix, &rest[..pos + delim.len()]));
                    continue;
                }
            }
            page.objects.push(ObjectSummary {
                key: key.clone(),
                size: data.len() as u64,
                last_modified: Some(Utc::now()),
            });
        }

        page.prefixes = prefixes.into_iter().collect();
        Ok(page)
    }

    async fn head(&self, key: &str) -> StorageResult<Option<ObjectHead>> {
        Ok(self.objects.lock().get(key).map(|data| ObjectHead {
            size: data.len() as u64,
            last_modified: Some(Utc::now()),
        }))
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        self.data(key)
            .ok_or_else(|| StorageError::from_status("GetObject", key, 404))
    }

    async fn put(&self, key: &str, data: &[u8], _content_type: &str) -> StorageResult<()> {
        self.insert(key, data);
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        // S3 DeleteObject succeeds for missing keys
        self.objects.lock().remove(key);
        Ok(())
    }

    async fn copy(&self, from: &str, to: &str) -> StorageResult<()> {
        let data = self.get(from).await?;
        self.objects.lock().insert(to.to_string(), data);
        Ok(())
    }

    async fn presign_get(&self, key: &str, expire_secs: u32) -> StorageResult<String> {
        Ok(format!("https://memory.local/{}?X-Amz-Expires={}", key, expire_secs))
    }
}
