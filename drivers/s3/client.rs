//! S3对象客户端
//!
//! `ObjectClient` is the seam between directory semantics (driver.rs) and
//! the flat object API. `BucketClient` delegates every call to rust-s3,
//! which signs the requests.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use s3::bucket::Bucket;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::Region;

use crate::models::{parse_s3_time, Credential};
use crate::storage::{StorageError, StorageResult};

/// One object of a listing / 列表中的对象
#[derive(Debug, Clone)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Result of a prefix listing / 前缀列举结果
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    pub objects: Vec<ObjectSummary>,
    /// Common prefixes (only with a delimiter), each ends with the delimiter / 公共前缀
    pub prefixes: Vec<String>,
}

/// HEAD result / 对象元信息
#[derive(Debug, Clone)]
pub struct ObjectHead {
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Flat object API / 对象存储原语
#[async_trait]
pub trait ObjectClient: Send + Sync {
    /// List keys under prefix, grouping by delimiter when given / 按前缀列举
    async fn list(&self, prefix: &str, delimiter: Option<&str>) -> StorageResult<ListPage>;

    /// None when the object does not exist / 对象不存在时返回None
    async fn head(&self, key: &str) -> StorageResult<Option<ObjectHead>>;

    async fn get(&self, key: &str) -> StorageResult<Bytes>;

    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> StorageResult<()>;

    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Server side copy / 服务端复制
    async fn copy(&self, from: &str, to: &str) -> StorageResult<()>;

    async fn presign_get(&self, key: &str, expire_secs: u32) -> StorageResult<String>;
}

/// rust-s3 backed client / 基于rust-s3的客户端
pub struct BucketClient {
    bucket: Box<Bucket>,
}

impl BucketClient {
    /// 创建S3 Bucket客户端
    pub fn from_credential(credential: &Credential) -> StorageResult<Self> {
        let credentials = Credentials::new(
            Some(&credential.access_key_id),
            Some(&credential.secret_access_key),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::backend("create credentials", e))?;

        let endpoint = if credential.endpoint.is_empty() {
            format!("https://s3.{}.amazonaws.com", credential.region)
        } else {
            credential.endpoint.clone()
        };
        let region = Region::Custom {
            region: credential.region.clone(),
            endpoint,
        };

        let bucket = Bucket::new(&credential.bucket, region, credentials)
            .map_err(|e| StorageError::backend("create bucket client", e))?;

        let bucket = if credential.path_style {
            bucket.with_path_style()
        } else {
            bucket
        };

        Ok(Self { bucket })
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

#[async_trait]
impl ObjectClient for BucketClient {
    async fn list(&self, prefix: &str, delimiter: Option<&str>) -> StorageResult<ListPage> {
        // rust-s3 follows continuation tokens and returns every page
        let results = self
            .bucket
            .list(prefix.to_string(), delimiter.map(|d| d.to_string()))
            .await
            .map_err(|e| StorageError::backend("ListObjects", e))?;

        let mut page = ListPage::default();
        for result in results {
            for cp in result.common_prefixes.unwrap_or_default() {
                page.prefixes.push(cp.prefix);
            }
            for obj in result.contents {
                page.objects.push(ObjectSummary {
                    last_modified: parse_s3_time(&obj.last_modified),
                    size: obj.size as u64,
                    key: obj.key,
                });
            }
        }
        Ok(page)
    }

    async fn head(&self, key: &str) -> StorageResult<Option<ObjectHead>> {
        match self.bucket.head_object(key).await {
            Ok((head, 200)) => Ok(Some(ObjectHead {
                size: head.content_length.unwrap_or(0).max(0) as u64,
                last_modified: head.last_modified.as_deref().and_then(parse_s3_time),
            })),
            Ok((_, 404)) | Err(S3Error::HttpFailWithBody(404, _)) => Ok(None),
            Ok((_, code)) => Err(StorageError::from_status("HeadObject", key, code)),
            Err(e) => Err(StorageError::backend("HeadObject", e)),
        }
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        let response = self
            .bucket
            .get_object(key)
            .await
            .map_err(|e| StorageError::backend("GetObject", e))?;
        if !is_success(response.status_code()) {
            return Err(StorageError::from_status("GetObject", key, response.status_code()));
        }
        Ok(response.bytes().clone())
    }

    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> StorageResult<()> {
        let response = self
            .bucket
            .put_object_with_content_type(key, data, content_type)
            .await
            .map_err(|e| StorageError::backend("PutObject", e))?;
        if !is_success(response.status_code()) {
            return Err(StorageError::from_status("PutObject", key, response.status_code()));
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let response = self
            .bucket
            .delete_object(key)
            .await
            .map_err(|e| StorageError::backend("DeleteObject", e))?;
        if !is_success(response.status_code()) {
            return Err(StorageError::from_status("DeleteObject", key, response.status_code()));
        }
        Ok(())
    }

    async fn copy(&self, from: &str, to: &str) -> StorageResult<()> {
        // copy_object_internal的from参数需要URL编码（中文等非ASCII字符）
        let encoded_src = urlencoding::encode(from);
        tracing::debug!("S3 CopyObject: src_key={}, encoded={}, dst_key={}", from, encoded_src, to);

        let status = self
            .bucket
            .copy_object_internal(&encoded_src, to)
            .await
            .map_err(|e| StorageError::backend("CopyObject", e))?;
        if !is_success(status) {
            return Err(StorageError::from_status("CopyObject", from, status));
        }
        Ok(())
    }

    async fn presign_get(&self, key: &str, expire_secs: u32) -> StorageResult<String> {
        self.bucket
            .presign_get(key, expire_secs, None)
            .await
            .map_err(|e| StorageError::backend("presign", e))
    }
}
