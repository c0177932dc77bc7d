use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::{file_name, get_ext, key_to_path};

/// Bucket credential entered on the connect form / 连接表单提交的凭证
#[derive(Clone, Serialize, Deserialize)]
pub struct Credential {
    pub access_key_id: String,
    pub secret_access_key: String,
    #[serde(default)]
    pub region: String,
    pub bucket: String,
    /// Custom endpoint for S3 compatible services (MinIO, OSS, R2 ...) / 自定义端点
    #[serde(default)]
    pub endpoint: String,
    /// Path style addressing / 路径风格访问
    #[serde(default)]
    pub path_style: bool,
}

// Secret must never end up in logs / 密钥不输出到日志
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***")
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint)
            .field("path_style", &self.path_style)
            .finish()
    }
}

impl Credential {
    /// Fill defaults and trim user input / 填充默认值
    pub fn normalized(mut self, default_region: &str) -> Self {
        self.access_key_id = self.access_key_id.trim().to_string();
        self.secret_access_key = self.secret_access_key.trim().to_string();
        self.bucket = self.bucket.trim().to_string();
        self.endpoint = self.endpoint.trim().trim_end_matches('/').to_string();
        self.region = self.region.trim().to_string();
        if self.region.is_empty() {
            self.region = default_region.to_string();
        }
        self
    }

    /// Required field check / 必填项检查
    pub fn validate(&self) -> Result<(), String> {
        if self.access_key_id.is_empty() {
            return Err("Access Key ID is required".to_string());
        }
        if self.secret_access_key.is_empty() {
            return Err("Secret Access Key is required".to_string());
        }
        if self.bucket.is_empty() {
            return Err("Bucket is required".to_string());
        }
        if !self.endpoint.is_empty()
            && !self.endpoint.starts_with("http://")
            && !self.endpoint.starts_with("https://")
        {
            return Err("Endpoint must start with http:// or https://".to_string());
        }
        Ok(())
    }
}

/// Public view of a connection (no secret) / 连接信息（不含密钥）
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionInfo {
    pub access_key_id: String,
    pub region: String,
    pub bucket: String,
    pub endpoint: String,
    pub path_style: bool,
    pub expires_at: String,
}

/// Persisted connection row / 持久化的连接记录
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ConnectionRow {
    pub token: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    pub bucket: String,
    pub endpoint: String,
    pub path_style: bool,
    pub created_at: String,
    pub expires_at: i64,
}

impl ConnectionRow {
    pub fn credential(&self) -> Credential {
        Credential {
            access_key_id: self.access_key_id.clone(),
            secret_access_key: self.secret_access_key.clone(),
            region: self.region.clone(),
            bucket: self.bucket.clone(),
            endpoint: self.endpoint.clone(),
            path_style: self.path_style,
        }
    }

    pub fn info(&self) -> ConnectionInfo {
        ConnectionInfo {
            access_key_id: self.access_key_id.clone(),
            region: self.region.clone(),
            bucket: self.bucket.clone(),
            endpoint: self.endpoint.clone(),
            path_style: self.path_style,
            expires_at: DateTime::from_timestamp(self.expires_at, 0)
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Folder,
}

/// Coarse file category used by the dashboard filter / 文件分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Folder,
    Image,
    Video,
    Audio,
    Document,
    Archive,
    Code,
    Other,
}

impl FileCategory {
    pub fn from_ext(ext: &str) -> Self {
        match ext {
            "jpg" | "jpeg" | "png" | "gif" | "bmp" | "webp" | "svg" | "ico" | "tif" | "tiff"
            | "heic" | "avif" => Self::Image,
            "mp4" | "mkv" | "avi" | "mov" | "wmv" | "flv" | "webm" | "m4v" | "ts" => Self::Video,
            "mp3" | "wav" | "flac" | "aac" | "ogg" | "m4a" | "wma" | "opus" => Self::Audio,
            "pdf" | "doc" | "docx" | "xls" | "xlsx" | "ppt" | "pptx" | "txt" | "md" | "csv"
            | "odt" | "ods" | "rtf" | "epub" => Self::Document,
            "zip" | "rar" | "7z" | "tar" | "gz" | "tgz" | "bz2" | "xz" | "zst" => Self::Archive,
            "rs" | "js" | "py" | "go" | "java" | "c" | "h" | "cpp" | "hpp" | "cs"
            | "rb" | "php" | "sh" | "json" | "yaml" | "yml" | "toml" | "xml" | "html" | "css"
            | "sql" | "tsx" | "jsx" => Self::Code,
            _ => Self::Other,
        }
    }
}

/// File entry information / 文件条目信息
#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    /// Full object key, folders end with `/` / 完整对象键
    pub key: String,
    pub name: String,
    /// UI path / 前端路径
    pub path: String,
    /// Always 0 for folders / 目录大小恒为0
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub kind: EntryKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub category: FileCategory,
}

impl FileEntry {
    pub fn file(key: &str, size: u64, last_modified: Option<DateTime<Utc>>) -> Self {
        let name = file_name(key);
        let ext = get_ext(&name);
        let mime_type = mime_guess::from_path(&name).first().map(|m| m.essence_str().to_string());
        Self {
            key: key.to_string(),
            path: key_to_path(key),
            size,
            last_modified,
            kind: EntryKind::File,
            category: FileCategory::from_ext(&ext),
            extension: if ext.is_empty() { None } else { Some(ext) },
            mime_type,
            name,
        }
    }

    /// `prefix` is the folder key with trailing `/` / 目录前缀
    pub fn folder(prefix: &str, last_modified: Option<DateTime<Utc>>) -> Self {
        let key = if prefix.ends_with('/') {
            prefix.to_string()
        } else {
            format!("{}/", prefix)
        };
        Self {
            name: file_name(&key),
            path: key_to_path(&key),
            key,
            size: 0,
            last_modified,
            kind: EntryKind::Folder,
            extension: None,
            mime_type: None,
            category: FileCategory::Folder,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }
}

/// Parse the timestamp format returned by S3 listings / 解析S3时间戳
/// ListObjects uses RFC 3339, HEAD uses RFC 2822 (HTTP date)
pub fn parse_s3_time(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_rfc2822(value))
        .map(|t| t.with_timezone(&Utc))
        .ok()
}
