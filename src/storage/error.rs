//! Storage error types / 存储错误类型

use thiserror::Error;

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Failure of a storage operation / 存储操作失败
///
/// The Display text carries details for the log; `public_message` is the
/// generic text shown to the user.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("invalid name: {0}")]
    InvalidName(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    /// Wrap a backend failure with the operation that failed / 包装后端错误
    pub fn backend(op: &str, err: impl std::fmt::Display) -> Self {
        Self::Backend(format!("{} failed: {}", op, err))
    }

    /// Map an HTTP status returned by the object store / 根据HTTP状态码映射
    pub fn from_status(op: &str, key: &str, status: u16) -> Self {
        match status {
            404 => Self::NotFound(key.to_string()),
            _ => Self::Backend(format!("{} {} returned HTTP {}", op, key, status)),
        }
    }

    /// Envelope code used by the HTTP layer / 接口返回码
    pub fn code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::AlreadyExists(_) => 409,
            Self::InvalidName(_) | Self::InvalidRequest(_) => 400,
            Self::Backend(_) => 500,
        }
    }

    /// Generic user-facing message / 面向用户的通用提示
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "File or folder not found",
            Self::AlreadyExists(_) => "An item with that name already exists",
            Self::InvalidName(_) => "Invalid file or folder name",
            Self::InvalidRequest(_) => "Invalid request",
            Self::Backend(_) => "Storage request failed, check your connection settings",
        }
    }
}
