//! S3对象存储驱动
//!
//! 支持AWS S3及兼容服务（MinIO、阿里云OSS、Cloudflare R2 等）

pub mod client;
pub mod driver;
pub mod factory;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;

pub use driver::S3Driver;
pub use factory::S3DriverFactory;
