//! S3驱动工厂

use crate::models::Credential;
use crate::storage::{ConfigItem, DriverFactory, DriverInfo, StorageDriver, StorageResult};
use super::client::BucketClient;
use super::driver::S3Driver;

/// S3驱动工厂
pub struct S3DriverFactory;

impl DriverFactory for S3DriverFactory {
    fn driver_type(&self) -> &'static str {
        "s3"
    }

    fn driver_info(&self) -> DriverInfo {
        DriverInfo {
            driver_type: "s3".to_string(),
            display_name: "S3".to_string(),
            items: vec![
                ConfigItem::new("access_key_id", "string")
                    .title("Access Key ID")
                    .required(),
                ConfigItem::new("secret_access_key", "password")
                    .title("Secret Access Key")
                    .required(),
                ConfigItem::new("region", "string")
                    .title("Region")
                    .help("S3区域，如 us-east-1、cn-hangzhou")
                    .default("us-east-1"),
                ConfigItem::new("bucket", "string")
                    .title("Bucket")
                    .help("S3存储桶名称")
                    .required(),
                ConfigItem::new("endpoint", "string")
                    .title("Endpoint")
                    .help("S3兼容服务端点（MinIO: http://localhost:9000），留空使用AWS"),
                ConfigItem::new("path_style", "bool")
                    .title("Path style")
                    .help("MinIO等需要开启此选项")
                    .default("false"),
            ],
        }
    }

    fn create_driver(&self, credential: &Credential) -> StorageResult<Box<dyn StorageDriver>> {
        let client = BucketClient::from_credential(credential)?;
        Ok(Box::new(S3Driver::new(client)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_form_fields() {
        let info = S3DriverFactory.driver_info();
        let names: Vec<&str> = info.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["access_key_id", "secret_access_key", "region", "bucket", "endpoint", "path_style"]
        );
        let secret = &info.items[1];
        assert_eq!(secret.item_type, "password");
        assert!(secret.required);
    }
}
