//! Folder to zip / 目录打包下载

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::storage::{StorageDriver, StorageError, StorageResult};
use crate::utils::{file_name, normalize_path, path_to_prefix};

fn zip_err(e: impl std::fmt::Display) -> StorageError {
    StorageError::Backend(format!("zip: {}", e))
}

/// Zip file name offered to the browser / 压缩包文件名
pub fn archive_name(path: &str) -> String {
    let name = file_name(&normalize_path(path));
    if name.is_empty() {
        "bucket.zip".to_string()
    } else {
        format!("{}.zip", name)
    }
}

/// 将目录压缩为zip（对象逐个读取，在内存中完成）
///
/// Entry names are relative to the folder; empty folder markers become
/// directory entries.
pub async fn build_folder_zip(driver: &dyn StorageDriver, path: &str) -> StorageResult<Vec<u8>> {
    let prefix = path_to_prefix(path);
    let entries = driver.list_recursive(path).await?;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for entry in &entries {
        let relative = match entry.key.strip_prefix(&prefix) {
            Some(rel) if !rel.is_empty() => rel,
            _ => continue,
        };

        if entry.is_folder() {
            let dir = relative.strip_suffix('/').unwrap_or(relative);
            if !dir.is_empty() {
                zip.add_directory(dir, options).map_err(zip_err)?;
            }
            continue;
        }

        let data = driver.read_key(&entry.key).await?;
        zip.start_file(relative, options).map_err(zip_err)?;
        zip.write_all(&data).map_err(zip_err)?;
    }

    let cursor = zip.finish().map_err(zip_err)?;
    tracing::debug!("zip built: prefix={}, entries={}", prefix, entries.len());
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::s3::memory::MemoryClient;
    use crate::drivers::s3::S3Driver;
    use std::io::Read;
    use zip::ZipArchive;

    #[tokio::test]
    async fn test_zip_contains_relative_paths() {
        let client = MemoryClient::with_keys(&[
            "docs/a.txt",
            "docs/sub/b.txt",
            "docs/empty/",
            "other/c.txt",
        ]);
        let driver = S3Driver::new(client);

        let bytes = build_folder_zip(&driver, "/docs").await.unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();

        let mut names: Vec<String> = archive.file_names().map(|n| n.to_string()).collect();
        names.sort();
        assert_eq!(names, vec!["a.txt", "empty/", "sub/b.txt"]);

        let mut content = String::new();
        archive.by_name("sub/b.txt").unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "docs/sub/b.txt");
    }

    #[tokio::test]
    async fn test_zip_keeps_unusual_keys() {
        let client = MemoryClient::with_keys(&["docs/a\\b.txt", "docs/ok.txt", "docs//x.csv"]);
        let driver = S3Driver::new(client);

        let bytes = build_folder_zip(&driver, "/docs").await.unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 3);

        let mut content = String::new();
        archive.by_name("a\\b.txt").unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "docs/a\\b.txt");
    }

    #[test]
    fn test_archive_name() {
        assert_eq!(archive_name("/docs/2024"), "2024.zip");
        assert_eq!(archive_name("/"), "bucket.zip");
    }
}
