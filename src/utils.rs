//! Path and object key utility functions / 路径与对象键工具函数
//!
//! A UI path is `/` followed by the object key, with no rewriting: keys may
//! legally contain `\`, `//`, `.` or `..` segments and must map back to
//! the same object. Folder prefixes end with `/`; their UI path drops that
//! one trailing `/`.

/// Ensure a request path is `/`-rooted, without touching its segments / 规范化请求路径
pub fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

/// UI path -> object key / 路径转对象键
/// "/a/b.txt" -> "a/b.txt", "/" -> ""
pub fn path_to_key(path: &str) -> String {
    path.strip_prefix('/').unwrap_or(path).to_string()
}

/// UI path -> folder prefix / 路径转目录前缀
/// "/a/b" -> "a/b/", "/" -> ""
pub fn path_to_prefix(path: &str) -> String {
    let key = path_to_key(path);
    if key.is_empty() {
        key
    } else {
        format!("{}/", key)
    }
}

/// Object key or folder prefix -> UI path / 对象键转路径
/// "a/b/" -> "/a/b", "data//" -> "/data/"
pub fn key_to_path(key: &str) -> String {
    format!("/{}", key.strip_suffix('/').unwrap_or(key))
}

/// Parent of a UI path / 获取父路径
pub fn parent_path(path: &str) -> String {
    let path = normalize_path(path);
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(pos) => path[..pos].to_string(),
    }
}

/// Last segment of a path, key or folder prefix / 获取最后一段名称
pub fn file_name(path: &str) -> String {
    let path = path.strip_suffix('/').unwrap_or(path);
    path.rsplit('/').next().unwrap_or("").to_string()
}

/// Join a folder path and a child name / 拼接路径
pub fn join_path(dir: &str, name: &str) -> String {
    let dir = normalize_path(dir);
    if dir == "/" {
        format!("/{}", name)
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Get file extension (lowercase) / 获取文件扩展名
pub fn get_ext(path: &str) -> String {
    std::path::Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Validate a single path segment / 校验文件名
pub fn validate_name(name: &str) -> Result<(), String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("name is empty".to_string());
    }
    if trimmed == "." || trimmed == ".." {
        return Err(format!("invalid name: {}", name));
    }
    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(format!("name must not contain path separators: {}", name));
    }
    if trimmed.chars().any(|c| c.is_control()) {
        return Err("name contains control characters".to_string());
    }
    Ok(())
}

/// Compute the target name of a rename / 计算重命名后的名称
/// Files keep their extension when the new name omits one:
/// rename_target("report.pdf", "final", false) -> "final.pdf"
pub fn rename_target(old_name: &str, new_name: &str, is_folder: bool) -> Result<String, String> {
    validate_name(new_name)?;
    let new_name = new_name.trim();

    if is_folder {
        return Ok(new_name.to_string());
    }

    let old_ext = std::path::Path::new(old_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");
    let has_ext = std::path::Path::new(new_name).extension().is_some();

    if old_ext.is_empty() || has_ext {
        Ok(new_name.to_string())
    } else {
        Ok(format!("{}.{}", new_name, old_ext))
    }
}

/// File name conflict handling strategy / 文件名冲突处理策略
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConflictStrategy {
    /// Auto rename: file.txt -> file (1).txt / 自动重命名
    AutoRename,
    /// Overwrite / 覆盖
    Overwrite,
    /// Error / 报错
    Error,
}

impl ConflictStrategy {
    pub fn parse(value: &str) -> Self {
        match value {
            "rename" | "auto_rename" => Self::AutoRename,
            "error" => Self::Error,
            _ => Self::Overwrite,
        }
    }
}

/// Generate conflict-free filename / 生成不冲突的文件名
/// If filename exists, add (1), (2) etc. suffixes / 如果文件名已存在，添加后缀
/// Input: "file.txt", existing list: ["file.txt", "file (1).txt"] / 输入
/// Output: "file (2).txt" / 输出
pub fn resolve_conflict_name(name: &str, existing_names: &[String]) -> String {
    if !existing_names.iter().any(|n| n == name) {
        return name.to_string();
    }

    // Separate filename and extension / 分离文件名和扩展名
    let path = std::path::Path::new(name);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(name);
    let ext = path.extension().and_then(|e| e.to_str());

    // Check if already has (n) suffix / 检查是否已有后缀
    let base_stem = match stem.rfind(" (") {
        Some(pos) if stem.ends_with(')') => {
            let num_part = &stem[pos + 2..stem.len() - 1];
            if !num_part.is_empty() && num_part.chars().all(|c| c.is_ascii_digit()) {
                &stem[..pos]
            } else {
                stem
            }
        }
        _ => stem,
    };

    for i in 1..10000 {
        let new_name = match ext {
            Some(e) => format!("{} ({}).{}", base_stem, i, e),
            None => format!("{} ({})", base_stem, i),
        };

        if !existing_names.contains(&new_name) {
            return new_name;
        }
    }

    // 极端情况：使用时间戳
    let timestamp = chrono::Utc::now().timestamp_millis();
    match ext {
        Some(e) => format!("{}_{}.{}", base_stem, timestamp, e),
        None => format!("{}_{}", base_stem, timestamp),
    }
}

/// Build a Content-Disposition value that survives non-ASCII names / 生成下载文件名头
pub fn content_disposition(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .map(|c| if (c.is_ascii_graphic() && c != '"') || c == ' ' { c } else { '_' })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii,
        urlencoding::encode(filename)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("a/b"), "/a/b");
        assert_eq!(normalize_path("/a/b"), "/a/b");
        assert_eq!(normalize_path("/a\\b//c/../d"), "/a\\b//c/../d");
    }

    #[test]
    fn test_key_mapping() {
        assert_eq!(path_to_key("/"), "");
        assert_eq!(path_to_key("/docs/a.txt"), "docs/a.txt");
        assert_eq!(path_to_prefix("/"), "");
        assert_eq!(path_to_prefix("/docs/2024"), "docs/2024/");
        assert_eq!(key_to_path("docs/2024/"), "/docs/2024");
        assert_eq!(key_to_path("a.txt"), "/a.txt");
        assert_eq!(key_to_path(""), "/");
    }

    #[test]
    fn test_unusual_keys_map_back_to_themselves() {
        for key in ["docs/a\\b.txt", "data//x.csv", "a/./b.txt", "a/../b.txt", " spaced /x"] {
            assert_eq!(path_to_key(&key_to_path(key)), key);
        }
        // folder prefix with an empty last segment
        assert_eq!(key_to_path("data//"), "/data/");
        assert_eq!(path_to_prefix("/data/"), "data//");
        assert_eq!(file_name("data//"), "");
        assert_eq!(parent_path("/data//x.csv"), "/data/");
        assert_eq!(join_path("/data/", "x.csv"), "/data//x.csv");
    }

    #[test]
    fn test_parent_and_name() {
        assert_eq!(parent_path("/a/b/c.txt"), "/a/b");
        assert_eq!(parent_path("/a"), "/");
        assert_eq!(parent_path("/"), "/");
        assert_eq!(file_name("docs/2024/"), "2024");
        assert_eq!(file_name("/a/b.txt"), "b.txt");
        assert_eq!(file_name("docs/a\\b.txt"), "a\\b.txt");
        assert_eq!(join_path("/a", "b.txt"), "/a/b.txt");
        assert_eq!(join_path("/", "b"), "/b");
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("report.pdf").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("  ").is_err());
        assert!(validate_name("..").is_err());
        assert!(validate_name("a/b").is_err());
        assert!(validate_name("a\\b").is_err());
    }

    #[test]
    fn test_rename_preserves_extension() {
        assert_eq!(rename_target("report.pdf", "final", false).unwrap(), "final.pdf");
        assert_eq!(rename_target("report.pdf", "final.txt", false).unwrap(), "final.txt");
        assert_eq!(rename_target("Makefile", "GNUmakefile", false).unwrap(), "GNUmakefile");
        assert_eq!(rename_target("photos.2024", "archive", true).unwrap(), "archive");
        assert!(rename_target("a.txt", "x/y", false).is_err());
    }

    #[test]
    fn test_resolve_conflict_name() {
        let existing = vec!["file.txt".to_string(), "file (1).txt".to_string()];
        assert_eq!(resolve_conflict_name("file.txt", &existing), "file (2).txt");
        assert_eq!(resolve_conflict_name("other.txt", &existing), "other.txt");
        let existing = vec!["notes".to_string()];
        assert_eq!(resolve_conflict_name("notes", &existing), "notes (1)");
    }

    #[test]
    fn test_conflict_strategy_parse() {
        assert_eq!(ConflictStrategy::parse("rename"), ConflictStrategy::AutoRename);
        assert_eq!(ConflictStrategy::parse("error"), ConflictStrategy::Error);
        assert_eq!(ConflictStrategy::parse(""), ConflictStrategy::Overwrite);
    }

    #[test]
    fn test_content_disposition() {
        let value = content_disposition("报告 1.pdf");
        assert!(value.starts_with("attachment; filename=\"__ 1.pdf\""));
        assert!(value.contains("filename*=UTF-8''%E6%8A%A5%E5%91%8A%201.pdf"));
    }
}
