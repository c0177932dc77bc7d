use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde_json::{json, Value};
use tower_cookies::Cookies;

use bucketdesk::models::FileEntry;
use bucketdesk::storage::{DriverBox, StorageError, StorageResult};
use bucketdesk::utils::{
    file_name, join_path, normalize_path, resolve_conflict_name, validate_name, ConflictStrategy,
};

use crate::api::{storage_error, unauthorized};
use crate::auth::session_driver;
use crate::state::AppState;

/// Names already present in the target folder / 目标目录中已有的名称
async fn existing_names(driver: &DriverBox, dir: &str) -> StorageResult<Vec<String>> {
    match driver.list(dir).await {
        Ok(entries) => Ok(entries.into_iter().map(|e| e.name).collect()),
        Err(StorageError::NotFound(_)) => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

/// Store one uploaded file according to the conflict strategy / 按冲突策略保存单个文件
async fn store_file(
    driver: &DriverBox,
    dir: &str,
    name: &str,
    data: Bytes,
    strategy: ConflictStrategy,
    existing: &mut Option<Vec<String>>,
) -> StorageResult<FileEntry> {
    validate_name(name).map_err(StorageError::InvalidName)?;

    let name = match strategy {
        ConflictStrategy::Overwrite => name.to_string(),
        ConflictStrategy::AutoRename | ConflictStrategy::Error => {
            if existing.is_none() {
                *existing = Some(existing_names(driver, dir).await?);
            }
            let names = existing.get_or_insert_with(Vec::new);
            let resolved = resolve_conflict_name(name, names);
            if strategy == ConflictStrategy::Error && resolved != name {
                return Err(StorageError::AlreadyExists(join_path(dir, name)));
            }
            names.push(resolved.clone());
            resolved
        }
    };

    let content_type = mime_guess::from_path(&name).first_or_octet_stream();
    driver.put(&join_path(dir, &name), data, content_type.as_ref()).await
}

/// POST /api/fs/upload - 上传文件（multipart，可包含多个文件，逐个上传）
///
/// Fields: `path` (target folder) and `conflict` must precede the `file` parts.
pub async fn fs_upload(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    mut multipart: Multipart,
) -> Result<Json<Value>, StatusCode> {
    let driver = match session_driver(&state, &cookies).await {
        Ok(Some(d)) => d,
        Ok(None) => return Ok(unauthorized()),
        Err(e) => return Ok(storage_error("restore session", &e)),
    };

    let mut target_path = "/".to_string();
    let mut strategy = ConflictStrategy::Overwrite;
    let mut existing: Option<Vec<String>> = None;
    let mut uploaded: Vec<FileEntry> = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|_| StatusCode::BAD_REQUEST)? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "path" => {
                target_path = normalize_path(&field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?);
            }
            "conflict" => {
                strategy = ConflictStrategy::parse(&field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?);
            }
            "file" | "files" => {
                // browsers may send a relative path as the file name
                let filename = file_name(field.file_name().unwrap_or(""));
                let data = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?;
                tracing::debug!("fs_upload: dir={}, name={}, size={}", target_path, filename, data.len());

                match store_file(&driver, &target_path, &filename, data, strategy, &mut existing).await {
                    Ok(entry) => uploaded.push(entry),
                    Err(e) => return Ok(storage_error("fs_upload", &e)),
                }
            }
            _ => {}
        }
    }

    if uploaded.is_empty() {
        return Ok(Json(json!({
            "code": 400,
            "message": "no file in request"
        })));
    }

    Ok(Json(json!({
        "code": 200,
        "message": "success",
        "data": uploaded
    })))
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::*;
    use crate::auth::SESSION_COOKIE_NAME;
    use axum::body::Body;
    use axum::http::{header, Request};
    use bytes::Bytes;

    const BOUNDARY: &str = "XBOUNDARYX";

    fn multipart_request(fields: &[(&str, Option<&str>, &str)]) -> Request<Body> {
        let mut body = String::new();
        for (name, filename, value) in fields {
            body.push_str(&format!("--{}\r\n", BOUNDARY));
            match filename {
                Some(f) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                    name, f
                )),
                None => body.push_str(&format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)),
            }
            body.push_str(value);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{}--\r\n", BOUNDARY));

        Request::post("/api/fs/upload")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY))
            .header(header::COOKIE, format!("{}={}", SESSION_COOKIE_NAME, TOKEN))
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_upload_multiple_files() {
        let (state, client) = connected_state(&["docs/"]).await;
        let req = multipart_request(&[
            ("path", None, "/docs"),
            ("file", Some("a.txt"), "hello"),
            ("file", Some("b.md"), "# title"),
        ]);
        let resp = call(state, req).await;
        assert_eq!(resp["code"], 200);
        assert_eq!(resp["data"].as_array().unwrap().len(), 2);
        assert_eq!(client.data("docs/a.txt").unwrap(), Bytes::from_static(b"hello"));
        assert_eq!(client.data("docs/b.md").unwrap(), Bytes::from_static(b"# title"));
    }

    #[tokio::test]
    async fn test_upload_conflict_strategies() {
        let (state, client) = connected_state(&["a.txt"]).await;

        let req = multipart_request(&[
            ("path", None, "/"),
            ("conflict", None, "rename"),
            ("file", Some("a.txt"), "new"),
        ]);
        let resp = call(state.clone(), req).await;
        assert_eq!(resp["data"][0]["name"], "a (1).txt");

        let req = multipart_request(&[
            ("path", None, "/"),
            ("conflict", None, "error"),
            ("file", Some("a.txt"), "new"),
        ]);
        let resp = call(state.clone(), req).await;
        assert_eq!(resp["code"], 409);

        let req = multipart_request(&[("path", None, "/"), ("file", Some("a.txt"), "replaced")]);
        let resp = call(state, req).await;
        assert_eq!(resp["code"], 200);
        assert_eq!(client.data("a.txt").unwrap(), Bytes::from_static(b"replaced"));
    }
}
