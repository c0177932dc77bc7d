use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_cookies::Cookies;

use bucketdesk::archive::{archive_name, build_folder_zip};
use bucketdesk::storage::StorageError;
use bucketdesk::utils::{content_disposition, normalize_path};

use crate::api::{storage_error, unauthorized};
use crate::auth::session_driver;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub path: String,
}

fn attachment(content_type: &str, filename: &str, data: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(filename)),
        ],
        Body::from(data),
    )
        .into_response()
}

/// GET /api/fs/download?path= - 下载文件，目录打包为zip
///
/// Errors are returned as the JSON envelope with the matching HTTP status.
pub async fn fs_download(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Query(query): Query<DownloadQuery>,
) -> Response {
    let fail = |op: &str, e: StorageError| {
        let status = StatusCode::from_u16(e.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, storage_error(op, &e)).into_response()
    };

    let driver = match session_driver(&state, &cookies).await {
        Ok(Some(d)) => d,
        Ok(None) => return (StatusCode::UNAUTHORIZED, unauthorized()).into_response(),
        Err(e) => return fail("restore session", e),
    };
    let path = normalize_path(&query.path);

    let entry = match driver.stat(&path).await {
        Ok(entry) => entry,
        Err(e) => return fail("fs_download", e),
    };

    if entry.is_folder() {
        tracing::info!("fs_download: zipping folder {}", path);
        return match build_folder_zip(&**driver, &path).await {
            Ok(data) => attachment("application/zip", &archive_name(&path), data),
            Err(e) => fail("fs_download zip", e),
        };
    }

    match driver.read(&path).await {
        Ok(data) => {
            let content_type = entry
                .mime_type
                .clone()
                .unwrap_or_else(|| "application/octet-stream".to_string());
            attachment(&content_type, &entry.name, data.to_vec())
        }
        Err(e) => fail("fs_download", e),
    }
}

#[derive(Debug, Deserialize)]
pub struct FsShareReq {
    pub path: String,
    /// Link lifetime in seconds, default from config / 链接有效期（秒）
    pub expire_secs: Option<u64>,
}

/// POST /api/fs/share - 生成预签名分享链接
pub async fn fs_share(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Json(req): Json<FsShareReq>,
) -> Result<Json<Value>, StatusCode> {
    let driver = match session_driver(&state, &cookies).await {
        Ok(Some(d)) => d,
        Ok(None) => return Ok(unauthorized()),
        Err(e) => return Ok(storage_error("restore session", &e)),
    };
    let path = normalize_path(&req.path);
    let expire_secs = req.expire_secs.unwrap_or(state.config.storage.presign_expire_secs);

    match driver.presign(&path, expire_secs).await {
        Ok(url) => Ok(Json(json!({
            "code": 200,
            "message": "success",
            "data": {
                "url": url,
                "expire_secs": expire_secs.clamp(1, bucketdesk::drivers::s3::driver::MAX_PRESIGN_SECS)
            }
        }))),
        Err(e) => Ok(storage_error("fs_share", &e)),
    }
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::*;
    use crate::auth::SESSION_COOKIE_NAME;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::json;
    use std::io::Cursor;

    fn download(path: &str) -> Request<Body> {
        Request::get(format!("/api/fs/download?path={}", urlencoding::encode(path)))
            .header(header::COOKIE, format!("{}={}", SESSION_COOKIE_NAME, TOKEN))
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_download_file() {
        let (state, _) = connected_state(&["docs/a.txt"]).await;
        let (parts, body) = send(state, download("/docs/a.txt")).await;
        assert_eq!(parts.status, StatusCode::OK);
        assert_eq!(parts.headers[header::CONTENT_TYPE], "text/plain");
        assert!(parts.headers[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .contains("filename=\"a.txt\""));
        assert_eq!(body, b"docs/a.txt");
    }

    #[tokio::test]
    async fn test_download_folder_as_zip() {
        let (state, _) = connected_state(&["docs/a.txt", "docs/sub/b.txt"]).await;
        let (parts, body) = send(state, download("/docs")).await;
        assert_eq!(parts.status, StatusCode::OK);
        assert_eq!(parts.headers[header::CONTENT_TYPE], "application/zip");

        let archive = zip::ZipArchive::new(Cursor::new(body)).unwrap();
        let mut names: Vec<&str> = archive.file_names().collect();
        names.sort();
        assert_eq!(names, vec!["a.txt", "sub/b.txt"]);
    }

    #[tokio::test]
    async fn test_download_missing_and_unauthorized() {
        let (state, _) = connected_state(&[]).await;
        let (parts, _) = send(state.clone(), download("/nope.txt")).await;
        assert_eq!(parts.status, StatusCode::NOT_FOUND);

        let req = Request::get("/api/fs/download?path=/a.txt").body(Body::empty()).unwrap();
        let (parts, _) = send(state, req).await;
        assert_eq!(parts.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_share_uses_clamped_expiry() {
        let (state, _) = connected_state(&["a.txt"]).await;
        let body = json!({"path": "/a.txt", "expire_secs": 99999999u64});
        let resp = call(state.clone(), post_json("/api/fs/share", body, true)).await;
        assert_eq!(resp["code"], 200);
        assert_eq!(resp["data"]["expire_secs"], 604800);
        assert!(resp["data"]["url"].as_str().unwrap().ends_with("X-Amz-Expires=604800"));

        let resp = call(state, post_json("/api/fs/share", json!({"path": "/a.txt"}), true)).await;
        assert!(resp["data"]["url"].as_str().unwrap().ends_with("X-Amz-Expires=3600"));
    }
}
