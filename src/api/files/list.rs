use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_cookies::Cookies;

use bucketdesk::query::{ListQuery, ListResult};
use bucketdesk::utils::normalize_path;

use super::FsPathReq;
use crate::api::{storage_error, unauthorized};
use crate::auth::session_driver;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FsListReq {
    pub path: Option<String>,
    #[serde(flatten)]
    pub query: ListQuery,
}

fn list_json(path: &str, result: ListResult) -> Json<Value> {
    Json(json!({
        "code": 200,
        "message": "success",
        "data": {
            "path": path,
            "content": result.content,
            "total": result.total,
            "folder_count": result.folder_count,
            "file_count": result.file_count,
            "page": result.page,
            "per_page": result.per_page
        }
    }))
}

/// POST /api/fs/list - 列出目录内容
pub async fn fs_list(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Json(req): Json<FsListReq>,
) -> Result<Json<Value>, StatusCode> {
    let driver = match session_driver(&state, &cookies).await {
        Ok(Some(d)) => d,
        Ok(None) => return Ok(unauthorized()),
        Err(e) => return Ok(storage_error("restore session", &e)),
    };
    let path = normalize_path(&req.path.unwrap_or_default());

    match driver.list(&path).await {
        Ok(entries) => {
            tracing::debug!("fs_list: path={}, entries={}", path, entries.len());
            Ok(list_json(&path, req.query.apply(entries)))
        }
        Err(e) => Ok(storage_error("fs_list", &e)),
    }
}

/// POST /api/fs/get - 获取单个文件或目录信息
pub async fn fs_get(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Json(req): Json<FsPathReq>,
) -> Result<Json<Value>, StatusCode> {
    let driver = match session_driver(&state, &cookies).await {
        Ok(Some(d)) => d,
        Ok(None) => return Ok(unauthorized()),
        Err(e) => return Ok(storage_error("restore session", &e)),
    };
    let path = normalize_path(&req.path);

    match driver.stat(&path).await {
        Ok(entry) => Ok(Json(json!({
            "code": 200,
            "message": "success",
            "data": entry
        }))),
        Err(e) => Ok(storage_error("fs_get", &e)),
    }
}

/// POST /api/fs/search - 在目录下递归搜索名称
pub async fn fs_search(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Json(req): Json<FsListReq>,
) -> Result<Json<Value>, StatusCode> {
    let driver = match session_driver(&state, &cookies).await {
        Ok(Some(d)) => d,
        Ok(None) => return Ok(unauthorized()),
        Err(e) => return Ok(storage_error("restore session", &e)),
    };
    let path = normalize_path(&req.path.unwrap_or_default());

    let keyword = req.query.keyword.as_deref().unwrap_or("").trim();
    if keyword.is_empty() {
        return Ok(Json(json!({
            "code": 400,
            "message": "keyword is required"
        })));
    }

    match driver.list_recursive(&path).await {
        Ok(entries) => {
            tracing::debug!("fs_search: path={}, keyword={}, scanned={}", path, keyword, entries.len());
            Ok(list_json(&path, req.query.apply(entries)))
        }
        Err(e) => Ok(storage_error("fs_search", &e)),
    }
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_list_sorted_and_paged() {
        let (state, _) = connected_state(&["docs/a.txt", "b10.txt", "b2.txt", "img.png"]).await;
        let body = json!({"path": "/", "page": 1, "per_page": 3});
        let resp = call(state, post_json("/api/fs/list", body, true)).await;

        assert_eq!(resp["code"], 200);
        assert_eq!(resp["data"]["total"], 4);
        assert_eq!(resp["data"]["folder_count"], 1);
        assert_eq!(resp["data"]["file_count"], 3);
        let names: Vec<&str> = resp["data"]["content"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["docs", "b2.txt", "b10.txt"]);
        assert_eq!(resp["data"]["content"][0]["size"], 0);
    }

    #[tokio::test]
    async fn test_list_category_filter() {
        let (state, _) = connected_state(&["a.txt", "img.png", "pics/"]).await;
        let body = json!({"path": "/", "category": "image"});
        let resp = call(state, post_json("/api/fs/list", body, true)).await;
        assert_eq!(resp["data"]["total"], 1);
        assert_eq!(resp["data"]["content"][0]["name"], "img.png");
    }

    #[tokio::test]
    async fn test_list_missing_folder() {
        let (state, _) = connected_state(&["a.txt"]).await;
        let resp = call(state, post_json("/api/fs/list", json!({"path": "/nope"}), true)).await;
        assert_eq!(resp["code"], 404);
    }

    #[tokio::test]
    async fn test_get_entry() {
        let (state, _) = connected_state(&["docs/a.txt"]).await;
        let resp = call(state, post_json("/api/fs/get", json!({"path": "/docs"}), true)).await;
        assert_eq!(resp["data"]["kind"], "folder");
        assert_eq!(resp["data"]["key"], "docs/");
    }

    #[tokio::test]
    async fn test_listed_path_round_trips_through_get() {
        let (state, _) = connected_state(&["docs/a\\b.txt"]).await;
        let resp = call(state.clone(), post_json("/api/fs/list", json!({"path": "/docs"}), true)).await;
        let path = resp["data"]["content"][0]["path"].as_str().unwrap().to_string();
        assert_eq!(path, "/docs/a\\b.txt");

        let resp = call(state, post_json("/api/fs/get", json!({"path": path}), true)).await;
        assert_eq!(resp["code"], 200);
        assert_eq!(resp["data"]["key"], "docs/a\\b.txt");
    }

    #[tokio::test]
    async fn test_search_is_recursive() {
        let (state, _) = connected_state(&["docs/Report.pdf", "docs/deep/report-2.pdf", "notes.txt"]).await;
        let body = json!({"path": "/", "keyword": "report"});
        let resp = call(state.clone(), post_json("/api/fs/search", body, true)).await;
        assert_eq!(resp["data"]["total"], 2);
        let mut paths: Vec<&str> = resp["data"]["content"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["path"].as_str().unwrap())
            .collect();
        paths.sort();
        assert_eq!(paths, vec!["/docs/Report.pdf", "/docs/deep/report-2.pdf"]);

        let resp = call(state, post_json("/api/fs/search", json!({"path": "/"}), true)).await;
        assert_eq!(resp["code"], 400);
    }
}
