use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_cookies::Cookies;

use bucketdesk::utils::{join_path, normalize_path};

use super::FsPathReq;
use crate::api::{storage_error, unauthorized};
use crate::auth::session_driver;
use crate::state::AppState;

/// POST /api/fs/mkdir - 创建目录
pub async fn fs_mkdir(
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

    tracing::debug!("fs_mkdir: path={}", path);
    match driver.create_dir(&path).await {
        Ok(entry) => Ok(Json(json!({
            "code": 200,
            "message": "success",
            "data": entry
        }))),
        Err(e) => Ok(storage_error("fs_mkdir", &e)),
    }
}

#[derive(Debug, Deserialize)]
pub struct FsRemoveReq {
    /// Parent folder / 所在目录
    pub dir: String,
    pub names: Vec<String>,
}

/// POST /api/fs/remove - 删除文件或目录（逐个删除，遇错即停）
pub async fn fs_remove(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Json(req): Json<FsRemoveReq>,
) -> Result<Json<Value>, StatusCode> {
    let driver = match session_driver(&state, &cookies).await {
        Ok(Some(d)) => d,
        Ok(None) => return Ok(unauthorized()),
        Err(e) => return Ok(storage_error("restore session", &e)),
    };
    let dir = normalize_path(&req.dir);

    if req.names.is_empty() {
        return Ok(Json(json!({
            "code": 400,
            "message": "nothing selected"
        })));
    }

    let mut removed_items = 0usize;
    let mut removed_objects = 0u64;
    for name in &req.names {
        // listed names may hold any character except `/`
        if name.is_empty() || name.contains('/') {
            tracing::debug!("fs_remove: invalid name {:?}", name);
            return Ok(Json(json!({
                "code": 400,
                "message": "Invalid file or folder name"
            })));
        }

        let path = join_path(&dir, name);
        match driver.delete(&path).await {
            Ok(count) => {
                removed_items += 1;
                removed_objects += count;
            }
            Err(e) => return Ok(storage_error("fs_remove", &e)),
        }
    }

    tracing::debug!("fs_remove: dir={}, items={}, objects={}", dir, removed_items, removed_objects);
    Ok(Json(json!({
        "code": 200,
        "message": "success",
        "data": {
            "removed": removed_items,
            "objects": removed_objects
        }
    })))
}

#[derive(Debug, Deserialize)]
pub struct FsRenameReq {
    pub path: String,
    pub name: String,
}

/// POST /api/fs/rename - 重命名文件或目录
pub async fn fs_rename(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Json(req): Json<FsRenameReq>,
) -> Result<Json<Value>, StatusCode> {
    let driver = match session_driver(&state, &cookies).await {
        Ok(Some(d)) => d,
        Ok(None) => return Ok(unauthorized()),
        Err(e) => return Ok(storage_error("restore session", &e)),
    };
    let path = normalize_path(&req.path);

    tracing::debug!("fs_rename: path={}, new_name={}", path, req.name);
    match driver.rename(&path, &req.name).await {
        Ok(entry) => Ok(Json(json!({
            "code": 200,
            "message": "success",
            "data": entry
        }))),
        Err(e) => Ok(storage_error("fs_rename", &e)),
    }
}
