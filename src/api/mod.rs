pub mod auth;
pub mod files;
pub mod server;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tower_cookies::CookieManagerLayer;

use bucketdesk::storage::StorageError;

use crate::state::AppState;

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: 200,
            message: "success".to_string(),
            data: Some(data),
        }
    }

    pub fn error(message: &str) -> Self {
        Self {
            code: 400,
            message: message.to_string(),
            data: None,
        }
    }
}

/// 未连接存储桶
pub fn unauthorized() -> Json<Value> {
    Json(json!({
        "code": 401,
        "message": "not connected"
    }))
}

/// Log the detailed error, return the generic message / 记录详细错误，返回通用提示
pub fn storage_error(op: &str, e: &StorageError) -> Json<Value> {
    match e {
        StorageError::Backend(_) => tracing::error!("{}: {}", op, e),
        _ => tracing::debug!("{}: {}", op, e),
    }
    Json(json!({
        "code": e.code(),
        "message": e.public_message()
    }))
}

/// API routes / 接口路由
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = match state.config.upload_limit_bytes() {
        Some(limit) => DefaultBodyLimit::max(limit),
        None => DefaultBodyLimit::disable(),
    };

    Router::new()
        .route("/api/health", get(server::health_check))
        .route("/api/version", get(server::version_info))
        .route("/api/auth/form", get(auth::connect_form))
        .route("/api/auth/connect", post(auth::connect))
        .route("/api/auth/session", get(auth::session))
        .route("/api/auth/disconnect", post(auth::disconnect))
        .route("/api/fs/list", post(files::fs_list))
        .route("/api/fs/get", post(files::fs_get))
        .route("/api/fs/search", post(files::fs_search))
        .route("/api/fs/mkdir", post(files::fs_mkdir))
        .route("/api/fs/upload", post(files::fs_upload))
        .route("/api/fs/remove", post(files::fs_remove))
        .route("/api/fs/rename", post(files::fs_rename))
        .route("/api/fs/share", post(files::fs_share))
        .route("/api/fs/download", get(files::fs_download))
        .layer(body_limit)
        .layer(CookieManagerLayer::new())
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use bucketdesk::config::AppConfig;
    use bucketdesk::drivers::s3::memory::MemoryClient;
    use bucketdesk::drivers::s3::S3Driver;
    use bucketdesk::storage::StorageManager;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    pub const TOKEN: &str = "test-session";

    /// State with one connected session backed by an in-memory bucket / 测试状态
    pub async fn connected_state(keys: &[&str]) -> (Arc<AppState>, MemoryClient) {
        let db = crate::db::memory_pool().await;
        let client = MemoryClient::with_keys(keys);
        let storage_manager = StorageManager::new();
        storage_manager
            .insert_driver(TOKEN, Box::new(S3Driver::new(client.clone())))
            .await;

        let now = chrono::Utc::now();
        let row = bucketdesk::models::ConnectionRow {
            token: TOKEN.to_string(),
            access_key_id: "ak".to_string(),
            secret_access_key: "sk".to_string(),
            region: "us-east-1".to_string(),
            bucket: "files".to_string(),
            endpoint: String::new(),
            path_style: false,
            created_at: now.to_rfc3339(),
            expires_at: now.timestamp() + 3600,
        };
        crate::db::insert_connection(&db, &row).await.unwrap();

        let state = Arc::new(AppState {
            db,
            storage_manager,
            config: AppConfig::default(),
        });
        (state, client)
    }

    pub fn post_json(uri: &str, body: Value, with_session: bool) -> Request<Body> {
        let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
        if with_session {
            builder = builder.header(header::COOKIE, format!("{}={}", crate::auth::SESSION_COOKIE_NAME, TOKEN));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    pub async fn send(state: Arc<AppState>, request: Request<Body>) -> (axum::http::response::Parts, Vec<u8>) {
        let response = router(state).oneshot(request).await.unwrap();
        let (parts, body) = response.into_parts();
        let bytes = body.collect().await.unwrap().to_bytes().to_vec();
        (parts, bytes)
    }

    pub async fn call(state: Arc<AppState>, request: Request<Body>) -> Value {
        let (_, bytes) = send(state, request).await;
        serde_json::from_slice(&bytes).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use axum::body::Body;
    use axum::http::Request;

    #[tokio::test]
    async fn test_fs_routes_require_session() {
        let (state, _) = connected_state(&["a.txt"]).await;
        let resp = call(state.clone(), post_json("/api/fs/list", json!({"path": "/"}), false)).await;
        assert_eq!(resp["code"], 401);

        let resp = call(state, post_json("/api/fs/list", json!({"path": "/"}), true)).await;
        assert_eq!(resp["code"], 200);
    }

    #[tokio::test]
    async fn test_health_and_version() {
        let (state, _) = connected_state(&[]).await;
        let req = Request::get("/api/health").body(Body::empty()).unwrap();
        let resp = call(state.clone(), req).await;
        assert_eq!(resp["status"], "ok");

        let req = Request::get("/api/version").body(Body::empty()).unwrap();
        let resp = call(state, req).await;
        assert_eq!(resp["data"]["version"], env!("CARGO_PKG_VERSION"));
    }
}
