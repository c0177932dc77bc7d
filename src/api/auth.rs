use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_cookies::Cookies;

use bucketdesk::models::Credential;

use crate::api::{storage_error, unauthorized, ApiResponse};
use crate::auth::{clear_cookie, close_session, current_connection, open_session, session_token};
use crate::state::AppState;

/// GET /api/auth/form - 连接表单描述
pub async fn connect_form(State(state): State<Arc<AppState>>) -> Result<Json<Value>, StatusCode> {
    let drivers = state.storage_manager.driver_infos().await;
    Ok(Json(json!({
        "code": 200,
        "message": "success",
        "data": drivers
    })))
}

#[derive(Debug, Deserialize)]
pub struct ConnectReq {
    #[serde(flatten)]
    pub credential: Credential,
    #[serde(default)]
    pub remember: bool,
}

/// POST /api/auth/connect - 连接存储桶
pub async fn connect(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Json(req): Json<ConnectReq>,
) -> Result<Json<Value>, StatusCode> {
    let credential = req.credential.normalized(&state.config.storage.default_region);
    if let Err(msg) = credential.validate() {
        let body = serde_json::to_value(ApiResponse::<()>::error(&msg))
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        return Ok(Json(body));
    }

    match open_session(&state, &cookies, credential, req.remember).await {
        Ok(row) => Ok(Json(json!({
            "code": 200,
            "message": "success",
            "data": row.info()
        }))),
        Err(e) => Ok(storage_error("connect", &e)),
    }
}

/// GET /api/auth/session - 当前连接信息
pub async fn session(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
) -> Result<Json<Value>, StatusCode> {
    match current_connection(&state, &cookies).await {
        Some(row) => Ok(Json(json!({
            "code": 200,
            "message": "success",
            "data": row.info()
        }))),
        None => Ok(unauthorized()),
    }
}

/// POST /api/auth/disconnect - 断开连接
pub async fn disconnect(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
) -> Result<Json<Value>, StatusCode> {
    if let Some(token) = session_token(&cookies) {
        close_session(&state, &token).await;
    }
    clear_cookie(&cookies);

    Ok(Json(json!({
        "code": 200,
        "message": "success"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::*;
    use axum::body::Body;
    use axum::http::{header, Request};

    #[tokio::test]
    async fn test_form_lists_s3_fields() {
        let (state, _) = connected_state(&[]).await;
        bucketdesk::register_storage_drivers(&state.storage_manager).await;

        let req = Request::get("/api/auth/form").body(Body::empty()).unwrap();
        let resp = call(state, req).await;
        assert_eq!(resp["data"][0]["driver_type"], "s3");
        assert_eq!(resp["data"][0]["items"][1]["name"], "secret_access_key");
    }

    #[tokio::test]
    async fn test_connect_rejects_missing_fields() {
        let (state, _) = connected_state(&[]).await;
        let body = json!({"access_key_id": "ak", "secret_access_key": "", "bucket": "files"});
        let resp = call(state, post_json("/api/auth/connect", body, false)).await;
        assert_eq!(resp["code"], 400);
        assert_eq!(resp["message"], "Secret Access Key is required");
    }

    #[tokio::test]
    async fn test_session_hides_secret() {
        let (state, _) = connected_state(&[]).await;
        let req = Request::get("/api/auth/session")
            .header(header::COOKIE, format!("{}={}", crate::auth::SESSION_COOKIE_NAME, TOKEN))
            .body(Body::empty())
            .unwrap();
        let resp = call(state, req).await;
        assert_eq!(resp["code"], 200);
        assert_eq!(resp["data"]["bucket"], "files");
        assert!(resp["data"].get("secret_access_key").is_none());
    }

    #[tokio::test]
    async fn test_disconnect_drops_session() {
        let (state, _) = connected_state(&["a.txt"]).await;
        let resp = call(state.clone(), post_json("/api/auth/disconnect", json!({}), true)).await;
        assert_eq!(resp["code"], 200);
        assert!(state.storage_manager.get_driver(TOKEN).await.is_none());

        let resp = call(state, post_json("/api/fs/list", json!({"path": "/"}), true)).await;
        assert_eq!(resp["code"], 401);
    }
}
