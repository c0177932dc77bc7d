//! Browser session handling / 浏览器会话
//!
//! A session is a random token in a cookie. The token keys both the
//! persisted connection row and the in-memory driver instance; a driver
//! missing after a restart is rebuilt from the row on first use.

use chrono::Utc;
use rand::Rng;
use tower_cookies::cookie::time::Duration;
use tower_cookies::{Cookie, Cookies};

use bucketdesk::models::{ConnectionRow, Credential};
use bucketdesk::storage::{DriverBox, StorageError, StorageResult};

use crate::db;
use crate::state::AppState;

pub const SESSION_COOKIE_NAME: &str = "bucketdesk_session";

/// Driver type every connection uses / 连接使用的驱动类型
pub const DRIVER_TYPE: &str = "s3";

/// 生成安全的随机令牌
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}

pub fn session_token(cookies: &Cookies) -> Option<String> {
    cookies
        .get(SESSION_COOKIE_NAME)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

/// Verify the credential, persist it and set the cookie / 建立连接
pub async fn open_session(
    state: &AppState,
    cookies: &Cookies,
    credential: Credential,
    remember: bool,
) -> StorageResult<ConnectionRow> {
    // replace an existing session of this browser
    if let Some(old) = session_token(cookies) {
        close_session(state, &old).await;
    }

    let token = generate_token();
    state
        .storage_manager
        .create_driver(&token, DRIVER_TYPE, &credential)
        .await?;

    let ttl = state.config.session_ttl_secs(remember);
    let row = ConnectionRow {
        token: token.clone(),
        access_key_id: credential.access_key_id,
        secret_access_key: credential.secret_access_key,
        region: credential.region,
        bucket: credential.bucket,
        endpoint: credential.endpoint,
        path_style: credential.path_style,
        created_at: Utc::now().to_rfc3339(),
        expires_at: Utc::now().timestamp() + ttl,
    };

    // a driver without its row is unreachable
    if let Err(e) = db::insert_connection(&state.db, &row).await {
        state.storage_manager.remove_driver(&token).await;
        return Err(StorageError::backend("persist connection", e));
    }

    let mut cookie = Cookie::new(SESSION_COOKIE_NAME, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    if remember {
        cookie.set_max_age(Duration::seconds(ttl));
    }
    cookies.add(cookie);

    tracing::info!("Session opened: bucket={}, remember={}", row.bucket, remember);
    Ok(row)
}

/// Drop driver and persisted row / 关闭会话
pub async fn close_session(state: &AppState, token: &str) {
    state.storage_manager.remove_driver(token).await;
    if let Err(e) = db::delete_connection(&state.db, token).await {
        tracing::warn!("Failed to delete connection row: {}", e);
    }
}

pub fn clear_cookie(cookies: &Cookies) {
    // 必须设置相同的 path 才能正确删除 cookie
    let mut removal_cookie = Cookie::new(SESSION_COOKIE_NAME, "");
    removal_cookie.set_path("/");
    cookies.remove(removal_cookie);
}

/// Current unexpired connection / 当前有效连接
pub async fn current_connection(state: &AppState, cookies: &Cookies) -> Option<ConnectionRow> {
    let token = session_token(cookies)?;
    match db::find_connection(&state.db, &token).await {
        Ok(Some(row)) => Some(row),
        Ok(None) => {
            // expired or unknown: make sure no driver outlives the row
            state.storage_manager.remove_driver(&token).await;
            None
        }
        Err(e) => {
            tracing::error!("Failed to load connection: {}", e);
            None
        }
    }
}

/// Purge expired rows and drop drivers left without a row / 清理过期连接及其驱动
///
/// Returns (purged rows, evicted drivers).
pub async fn sweep_expired_sessions(state: &AppState) -> anyhow::Result<(u64, usize)> {
    let purged = db::purge_expired(&state.db).await?;

    let mut evicted = 0;
    for token in state.storage_manager.driver_ids().await {
        if db::find_connection(&state.db, &token).await?.is_none() {
            state.storage_manager.remove_driver(&token).await;
            evicted += 1;
        }
    }

    if purged > 0 || evicted > 0 {
        tracing::info!("Session sweep: purged {} rows, evicted {} drivers", purged, evicted);
    }
    Ok((purged, evicted))
}

/// Driver of the current session, rebuilt from the database when needed / 获取会话驱动
///
/// `Ok(None)` means no valid session. A failed rebuild is returned as the
/// storage error so the caller can report it instead of asking to reconnect.
pub async fn session_driver(state: &AppState, cookies: &Cookies) -> StorageResult<Option<DriverBox>> {
    let row = match current_connection(state, cookies).await {
        Some(row) => row,
        None => return Ok(None),
    };

    if let Some(driver) = state.storage_manager.get_driver(&row.token).await {
        return Ok(Some(driver));
    }

    match state
        .storage_manager
        .create_driver(&row.token, DRIVER_TYPE, &row.credential())
        .await
    {
        Ok(driver) => {
            tracing::info!("Driver restored for bucket {}", row.bucket);
            Ok(Some(driver))
        }
        Err(e) => {
            tracing::warn!("Failed to restore driver for bucket {}: {}", row.bucket, e);
            Err(e)
        }
    }
}
