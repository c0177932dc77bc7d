use axum::{
    body::Body,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use rust_embed::RustEmbed;
use sqlx::sqlite::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Embed frontend static files (compile-time embed from frontend/dist) / 嵌入前端静态文件
#[derive(RustEmbed)]
#[folder = "frontend/dist"]
struct FrontendAssets;

mod api;
mod auth;
mod db;
mod state;

use bucketdesk::config;
use state::AppState;

/// Handle embedded static file requests / 处理嵌入的静态文件请求
async fn serve_embedded_file(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');

    // Try to get requested file / 尝试获取请求的文件
    if let Some(content) = FrontendAssets::get(path) {
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        return (
            [(header::CONTENT_TYPE, mime.as_ref().to_string())],
            Body::from(content.data.into_owned()),
        )
            .into_response();
    }

    // If directory or file not found, try return index.html (SPA routing support) / 目录或文件不存在时返回index.html
    if let Some(content) = FrontendAssets::get("index.html") {
        return (
            [(header::CONTENT_TYPE, "text/html; charset=utf-8".to_string())],
            Body::from(content.data.into_owned()),
        )
            .into_response();
    }

    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bucketdesk=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration / 加载配置
    let app_config = config::load_config().map_err(anyhow::Error::msg)?;
    tracing::info!("Server will listen on {}:{}", app_config.server.host, app_config.server.port);

    // Create data directory if not exists / 创建数据目录
    let data_dir = app_config.get_data_dir();
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        tracing::info!("Created data directory: {:?}", data_dir);
    }

    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| app_config.get_database_url());
    let pool = SqlitePool::connect(&database_url).await?;

    db::run_migrations(&pool).await?;

    let storage_manager = bucketdesk::storage::StorageManager::new();
    // Register all storage driver factories / 注册所有存储驱动工厂
    bucketdesk::register_storage_drivers(&storage_manager).await;

    // Drivers of persisted connections are rebuilt lazily on the first request / 已保存的连接在首次请求时重建驱动
    let bind_address = app_config.get_bind_address();
    let state = Arc::new(AppState {
        db: pool,
        storage_manager,
        config: app_config,
    });

    // Sweep expired connections in background / 后台定期清理过期连接
    let sweep_state = state.clone();
    tokio::spawn(async move {
        let period = std::time::Duration::from_secs(sweep_state.config.session.sweep_interval_secs.max(1));
        let mut interval = tokio::time::interval(period);
        // the first tick completes immediately, startup already purged
        interval.tick().await;
        loop {
            interval.tick().await;
            if let Err(e) = auth::sweep_expired_sessions(&sweep_state).await {
                tracing::warn!("Session sweep failed: {}", e);
            }
        }
    });

    let app = api::router(state)
        // Embedded frontend static files
        .fallback(serve_embedded_file)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server running on http://{}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
