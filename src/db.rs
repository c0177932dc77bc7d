use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;

use bucketdesk::models::ConnectionRow;

/// Run database migrations / 运行数据库迁移
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS connections (
            token TEXT PRIMARY KEY,
            access_key_id TEXT NOT NULL,
            secret_access_key TEXT NOT NULL,
            region TEXT NOT NULL,
            bucket TEXT NOT NULL,
            endpoint TEXT NOT NULL DEFAULT '',
            path_style INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            expires_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_connections_expires ON connections(expires_at)")
        .execute(pool)
        .await?;

    let purged = purge_expired(pool).await?;
    if purged > 0 {
        tracing::info!("Purged {} expired connections", purged);
    }

    Ok(())
}

/// Delete expired connections / 清理过期连接
pub async fn purge_expired(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM connections WHERE expires_at <= ?")
        .bind(Utc::now().timestamp())
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn insert_connection(pool: &SqlitePool, row: &ConnectionRow) -> Result<()> {
    sqlx::query(
        r#"INSERT INTO connections
           (token, access_key_id, secret_access_key, region, bucket, endpoint, path_style, created_at, expires_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&row.token)
    .bind(&row.access_key_id)
    .bind(&row.secret_access_key)
    .bind(&row.region)
    .bind(&row.bucket)
    .bind(&row.endpoint)
    .bind(row.path_style)
    .bind(&row.created_at)
    .bind(row.expires_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Unexpired connection by token / 按token查询未过期的连接
pub async fn find_connection(pool: &SqlitePool, token: &str) -> Result<Option<ConnectionRow>> {
    let row = sqlx::query_as::<_, ConnectionRow>(
        "SELECT * FROM connections WHERE token = ? AND expires_at > ?",
    )
    .bind(token)
    .bind(Utc::now().timestamp())
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn delete_connection(pool: &SqlitePool, token: &str) -> Result<()> {
    sqlx::query("DELETE FROM connections WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}

/// Single-connection in-memory database for tests / 测试用内存数据库
#[cfg(test)]
pub async fn memory_pool() -> SqlitePool {
    // every connection to sqlite::memory: is a separate database
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    run_migrations(&pool).await.unwrap();
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(token: &str, expires_at: i64) -> ConnectionRow {
        ConnectionRow {
            token: token.to_string(),
            access_key_id: "ak".to_string(),
            secret_access_key: "sk".to_string(),
            region: "us-east-1".to_string(),
            bucket: "files".to_string(),
            endpoint: String::new(),
            path_style: true,
            created_at: Utc::now().to_rfc3339(),
            expires_at,
        }
    }

    #[tokio::test]
    async fn test_connection_lifecycle() {
        let pool = memory_pool().await;
        let now = Utc::now().timestamp();

        insert_connection(&pool, &row("live", now + 3600)).await.unwrap();
        insert_connection(&pool, &row("old", now - 10)).await.unwrap();

        let found = find_connection(&pool, "live").await.unwrap().unwrap();
        assert_eq!(found.bucket, "files");
        assert!(found.path_style);
        assert!(find_connection(&pool, "old").await.unwrap().is_none());

        assert_eq!(purge_expired(&pool).await.unwrap(), 1);

        delete_connection(&pool, "live").await.unwrap();
        assert!(find_connection(&pool, "live").await.unwrap().is_none());
    }
}
