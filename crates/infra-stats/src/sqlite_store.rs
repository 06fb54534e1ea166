// SQLite StatsStore Implementation

use crate::{run_migrations, start_of_day_millis, truncate_url};
use async_trait::async_trait;
use clipqueue_core::domain::SubmitterId;
use clipqueue_core::error::{AppError, Result};
use clipqueue_core::port::{AggregateStats, StatsStore, TimeProvider, UserStats};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::debug;

// Every storage fault is reported as StorageUnavailable; the code keeps the
// SQLite result code visible in logs and API errors
fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => match db_err.code() {
            // SQLite error codes: https://www.sqlite.org/rescode.html
            Some(code) if code.as_ref() == "5" => AppError::StorageUnavailable(format!(
                "Database locked (SQLITE_BUSY): {}",
                db_err.message()
            )),
            Some(code) if code.as_ref() == "13" => {
                AppError::StorageUnavailable(format!("Database full: {}", db_err.message()))
            }
            Some(code) => AppError::StorageUnavailable(format!(
                "Database error [{}]: {}",
                code.as_ref(),
                db_err.message()
            )),
            None => AppError::StorageUnavailable(format!("Database error: {}", db_err.message())),
        },
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            AppError::StorageUnavailable(format!("Connection pool unavailable: {}", err))
        }
        _ => AppError::StorageUnavailable(err.to_string()),
    }
}

/// Durable statistics backed by SQLite
pub struct SqliteStatsStore {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteStatsStore {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl StatsStore for SqliteStatsStore {
    async fn initialize(&self) -> Result<()> {
        run_migrations(&self.pool).await
    }

    async fn record_user(&self, submitter_id: SubmitterId, display_name: &str) -> Result<()> {
        let now = self.time_provider.now_millis();

        sqlx::query(
            r#"
            INSERT INTO users (telegram_id, username, first_seen, last_seen)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(telegram_id) DO UPDATE SET
                username = excluded.username,
                last_seen = excluded.last_seen
            "#,
        )
        .bind(submitter_id)
        .bind(display_name)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        debug!(submitter_id, "User recorded");
        Ok(())
    }

    async fn record_attempt(
        &self,
        submitter_id: SubmitterId,
        source_url: &str,
        success: bool,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO downloads (telegram_id, url, success, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(submitter_id)
        .bind(truncate_url(source_url))
        .bind(success)
        .bind(self.time_provider.now_millis())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        debug!(submitter_id, success, "Attempt recorded");
        Ok(())
    }

    async fn aggregate_stats(&self) -> Result<AggregateStats> {
        let today_start = start_of_day_millis(self.time_provider.now_millis());

        let total_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let (total, successful, today): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(success), 0),
                COALESCE(SUM(CASE WHEN created_at >= ? THEN 1 ELSE 0 END), 0)
            FROM downloads
            "#,
        )
        .bind(today_start)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(AggregateStats {
            total_users,
            total_downloads: total,
            successful_downloads: successful,
            failed_downloads: total - successful,
            today_downloads: today,
        })
    }

    async fn user_stats(&self, submitter_id: SubmitterId) -> Result<UserStats> {
        let today_start = start_of_day_millis(self.time_provider.now_millis());

        let (total, successful, today): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(success), 0),
                COALESCE(SUM(CASE WHEN created_at >= ? THEN 1 ELSE 0 END), 0)
            FROM downloads
            WHERE telegram_id = ?
            "#,
        )
        .bind(today_start)
        .bind(submitter_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(UserStats {
            total_downloads: total,
            successful_downloads: successful,
            failed_downloads: total - successful,
            today_downloads: today,
        })
    }
}
