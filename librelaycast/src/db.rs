//! Durable queue of discovered posts
//!
//! One long-lived [`SqlitePool`] backs every operation. Rows are inserted
//! with insert-or-ignore semantics keyed on the external post id, consumed
//! in ascending `id` order, and never deleted.

use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use std::path::Path;

use crate::error::{DbError, Result};
use crate::types::{PostStatus, QueueStats, QueuedPost, ScrapedPost};

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) the store and bring the schema up to date.
    ///
    /// Idempotent: safe to call on every process start.
    pub async fn new(db_path: &str) -> Result<Self> {
        let expanded_path = shellexpand::tilde(db_path).to_string();
        let path = Path::new(&expanded_path);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(DbError::IoError)?;
            }
        }

        // mode=rwc creates the file when missing
        let db_url = format!("sqlite://{}?mode=rwc", expanded_path.replace('\\', "/"));

        let pool = SqlitePool::connect(&db_url)
            .await
            .map_err(DbError::SqlxError)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(DbError::MigrationError)?;

        Ok(Self { pool })
    }

    /// Open an existing store for inspection only.
    ///
    /// Never creates the file or runs migrations; writes through the
    /// returned handle fail.
    pub async fn open_read_only(db_path: &str) -> Result<Self> {
        let expanded_path = shellexpand::tilde(db_path).to_string();

        if !Path::new(&expanded_path).is_file() {
            return Err(DbError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no queue database at {}", expanded_path),
            ))
            .into());
        }

        let db_url = format!("sqlite://{}?mode=ro", expanded_path.replace('\\', "/"));

        let pool = SqlitePool::connect(&db_url)
            .await
            .map_err(DbError::SqlxError)?;

        Ok(Self { pool })
    }

    /// Queue newly discovered posts for `account`.
    ///
    /// Posts whose external id is already stored (from any account) are
    /// ignored, never updated. Posts without an external id or with blank
    /// text are skipped. Returns how many rows were actually added.
    pub async fn insert_many(&self, account: &str, posts: &[ScrapedPost]) -> Result<u64> {
        let mut tx = self.pool.begin().await.map_err(DbError::SqlxError)?;
        let mut inserted = 0;

        for post in posts {
            if post.external_id.is_empty() || post.text.trim().is_empty() {
                continue;
            }

            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO posts (account, post_id, text, created_at)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(account)
            .bind(&post.external_id)
            .bind(&post.text)
            .bind(&post.created_at)
            .execute(&mut *tx)
            .await
            .map_err(DbError::SqlxError)?;

            inserted += result.rows_affected();
        }

        tx.commit().await.map_err(DbError::SqlxError)?;

        Ok(inserted)
    }

    /// Oldest record still waiting to be published
    pub async fn next_pending(&self) -> Result<Option<QueuedPost>> {
        let row = sqlx::query(
            r#"
            SELECT id, account, post_id, text, status, created_at
            FROM posts
            WHERE status = 'new'
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(row.as_ref().map(row_to_post))
    }

    /// Transition a record from `new` to `sent`.
    ///
    /// Missing or already-sent ids are a no-op. Returns whether a row changed.
    pub async fn mark_sent(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE posts SET status = 'sent' WHERE id = ? AND status = 'new'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn get_post(&self, id: i64) -> Result<Option<QueuedPost>> {
        let row = sqlx::query(
            r#"
            SELECT id, account, post_id, text, status, created_at
            FROM posts WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(row.as_ref().map(row_to_post))
    }

    /// List records in queue order, optionally filtered by status
    pub async fn list_posts(
        &self,
        status: Option<PostStatus>,
        limit: usize,
    ) -> Result<Vec<QueuedPost>> {
        let rows = match status {
            Some(status) => {
                sqlx::query(
                    r#"
                    SELECT id, account, post_id, text, status, created_at
                    FROM posts
                    WHERE status = ?
                    ORDER BY id ASC
                    LIMIT ?
                    "#,
                )
                .bind(status.as_str())
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT id, account, post_id, text, status, created_at
                    FROM posts
                    ORDER BY id ASC
                    LIMIT ?
                    "#,
                )
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(DbError::SqlxError)?;

        Ok(rows.iter().map(row_to_post).collect())
    }

    pub async fn stats(&self) -> Result<QueueStats> {
        let row = sqlx::query(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN status = 'new' THEN 1 ELSE 0 END), 0) AS pending,
                COALESCE(SUM(CASE WHEN status = 'sent' THEN 1 ELSE 0 END), 0) AS sent
            FROM posts
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(QueueStats {
            pending: row.get("pending"),
            sent: row.get("sent"),
        })
    }
}

fn row_to_post(r: &SqliteRow) -> QueuedPost {
    QueuedPost {
        id: r.get("id"),
        account: r.get::<Option<String>, _>("account").unwrap_or_default(),
        external_id: r.get::<Option<String>, _>("post_id").unwrap_or_default(),
        text: r.get::<Option<String>, _>("text").unwrap_or_default(),
        status: r
            .get::<Option<String>, _>("status")
            .and_then(|s| s.parse().ok())
            .unwrap_or(PostStatus::New),
        created_at: r.get::<Option<String>, _>("created_at").unwrap_or_default(),
    }
}
