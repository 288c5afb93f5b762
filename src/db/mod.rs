pub mod sqlite_schema;

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use thiserror::Error;

use crate::db::sqlite_schema::{split_sql_statements, PROGRESS_SCHEMA_SQL, SCHEMA_VERSION};
use crate::feedback::{FeedbackEntry, FeedbackKind};
use crate::mastery::{clamp_mastery, MasteryRecord, MasteryTable};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// SQLite-backed progress and feedback tables.
#[derive(Clone)]
pub struct ProgressStore {
    pool: SqlitePool,
}

impl ProgressStore {
    pub async fn open(db_path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Io(e.to_string()))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        tracing::info!(path = %db_path.display(), "progress store ready");
        Ok(store)
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        let version: Option<String> =
            sqlx::query_scalar(r#"SELECT "value" FROM "_db_metadata" WHERE "key" = 'schema_version'"#)
                .fetch_optional(&self.pool)
                .await
                .unwrap_or(None);

        if version.as_deref() == Some(SCHEMA_VERSION) {
            return Ok(());
        }

        for stmt in split_sql_statements(PROGRESS_SCHEMA_SQL) {
            sqlx::query(&stmt).execute(&self.pool).await?;
        }

        sqlx::query(r#"INSERT OR REPLACE INTO "_db_metadata" ("key", "value") VALUES ('schema_version', ?)"#)
            .bind(SCHEMA_VERSION)
            .execute(&self.pool)
            .await?;

        tracing::debug!(version = SCHEMA_VERSION, "progress schema applied");
        Ok(())
    }

    pub async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    pub async fn load_progress(&self) -> Result<MasteryTable, StoreError> {
        let rows = sqlx::query(
            r#"SELECT "user_id", "course", "topic", "mastery_level" FROM "student_progress""#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(MasteryRecord {
                user_id: row.try_get("user_id")?,
                course: row.try_get("course")?,
                topic: row.try_get("topic")?,
                mastery_level: row.try_get::<f64, _>("mastery_level")?,
            });
        }

        Ok(MasteryTable::new(records))
    }

    /// A failed read is a cold start, not an error.
    pub async fn load_progress_or_empty(&self) -> MasteryTable {
        match self.load_progress().await {
            Ok(table) => table,
            Err(err) => {
                tracing::warn!(error = %err, "progress table unavailable, treating as empty");
                MasteryTable::empty()
            }
        }
    }

    pub async fn get_progress(
        &self,
        user_id: &str,
        course: &str,
        topic: &str,
    ) -> Result<f64, StoreError> {
        let level: Option<f64> = sqlx::query_scalar(
            r#"SELECT "mastery_level" FROM "student_progress" WHERE "user_id" = ? AND "course" = ? AND "topic" = ?"#,
        )
        .bind(user_id)
        .bind(course)
        .bind(topic)
        .fetch_optional(&self.pool)
        .await?;

        Ok(level.unwrap_or(0.0))
    }

    /// Stores the clamped level and returns it.
    pub async fn upsert_progress(
        &self,
        user_id: &str,
        course: &str,
        topic: &str,
        mastery_level: f64,
    ) -> Result<f64, StoreError> {
        let level = clamp_mastery(mastery_level);
        sqlx::query(
            r#"
            INSERT INTO "student_progress" ("user_id", "course", "topic", "mastery_level")
            VALUES (?, ?, ?, ?)
            ON CONFLICT ("user_id", "course", "topic") DO UPDATE SET
                "mastery_level" = excluded."mastery_level"
            "#,
        )
        .bind(user_id)
        .bind(course)
        .bind(topic)
        .bind(level)
        .execute(&self.pool)
        .await?;

        Ok(level)
    }

    pub async fn record_feedback(
        &self,
        user_id: &str,
        topic: &str,
        kind: FeedbackKind,
    ) -> Result<FeedbackEntry, StoreError> {
        let recorded_at = Utc::now();
        sqlx::query(
            r#"INSERT INTO "feedback" ("recorded_at", "user_id", "topic", "feedback") VALUES (?, ?, ?, ?)"#,
        )
        .bind(recorded_at)
        .bind(user_id)
        .bind(topic)
        .bind(kind.as_str())
        .execute(&self.pool)
        .await?;

        Ok(FeedbackEntry {
            user_id: user_id.to_string(),
            topic: topic.to_string(),
            kind,
            recorded_at,
        })
    }

    pub async fn list_feedback(&self, user_id: &str) -> Result<Vec<FeedbackEntry>, StoreError> {
        let rows = sqlx::query(
            r#"SELECT "recorded_at", "user_id", "topic", "feedback" FROM "feedback" WHERE "user_id" = ? ORDER BY "id""#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<FeedbackEntry, StoreError> {
                let raw_kind: String = row.try_get("feedback")?;
                let kind = FeedbackKind::from_stored(&raw_kind);
                Ok(FeedbackEntry {
                    user_id: row.try_get("user_id")?,
                    topic: row.try_get("topic")?,
                    kind,
                    recorded_at: row.try_get::<DateTime<Utc>, _>("recorded_at")?,
                })
            })
            .collect()
    }
}
