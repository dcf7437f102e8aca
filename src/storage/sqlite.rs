use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info, warn};

use super::{Invocation, Session, Storage};
use crate::config::DatabaseConfig;
use crate::error::{StorageError, StorageResult};
use crate::workflow::{SessionState, StateKey, StateValue};

/// Static migrator that embeds migrations at compile time
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// SQLite-backed storage implementation
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Create a new SQLite storage instance
    pub async fn new(config: &DatabaseConfig) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Connection {
                message: format!("Failed to create database directory: {}", e),
            })?;
        }

        let database_url = format!("sqlite://{}?mode=rwc", config.path.display());

        let options = SqliteConnectOptions::from_str(&database_url)
            .map_err(|e| StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            })?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to connect to database: {}", e),
            })?;

        let storage = Self { pool };
        storage.run_migrations().await?;

        Ok(storage)
    }

    /// Create an in-memory database (for tests).
    ///
    /// Limited to one connection so every query sees the same database.
    pub async fn new_in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            })?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to open in-memory database: {}", e),
            })?;

        let storage = Self { pool };
        storage.run_migrations().await?;

        Ok(storage)
    }

    /// Run database migrations using embedded sqlx migrations
    async fn run_migrations(&self) -> StorageResult<()> {
        info!("Running database migrations...");

        MIGRATOR.run(&self.pool).await.map_err(|e| StorageError::Migration {
            message: format!("Failed to run migrations: {}", e),
        })?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Get the underlying pool for advanced queries
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn get_session(&self, id: &str) -> StorageResult<Option<Session>> {
        let row: Option<SessionRow> = sqlx::query_as(
            r#"
            SELECT id, created_at, updated_at
            FROM sessions
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    async fn load_state(&self, session_id: &str) -> StorageResult<Option<SessionState>> {
        if self.get_session(session_id).await?.is_none() {
            return Ok(None);
        }

        let rows: Vec<EntryRow> = sqlx::query_as(
            r#"
            SELECT key, value
            FROM session_entries
            WHERE session_id = ?
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        let mut state = SessionState::new();
        for row in rows {
            let key = match StateKey::from_str(&row.key) {
                Ok(key) => key,
                Err(e) => {
                    warn!(session_id, key = %row.key, error = %e, "Skipping unknown state key");
                    continue;
                }
            };
            match serde_json::from_str::<StateValue>(&row.value) {
                Ok(value) => state.set(key, value),
                Err(e) => {
                    warn!(session_id, key = %key, error = %e, "Skipping unreadable state value");
                }
            }
        }

        debug!(session_id, entries = state.len(), "Session state loaded");
        Ok(Some(state))
    }

    async fn save_state(&self, session_id: &str, state: &SessionState) -> StorageResult<()> {
        let mut entries = Vec::with_capacity(state.len());
        for (key, value) in state.iter() {
            let json = serde_json::to_string(value).map_err(|e| StorageError::Serialization {
                key: key.to_string(),
                message: e.to_string(),
            })?;
            entries.push((key.as_str(), json));
        }

        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO sessions (id, created_at, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET updated_at = excluded.updated_at
            "#,
        )
        .bind(session_id)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM session_entries WHERE session_id = ?")
            .bind(session_id)
            .execute(&mut *tx)
            .await?;

        for (key, json) in &entries {
            sqlx::query(
                r#"
                INSERT INTO session_entries (session_id, key, value)
                VALUES (?, ?, ?)
                "#,
            )
            .bind(session_id)
            .bind(*key)
            .bind(json)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(session_id, entries = entries.len(), "Session state saved");
        Ok(())
    }

    async fn delete_session(&self, id: &str) -> StorageResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM session_entries WHERE session_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn log_invocation(&self, invocation: &Invocation) -> StorageResult<()> {
        let input = serde_json::to_string(&invocation.input).unwrap_or_default();
        let output = invocation
            .output
            .as_ref()
            .map(|o| serde_json::to_string(o).unwrap_or_default());

        sqlx::query(
            r#"
            INSERT INTO invocations (id, session_id, action, input, output, latency_ms, success, error, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&invocation.id)
        .bind(&invocation.session_id)
        .bind(&invocation.action)
        .bind(&input)
        .bind(&output)
        .bind(invocation.latency_ms)
        .bind(invocation.success)
        .bind(&invocation.error)
        .bind(invocation.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_invocations(&self, session_id: &str) -> StorageResult<Vec<Invocation>> {
        let rows: Vec<InvocationRow> = sqlx::query_as(
            r#"
            SELECT id, session_id, action, input, output, latency_ms, success, error, created_at
            FROM invocations
            WHERE session_id = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

// Internal row types for SQLx mapping
#[derive(sqlx::FromRow)]
struct SessionRow {
    id: String,
    created_at: String,
    updated_at: String,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Self {
            id: row.id,
            created_at: parse_timestamp(&row.created_at),
            updated_at: parse_timestamp(&row.updated_at),
        }
    }
}

#[derive(sqlx::FromRow)]
struct EntryRow {
    key: String,
    value: String,
}

#[derive(sqlx::FromRow)]
struct InvocationRow {
    id: String,
    session_id: Option<String>,
    action: String,
    input: String,
    output: Option<String>,
    latency_ms: Option<i64>,
    success: bool,
    error: Option<String>,
    created_at: String,
}

impl From<InvocationRow> for Invocation {
    fn from(row: InvocationRow) -> Self {
        Self {
            id: row.id,
            session_id: row.session_id,
            action: row.action,
            input: serde_json::from_str(&row.input).unwrap_or_default(),
            output: row.output.and_then(|s| serde_json::from_str(&s).ok()),
            latency_ms: row.latency_ms,
            success: row.success,
            error: row.error,
            created_at: parse_timestamp(&row.created_at),
        }
    }
}
