//! Storage layer for session persistence.
//!
//! A session's state is stored as one row per key with a JSON value. The
//! current step is never stored; callers re-derive it after loading.

mod sqlite;

pub use sqlite::SqliteStorage;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StorageResult;
use crate::workflow::SessionState;

/// A hardening session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier.
    pub id: String,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session state was last saved.
    pub updated_at: DateTime<Utc>,
}

/// Audit log entry for one workflow action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invocation {
    /// Unique invocation identifier.
    pub id: String,
    /// Session the action ran against.
    pub session_id: Option<String>,
    /// Action name.
    pub action: String,
    /// Action input as JSON.
    pub input: serde_json::Value,
    /// Result as JSON (if successful).
    pub output: Option<serde_json::Value>,
    /// Latency in milliseconds.
    pub latency_ms: Option<i64>,
    /// Whether the action succeeded.
    pub success: bool,
    /// Error message (if failed).
    pub error: Option<String>,
    /// When the action ran.
    pub created_at: DateTime<Utc>,
}

impl Invocation {
    /// Create a new invocation log entry
    pub fn new(action: impl Into<String>, input: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session_id: None,
            action: action.into(),
            input,
            output: None,
            latency_ms: None,
            success: true,
            error: None,
            created_at: Utc::now(),
        }
    }

    /// Set the session ID
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Mark as successful with output
    pub fn success(mut self, output: serde_json::Value, latency_ms: i64) -> Self {
        self.success = true;
        self.output = Some(output);
        self.latency_ms = Some(latency_ms);
        self
    }

    /// Mark as failed with error
    pub fn failure(mut self, error: impl Into<String>, latency_ms: i64) -> Self {
        self.success = false;
        self.error = Some(error.into());
        self.latency_ms = Some(latency_ms);
        self
    }
}

/// Persistence for session state and the action log.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Get a session by ID.
    async fn get_session(&self, id: &str) -> StorageResult<Option<Session>>;

    /// Load a session's state, `None` if the session does not exist.
    ///
    /// Entries with unknown keys or unreadable values are skipped.
    async fn load_state(&self, session_id: &str) -> StorageResult<Option<SessionState>>;

    /// Replace a session's stored state, creating the session if needed.
    async fn save_state(&self, session_id: &str, state: &SessionState) -> StorageResult<()>;

    /// Delete a session and its state. Deleting a missing session is a no-op.
    async fn delete_session(&self, id: &str) -> StorageResult<()>;

    /// Record an action in the audit log.
    async fn log_invocation(&self, invocation: &Invocation) -> StorageResult<()>;

    /// Audit log entries for a session, oldest first.
    async fn get_invocations(&self, session_id: &str) -> StorageResult<Vec<Invocation>>;
}
