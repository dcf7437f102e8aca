use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Langbase error: {0}")]
    Langbase(#[from] LangbaseError),

    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("Framework catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("MCP protocol error: {0}")]
    Mcp(#[from] McpError),
}

/// Storage layer errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database connection failed: {message}")]
    Connection { message: String },

    #[error("Migration failed: {message}")]
    Migration { message: String },

    #[error("Failed to serialize value for key {key}: {message}")]
    Serialization { key: String, message: String },

    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Langbase API errors
#[derive(Debug, Error)]
pub enum LangbaseError {
    #[error("Langbase unavailable: {message} (retries: {retries})")]
    Unavailable { message: String, retries: u32 },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Errors raised while processing a workflow action.
///
/// `Validation` and `MissingPrerequisite` are recoverable and leave the
/// session store untouched. `Generation` wraps a failure of the text
/// generation backend and is not retried at this layer.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{reason}")]
    Validation { field: String, reason: String },

    #[error("Missing prerequisite: {key} has not been produced yet")]
    MissingPrerequisite { key: String },

    #[error("Malformed {stage} output: {reason}")]
    MalformedOutput { stage: String, reason: String },

    #[error("Generation failed: {0}")]
    Generation(#[from] LangbaseError),
}

impl WorkflowError {
    /// Whether the user can correct their input and resubmit.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, WorkflowError::Generation(_))
    }
}

/// Framework catalog errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read framework catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse framework catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate framework name: {name}")]
    DuplicateName { name: String },

    #[error("Framework catalog is empty")]
    Empty,

    #[error("Framework at position {index} has an empty name")]
    EmptyName { index: usize },
}

/// MCP protocol errors
#[derive(Debug, Error)]
pub enum McpError {
    #[error("Unknown tool: {tool_name}")]
    UnknownTool { tool_name: String },

    #[error("Invalid parameters for {tool_name}: {message}")]
    InvalidParameters { tool_name: String, message: String },

    #[error("Tool execution failed: {message}")]
    ExecutionFailed { message: String },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<AppError> for McpError {
    fn from(err: AppError) -> Self {
        McpError::ExecutionFailed {
            message: err.to_string(),
        }
    }
}

impl From<StorageError> for McpError {
    fn from(err: StorageError) -> Self {
        McpError::ExecutionFailed {
            message: err.to_string(),
        }
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for Langbase operations
pub type LangbaseResult<T> = Result<T, LangbaseError>;

/// Result type alias for workflow actions
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Result type alias for MCP operations
pub type McpResult<T> = Result<T, McpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::Config {
            message: "missing key".to_string(),
        };
        assert_eq!(err.to_string(), "Configuration error: missing key");
    }

    #[test]
    fn test_validation_error_displays_reason_verbatim() {
        let err = WorkflowError::Validation {
            field: "problem".to_string(),
            reason: "Please provide both a problem and an approach.".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Please provide both a problem and an approach."
        );
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_generation_error_is_not_recoverable() {
        let err: WorkflowError = LangbaseError::Timeout { timeout_ms: 5000 }.into();
        assert!(!err.is_recoverable());
        assert_eq!(
            err.to_string(),
            "Generation failed: Request timeout after 5000ms"
        );
    }

    #[test]
    fn test_missing_prerequisite_display() {
        let err = WorkflowError::MissingPrerequisite {
            key: "context_summary".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Missing prerequisite: context_summary has not been produced yet"
        );
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_langbase_error_display() {
        let err = LangbaseError::Unavailable {
            message: "server down".to_string(),
            retries: 2,
        };
        assert_eq!(err.to_string(), "Langbase unavailable: server down (retries: 2)");

        let err = LangbaseError::Api {
            status: 401,
            message: "unauthorized".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 401 - unauthorized");
    }

    #[test]
    fn test_catalog_error_display() {
        let err = CatalogError::DuplicateName {
            name: "Pre-Mortem".to_string(),
        };
        assert_eq!(err.to_string(), "Duplicate framework name: Pre-Mortem");
        assert_eq!(CatalogError::Empty.to_string(), "Framework catalog is empty");
        assert_eq!(
            CatalogError::EmptyName { index: 2 }.to_string(),
            "Framework at position 2 has an empty name"
        );
    }

    #[test]
    fn test_workflow_error_conversion_to_app_error() {
        let err = WorkflowError::MalformedOutput {
            stage: "clarify".to_string(),
            reason: "found 3 of 5 questions".to_string(),
        };
        let app_err: AppError = err.into();
        assert!(matches!(app_err, AppError::Workflow(_)));
        assert!(app_err.to_string().contains("Malformed clarify output"));
    }

    #[test]
    fn test_app_error_conversion_to_mcp_error() {
        let app_err = AppError::Config {
            message: "test error".to_string(),
        };
        let mcp_err: McpError = app_err.into();
        assert!(matches!(mcp_err, McpError::ExecutionFailed { .. }));
        assert!(mcp_err.to_string().contains("Configuration error"));
    }
}
