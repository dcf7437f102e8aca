use std::env;
use std::path::PathBuf;

use crate::error::AppError;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Langbase API access.
    pub langbase: LangbaseConfig,
    /// SQLite session store.
    pub database: DatabaseConfig,
    /// Log level and format.
    pub logging: LoggingConfig,
    /// Timeouts and retries for pipe calls.
    pub request: RequestConfig,
    /// Pipe names per stage.
    pub pipes: PipeConfig,
    /// Framework catalog location.
    pub frameworks: FrameworksConfig,
}

/// Langbase API configuration
#[derive(Debug, Clone)]
pub struct LangbaseConfig {
    /// Langbase API key.
    pub api_key: String,
    /// API base URL.
    pub base_url: String,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// SQLite file path.
    pub path: PathBuf,
    /// Pool size.
    pub max_connections: u32,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    /// Human-readable lines.
    Pretty,
    /// One JSON object per line.
    Json,
}

/// HTTP request configuration
///
/// Generation calls carry an explicit timeout and a small bounded retry
/// budget. Exhausting it surfaces as `LangbaseError::Unavailable`.
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// Per-request timeout.
    pub timeout_ms: u64,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Base delay between retries.
    pub retry_delay_ms: u64,
}

/// Langbase pipe name per generation stage
#[derive(Debug, Clone)]
pub struct PipeConfig {
    /// Model used when creating pipes.
    pub model: String,
    /// Clarification pipe.
    pub clarify: String,
    /// Context summary pipe.
    pub summary: String,
    /// Critique pipe, shared by all rounds.
    pub critique: String,
    /// Reflection fold pipe.
    pub context_update: String,
    /// Synthesis pipe.
    pub synthesis: String,
    /// Mitigation pipe.
    pub mitigation: String,
}

/// Framework catalog location
#[derive(Debug, Clone)]
pub struct FrameworksConfig {
    /// Path to the catalog JSON file.
    pub path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let langbase = LangbaseConfig {
            api_key: env::var("LANGBASE_API_KEY").map_err(|_| AppError::Config {
                message: "LANGBASE_API_KEY is required".to_string(),
            })?,
            base_url: env::var("LANGBASE_BASE_URL")
                .unwrap_or_else(|_| "https://api.langbase.com".to_string()),
        };

        let database = DatabaseConfig {
            path: PathBuf::from(
                env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/hardener.db".to_string()),
            ),
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let defaults = RequestConfig::default();
        let request = RequestConfig {
            timeout_ms: env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.timeout_ms),
            max_retries: env::var("MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_retries),
            retry_delay_ms: env::var("RETRY_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.retry_delay_ms),
        };

        let pipe_defaults = PipeConfig::default();
        let pipes = PipeConfig {
            model: env::var("PIPE_MODEL").unwrap_or(pipe_defaults.model),
            clarify: env::var("PIPE_CLARIFY").unwrap_or(pipe_defaults.clarify),
            summary: env::var("PIPE_SUMMARY").unwrap_or(pipe_defaults.summary),
            critique: env::var("PIPE_CRITIQUE").unwrap_or(pipe_defaults.critique),
            context_update: env::var("PIPE_CONTEXT_UPDATE")
                .unwrap_or(pipe_defaults.context_update),
            synthesis: env::var("PIPE_SYNTHESIS").unwrap_or(pipe_defaults.synthesis),
            mitigation: env::var("PIPE_MITIGATION").unwrap_or(pipe_defaults.mitigation),
        };

        let frameworks = FrameworksConfig {
            path: PathBuf::from(
                env::var("FRAMEWORKS_PATH")
                    .unwrap_or_else(|_| "./frameworks/frameworks.json".to_string()),
            ),
        };

        Ok(Config {
            langbase,
            database,
            logging,
            request,
            pipes,
            frameworks,
        })
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 60000,
            max_retries: 1,
            retry_delay_ms: 1000,
        }
    }
}

impl Default for PipeConfig {
    fn default() -> Self {
        Self {
            model: "openai:gpt-4.1-mini".to_string(),
            clarify: "hardener-clarify-v1".to_string(),
            summary: "hardener-summary-v1".to_string(),
            critique: "hardener-critique-v1".to_string(),
            context_update: "hardener-context-update-v1".to_string(),
            synthesis: "hardener-synthesis-v1".to_string(),
            mitigation: "hardener-mitigation-v1".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_config_default_has_single_retry() {
        let config = RequestConfig::default();
        assert_eq!(config.timeout_ms, 60000);
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.retry_delay_ms, 1000);
    }

    #[test]
    fn test_pipe_config_default_names() {
        let pipes = PipeConfig::default();
        assert_eq!(pipes.model, "openai:gpt-4.1-mini");
        assert_eq!(pipes.clarify, "hardener-clarify-v1");
        assert_eq!(pipes.context_update, "hardener-context-update-v1");
        assert_eq!(pipes.mitigation, "hardener-mitigation-v1");
    }
}
