//! Command-line interface.
//!
//! Without a subcommand the binary serves MCP over stdio. The remaining
//! commands inspect the framework catalog and stored sessions.

use clap::{Parser, Subcommand};

use crate::frameworks::FrameworkCatalog;
use crate::storage::{SqliteStorage, Storage};
use crate::workflow::derive_step;

/// Idea hardener MCP server.
#[derive(Parser, Debug)]
#[command(name = "idea-hardener", version, about)]
pub struct Cli {
    /// Command to run (defaults to `serve`).
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// CLI subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Serve MCP over stdio
    Serve,

    /// List the critique frameworks in the catalog
    Frameworks,

    /// Show a stored session's state and derived step
    Inspect {
        /// Session ID
        session_id: String,
    },

    /// Show the action log for a session
    History {
        /// Session ID
        session_id: String,

        /// Maximum number of entries to show (most recent)
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

/// Result of CLI command execution.
pub struct CliResult {
    /// Exit code (0 = success)
    pub exit_code: i32,
    /// Output message
    pub message: String,
}

impl CliResult {
    /// Create a success result with the given message.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            message: message.into(),
        }
    }

    /// Create an error result with the given message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            exit_code: 1,
            message: message.into(),
        }
    }
}

const RULE: &str = "═══════════════════════════════════════════════════════════════════════════════\n";

/// List catalog frameworks with their tooltips.
pub fn execute_frameworks(catalog: &FrameworkCatalog) -> CliResult {
    let mut output = String::new();
    output.push_str(&format!("\nCritique Frameworks ({})\n", catalog.len()));
    output.push_str(RULE);
    output.push('\n');

    for option in catalog.options() {
        output.push_str(&format!("  {}\n    {}\n", option.name, option.tooltip));
    }

    CliResult::success(output)
}

/// Show a session's stored keys and derived step.
pub async fn execute_inspect(storage: &SqliteStorage, session_id: &str) -> CliResult {
    let state = match storage.load_state(session_id).await {
        Ok(Some(state)) => state,
        Ok(None) => return CliResult::error(format!("Session not found: {}", session_id)),
        Err(e) => return CliResult::error(format!("Failed to load session: {}", e)),
    };

    let step = derive_step(&state);
    let mut output = String::new();
    output.push_str(&format!("\nSession {}\n", session_id));
    output.push_str(RULE);
    output.push_str(&format!("Step: {} ({})\n\n", step.number(), step.name()));

    for (key, value) in state.iter() {
        let rendered = serde_json::to_string(value).unwrap_or_else(|e| e.to_string());
        output.push_str(&format!("  {}: {}\n", key, truncate(&rendered, 70)));
    }

    CliResult::success(output)
}

/// Show the most recent action log entries for a session.
pub async fn execute_history(storage: &SqliteStorage, session_id: &str, limit: usize) -> CliResult {
    let invocations = match storage.get_invocations(session_id).await {
        Ok(invocations) => invocations,
        Err(e) => return CliResult::error(format!("Failed to load history: {}", e)),
    };

    let mut output = String::new();
    output.push_str(&format!("\nAction History for {}\n", session_id));
    output.push_str(RULE);
    output.push('\n');

    if invocations.is_empty() {
        output.push_str("No actions recorded.\n");
        return CliResult::success(output);
    }

    let skip = invocations.len().saturating_sub(limit);
    for invocation in invocations.iter().skip(skip) {
        let status = if invocation.success {
            "[OK]"
        } else {
            "[FAILED]"
        };
        output.push_str(&format!(
            "  {} {} {} ({}ms)",
            invocation.created_at.format("%Y-%m-%d %H:%M:%S"),
            status,
            invocation.action,
            invocation.latency_ms.unwrap_or(0)
        ));
        if let Some(error) = &invocation.error {
            output.push_str(&format!(": {}", truncate(error, 60)));
        }
        output.push('\n');
    }

    CliResult::success(output)
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}…", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frameworks::Framework;
    use crate::storage::Invocation;
    use crate::workflow::{SessionState, StateKey};

    fn catalog() -> FrameworkCatalog {
        FrameworkCatalog::new(vec![Framework {
            name: "Pre-mortem".to_string(),
            description: "Imagine failure".to_string(),
            output_instructions: String::new(),
            tooltip: "Assume it failed".to_string(),
        }])
        .unwrap()
    }

    #[test]
    fn test_cli_defaults_to_no_subcommand() {
        let cli = Cli::parse_from(["idea-hardener"]);
        assert!(cli.command.is_none());

        let cli = Cli::parse_from(["idea-hardener", "history", "s1", "--limit", "3"]);
        assert_eq!(
            cli.command,
            Some(Commands::History {
                session_id: "s1".to_string(),
                limit: 3
            })
        );
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc…");
    }

    #[test]
    fn test_frameworks_output() {
        let result = execute_frameworks(&catalog());
        assert_eq!(result.exit_code, 0);
        assert!(result.message.contains("Pre-mortem"));
        assert!(result.message.contains("Assume it failed"));
    }

    #[tokio::test]
    async fn test_inspect_missing_session() {
        let storage = SqliteStorage::new_in_memory().await.unwrap();
        let result = execute_inspect(&storage, "nope").await;
        assert_eq!(result.exit_code, 1);
    }

    #[tokio::test]
    async fn test_inspect_and_history() {
        let storage = SqliteStorage::new_in_memory().await.unwrap();
        let mut state = SessionState::new();
        state.set(StateKey::Problem, "X");
        storage.save_state("s1", &state).await.unwrap();
        storage
            .log_invocation(
                &Invocation::new("submit_idea", serde_json::json!({}))
                    .with_session("s1")
                    .failure("boom", 4),
            )
            .await
            .unwrap();

        let inspect = execute_inspect(&storage, "s1").await;
        assert_eq!(inspect.exit_code, 0);
        assert!(inspect.message.contains("Step: 0 (initial)"));
        assert!(inspect.message.contains("problem: \"X\""));

        let history = execute_history(&storage, "s1", 10).await;
        assert!(history.message.contains("[FAILED] submit_idea (4ms): boom"));
    }
}
