//! # Idea Hardener
//!
//! A Model Context Protocol (MCP) server that walks an idea through a staged
//! critique workflow, delegating each generation stage to a Langbase Pipe.
//!
//! ## Workflow
//!
//! 1. **Clarify**: the idea is reframed and five clarifying questions are asked
//! 2. **Summarize**: answers are folded into a context summary
//! 3. **Critique rounds**: up to three rounds of framework-based critique, each
//!    followed by user reflections that are folded back into the summary
//! 4. **Synthesize**: all rounds are condensed into a synthesis
//! 5. **Mitigate**: concrete improvements are generated from the synthesis
//!
//! Editing an earlier stage clears everything downstream of it. The current
//! step is never stored; it is always derived from the session's contents.
//!
//! ## Architecture
//!
//! ```text
//! MCP Client → MCP Server (Rust) → Langbase Pipes (HTTP)
//!                    ↓
//!              SQLite (Sessions)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use idea_hardener::{Config, AppState, McpServer};
//! use idea_hardener::frameworks::FrameworkCatalog;
//! use idea_hardener::langbase::LangbaseClient;
//! use idea_hardener::storage::SqliteStorage;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let catalog = Arc::new(FrameworkCatalog::load(&config.frameworks.path)?);
//!     let storage = SqliteStorage::new(&config.database).await?;
//!     let langbase = LangbaseClient::new(&config.langbase, config.request.clone(), config.pipes.clone())?;
//!     let state = Arc::new(AppState::new(config, storage, Arc::new(langbase), catalog));
//!     McpServer::new(state).run().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// Command-line interface.
pub mod cli;
/// Configuration management for the MCP server.
pub mod config;
/// Error types and result aliases for the application.
pub mod error;
/// Critique framework catalog.
pub mod frameworks;
/// Langbase API client and the generation seam.
pub mod langbase;
/// Prompt text for every generation stage.
pub mod prompts;
/// MCP server implementation and request handling.
pub mod server;
/// SQLite storage layer for session persistence.
pub mod storage;
/// Session state, actions and the hardening workflow.
pub mod workflow;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use server::{AppState, McpServer, SharedState};
