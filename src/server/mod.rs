//! Server module for MCP protocol handling.
//!
//! This module provides:
//! - MCP server implementation over stdio
//! - Tool call handlers and routing
//! - Shared application state

mod handlers;
mod mcp;

pub use handlers::*;
pub use mcp::*;

use std::sync::Arc;

use crate::config::Config;
use crate::frameworks::FrameworkCatalog;
use crate::langbase::Generator;
use crate::storage::SqliteStorage;
use crate::workflow::Dispatcher;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// SQLite storage backend.
    pub storage: SqliteStorage,
    /// Workflow action dispatcher.
    pub dispatcher: Dispatcher,
}

impl AppState {
    /// Create new application state
    pub fn new(
        config: Config,
        storage: SqliteStorage,
        generator: Arc<dyn Generator>,
        catalog: Arc<FrameworkCatalog>,
    ) -> Self {
        tracing::info!(
            frameworks = catalog.len(),
            critique_pipe = %config.pipes.critique,
            "AppState initializing"
        );

        Self {
            config,
            storage,
            dispatcher: Dispatcher::new(generator, catalog),
        }
    }

    /// The shared framework catalog.
    pub fn catalog(&self) -> &FrameworkCatalog {
        self.dispatcher.catalog()
    }
}

/// Shared application state handle
pub type SharedState = Arc<AppState>;
