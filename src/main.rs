use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use idea_hardener::{
    cli::{execute_frameworks, execute_history, execute_inspect, Cli, CliResult, Commands},
    config::{Config, LogFormat},
    frameworks::FrameworkCatalog,
    langbase::LangbaseClient,
    server::{AppState, McpServer},
    storage::SqliteStorage,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(&config);

    let catalog = match FrameworkCatalog::load(&config.frameworks.path) {
        Ok(c) => {
            info!(
                path = %config.frameworks.path.display(),
                frameworks = c.len(),
                "Framework catalog loaded"
            );
            Arc::new(c)
        }
        Err(e) => {
            error!(error = %e, "Failed to load framework catalog");
            return Err(e.into());
        }
    };

    let command = cli.command.unwrap_or(Commands::Serve);
    if command == Commands::Frameworks {
        return exit_with(execute_frameworks(&catalog));
    }

    // Initialize storage
    let storage = match SqliteStorage::new(&config.database).await {
        Ok(s) => {
            info!(path = %config.database.path.display(), "Database initialized");
            s
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize database");
            return Err(e.into());
        }
    };

    match command {
        Commands::Inspect { session_id } => {
            return exit_with(execute_inspect(&storage, &session_id).await);
        }
        Commands::History { session_id, limit } => {
            return exit_with(execute_history(&storage, &session_id, limit).await);
        }
        Commands::Serve | Commands::Frameworks => {}
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Idea hardener starting..."
    );

    // Initialize Langbase client
    let langbase = match LangbaseClient::new(
        &config.langbase,
        config.request.clone(),
        config.pipes.clone(),
    ) {
        Ok(c) => {
            info!(base_url = %config.langbase.base_url, "Langbase client initialized");
            c
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize Langbase client");
            return Err(e.into());
        }
    };

    // Ensure one pipe per generation stage exists (create if needed)
    info!("Ensuring required Langbase pipes exist...");
    if let Err(e) = langbase.ensure_pipes().await {
        error!(error = %e, "Failed to ensure pipes exist");
        return Err(e.into());
    }

    let state = Arc::new(AppState::new(config, storage, Arc::new(langbase), catalog));
    let server = McpServer::new(state);

    info!("Server ready, waiting for requests on stdin...");

    if let Err(e) = server.run().await {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}

fn exit_with(result: CliResult) -> anyhow::Result<()> {
    if result.exit_code == 0 {
        println!("{}", result.message);
        Ok(())
    } else {
        eprintln!("{}", result.message);
        std::process::exit(result.exit_code);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
