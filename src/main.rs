/// Flowsmith server entry point
///
/// Serves:
/// - Workflow generation and download at /api/workflows/*
/// - Template catalog at /api/templates/*
/// - Plan management at /api/users/*
/// - Health check at /healthz

use flowsmith::{config::Config, server::start_server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration (defaults to 0.0.0.0:3004, data/flowsmith.db, gpt-4o)
    let config = Config::default();

    start_server(config).await?;

    Ok(())
}
