/// Server setup and initialization
///
/// Wires together storage, the template catalog, the generation provider, and HTTP
/// routes. `build_router` takes a ready `AppState` so tests can inject their own
/// provider and database.

use crate::{
    account::storage::AccountStorage,
    api::{create_template_routes, create_user_routes, create_workflow_routes, AppState},
    config::Config,
    database,
    generation::{CompletionOptions, OpenAiProvider, WorkflowGenerator},
    template::{TemplateRegistry, TemplateStorage},
    workflow::storage::WorkflowStorage,
};
use anyhow::Result;
use axum::{routing::get, Router};
use sqlx::sqlite::SqlitePool;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Build application state over an open pool
///
/// Seeds and loads the template catalog.
pub async fn build_state(pool: SqlitePool, generator: Arc<WorkflowGenerator>) -> Result<AppState> {
    let template_storage = TemplateStorage::new(pool.clone());
    template_storage
        .seed_defaults()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to seed template catalog: {}", e))?;

    tracing::info!("📚 Loading template catalog");
    let templates = Arc::new(TemplateRegistry::new(template_storage));
    let count = templates
        .reload()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load template catalog: {}", e))?;
    tracing::info!("📚 {} templates available", count);

    Ok(AppState {
        workflows: WorkflowStorage::new(pool.clone()),
        accounts: AccountStorage::new(pool),
        templates,
        generator,
    })
}

/// Router with every endpoint mounted
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check endpoint
        .route("/healthz", get(health_check))
        .merge(create_workflow_routes())
        .merge(create_template_routes())
        .merge(create_user_routes())
        .with_state(state)
}

/// Create the main Axum application from configuration
pub async fn create_app(config: Config) -> Result<Router> {
    let pool = database::connect(&config.database.database_path())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open database: {}", e))?;

    tracing::info!(
        "🤖 Initializing generation provider ({} via {})",
        config.generation.model,
        config.generation.api_base
    );
    let provider = OpenAiProvider::new(&config.generation)?;
    let generator = Arc::new(WorkflowGenerator::new(
        Arc::new(provider),
        CompletionOptions::from(&config.generation),
    ));

    let state = build_state(pool, generator).await?;

    tracing::info!("📡 Creating HTTP router with all endpoints");
    let app = build_router(state);

    tracing::info!("✅ Application initialized successfully");
    Ok(app)
}

/// Start the HTTP server with the given configuration
pub async fn start_server(config: Config) -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    tracing::info!("Starting Flowsmith server...");

    let app = create_app(config.clone()).await?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "ok"
}
