//! services/api/src/bin/api.rs

use ad_replacement_core::ports::{AdSelector, AdStore};
use api_lib::{
    adapters::{CatalogAdSelector, DbAdapter, MemoryStore},
    bootstrap,
    config::Config,
    error::ApiError,
    web::{router, ApiDoc, AppState, ROUTES},
};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to the Store & Run Migrations ---
    let store: Arc<dyn AdStore> = match &config.database_url {
        Some(database_url) => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .connect(database_url)
                .await?;
            let db_adapter = DbAdapter::new(db_pool);
            info!("Running database migrations...");
            db_adapter.run_migrations().await?;
            info!("Database migrations complete.");
            Arc::new(db_adapter)
        }
        None => {
            warn!("DATABASE_URL is not set; using the in-memory store");
            Arc::new(MemoryStore::new())
        }
    };
    bootstrap::initialize(store.as_ref()).await;

    // --- 3. Load the Ad Catalog ---
    let selector = match &config.ad_catalog_path {
        Some(path) => CatalogAdSelector::from_path(path)?,
        None => {
            warn!("AD_CATALOG_PATH is not set; every replacement will use the placeholder");
            CatalogAdSelector::default()
        }
    };
    info!(entries = selector.len(), "Ad catalog loaded.");
    let selector: Arc<dyn AdSelector> = Arc::new(selector);

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(store, selector, config.clone()));
    let background = app_state.background.clone();

    // --- 5. Create the Web Router ---
    for route in ROUTES {
        info!(path = route.path, deprecated = route.deprecated, "{}", route.description);
    }
    let app = Router::new()
        .merge(router(app_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // --- 7. Drain Detached Writes ---
    background.close();
    info!(pending = background.len(), "Waiting for background writes...");
    background.wait().await;
    info!("Shutdown complete.");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received.");
}
