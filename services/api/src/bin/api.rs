//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        DbAdapter, InMemoryUsageLimiter, JwtIdentityVerifier, OpenAiCompletionAdapter,
        PdfExtractAdapter, RedisUsageLimiter,
    },
    config::Config,
    error::ApiError,
    web::{self, state::AppState},
};
use async_openai::{config::OpenAIConfig, Client};
use documind_core::ports::UsageLimiter;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool));
    info!("Running database migrations...");
    db_adapter
        .run_migrations()
        .await
        .map_err(|e| ApiError::Internal(format!("Migration failed: {}", e)))?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let identity = Arc::new(
        JwtIdentityVerifier::from_config(&config.identity_key, config.identity_issuer.as_deref())
            .map_err(|e| ApiError::Internal(format!("Invalid identity key: {}", e)))?,
    );

    let usage: Arc<dyn UsageLimiter> = match &config.redis_url {
        Some(url) => {
            info!("Connecting to usage counter...");
            Arc::new(RedisUsageLimiter::connect(url, config.quota).await?)
        }
        None => {
            warn!("REDIS_URL is not set; usage counts are kept in memory and reset on restart");
            Arc::new(InMemoryUsageLimiter::new(config.quota))
        }
    };

    let openai_config = OpenAIConfig::new()
        .with_api_base(&config.llm_api_base)
        .with_api_key(&config.llm_api_key);
    let generator = Arc::new(OpenAiCompletionAdapter::new(
        Client::with_config(openai_config),
        config.completion_model.clone(),
        config.system_instruction.clone(),
    ));

    let extractor = Arc::new(PdfExtractAdapter::new());

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        db: db_adapter,
        config: config.clone(),
        identity,
        usage,
        generator,
        extractor,
    });

    // --- 5. Create the Web Router ---
    let app = web::router(app_state).layer(web::cors_layer(&config)?);

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
