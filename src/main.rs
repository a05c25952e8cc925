use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use healthstake::config::{AppConfig, GeminiCredentials};
use healthstake::gateway::{Gateway, GatewayConfig, InMemorySessionStore};
use healthstake::imaging::{ImageAnalysisService, MediaStore};
use healthstake::llm::gemini::GeminiClient;
use healthstake::llm::ContentGenerator;
use healthstake::routes::{configure_routes, RouteConfig};
use healthstake::state::AppState;
use healthstake::store::{DbClient, DbConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!(app = %config.app_name, version = %config.app_version, "Starting");

    let provider: Arc<dyn ContentGenerator> = match &config.gemini {
        GeminiCredentials::ApiKey(key) => Arc::new(
            GeminiClient::with_api_key(key.clone(), config.gemini_model.clone())
                .context("Failed to build Gemini client")?,
        ),
        GeminiCredentials::Vertex {
            project_id,
            location,
        } => Arc::new(
            GeminiClient::with_adc(
                project_id.clone(),
                location.clone(),
                config.gemini_model.clone(),
            )
            .await
            .context("Failed to initialise Vertex AI credentials")?,
        ),
    };

    let gateway = Gateway::new(
        provider,
        Arc::new(InMemorySessionStore::new()),
        GatewayConfig::new(config.gemini_model.clone())
            .with_system_prompt(config.system_prompt.clone())
            .with_system_instruction_supported(config.gemini_system_instruction),
    );

    let db_config = DbConfig::from_connection_string(&config.database_url)?
        .with_max_pool_size(config.database_max_pool_size);
    let db = DbClient::new(db_config)
        .await
        .context("Failed to connect to the database")?;

    tokio::fs::create_dir_all(&config.media_root)
        .await
        .with_context(|| format!("Failed to create {}", config.media_root.display()))?;
    let media = MediaStore::new(config.media_root.clone());

    let state = AppState {
        images: ImageAnalysisService::new(gateway.clone(), Arc::new(db.clone()), media),
        gateway,
        db,
        app_name: config.app_name.as_str().into(),
        app_version: config.app_version.as_str().into(),
    };

    let routes = configure_routes(
        state,
        RouteConfig {
            media_root: config.media_root.clone(),
            max_upload_bytes: config.max_upload_bytes,
        },
    );

    let addr = config.socket_addr();
    tracing::info!("Starting server on http://{}", addr);
    warp::serve(routes).run(addr).await;

    Ok(())
}
