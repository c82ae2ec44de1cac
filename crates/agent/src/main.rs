//! Surge Agent - hospital patient-surge prediction service
//!
//! Loads or trains the surge model at startup and serves predictions,
//! model management, health and metrics over HTTP.

use anyhow::Result;
use std::sync::Arc;
use surge_agent::{api, AgentConfig, AppState};
use surge_engine::{
    health::{components, HealthRegistry},
    observability::StructuredLogger,
    ModelOrigin, SurgeEngine,
};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting surge-agent");

    let config = AgentConfig::load()?;
    info!(
        instance = %config.instance_name,
        model_dir = %config.engine.model_dir.display(),
        "Agent configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register(components::ENGINE).await;
    health_registry.register(components::MODEL_STORE).await;

    let logger = StructuredLogger::new(&config.instance_name);
    let engine = Arc::new(SurgeEngine::with_logger(config.engine.clone(), logger.clone()));

    let app_state = Arc::new(AppState::new(engine, health_registry));

    // Serve health endpoints while the model is loading or training
    let api_handle = tokio::spawn(api::serve(config.listen_addr(), Arc::clone(&app_state)));

    let model_version = match app_state.initialize_model().await {
        Ok(origin) => {
            let version = app_state
                .engine
                .model()?
                .map(|m| m.model_version().to_string())
                .unwrap_or_default();
            info!(
                loaded = matches!(origin, ModelOrigin::Loaded),
                model_version = %version,
                "Surge model ready"
            );
            version
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize surge model");
            String::new()
        }
    };
    logger.log_startup(AGENT_VERSION, &model_version);

    tokio::select! {
        result = api_handle => {
            match result {
                Ok(Err(e)) => error!(error = %e, "API server exited"),
                Err(e) => error!(error = %e, "API server task failed"),
                Ok(Ok(())) => {}
            }
            logger.log_shutdown("API server stopped");
        }
        _ = tokio::signal::ctrl_c() => {
            logger.log_shutdown("SIGINT received");
        }
    }

    info!("Shutting down");
    Ok(())
}
