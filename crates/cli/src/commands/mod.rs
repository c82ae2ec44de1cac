//! CLI command implementations

pub mod generate;
pub mod model;
pub mod predict;
pub mod scenarios;
pub mod train;

use anyhow::{Context, Result};
use std::sync::Arc;
use surge_engine::{EngineConfig, ModelOrigin, SurgeEngine};

use crate::output::{print_info, print_warning, OutputFormat};

/// Open a local engine, loading the persisted model or training one
pub async fn open_engine(config: EngineConfig, format: OutputFormat) -> Result<Arc<SurgeEngine>> {
    let engine = Arc::new(SurgeEngine::new(config));
    let handle = Arc::clone(&engine);

    let origin = tokio::task::spawn_blocking(move || handle.initialize())
        .await
        .context("Model initialization task failed")?
        .context("Failed to initialize surge model")?;

    if format == OutputFormat::Table {
        match origin {
            ModelOrigin::Loaded => {}
            ModelOrigin::Trained { persisted: true } => {
                print_info("No saved model found, trained a new one");
            }
            ModelOrigin::Trained { persisted: false } => {
                print_warning("Trained a new model but could not save it");
            }
        }
    }

    Ok(engine)
}
