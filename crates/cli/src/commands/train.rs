//! Model training commands

use anyhow::{Context, Result};
use surge_engine::{EngineConfig, SurgeEngine};

use super::model::{model_info, print_model_info};
use crate::client::ApiClient;
use crate::output::{print_success, print_warning, OutputFormat};

/// Train locally and persist into the configured model directory
pub async fn train_local(config: EngineConfig, format: OutputFormat) -> Result<()> {
    let model_dir = config.model_dir.clone();
    let engine = SurgeEngine::new(config);

    let outcome = tokio::task::spawn_blocking(move || engine.train())
        .await
        .context("Training task failed")?
        .context("Failed to train surge model")?;

    let info = model_info(&outcome.model, &model_dir, Some(outcome.persisted));
    if format == OutputFormat::Table {
        if outcome.persisted {
            print_success(&format!("Model saved to {}", model_dir.display()));
        } else {
            print_warning("Model trained but could not be saved");
        }
        println!();
    }
    print_model_info(&info, format)
}

/// Ask a running agent to retrain and install a new model
pub async fn train_remote(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let info = client.retrain().await?;
    if format == OutputFormat::Table {
        print_success("Agent retrained its model");
        println!();
    }
    print_model_info(&info, format)
}
