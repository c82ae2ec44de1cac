//! Model inspection commands

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use surge_engine::{ModelStore, TrainedModel};
use tabled::Tabled;

use crate::client::{ApiClient, ModelInfo};
use crate::output::{print_json, render_table, OutputFormat};

/// Row for the feature importance table
#[derive(Tabled)]
struct ImportanceRow {
    #[tabled(rename = "Rank")]
    rank: usize,
    #[tabled(rename = "Feature")]
    feature: String,
    #[tabled(rename = "Importance")]
    importance: String,
}

pub fn model_info(model: &TrainedModel, model_dir: &Path, persisted: Option<bool>) -> ModelInfo {
    ModelInfo {
        model_version: model.model_version().to_string(),
        trained_at: model.trained_at(),
        model_dir: model_dir.display().to_string(),
        report: model.report().clone(),
        persisted,
    }
}

/// Show the model persisted in a local directory
pub fn show_local(model_dir: &Path, format: OutputFormat) -> Result<()> {
    let store = ModelStore::new(model_dir);
    if !store.exists() {
        anyhow::bail!(
            "No saved model in {}; run `surge train` first",
            model_dir.display()
        );
    }

    let manifest = store.manifest().context("Failed to read model manifest")?;
    match format {
        OutputFormat::Json => print_json(&manifest),
        OutputFormat::Table => {
            print_model_info(
                &ModelInfo {
                    model_version: manifest.model_version.clone(),
                    trained_at: manifest.trained_at,
                    model_dir: model_dir.display().to_string(),
                    report: manifest.report.clone(),
                    persisted: None,
                },
                format,
            )?;
            println!();
            println!("Regressor SHA-256: {}", manifest.regressor_sha256.dimmed());
            println!("Scaler SHA-256:    {}", manifest.scaler_sha256.dimmed());
            Ok(())
        }
    }
}

/// Show the model installed in a running agent
pub async fn show_remote(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let info = client.model_info().await?;
    print_model_info(&info, format)
}

pub fn print_model_info(info: &ModelInfo, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(info);
    }

    let report = &info.report;
    println!("{}", "Surge Model".bold());
    println!("{}", "=".repeat(50));
    println!("Version:     {}", info.model_version.cyan());
    println!("Trained:     {}", info.trained_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("Regressor:   {}", report.regressor);
    println!("Directory:   {}", info.model_dir);
    if let Some(persisted) = info.persisted {
        let label = if persisted { "yes".green() } else { "no".red() };
        println!("Persisted:   {}", label);
    }
    println!();
    println!("{}", "Held-out Evaluation".bold());
    println!("{}", "-".repeat(50));
    println!("MAE:         {:.2} percentage points", report.mae);
    println!("R²:          {:.3}", report.r2);
    println!("Train/Test:  {}/{}", report.train_size, report.test_size);

    if !report.feature_importances.is_empty() {
        println!();
        let rows = report
            .feature_importances
            .iter()
            .enumerate()
            .map(|(i, f)| ImportanceRow {
                rank: i + 1,
                feature: f.feature.clone(),
                importance: format!("{:.1}%", f.importance * 100.0),
            });
        println!("{}", render_table(rows));
    }

    Ok(())
}
