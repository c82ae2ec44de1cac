//! Surge prediction commands

use anyhow::Result;
use chrono::{Local, NaiveDate};
use colored::Colorize;
use serde::Serialize;
use surge_engine::{assess, EngineConfig, PredictionResult, SurgeAssessment};

use super::open_engine;
use crate::client::ApiClient;
use crate::output::{color_confidence, color_risk, format_surge, print_json, OutputFormat};

#[derive(Serialize)]
struct PredictionOutput<'a> {
    prediction: &'a PredictionResult,
    assessment: &'a SurgeAssessment,
}

/// Predict with a local model, training one if none is saved
pub async fn predict_local(
    config: EngineConfig,
    text: &str,
    date: Option<NaiveDate>,
    format: OutputFormat,
) -> Result<()> {
    let engine = open_engine(config, format).await?;
    let date = date.unwrap_or_else(|| Local::now().date_naive());

    let prediction = engine.predict_at(text, date)?;
    let assessment = assess(&prediction);
    print_prediction(&prediction, &assessment, format)
}

/// Predict through a running agent
pub async fn predict_remote(
    client: &ApiClient,
    text: &str,
    date: Option<NaiveDate>,
    format: OutputFormat,
) -> Result<()> {
    let response = client.predict(text, date).await?;
    print_prediction(&response.prediction, &response.assessment, format)
}

pub fn print_prediction(
    prediction: &PredictionResult,
    assessment: &SurgeAssessment,
    format: OutputFormat,
) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(&PredictionOutput {
            prediction,
            assessment,
        });
    }

    println!("{}", "Surge Forecast".bold());
    println!("{}", "=".repeat(50));
    println!(
        "Predicted surge:  {} increase in admissions",
        format_surge(prediction.surge_percentage).bold()
    );
    println!("Risk level:       {}", color_risk(prediction.risk_level));
    println!("Timeline:         {}", prediction.timeline);
    println!("Confidence:       {}", color_confidence(prediction.confidence));
    println!("Model:            {}", prediction.model_version.dimmed());

    println!();
    println!("{}", "Key Risk Factors".bold());
    println!("{}", "-".repeat(50));
    if prediction.key_factors.is_empty() {
        println!("  • Minimal risk factors detected");
    }
    for factor in &prediction.key_factors {
        println!("  • {}", factor);
    }

    println!();
    println!("{}", "Expected Primary Conditions".bold());
    println!("{}", "-".repeat(50));
    for condition in &assessment.expected_conditions {
        println!("  • {}", condition);
    }

    if !assessment.recommendations.is_empty() {
        println!();
        println!("{}", "Recommendations".bold());
        println!("{}", "-".repeat(50));
        for recommendation in &assessment.recommendations {
            println!("  • {}", recommendation);
        }
    }

    if assessment.activate_surge_protocol {
        println!();
        println!("{}", "SURGE PROTOCOL RECOMMENDED".red().bold());
    }

    Ok(())
}
