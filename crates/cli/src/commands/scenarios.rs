//! Built-in scenario runner

use anyhow::Result;
use chrono::{Local, NaiveDate};
use colored::Colorize;
use serde::Serialize;
use surge_engine::{assess, EngineConfig, PredictionResult, SurgeAssessment};
use tabled::Tabled;

use super::open_engine;
use crate::output::{color_confidence, color_risk, format_surge, print_json, render_table, OutputFormat};

pub struct Scenario {
    pub name: &'static str,
    pub expected: &'static str,
    pub text: &'static str,
}

pub const SCENARIOS: [Scenario; 3] = [
    Scenario {
        name: "Low Risk",
        expected: "Low",
        text: "AQI 75 (Good). No festivals. Hospital occupancy 70%. No health alerts.",
    },
    Scenario {
        name: "High Risk",
        expected: "High",
        text: "AQI 220 (Very Unhealthy). Ganesh Chaturthi festival starting tomorrow. \
               Hospital occupancy 95%. Spike in respiratory cases.",
    },
    Scenario {
        name: "Moderate Risk",
        expected: "Moderate",
        text: "AQI 140 (Unhealthy for sensitive groups). Weekend. Hospital occupancy 82%. \
               Minor increase in cardiac cases.",
    },
];

#[derive(Serialize)]
struct ScenarioOutcome {
    name: &'static str,
    expected: &'static str,
    text: &'static str,
    prediction: PredictionResult,
    assessment: SurgeAssessment,
}

#[derive(Tabled)]
struct ScenarioRow {
    #[tabled(rename = "Scenario")]
    name: String,
    #[tabled(rename = "Expected")]
    expected: String,
    #[tabled(rename = "Surge")]
    surge: String,
    #[tabled(rename = "Risk")]
    risk: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "Key Factors")]
    factors: String,
}

/// Run every built-in scenario through a local model
pub async fn run(config: EngineConfig, date: Option<NaiveDate>, format: OutputFormat) -> Result<()> {
    let engine = open_engine(config, format).await?;
    let date = date.unwrap_or_else(|| Local::now().date_naive());

    let mut outcomes = Vec::with_capacity(SCENARIOS.len());
    for scenario in &SCENARIOS {
        let prediction = engine.predict_at(scenario.text, date)?;
        let assessment = assess(&prediction);
        outcomes.push(ScenarioOutcome {
            name: scenario.name,
            expected: scenario.expected,
            text: scenario.text,
            prediction,
            assessment,
        });
    }

    match format {
        OutputFormat::Json => print_json(&outcomes),
        OutputFormat::Table => {
            println!("{} (reference date {})", "Surge Scenarios".bold(), date);
            let rows = outcomes.iter().map(|o| ScenarioRow {
                name: o.name.to_string(),
                expected: o.expected.to_string(),
                surge: format_surge(o.prediction.surge_percentage),
                risk: color_risk(o.prediction.risk_level),
                confidence: color_confidence(o.prediction.confidence),
                factors: if o.prediction.key_factors.is_empty() {
                    "-".to_string()
                } else {
                    o.prediction.key_factors.join("\n")
                },
            });
            println!("{}", render_table(rows));
            Ok(())
        }
    }
}
