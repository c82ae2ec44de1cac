//! Core data models for the surge engine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of features consumed by the regressor
pub const FEATURE_COUNT: usize = 12;

/// Feature names in model input order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "aqi_value",
    "temperature",
    "humidity",
    "festival_score",
    "baseline_admissions",
    "hospital_occupancy",
    "day_of_week",
    "month",
    "respiratory_cases_trend",
    "cardiac_cases_trend",
    "trauma_cases_trend",
    "population_density",
];

/// A feature vector laid out in model input order
pub type FeatureRow = [f64; FEATURE_COUNT];

/// Feature vector shared by the training table and text extraction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub aqi_value: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub festival_score: f64,
    pub baseline_admissions: f64,
    pub hospital_occupancy: f64,
    pub day_of_week: f64,
    pub month: f64,
    pub respiratory_cases_trend: f64,
    pub cardiac_cases_trend: f64,
    pub trauma_cases_trend: f64,
    pub population_density: f64,
}

impl FeatureVector {
    /// Flatten into a row in `FEATURE_NAMES` order
    pub fn to_row(&self) -> FeatureRow {
        [
            self.aqi_value,
            self.temperature,
            self.humidity,
            self.festival_score,
            self.baseline_admissions,
            self.hospital_occupancy,
            self.day_of_week,
            self.month,
            self.respiratory_cases_trend,
            self.cardiac_cases_trend,
            self.trauma_cases_trend,
            self.population_density,
        ]
    }

    /// Rebuild from a row in `FEATURE_NAMES` order
    pub fn from_row(row: &FeatureRow) -> Self {
        Self {
            aqi_value: row[0],
            temperature: row[1],
            humidity: row[2],
            festival_score: row[3],
            baseline_admissions: row[4],
            hospital_occupancy: row[5],
            day_of_week: row[6],
            month: row[7],
            respiratory_cases_trend: row[8],
            cardiac_cases_trend: row[9],
            trauma_cases_trend: row[10],
            population_density: row[11],
        }
    }

    /// The three health-trend multipliers
    pub fn trends(&self) -> [f64; 3] {
        [
            self.respiratory_cases_trend,
            self.cardiac_cases_trend,
            self.trauma_cases_trend,
        ]
    }

    /// Saturday or Sunday (Monday = 0)
    pub fn is_weekend(&self) -> bool {
        self.day_of_week == 5.0 || self.day_of_week == 6.0
    }

    pub fn is_finite(&self) -> bool {
        self.to_row().iter().all(|v| v.is_finite())
    }
}

/// One labeled row of the synthetic training table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingRow {
    #[serde(flatten)]
    pub features: FeatureVector,
    /// Percentage increase in admissions, the regression target
    pub surge_percentage: f64,
    /// Intermediate probability the label was derived from
    pub surge_probability: f64,
}

/// Risk tier derived from the surge estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::High => "High",
            RiskLevel::VeryHigh => "Very High",
        }
    }

    /// Expected time until the surge materializes
    pub fn timeline(&self) -> &'static str {
        match self {
            RiskLevel::VeryHigh => "2-4 days",
            RiskLevel::High => "3-5 days",
            RiskLevel::Moderate => "5-7 days",
            RiskLevel::Low => "7+ days",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Surge prediction returned to callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    pub surge_percentage: f64,
    pub confidence: u8,
    pub risk_level: RiskLevel,
    pub timeline: String,
    pub key_factors: Vec<String>,
    pub features_used: FeatureVector,
    pub model_version: String,
    pub generated_at: i64,
}
