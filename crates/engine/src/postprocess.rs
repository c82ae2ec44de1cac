//! Prediction post-processing
//!
//! Converts a raw regressor estimate plus the extracted features into a
//! risk tier, timeline, confidence score and contributing factors.

use crate::extractor::DEFAULT_AQI;
use crate::models::{FeatureVector, PredictionResult, RiskLevel};
use chrono::Utc;

/// Confidence before corroboration boosts
pub const BASE_CONFIDENCE: u8 = 70;

/// Upper bound on confidence
pub const MAX_CONFIDENCE: u8 = 95;

const AQI_BOOST: u8 = 10;
const FESTIVAL_BOOST: u8 = 8;
const OCCUPANCY_BOOST: u8 = 7;
const TREND_BOOST: u8 = 5;

/// Tier thresholds on the surge percentage
const VERY_HIGH_THRESHOLD: f64 = 40.0;
const HIGH_THRESHOLD: f64 = 25.0;
const MODERATE_THRESHOLD: f64 = 15.0;

/// Factor thresholds on the extracted features
const POLLUTION_FACTOR_AQI: f64 = 150.0;
const FESTIVAL_FACTOR_SCORE: f64 = 0.3;
const OCCUPANCY_FACTOR: f64 = 0.85;
const RESPIRATORY_FACTOR_TREND: f64 = 1.2;

#[derive(Debug, Clone, Default)]
pub struct PredictionPostProcessor;

impl PredictionPostProcessor {
    pub fn new() -> Self {
        Self
    }

    pub fn process(
        &self,
        raw: f64,
        features: &FeatureVector,
        text: &str,
        model_version: &str,
    ) -> PredictionResult {
        let surge_percentage = if raw.is_finite() { raw.max(0.0) } else { 0.0 };
        let risk_level = risk_level(surge_percentage);

        PredictionResult {
            surge_percentage,
            confidence: confidence(features, text),
            risk_level,
            timeline: risk_level.timeline().to_string(),
            key_factors: key_factors(features),
            features_used: *features,
            model_version: model_version.to_string(),
            generated_at: Utc::now().timestamp(),
        }
    }
}

pub fn risk_level(surge_percentage: f64) -> RiskLevel {
    if surge_percentage >= VERY_HIGH_THRESHOLD {
        RiskLevel::VeryHigh
    } else if surge_percentage >= HIGH_THRESHOLD {
        RiskLevel::High
    } else if surge_percentage >= MODERATE_THRESHOLD {
        RiskLevel::Moderate
    } else {
        RiskLevel::Low
    }
}

/// Heuristic corroboration score in `[70, 95]`.
///
/// Each signal the report actually carries adds a fixed boost.
pub fn confidence(features: &FeatureVector, text: &str) -> u8 {
    let mut score = BASE_CONFIDENCE;

    if text.contains("AQI") && features.aqi_value != DEFAULT_AQI {
        score += AQI_BOOST;
    }
    if features.festival_score > 0.0 {
        score += FESTIVAL_BOOST;
    }
    if text.to_lowercase().contains("occupancy") {
        score += OCCUPANCY_BOOST;
    }
    if features.trends().iter().any(|&t| t != 1.0) {
        score += TREND_BOOST;
    }

    score.min(MAX_CONFIDENCE)
}

/// Contributing factors in a fixed order
pub fn key_factors(features: &FeatureVector) -> Vec<String> {
    let mut factors = Vec::new();

    if features.aqi_value > POLLUTION_FACTOR_AQI {
        factors.push(format!("High air pollution (AQI: {:.0})", features.aqi_value));
    }
    if features.festival_score > FESTIVAL_FACTOR_SCORE {
        factors.push("Major festival/gathering period".to_string());
    }
    if features.hospital_occupancy > OCCUPANCY_FACTOR {
        factors.push(format!(
            "High hospital occupancy ({:.1}%)",
            features.hospital_occupancy * 100.0
        ));
    }
    if features.respiratory_cases_trend > RESPIRATORY_FACTOR_TREND {
        factors.push("Increasing respiratory cases trend".to_string());
    }
    if features.is_weekend() {
        factors.push("Weekend effect".to_string());
    }

    factors
}
