//! Text feature extraction
//!
//! Converts a free-text situational report into the model's feature
//! vector. Extraction never fails: any feature whose pattern is absent
//! falls back to a documented default.

pub mod rules;

use crate::models::FeatureVector;
use chrono::{Datelike, Local, NaiveDate};

pub const DEFAULT_AQI: f64 = 120.0;
pub const DEFAULT_TEMPERATURE: f64 = 28.0;
pub const DEFAULT_HUMIDITY: f64 = 75.0;
pub const DEFAULT_OCCUPANCY: f64 = 0.8;
pub const DEFAULT_BASELINE_ADMISSIONS: f64 = 150.0;
pub const DEFAULT_POPULATION_DENSITY: f64 = 20000.0;
pub const NEUTRAL_TREND: f64 = 1.0;

/// Extracts features from report text
#[derive(Debug, Clone, Default)]
pub struct TextFeatureExtractor;

impl TextFeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract using today's local date for the calendar features
    pub fn extract(&self, text: &str) -> FeatureVector {
        self.extract_at(text, Local::now().date_naive())
    }

    /// Extract with an explicit reference date for `day_of_week` and `month`
    pub fn extract_at(&self, text: &str, reference_date: NaiveDate) -> FeatureVector {
        FeatureVector {
            aqi_value: rules::aqi_value(text).unwrap_or(DEFAULT_AQI),
            temperature: rules::temperature(text).unwrap_or(DEFAULT_TEMPERATURE),
            humidity: DEFAULT_HUMIDITY,
            festival_score: rules::festival_score(text),
            baseline_admissions: rules::baseline_admissions(text)
                .unwrap_or(DEFAULT_BASELINE_ADMISSIONS),
            hospital_occupancy: rules::hospital_occupancy(text).unwrap_or(DEFAULT_OCCUPANCY),
            day_of_week: f64::from(reference_date.weekday().num_days_from_monday()),
            month: f64::from(reference_date.month()),
            respiratory_cases_trend: rules::trend_multiplier(text, &rules::RESPIRATORY_KEYWORDS)
                .unwrap_or(NEUTRAL_TREND),
            cardiac_cases_trend: rules::trend_multiplier(text, &rules::CARDIAC_KEYWORDS)
                .unwrap_or(NEUTRAL_TREND),
            trauma_cases_trend: rules::trend_multiplier(text, &rules::TRAUMA_KEYWORDS)
                .unwrap_or(NEUTRAL_TREND),
            population_density: DEFAULT_POPULATION_DENSITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wednesday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 12).unwrap()
    }

    #[test]
    fn test_empty_text_yields_defaults() {
        let f = TextFeatureExtractor::new().extract_at("", wednesday());
        assert_eq!(f.aqi_value, DEFAULT_AQI);
        assert_eq!(f.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(f.humidity, DEFAULT_HUMIDITY);
        assert_eq!(f.festival_score, 0.0);
        assert_eq!(f.baseline_admissions, DEFAULT_BASELINE_ADMISSIONS);
        assert_eq!(f.hospital_occupancy, DEFAULT_OCCUPANCY);
        assert_eq!(f.day_of_week, 2.0);
        assert_eq!(f.month, 6.0);
        assert_eq!(f.trends(), [1.0, 1.0, 1.0]);
        assert_eq!(f.population_density, DEFAULT_POPULATION_DENSITY);
    }

    #[test]
    fn test_malformed_text_is_total() {
        let extractor = TextFeatureExtractor::new();
        for text in ["%%%", "AQI", "occupancy %", "\u{0}\u{1}", "beds occupied"] {
            let f = extractor.extract_at(text, wednesday());
            assert!(f.is_finite(), "non-finite features for {:?}", text);
            assert_eq!(f.aqi_value, DEFAULT_AQI);
        }
    }

    #[test]
    fn test_overflowing_aqi_falls_back_to_default() {
        let text = format!("AQI {}. Hospital occupancy 90%.", "9".repeat(400));
        let f = TextFeatureExtractor::new().extract_at(&text, wednesday());
        assert!(f.is_finite());
        assert_eq!(f.aqi_value, DEFAULT_AQI);
        assert_eq!(f.hospital_occupancy, 0.9);
    }

    #[test]
    fn test_high_risk_report() {
        let text = "AQI 220. Ganesh Chaturthi festival starting tomorrow. \
                    Hospital occupancy 95%. Spike in respiratory cases.";
        let f = TextFeatureExtractor::new().extract_at(text, wednesday());
        assert_eq!(f.aqi_value, 220.0);
        assert_eq!(f.festival_score, 0.25);
        assert_eq!(f.hospital_occupancy, 0.95);
        assert_eq!(f.respiratory_cases_trend, 1.5);
        assert_eq!(f.cardiac_cases_trend, 1.0);
        // "festival" doubles as a trauma keyword
        assert_eq!(f.trauma_cases_trend, 1.5);
    }

    #[test]
    fn test_extraction_is_idempotent_for_fixed_date() {
        let extractor = TextFeatureExtractor::new();
        let text = "AQI 140. Weekend. Hospital occupancy 82%. Minor increase in cardiac cases.";
        assert_eq!(
            extractor.extract_at(text, wednesday()),
            extractor.extract_at(text, wednesday())
        );
    }

    #[test]
    fn test_calendar_features_follow_reference_date() {
        let sunday = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let f = TextFeatureExtractor::new().extract_at("", sunday);
        assert_eq!(f.day_of_week, 6.0);
        assert_eq!(f.month, 10.0);
        assert!(f.is_weekend());
    }
}
