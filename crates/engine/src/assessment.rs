//! Clinical assessment derived from a prediction's key factors

use crate::models::PredictionResult;
use serde::{Deserialize, Serialize};

/// Surge protocol triggers above both thresholds
const PROTOCOL_CONFIDENCE: u8 = 80;
const PROTOCOL_SURGE_PERCENTAGE: f64 = 25.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurgeAssessment {
    pub expected_conditions: Vec<String>,
    pub recommendations: Vec<String>,
    pub activate_surge_protocol: bool,
}

#[derive(Debug, Default, Clone, Copy)]
struct FactorFamilies {
    pollution: bool,
    festival: bool,
    occupancy: bool,
}

impl FactorFamilies {
    fn from_factors(factors: &[String]) -> Self {
        let mut families = Self::default();
        for factor in factors {
            let lower = factor.to_lowercase();
            families.pollution |= lower.contains("pollution") || lower.contains("aqi");
            families.festival |= lower.contains("festival");
            families.occupancy |= lower.contains("occupancy");
        }
        families
    }
}

/// Map key factors to expected conditions and operational recommendations
pub fn assess(result: &PredictionResult) -> SurgeAssessment {
    let families = FactorFamilies::from_factors(&result.key_factors);

    let mut expected_conditions = Vec::new();
    let mut recommendations = Vec::new();

    if families.pollution {
        expected_conditions.push("Respiratory complications (asthma, COPD exacerbations)".to_string());
        recommendations.push("Monitor respiratory admissions closely".to_string());
    }
    if families.festival {
        expected_conditions.push("Trauma and injuries from gatherings".to_string());
        expected_conditions.push("Cardiac events from physical exertion".to_string());
        recommendations.push("Prepare trauma resources for gathering-related injuries".to_string());
    }
    if families.occupancy {
        expected_conditions.push("Delayed care complications".to_string());
        recommendations.push("Consider early discharge protocols".to_string());
    }
    if expected_conditions.is_empty() {
        expected_conditions = vec![
            "General medical conditions".to_string(),
            "Routine emergencies".to_string(),
        ];
    }

    let activate_surge_protocol = result.confidence > PROTOCOL_CONFIDENCE
        && result.surge_percentage > PROTOCOL_SURGE_PERCENTAGE;
    if activate_surge_protocol {
        recommendations.push("Implement surge protocols".to_string());
    }

    SurgeAssessment {
        expected_conditions,
        recommendations,
        activate_surge_protocol,
    }
}
