//! Synthetic training data generation
//!
//! Produces a labeled training table from parametric distributions that
//! encode the believed correlations between air quality, festivals,
//! hospital load, calendar effects and health trends.

use crate::models::{FeatureVector, TrainingRow};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default seed for reproducible training tables
pub const DEFAULT_SEED: u64 = 42;

/// Default number of synthetic rows
pub const DEFAULT_SAMPLES: usize = 5000;

/// Upper bound of the surge label (percent increase in admissions)
pub const MAX_SURGE_PERCENTAGE: f64 = 60.0;

const MIN_SURGE_PROBABILITY: f64 = 0.05;
const MAX_SURGE_PROBABILITY: f64 = 0.95;
const FESTIVAL_PROBABILITY: f64 = 0.15;
const WINTER_MONTHS: [u32; 4] = [10, 11, 12, 1];

/// Generator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self { seed: DEFAULT_SEED }
    }
}

struct Distributions {
    aqi: Normal<f64>,
    temperature: Normal<f64>,
    humidity: Normal<f64>,
    admissions: Normal<f64>,
    respiratory: Normal<f64>,
    cardiac: Normal<f64>,
    trauma: Normal<f64>,
    density: Normal<f64>,
    noise: Normal<f64>,
}

impl Distributions {
    fn new() -> Self {
        Self {
            aqi: normal(120.0, 40.0),
            temperature: normal(28.0, 5.0),
            humidity: normal(75.0, 15.0),
            admissions: normal(150.0, 30.0),
            respiratory: normal(1.0, 0.3),
            cardiac: normal(1.0, 0.2),
            trauma: normal(1.0, 0.25),
            density: normal(20000.0, 5000.0),
            noise: normal(0.0, 0.05),
        }
    }
}

fn normal(mean: f64, std_dev: f64) -> Normal<f64> {
    Normal::new(mean, std_dev).expect("distribution parameters are finite and positive")
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Seeded generator for the synthetic training table
pub struct SyntheticDataGenerator {
    config: GeneratorConfig,
}

impl SyntheticDataGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::new(GeneratorConfig { seed })
    }

    /// Generate `n` labeled rows; identical seeds yield identical tables
    pub fn generate(&self, n: usize) -> Vec<TrainingRow> {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let dists = Distributions::new();

        let rows: Vec<TrainingRow> = (0..n).map(|_| sample_row(&mut rng, &dists)).collect();

        debug!(rows = rows.len(), seed = self.config.seed, "Generated synthetic training table");
        rows
    }
}

impl Default for SyntheticDataGenerator {
    fn default() -> Self {
        Self::new(GeneratorConfig::default())
    }
}

fn sample_row(rng: &mut StdRng, d: &Distributions) -> TrainingRow {
    let aqi_value = d.aqi.sample(rng).clamp(50.0, 500.0);
    let temperature = finite_or(d.temperature.sample(rng), 28.0);
    let humidity = finite_or(d.humidity.sample(rng), 75.0);

    let is_festival = rng.gen_bool(FESTIVAL_PROBABILITY);
    let festival_draw: f64 = rng.gen_range(0.5..1.0);
    let festival_score = if is_festival { festival_draw } else { 0.0 };

    let baseline_admissions = d.admissions.sample(rng).max(80.0);
    let hospital_occupancy: f64 = rng.gen_range(0.6..0.95);

    let day_of_week = rng.gen_range(0..7u32);
    let month = rng.gen_range(1..=12u32);

    let features = FeatureVector {
        aqi_value,
        temperature,
        humidity,
        festival_score,
        baseline_admissions,
        hospital_occupancy,
        day_of_week: f64::from(day_of_week),
        month: f64::from(month),
        respiratory_cases_trend: d.respiratory.sample(rng),
        cardiac_cases_trend: d.cardiac.sample(rng),
        trauma_cases_trend: d.trauma.sample(rng),
        population_density: d.density.sample(rng),
    };

    let noise = d.noise.sample(rng);
    let surge_probability = surge_probability(&features, noise);

    TrainingRow {
        features,
        surge_percentage: surge_probability * MAX_SURGE_PERCENTAGE,
        surge_probability,
    }
}

/// Additive risk score that labels the synthetic table.
///
/// Clamped to `[0.05, 0.95]`; multiply by [`MAX_SURGE_PERCENTAGE`] for the
/// regression target.
pub fn surge_probability(f: &FeatureVector, noise: f64) -> f64 {
    let mut surge = 0.10;

    if f.aqi_value > 200.0 {
        surge += 0.30;
    } else if f.aqi_value > 150.0 {
        surge += 0.15;
    } else if f.aqi_value > 100.0 {
        surge += 0.05;
    }

    surge += f.festival_score * 0.25;

    if f.hospital_occupancy > 0.9 {
        surge += 0.20;
    } else if f.hospital_occupancy > 0.8 {
        surge += 0.10;
    }

    if f.is_weekend() {
        surge += 0.05;
    }

    if WINTER_MONTHS.iter().any(|&m| f64::from(m) == f.month) {
        surge += f.respiratory_cases_trend * 0.10;
    }

    surge += (f.respiratory_cases_trend - 1.0) * 0.20;
    surge += (f.cardiac_cases_trend - 1.0) * 0.15;
    surge += (f.trauma_cases_trend - 1.0) * 0.10;

    surge += noise;

    // NaN would survive clamp(); treat it as the floor
    if surge.is_nan() {
        return MIN_SURGE_PROBABILITY;
    }
    surge.clamp(MIN_SURGE_PROBABILITY, MAX_SURGE_PROBABILITY)
}
