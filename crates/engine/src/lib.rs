//! Hospital patient-surge estimation engine
//!
//! This crate provides:
//! - Synthetic training data encoding domain correlations
//! - A random forest surge regressor with persisted scaler pairing
//! - Text-to-feature extraction from situational reports
//! - Risk tiering, confidence scoring and clinical assessment
//! - Health checks and observability

pub mod assessment;
pub mod config;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod health;
pub mod models;
pub mod observability;
pub mod postprocess;
pub mod regressor;
pub mod store;
pub mod synthetic;

pub use assessment::{assess, SurgeAssessment};
pub use config::EngineConfig;
pub use engine::{ModelOrigin, SurgeEngine, TrainOutcome};
pub use error::{PersistenceError, Result, SurgeError};
pub use extractor::TextFeatureExtractor;
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{EngineMetrics, StructuredLogger};
pub use postprocess::PredictionPostProcessor;
pub use regressor::{
    ForestParams, RandomForestRegressor, Regressor, StandardScaler, TrainedModel,
    TrainingConfig, TrainingReport,
};
pub use store::{ModelManifest, ModelStore};
pub use synthetic::{GeneratorConfig, SyntheticDataGenerator};
