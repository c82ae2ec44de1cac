//! Caller-owned surge engine handle
//!
//! Training and loading run outside the model lock and finish with a single
//! swap of the `Arc<TrainedModel>`. Predictions hold the read lock only to
//! clone that `Arc`, so a prediction never mixes two models.

use crate::config::EngineConfig;
use crate::error::{Result, SurgeError};
use crate::extractor::TextFeatureExtractor;
use crate::models::PredictionResult;
use crate::observability::{EngineMetrics, StructuredLogger};
use crate::postprocess::PredictionPostProcessor;
use crate::regressor::{RandomForestRegressor, TrainedModel};
use crate::store::ModelStore;
use crate::synthetic::SyntheticDataGenerator;
use chrono::{Local, NaiveDate};
use std::sync::{Arc, RwLock};
use std::time::Instant;
use tracing::{debug, warn};

/// How `initialize` obtained its model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelOrigin {
    Loaded,
    Trained { persisted: bool },
}

/// Result of a training run
#[derive(Debug, Clone)]
pub struct TrainOutcome {
    pub model: Arc<TrainedModel>,
    /// False when saving failed; the model is installed regardless
    pub persisted: bool,
}

pub struct SurgeEngine {
    config: EngineConfig,
    store: ModelStore,
    extractor: TextFeatureExtractor,
    postprocessor: PredictionPostProcessor,
    model: RwLock<Option<Arc<TrainedModel>>>,
    metrics: EngineMetrics,
    logger: StructuredLogger,
}

impl SurgeEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_logger(config, StructuredLogger::new("surge-engine"))
    }

    pub fn with_logger(config: EngineConfig, logger: StructuredLogger) -> Self {
        Self {
            store: ModelStore::new(config.model_dir.clone()),
            config,
            extractor: TextFeatureExtractor::new(),
            postprocessor: PredictionPostProcessor::new(),
            model: RwLock::new(None),
            metrics: EngineMetrics::new(),
            logger,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    /// Load the persisted model, or train and persist a fresh one.
    ///
    /// A corrupt or incompatible persisted pair is replaced by retraining.
    pub fn initialize(&self) -> Result<ModelOrigin> {
        match self.load() {
            Ok(true) => return Ok(ModelOrigin::Loaded),
            Ok(false) => debug!("No persisted model, training a new one"),
            Err(SurgeError::Persistence(e)) => {
                warn!(error = %e, "Persisted model unusable, retraining");
            }
            Err(e) => return Err(e),
        }

        let outcome = self.train()?;
        Ok(ModelOrigin::Trained {
            persisted: outcome.persisted,
        })
    }

    /// Generate data, fit, install and persist a new model
    pub fn train(&self) -> Result<TrainOutcome> {
        let started = Instant::now();

        let rows = SyntheticDataGenerator::new(self.config.generator())
            .generate(self.config.training_samples);
        let regressor = RandomForestRegressor::new(self.config.forest());
        let trained = TrainedModel::fit(&rows, regressor, &self.config.training())?;

        let elapsed = started.elapsed().as_secs_f64();
        self.metrics.observe_training_duration(elapsed);
        self.logger
            .log_model_trained(trained.model_version(), trained.report(), elapsed);

        let persisted = match self.store.save(&trained) {
            Ok(_) => true,
            Err(e) => {
                self.logger
                    .log_persist_failed(trained.model_version(), &e.to_string());
                false
            }
        };

        let model = self.install(trained)?;
        Ok(TrainOutcome { model, persisted })
    }

    /// Install the persisted model if one exists
    pub fn load(&self) -> Result<bool> {
        match self.store.load::<RandomForestRegressor>()? {
            Some(model) => {
                let version = model.model_version().to_string();
                self.install(model)?;
                self.logger
                    .log_model_loaded(&version, &self.store.dir().display().to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Swap in a new model
    pub fn install(&self, model: TrainedModel) -> Result<Arc<TrainedModel>> {
        let model = Arc::new(model);
        {
            let mut slot = self.model.write().map_err(|_| SurgeError::LockPoisoned)?;
            *slot = Some(Arc::clone(&model));
        }
        self.metrics.set_model(model.model_version(), model.report());
        Ok(model)
    }

    /// Current model, if any
    pub fn model(&self) -> Result<Option<Arc<TrainedModel>>> {
        let slot = self.model.read().map_err(|_| SurgeError::LockPoisoned)?;
        Ok(slot.clone())
    }

    /// Predict using today's local date for calendar features
    pub fn predict(&self, text: &str) -> Result<PredictionResult> {
        self.predict_at(text, Local::now().date_naive())
    }

    pub fn predict_at(&self, text: &str, reference_date: NaiveDate) -> Result<PredictionResult> {
        let started = Instant::now();
        let result = self.run_prediction(text, reference_date);

        match &result {
            Ok(prediction) => {
                self.metrics
                    .observe_prediction_latency(started.elapsed().as_secs_f64());
                self.metrics.record_prediction(prediction);
                self.logger.log_prediction(prediction);
            }
            Err(_) => self.metrics.inc_prediction_errors(),
        }

        result
    }

    fn run_prediction(&self, text: &str, reference_date: NaiveDate) -> Result<PredictionResult> {
        let model = self.model()?.ok_or(SurgeError::UntrainedModel)?;
        let features = self.extractor.extract_at(text, reference_date);
        let raw = model.predict(&features)?;
        Ok(self
            .postprocessor
            .process(raw, &features, text, model.model_version()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn small_config(dir: &TempDir) -> EngineConfig {
        EngineConfig {
            training_samples: 300,
            n_estimators: 8,
            max_depth: Some(6),
            ..EngineConfig::default()
        }
        .with_model_dir(dir.path())
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 12).unwrap()
    }

    #[test]
    fn test_predict_before_training_fails() {
        let dir = TempDir::new().unwrap();
        let engine = SurgeEngine::new(small_config(&dir));
        assert!(engine.model().unwrap().is_none());
        assert!(matches!(
            engine.predict_at("AQI 200", date()),
            Err(SurgeError::UntrainedModel)
        ));
    }

    #[test]
    fn test_initialize_trains_then_loads() {
        let dir = TempDir::new().unwrap();

        let first = SurgeEngine::new(small_config(&dir));
        assert_eq!(
            first.initialize().unwrap(),
            ModelOrigin::Trained { persisted: true }
        );
        let version = first.model().unwrap().unwrap().model_version().to_string();

        let second = SurgeEngine::new(small_config(&dir));
        assert_eq!(second.initialize().unwrap(), ModelOrigin::Loaded);
        assert_eq!(
            second.model().unwrap().unwrap().model_version(),
            version.as_str()
        );
    }

    #[test]
    fn test_initialize_retrains_over_corrupt_store() {
        let dir = TempDir::new().unwrap();
        let engine = SurgeEngine::new(small_config(&dir));
        engine.train().unwrap();
        std::fs::write(dir.path().join(crate::store::MODEL_FILE), b"garbage").unwrap();

        let fresh = SurgeEngine::new(small_config(&dir));
        assert!(matches!(
            fresh.initialize().unwrap(),
            ModelOrigin::Trained { .. }
        ));
        assert!(fresh.predict_at("AQI 90", date()).is_ok());
    }

    #[test]
    fn test_install_swaps_whole_model() {
        let dir = TempDir::new().unwrap();
        let engine = SurgeEngine::new(small_config(&dir));
        let first = engine.train().unwrap().model;

        let held = engine.model().unwrap().unwrap();
        let mut other = small_config(&dir);
        other.data_seed = 7;
        let rows = SyntheticDataGenerator::new(other.generator()).generate(other.training_samples);
        let retrained = TrainedModel::fit(
            &rows,
            RandomForestRegressor::new(other.forest()),
            &other.training(),
        )
        .unwrap();
        let installed = engine.install(retrained).unwrap();

        assert_eq!(held.model_version(), first.model_version());
        assert_ne!(installed.model_version(), first.model_version());
        assert_eq!(
            engine.model().unwrap().unwrap().model_version(),
            installed.model_version()
        );
    }

    #[test]
    fn test_prediction_carries_model_version() {
        let dir = TempDir::new().unwrap();
        let engine = SurgeEngine::new(small_config(&dir));
        let model = engine.train().unwrap().model;

        let result = engine
            .predict_at("AQI 180. Hospital occupancy 88%.", date())
            .unwrap();
        assert_eq!(result.model_version, model.model_version());
        assert!(result.surge_percentage >= 0.0);
        assert_eq!(result.features_used.aqi_value, 180.0);
    }

    #[test]
    fn test_unwritable_model_dir_still_serves() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();
        let config = small_config(&dir).with_model_dir(blocker.join("models"));

        let engine = SurgeEngine::new(config);
        let outcome = engine.train().unwrap();
        assert!(!outcome.persisted);
        assert!(engine.predict_at("AQI 100", date()).is_ok());
    }
}
