//! Observability infrastructure for the surge engine
//!
//! Provides:
//! - Prometheus metrics (prediction latency, training duration, model quality, model version)
//! - Structured JSON logging with tracing

use crate::models::{PredictionResult, RiskLevel};
use crate::regressor::TrainingReport;
use prometheus::{
    register_gauge, register_gauge_vec, register_histogram, register_int_counter,
    register_int_counter_vec, Gauge, GaugeVec, Histogram, IntCounter, IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for prediction latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Histogram buckets for training duration (in seconds)
const TRAINING_BUCKETS: &[f64] = &[0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<EngineMetricsInner> = OnceLock::new();

struct EngineMetricsInner {
    prediction_latency_seconds: Histogram,
    training_duration_seconds: Histogram,
    predictions_total: IntCounter,
    prediction_errors_total: IntCounter,
    predictions_by_risk_level: IntCounterVec,
    last_surge_percentage: Gauge,
    model_mae: Gauge,
    model_r2: Gauge,
    model_version_info: GaugeVec,
}

impl EngineMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "surge_prediction_latency_seconds",
                "Time spent extracting features and running the regressor",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            training_duration_seconds: register_histogram!(
                "surge_training_duration_seconds",
                "Time spent generating data and fitting the model",
                TRAINING_BUCKETS.to_vec()
            )
            .expect("Failed to register training_duration_seconds"),

            predictions_total: register_int_counter!(
                "surge_predictions_total",
                "Total number of surge predictions generated"
            )
            .expect("Failed to register predictions_total"),

            prediction_errors_total: register_int_counter!(
                "surge_prediction_errors_total",
                "Total number of failed prediction requests"
            )
            .expect("Failed to register prediction_errors_total"),

            predictions_by_risk_level: register_int_counter_vec!(
                "surge_predictions_by_risk_level_total",
                "Predictions grouped by risk tier",
                &["risk_level"]
            )
            .expect("Failed to register predictions_by_risk_level"),

            last_surge_percentage: register_gauge!(
                "surge_last_surge_percentage",
                "Surge percentage of the most recent prediction"
            )
            .expect("Failed to register last_surge_percentage"),

            model_mae: register_gauge!(
                "surge_model_mae",
                "Mean absolute error of the installed model on its held-out split"
            )
            .expect("Failed to register model_mae"),

            model_r2: register_gauge!(
                "surge_model_r2",
                "R squared of the installed model on its held-out split"
            )
            .expect("Failed to register model_r2"),

            model_version_info: register_gauge_vec!(
                "surge_model_version_info",
                "Information about the currently installed model",
                &["version", "regressor"]
            )
            .expect("Failed to register model_version_info"),
        }
    }
}

/// Engine metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the same
/// underlying metrics.
#[derive(Clone)]
pub struct EngineMetrics {
    _private: (),
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineMetrics {
    /// Create a handle, registering the global metrics on first call
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(EngineMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &EngineMetricsInner {
        GLOBAL_METRICS.get_or_init(EngineMetricsInner::new)
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn observe_training_duration(&self, duration_secs: f64) {
        self.inner().training_duration_seconds.observe(duration_secs);
    }

    /// Count a successful prediction and its tier
    pub fn record_prediction(&self, result: &PredictionResult) {
        let inner = self.inner();
        inner.predictions_total.inc();
        inner
            .predictions_by_risk_level
            .with_label_values(&[risk_label(result.risk_level)])
            .inc();
        inner.last_surge_percentage.set(result.surge_percentage);
    }

    pub fn inc_prediction_errors(&self) {
        self.inner().prediction_errors_total.inc();
    }

    /// Publish quality and version of a newly installed model
    pub fn set_model(&self, version: &str, report: &TrainingReport) {
        let inner = self.inner();
        inner.model_mae.set(report.mae);
        inner.model_r2.set(report.r2);
        inner.model_version_info.reset();
        inner
            .model_version_info
            .with_label_values(&[version, &report.regressor])
            .set(1.0);
    }

    pub fn predictions_total(&self) -> u64 {
        self.inner().predictions_total.get()
    }
}

fn risk_label(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Low => "low",
        RiskLevel::Moderate => "moderate",
        RiskLevel::High => "high",
        RiskLevel::VeryHigh => "very_high",
    }
}

/// Structured logger for engine and agent events
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn log_prediction(&self, result: &PredictionResult) {
        info!(
            event = "prediction_generated",
            instance = %self.instance,
            surge_percentage = result.surge_percentage,
            risk_level = %result.risk_level,
            confidence = result.confidence,
            key_factors = result.key_factors.len(),
            model_version = %result.model_version,
            "Generated surge prediction"
        );
    }

    pub fn log_model_trained(&self, version: &str, report: &TrainingReport, duration_secs: f64) {
        info!(
            event = "model_trained",
            instance = %self.instance,
            model_version = %version,
            regressor = %report.regressor,
            mae = report.mae,
            r2 = report.r2,
            train_size = report.train_size,
            test_size = report.test_size,
            duration_secs = duration_secs,
            "Surge model trained"
        );
    }

    pub fn log_model_loaded(&self, version: &str, dir: &str) {
        info!(
            event = "model_loaded",
            instance = %self.instance,
            model_version = %version,
            dir = %dir,
            "Surge model loaded from disk"
        );
    }

    pub fn log_persist_failed(&self, version: &str, error: &str) {
        warn!(
            event = "model_persist_failed",
            instance = %self.instance,
            model_version = %version,
            error = %error,
            "Failed to persist model, continuing with in-memory model"
        );
    }

    pub fn log_startup(&self, version: &str, model_version: &str) {
        info!(
            event = "agent_started",
            instance = %self.instance,
            agent_version = %version,
            model_version = %model_version,
            "Surge agent started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "agent_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Surge agent shutting down"
        );
    }
}
