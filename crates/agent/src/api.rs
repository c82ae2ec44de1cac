//! HTTP API for surge prediction, model management, health and metrics

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use surge_engine::{
    assess,
    health::{components, ComponentStatus, HealthRegistry},
    ModelOrigin, PredictionResult, SurgeAssessment, SurgeEngine, SurgeError, TrainedModel,
    TrainingReport,
};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{error, info};

/// Shared application state
pub struct AppState {
    pub engine: Arc<SurgeEngine>,
    pub health_registry: HealthRegistry,
    retrain_guard: Mutex<()>,
}

impl AppState {
    pub fn new(engine: Arc<SurgeEngine>, health_registry: HealthRegistry) -> Self {
        Self {
            engine,
            health_registry,
            retrain_guard: Mutex::new(()),
        }
    }

    /// Exclusive right to retrain; `None` while another retrain holds it
    pub fn retrain_permit(&self) -> Option<MutexGuard<'_, ()>> {
        self.retrain_guard.try_lock().ok()
    }

    /// Load or train the model off the async runtime and publish health
    pub async fn initialize_model(&self) -> anyhow::Result<ModelOrigin> {
        let engine = Arc::clone(&self.engine);
        let outcome = tokio::task::spawn_blocking(move || engine.initialize()).await?;

        match outcome {
            Ok(origin) => {
                let persisted = !matches!(origin, ModelOrigin::Trained { persisted: false });
                self.publish_model(persisted).await;
                Ok(origin)
            }
            Err(e) => {
                self.health_registry
                    .set_unhealthy(components::ENGINE, e.to_string())
                    .await;
                Err(e.into())
            }
        }
    }

    async fn publish_model(&self, persisted: bool) {
        let version = self
            .engine
            .model()
            .ok()
            .flatten()
            .map(|m| m.model_version().to_string());
        self.health_registry.set_model_version(version).await;
        self.health_registry.set_healthy(components::ENGINE).await;
        if persisted {
            self.health_registry
                .set_healthy(components::MODEL_STORE)
                .await;
        } else {
            self.health_registry
                .set_degraded(components::MODEL_STORE, "model not persisted")
                .await;
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub text: String,
    /// Calendar date for day-of-week and month; today when omitted
    #[serde(default)]
    pub reference_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub prediction: PredictionResult,
    pub assessment: SurgeAssessment,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_version: String,
    pub trained_at: DateTime<Utc>,
    pub model_dir: String,
    pub report: TrainingReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persisted: Option<bool>,
}

impl ModelInfo {
    fn new(model: &TrainedModel, model_dir: String, persisted: Option<bool>) -> Self {
        Self {
            model_version: model.model_version().to_string(),
            trained_at: model.trained_at(),
            model_dir,
            report: model.report().clone(),
            persisted,
        }
    }
}

/// Error body returned by the API
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug)]
pub enum ApiError {
    Engine(SurgeError),
    RetrainInProgress,
    Internal(String),
}

impl From<SurgeError> for ApiError {
    fn from(e: SurgeError) -> Self {
        ApiError::Engine(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Engine(SurgeError::UntrainedModel) => {
                (StatusCode::SERVICE_UNAVAILABLE, SurgeError::UntrainedModel.to_string())
            }
            ApiError::Engine(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            ApiError::RetrainInProgress => (
                StatusCode::CONFLICT,
                "a retrain is already in progress".to_string(),
            ),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// Health check response - returns 200 if operational, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 once a model is installed
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Result<impl IntoResponse, ApiError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok((
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    ))
}

async fn predict(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, ApiError> {
    let engine = Arc::clone(&state.engine);
    let prediction = tokio::task::spawn_blocking(move || match request.reference_date {
        Some(date) => engine.predict_at(&request.text, date),
        None => engine.predict(&request.text),
    })
    .await
    .map_err(|e| ApiError::Internal(format!("prediction task failed: {}", e)))??;
    let assessment = assess(&prediction);

    Ok(Json(PredictResponse {
        prediction,
        assessment,
    }))
}

async fn model_info(State(state): State<Arc<AppState>>) -> Result<Json<ModelInfo>, ApiError> {
    let model = state
        .engine
        .model()?
        .ok_or(ApiError::Engine(SurgeError::UntrainedModel))?;
    let dir = state.engine.store().dir().display().to_string();
    Ok(Json(ModelInfo::new(&model, dir, None)))
}

async fn retrain(State(state): State<Arc<AppState>>) -> Result<Json<ModelInfo>, ApiError> {
    let _permit = state
        .retrain_permit()
        .ok_or(ApiError::RetrainInProgress)?;

    info!("Retraining surge model");
    let engine = Arc::clone(&state.engine);
    let outcome = tokio::task::spawn_blocking(move || engine.train())
        .await
        .map_err(|e| ApiError::Internal(format!("training task failed: {}", e)))?
        .map_err(|e| {
            error!(error = %e, "Retraining failed");
            ApiError::from(e)
        })?;

    state.publish_model(outcome.persisted).await;

    let dir = state.engine.store().dir().display().to_string();
    Ok(Json(ModelInfo::new(
        &outcome.model,
        dir,
        Some(outcome.persisted),
    )))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/api/v1/predict", post(predict))
        .route("/api/v1/model", get(model_info))
        .route("/api/v1/model/retrain", post(retrain))
        .with_state(state)
}

/// Start the API server
pub async fn serve(addr: String, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
