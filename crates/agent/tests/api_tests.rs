//! Integration tests for the agent API endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use std::sync::Arc;
use surge_agent::{create_router, AppState};
use surge_engine::{
    health::{components, HealthRegistry},
    store::{MANIFEST_FILE, MODEL_FILE, SCALER_FILE},
    EngineConfig, SurgeEngine,
};
use tempfile::TempDir;
use tower::ServiceExt;

async fn setup_test_app() -> (Router, Arc<AppState>, TempDir) {
    let dir = TempDir::new().unwrap();
    let config = EngineConfig {
        training_samples: 300,
        n_estimators: 8,
        max_depth: Some(6),
        ..EngineConfig::default()
    }
    .with_model_dir(dir.path());

    let health_registry = HealthRegistry::new();
    health_registry.register(components::ENGINE).await;
    health_registry.register(components::MODEL_STORE).await;

    let engine = Arc::new(SurgeEngine::new(config));
    let state = Arc::new(AppState::new(engine, health_registry));
    let router = create_router(state.clone());

    (router, state, dir)
}

async fn setup_ready_app() -> (Router, Arc<AppState>, TempDir) {
    let (router, state, dir) = setup_test_app().await;
    state.initialize_model().await.unwrap();
    (router, state, dir)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_healthz_returns_ok_when_healthy() {
    let (app, _state, _dir) = setup_test_app().await;

    let response = app.oneshot(get("/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let health = json_body(response).await;
    assert_eq!(health["status"], "healthy");
    assert!(health["components"][components::ENGINE].is_object());
}

#[tokio::test]
async fn test_healthz_returns_503_when_unhealthy() {
    let (app, state, _dir) = setup_test_app().await;
    state
        .health_registry
        .set_unhealthy(components::ENGINE, "training failed")
        .await;

    let response = app.oneshot(get("/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let health = json_body(response).await;
    assert_eq!(health["status"], "unhealthy");
    assert_eq!(
        health["components"][components::ENGINE]["message"],
        "training failed"
    );
}

#[tokio::test]
async fn test_readyz_waits_for_model() {
    let (app, state, _dir) = setup_test_app().await;

    let response = app.clone().oneshot(get("/readyz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let readiness = json_body(response).await;
    assert_eq!(readiness["ready"], false);

    state.initialize_model().await.unwrap();

    let response = app.oneshot(get("/readyz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["ready"], true);
}

#[tokio::test]
async fn test_predict_without_model_returns_503() {
    let (app, _state, _dir) = setup_test_app().await;

    let response = app
        .oneshot(post_json(
            "/api/v1/predict",
            serde_json::json!({ "text": "AQI 200" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("no trained model"));
}

#[tokio::test]
async fn test_predict_returns_prediction_and_assessment() {
    let (app, _state, _dir) = setup_ready_app().await;

    let response = app
        .oneshot(post_json(
            "/api/v1/predict",
            serde_json::json!({
                "text": "AQI 220. Festival celebration tonight. Hospital occupancy 95%.",
                "reference_date": "2024-06-12"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;

    let prediction = &body["prediction"];
    assert_eq!(prediction["features_used"]["aqi_value"], 220.0);
    assert_eq!(prediction["features_used"]["day_of_week"], 2.0);
    assert_eq!(prediction["features_used"]["month"], 6.0);
    assert_eq!(prediction["key_factors"][0], "High air pollution (AQI: 220)");
    let confidence = prediction["confidence"].as_u64().unwrap();
    assert!((70..=95).contains(&confidence));

    let conditions = body["assessment"]["expected_conditions"].as_array().unwrap();
    assert!(conditions
        .iter()
        .any(|c| c == "Trauma and injuries from gatherings"));
}

#[tokio::test]
async fn test_predict_rejects_malformed_body() {
    let (app, _state, _dir) = setup_ready_app().await;

    let response = app
        .oneshot(post_json(
            "/api/v1/predict",
            serde_json::json!({ "report": "missing text field" }),
        ))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_model_info() {
    let (app, state, _dir) = setup_test_app().await;

    let response = app.clone().oneshot(get("/api/v1/model")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    state.initialize_model().await.unwrap();

    let response = app.oneshot(get("/api/v1/model")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let info = json_body(response).await;

    let expected = state.engine.model().unwrap().unwrap();
    assert_eq!(info["model_version"], expected.model_version());
    assert_eq!(info["report"]["train_size"], 240);
    assert_eq!(info["report"]["test_size"], 60);
    assert_eq!(
        info["report"]["feature_importances"].as_array().unwrap().len(),
        12
    );
}

#[tokio::test]
async fn test_retrain_installs_and_persists_model() {
    let (app, state, dir) = setup_test_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/model/retrain")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let info = json_body(response).await;
    assert_eq!(info["persisted"], true);

    for file in [MODEL_FILE, SCALER_FILE, MANIFEST_FILE] {
        assert!(dir.path().join(file).is_file(), "{} missing", file);
    }

    let installed = state.engine.model().unwrap().unwrap();
    assert_eq!(info["model_version"], installed.model_version());

    let response = app.oneshot(get("/readyz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_retrain_conflicts_with_running_retrain() {
    let (app, state, _dir) = setup_ready_app().await;
    let version = state.engine.model().unwrap().unwrap().model_version().to_string();

    let running = state.retrain_permit().expect("no retrain should be running");
    assert!(state.retrain_permit().is_none());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/model/retrain")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("already in progress"));
    assert_eq!(
        state.engine.model().unwrap().unwrap().model_version(),
        version
    );

    drop(running);
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/model/retrain")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, _state, _dir) = setup_ready_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/predict",
            serde_json::json!({ "text": "AQI 90", "reference_date": "2024-06-12" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();

    assert!(text.contains("surge_predictions_total"));
    assert!(text.contains("surge_prediction_latency_seconds"));
    assert!(text.contains("surge_model_version_info"));
}
