//! API client for communicating with a running surge agent

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use surge_engine::{PredictionResult, SurgeAssessment, TrainingReport};
use url::Url;

/// API client for the surge agent
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        // Retraining happens inside the request, so allow for it
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        Self::parse(response).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            anyhow::bail!("API error ({}): {}", status, message);
        }

        response.json().await.context("Failed to parse response")
    }

    pub async fn predict(&self, text: &str, reference_date: Option<NaiveDate>) -> Result<PredictResponse> {
        let request = PredictRequest {
            text: text.to_string(),
            reference_date,
        };
        self.post("api/v1/predict", &request).await
    }

    pub async fn model_info(&self) -> Result<ModelInfo> {
        self.get("api/v1/model").await
    }

    pub async fn retrain(&self) -> Result<ModelInfo> {
        self.post("api/v1/model/retrain", &serde_json::json!({})).await
    }
}

// API request and response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub prediction: PredictionResult,
    pub assessment: SurgeAssessment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_version: String,
    pub trained_at: DateTime<Utc>,
    pub model_dir: String,
    pub report: TrainingReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persisted: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn report_json() -> serde_json::Value {
        serde_json::json!({
            "regressor": "Random Forest (100 estimators, max depth 10)",
            "mae": 3.1,
            "r2": 0.82,
            "train_size": 4000,
            "test_size": 1000,
            "feature_importances": [
                { "feature": "aqi_value", "importance": 0.4 },
                { "feature": "hospital_occupancy", "importance": 0.2 }
            ]
        })
    }

    #[tokio::test]
    async fn test_predict_posts_text_and_date() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::json!({
            "prediction": {
                "surge_percentage": 31.5,
                "confidence": 95,
                "risk_level": "High",
                "timeline": "3-5 days",
                "key_factors": ["High air pollution (AQI: 220)"],
                "features_used": {
                    "aqi_value": 220.0, "temperature": 28.0, "humidity": 75.0,
                    "festival_score": 0.0, "baseline_admissions": 150.0,
                    "hospital_occupancy": 0.8, "day_of_week": 2.0, "month": 6.0,
                    "respiratory_cases_trend": 1.0, "cardiac_cases_trend": 1.0,
                    "trauma_cases_trend": 1.0, "population_density": 20000.0
                },
                "model_version": "abc123def456",
                "generated_at": 1718150400
            },
            "assessment": {
                "expected_conditions": ["Respiratory complications (asthma, COPD exacerbations)"],
                "recommendations": ["Monitor respiratory admissions closely"],
                "activate_surge_protocol": true
            }
        });
        let mock = server
            .mock("POST", "/api/v1/predict")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "text": "AQI 220",
                "reference_date": "2024-06-12"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 6, 12);
        let response = client.predict("AQI 220", date).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.prediction.surge_percentage, 31.5);
        assert_eq!(response.prediction.risk_level, surge_engine::RiskLevel::High);
        assert!(response.assessment.activate_surge_protocol);
    }

    #[tokio::test]
    async fn test_error_body_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/predict")
            .with_status(503)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"no trained model is available"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let err = client.predict("AQI 220", None).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("503"), "{}", message);
        assert!(message.contains("no trained model"), "{}", message);
    }

    #[tokio::test]
    async fn test_model_info() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/model")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "model_version": "abc123def456",
                    "trained_at": "2024-06-12T08:00:00Z",
                    "model_dir": "/var/lib/surge/models",
                    "report": report_json()
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let info = client.model_info().await.unwrap();
        assert_eq!(info.model_version, "abc123def456");
        assert_eq!(info.report.feature_importances[0].feature, "aqi_value");
        assert!(info.persisted.is_none());
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(ApiClient::new("not a url").is_err());
    }
}
