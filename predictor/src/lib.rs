// predictor/src/lib.rs
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use models::medical::{Location, VitalReading};

pub mod types;

pub use types::{AssignedResources, Anomaly, HealthData, HealthVerdict, RecentRecord};
use types::{AnomalyRequest, AnomalyResponse, ResourceRequest};

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum PredictorError {
    #[error("Predictor request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Predictor responded with HTTP {0}")]
    Status(u16),
    #[error("Predictor response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Predictor endpoint not configured: {0}")]
    NotConfigured(&'static str),
}

/// The external ML service. Every operation returns a usable answer; failures
/// degrade to the documented fallback values.
#[async_trait]
pub trait Predictor: Send + Sync + 'static {
    async fn nearest_resources(&self, location: Location) -> AssignedResources;
    async fn detect_anomalies(&self, vitals: &[VitalReading]) -> Vec<Anomaly>;
    async fn predict_health_status(&self, data: &HealthData) -> HealthVerdict;
}

#[derive(Debug, Clone, Default)]
pub struct PredictorEndpoints {
    pub resources: String,
    pub anomalies: String,
    pub risk: String,
}

/// `Predictor` over HTTP. Each call POSTs JSON with the service key as a
/// bearer token.
#[derive(Debug, Clone)]
pub struct HttpPredictor {
    client: Client,
    endpoints: PredictorEndpoints,
    key: String,
}

impl HttpPredictor {
    pub fn new(endpoints: PredictorEndpoints, key: impl Into<String>, timeout: Duration) -> Result<Self, PredictorError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(HttpPredictor { client, endpoints, key: key.into() })
    }

    async fn post<B, R>(&self, url: &str, name: &'static str, body: &B) -> Result<R, PredictorError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        if url.is_empty() {
            return Err(PredictorError::NotConfigured(name));
        }
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.key)
            .json(body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PredictorError::Status(status.as_u16()));
        }
        let bytes = response.bytes().await?;
        debug!(endpoint = name, bytes = bytes.len(), "Predictor responded");
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn try_nearest_resources(&self, location: Location) -> Result<AssignedResources, PredictorError> {
        let body = ResourceRequest { latitude: location.latitude, longitude: location.longitude };
        self.post(&self.endpoints.resources, "resources", &body).await
    }

    pub async fn try_detect_anomalies(&self, vitals: &[VitalReading]) -> Result<Vec<Anomaly>, PredictorError> {
        let response: AnomalyResponse = self
            .post(&self.endpoints.anomalies, "anomalies", &AnomalyRequest { vitals })
            .await?;
        Ok(response.anomalies)
    }

    pub async fn try_predict_health_status(&self, data: &HealthData) -> Result<HealthVerdict, PredictorError> {
        self.post(&self.endpoints.risk, "risk", data).await
    }
}

#[async_trait]
impl Predictor for HttpPredictor {
    async fn nearest_resources(&self, location: Location) -> AssignedResources {
        match self.try_nearest_resources(location).await {
            Ok(resources) if resources.is_complete() => resources,
            Ok(_) => {
                warn!("Predictor returned an incomplete assignment; using fallback responders");
                AssignedResources::fallback()
            }
            Err(e) => {
                warn!(error = %e, "Resource lookup failed; using fallback responders");
                AssignedResources::fallback()
            }
        }
    }

    async fn detect_anomalies(&self, vitals: &[VitalReading]) -> Vec<Anomaly> {
        self.try_detect_anomalies(vitals).await.unwrap_or_else(|e| {
            warn!(error = %e, "Anomaly detection failed");
            Vec::new()
        })
    }

    async fn predict_health_status(&self, data: &HealthData) -> HealthVerdict {
        self.try_predict_health_status(data).await.unwrap_or_else(|e| {
            warn!(error = %e, "Health risk prediction failed");
            HealthVerdict::unknown()
        })
    }
}
