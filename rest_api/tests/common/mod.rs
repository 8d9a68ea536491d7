// rest_api/tests/common/mod.rs
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use models::medical::{Location, VitalReading};
use predictor::{Anomaly, AssignedResources, HealthData, HealthVerdict, HttpPredictor, Predictor, PredictorEndpoints};
use rest_api::{build_router, AppState};
use security::{CommsTokenIssuer, TokenIssuer};
use storage::SledRecordStore;

pub const COMMS_CONNECTION: &str = "endpoint=https://comms.example.test/;accesskey=test-access-key";

/// Always assigns the same responders and reports a fixed anomaly.
pub struct FixedPredictor;

#[async_trait]
impl Predictor for FixedPredictor {
    async fn nearest_resources(&self, _location: Location) -> AssignedResources {
        AssignedResources {
            hospital_id: "h-1".to_string(),
            hospital_name: "City Hospital".to_string(),
            ambulance_id: "a-1".to_string(),
            estimated_arrival_time: "8 minutes".to_string(),
        }
    }

    async fn detect_anomalies(&self, vitals: &[VitalReading]) -> Vec<Anomaly> {
        vitals
            .first()
            .map(|v| Anomaly {
                kind: v.kind.to_string(),
                value: json!(v.value),
                unit: v.unit.clone(),
                timestamp: v.timestamp.to_rfc3339(),
                severity: None,
            })
            .into_iter()
            .collect()
    }

    async fn predict_health_status(&self, data: &HealthData) -> HealthVerdict {
        HealthVerdict {
            status: "Stable".to_string(),
            risk_level: if data.vitals.is_empty() { "Unknown" } else { "Low" }.to_string(),
            recommendations: vec![json!("Keep hydrated")],
            summary: None,
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<SledRecordStore>,
    pub state: AppState,
}

impl TestApp {
    pub fn with_predictor(predictor: Arc<dyn Predictor>, comms: Option<CommsTokenIssuer>) -> Self {
        let store = Arc::new(SledRecordStore::temporary().expect("temporary store"));
        let state = AppState::new(store.clone(), predictor, TokenIssuer::new(b"integration-secret", 3600))
            .with_comms(comms);
        TestApp { router: build_router(state.clone()), store, state }
    }

    pub fn new() -> Self {
        Self::with_predictor(Arc::new(FixedPredictor), None)
    }

    pub fn with_comms() -> Self {
        Self::with_predictor(Arc::new(FixedPredictor), CommsTokenIssuer::from_connection_string(COMMS_CONNECTION))
    }

    pub async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };
        let response = self.router.clone().oneshot(request).await.expect("router response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body");
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    /// Registers a user over HTTP and returns `(token, user id)`.
    pub async fn register(&self, email: &str, role: &str) -> (String, String) {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({
                    "email": email,
                    "password": "hunter22",
                    "phone": "555-0199",
                    "name": format!("{} user", role),
                    "role": role,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        let token = body["token"].as_str().expect("token").to_string();
        let id = body["user"]["id"].as_str().expect("user id").to_string();
        (token, id)
    }

    /// The patient profile id behind a patient token.
    pub async fn patient_id(&self, token: &str) -> String {
        let (status, body) = self.call(Method::GET, "/api/patient/profile", Some(token), None).await;
        assert_eq!(status, StatusCode::OK, "profile failed: {}", body);
        body["id"].as_str().expect("patient id").to_string()
    }
}

/// A predictor pointed at a local stub that answers every request with 500.
pub async fn failing_predictor() -> Arc<dyn Predictor> {
    use axum::routing::post;

    let app = Router::new().route("/", post(|| async { StatusCode::INTERNAL_SERVER_ERROR }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
    let base = format!("http://{}/", listener.local_addr().expect("stub addr"));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let endpoints = PredictorEndpoints {
        resources: base.clone(),
        anomalies: base.clone(),
        risk: base,
    };
    Arc::new(HttpPredictor::new(endpoints, "ml-key", Duration::from_secs(2)).expect("predictor"))
}
