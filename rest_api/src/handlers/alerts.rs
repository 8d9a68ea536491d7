// rest_api/src/handlers/alerts.rs
use std::str::FromStr;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use models::medical::{Alert, AlertType, Role};
use models::validation::{
    check_max_len, parse_optional_uuid, require, DateRange, ALERT_MESSAGE_MAX_LEN, ALERT_TITLE_MAX_LEN,
};
use predictor::Anomaly;
use storage::{AlertsQuery, VitalsQuery};

use super::own_patient;
use crate::errors::{ApiError, ApiResult};
use crate::extractors::{ApiJson, Caller};
use crate::state::AppState;

const ANOMALY_WINDOW: usize = 50;
const STORED_ALERTS_LIMIT: usize = 10;

// Whole floats print without a fractional part: 180.0 reads as 180.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) if n.is_f64() => n.as_f64().map_or_else(|| n.to_string(), |f| f.to_string()),
        other => other.to_string(),
    }
}

fn anomaly_json(anomaly: &Anomaly) -> Value {
    let value = display_value(&anomaly.value);
    json!({
        "id": format!("anomaly-{}", anomaly.timestamp),
        "type": "anomaly",
        "message": format!("Anomaly detected in {}: {} {}", anomaly.kind, value, anomaly.unit),
        "severity": anomaly.severity.as_deref().unwrap_or("high"),
        "timestamp": anomaly.timestamp,
    })
}

fn alert_json(alert: &Alert) -> Value {
    json!({
        "id": alert.id,
        "userId": alert.user_id,
        "type": alert.kind,
        "title": alert.title,
        "message": alert.message,
        "createdAt": alert.created_at,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertsParams {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Handler for `GET /api/alerts`.
///
/// Patients get live anomalies over their recent readings in the requested
/// date window ahead of the stored alerts. Anomalies are only included when
/// no type filter excludes them.
pub async fn get_alerts_handler(
    State(state): State<AppState>,
    caller: Caller,
    Query(params): Query<AlertsParams>,
) -> ApiResult<Json<Value>> {
    caller.ensure_active(state.store.as_ref()).await?;
    let kind = params.kind.as_deref().map(AlertType::from_str).transpose()?;
    let range = DateRange::from_params(params.start_date.as_deref(), params.end_date.as_deref())?;
    let store = state.store.as_ref();

    let mut out = Vec::new();
    let wants_anomalies = kind.is_none_or(|k| k == AlertType::Anomaly);
    if caller.0.role == Role::Patient && wants_anomalies {
        let patient = own_patient(store, &caller).await?;
        let recent = store
            .query_vitals(&VitalsQuery {
                patient_id: patient.id,
                range,
                limit: Some(ANOMALY_WINDOW),
                ..Default::default()
            })
            .await?;
        if !recent.is_empty() {
            let anomalies = state.predictor.detect_anomalies(&recent).await;
            debug!(patient_id = %patient.id, readings = recent.len(), anomalies = anomalies.len(), "Anomaly scan");
            out.extend(anomalies.iter().map(anomaly_json));
        }
    }

    let stored = store
        .query_alerts(&AlertsQuery {
            user_id: caller.0.user_id,
            kind,
            range,
            limit: Some(STORED_ALERTS_LIMIT),
        })
        .await?;
    out.extend(stored.iter().map(alert_json));
    Ok(Json(Value::Array(out)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlertRequest {
    pub user_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub title: Option<String>,
    pub message: Option<String>,
}

/// Handler for `POST /api/alerts`.
pub async fn create_alert_handler(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(payload): ApiJson<CreateAlertRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    caller.ensure_active(state.store.as_ref()).await?;
    let target = parse_optional_uuid("userId", payload.user_id.as_deref())?;
    let kind = AlertType::from_str(&require("type", payload.kind.as_deref())?)?;
    let title = require("title", payload.title.as_deref())?;
    check_max_len("title", &title, ALERT_TITLE_MAX_LEN)?;
    let message = require("message", payload.message.as_deref())?;
    check_max_len("message", &message, ALERT_MESSAGE_MAX_LEN)?;

    let user_id: Uuid = match target {
        Some(id) if id != caller.0.user_id && caller.0.role != Role::Admin => {
            return Err(ApiError::Forbidden("Not authorized to create alerts for other users".to_string()));
        }
        Some(id) => id,
        None => caller.0.user_id,
    };

    let alert = Alert { id: Uuid::new_v4(), user_id, kind, title, message, created_at: Utc::now() };
    state.store.insert_alert(&alert).await?;
    info!(alert_id = %alert.id, user_id = %user_id, created_by = %caller.0.user_id, "Alert created");
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "alert": alert_json(&alert) }))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anomaly_message_and_default_severity() {
        let anomaly = Anomaly {
            kind: "heart_rate".to_string(),
            value: json!(142),
            unit: "bpm".to_string(),
            timestamp: "2024-01-02T10:00:00Z".to_string(),
            severity: None,
        };
        let view = anomaly_json(&anomaly);
        assert_eq!(view["id"], "anomaly-2024-01-02T10:00:00Z");
        assert_eq!(view["message"], "Anomaly detected in heart_rate: 142 bpm");
        assert_eq!(view["severity"], "high");
    }

    #[test]
    fn text_values_are_not_quoted() {
        let anomaly = Anomaly {
            kind: "blood_pressure".to_string(),
            value: json!("180/120"),
            unit: "mmHg".to_string(),
            timestamp: "t".to_string(),
            severity: Some("critical".to_string()),
        };
        let view = anomaly_json(&anomaly);
        assert_eq!(view["message"], "Anomaly detected in blood_pressure: 180/120 mmHg");
        assert_eq!(view["severity"], "critical");
    }

    #[test]
    fn whole_float_values_drop_the_fraction() {
        let anomaly = Anomaly {
            kind: "heart_rate".to_string(),
            value: json!(180.0),
            unit: "bpm".to_string(),
            timestamp: "t".to_string(),
            severity: None,
        };
        assert_eq!(anomaly_json(&anomaly)["message"], "Anomaly detected in heart_rate: 180 bpm");
        assert_eq!(display_value(&json!(36.6)), "36.6");
    }
}
