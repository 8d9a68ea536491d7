// rest_api/src/handlers/vitals.rs
use std::str::FromStr;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use models::medical::{Role, Trend, VitalReading, VitalType, VitalValue};
use models::validation::{parse_optional_uuid, require, DateRange};
use models::ValidationError;
use storage::{RecordStore, VitalsQuery};

use super::{own_patient, parse_limit};
use crate::errors::{ApiError, ApiResult};
use crate::extractors::{ApiJson, Caller};
use crate::state::AppState;

const DEFAULT_VITALS_LIMIT: usize = 10;
const MAX_VITALS_LIMIT: usize = 100;

fn title(kind: VitalType) -> &'static str {
    match kind {
        VitalType::HeartRate => "Heart Rate",
        VitalType::BloodPressure => "Blood Pressure",
        VitalType::Temperature => "Temperature",
        VitalType::OxygenLevel => "Oxygen Level",
    }
}

pub(crate) fn vital_json(reading: &VitalReading) -> Value {
    json!({
        "id": reading.id,
        "patientId": reading.patient_id,
        "type": reading.kind,
        "title": title(reading.kind),
        "value": reading.value,
        "unit": reading.unit,
        "color": reading.kind.color(),
        "trend": reading.trend,
        "timestamp": reading.timestamp,
    })
}

/// Picks the patient whose vitals the caller may touch. Patients are pinned
/// to their own profile; clinicians must name one.
async fn target_patient(store: &dyn RecordStore, caller: &Caller, requested: Option<Uuid>) -> ApiResult<Uuid> {
    match caller.0.role {
        Role::Patient => {
            let own = own_patient(store, caller).await?;
            match requested {
                Some(id) if id != own.id => {
                    Err(ApiError::Forbidden("Not authorized to access this patient's vitals".to_string()))
                }
                _ => Ok(own.id),
            }
        }
        Role::Doctor | Role::Admin => {
            let id = requested.ok_or_else(|| ValidationError::MissingField("patientId".to_string()))?;
            if store.patient_by_id(id).await?.is_none() {
                return Err(ApiError::not_found("Patient"));
            }
            Ok(id)
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalsParams {
    pub patient_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: Option<String>,
}

/// Handler for `GET /api/vitals`.
pub async fn get_vitals_handler(
    State(state): State<AppState>,
    caller: Caller,
    Query(params): Query<VitalsParams>,
) -> ApiResult<Json<Value>> {
    caller.ensure_active(state.store.as_ref()).await?;
    let requested = parse_optional_uuid("patientId", params.patient_id.as_deref())?;
    let kind = params.kind.as_deref().map(VitalType::from_str).transpose()?;
    let range = DateRange::from_params(params.start_date.as_deref(), params.end_date.as_deref())?;
    let limit = parse_limit(params.limit.as_deref(), DEFAULT_VITALS_LIMIT, MAX_VITALS_LIMIT)?;

    let store = state.store.as_ref();
    let patient_id = target_patient(store, &caller, requested).await?;
    let readings = store
        .query_vitals(&VitalsQuery { patient_id, kind, range, limit: Some(limit) })
        .await?;
    debug!(patient_id = %patient_id, count = readings.len(), "Vitals fetched");
    Ok(Json(Value::Array(readings.iter().map(vital_json).collect())))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVitalRequest {
    pub patient_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub value: Option<VitalValue>,
    pub unit: Option<String>,
    pub timestamp: Option<String>,
    pub trend: Option<String>,
}

pub(crate) fn parse_timestamp(field: &str, raw: &str) -> Result<DateTime<Utc>, ValidationError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| ValidationError::InvalidFormat(field.to_string()))
}

/// Handler for `POST /api/vitals`.
pub async fn create_vital_handler(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(payload): ApiJson<CreateVitalRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    caller.ensure_active(state.store.as_ref()).await?;
    let requested = parse_optional_uuid("patientId", payload.patient_id.as_deref())?;
    let kind = VitalType::from_str(&require("type", payload.kind.as_deref())?)?;
    let value = match payload.value {
        Some(VitalValue::Text(t)) => VitalValue::Text(require("value", Some(&t))?),
        Some(VitalValue::Number(n)) if n.is_finite() => VitalValue::Number(n),
        Some(VitalValue::Number(_)) => return Err(ValidationError::OutOfRange("value".to_string()).into()),
        None => return Err(ValidationError::MissingField("value".to_string()).into()),
    };
    let unit = require("unit", payload.unit.as_deref())?;
    let timestamp = match payload.timestamp.as_deref() {
        Some(raw) => parse_timestamp("timestamp", raw)?,
        None => Utc::now(),
    };
    let trend = payload.trend.as_deref().map(Trend::from_str).transpose()?.unwrap_or_default();

    let store = state.store.as_ref();
    let patient_id = target_patient(store, &caller, requested).await?;
    let reading = VitalReading { id: Uuid::new_v4(), patient_id, kind, value, unit, timestamp, trend };
    store.insert_vital(&reading).await?;
    info!(patient_id = %patient_id, kind = %kind, recorded_by = %caller.0.user_id, "Vital reading recorded");
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "vital": vital_json(&reading) }))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_must_be_rfc3339() {
        let ts = parse_timestamp("timestamp", "2024-01-15T08:30:00+02:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-01-15T06:30:00+00:00");
        assert!(parse_timestamp("timestamp", "2024-01-15").is_err());
    }

    #[test]
    fn vital_view_carries_title_and_color() {
        let reading = VitalReading {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            kind: VitalType::BloodPressure,
            value: VitalValue::Text("120/80".to_string()),
            unit: "mmHg".to_string(),
            timestamp: Utc::now(),
            trend: Trend::Increasing,
        };
        let view = vital_json(&reading);
        assert_eq!(view["title"], "Blood Pressure");
        assert_eq!(view["color"], "#007bff");
        assert_eq!(view["value"], "120/80");
        assert_eq!(view["trend"], "increasing");
    }
}
