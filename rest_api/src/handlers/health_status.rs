// rest_api/src/handlers/health_status.rs
use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use models::medical::VitalSnapshot;
use models::validation::parse_optional_uuid;
use predictor::{HealthData, RecentRecord};
use security::RoleGate;
use storage::{RecordsQuery, VitalsQuery};

use super::own_patient;
use crate::errors::{ApiError, ApiResult};
use crate::extractors::Caller;
use crate::state::AppState;

const RECENT_VITALS: usize = 10;
const RECENT_RECORDS: usize = 5;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatusParams {
    pub patient_id: Option<String>,
}

/// Handler for `GET /api/health-status`.
///
/// `patientId`, when given, must be the caller's own patient profile.
pub async fn get_health_status_handler(
    State(state): State<AppState>,
    caller: Caller,
    Query(params): Query<HealthStatusParams>,
) -> ApiResult<Json<Value>> {
    caller.authorize(RoleGate::PATIENT, state.store.as_ref()).await?;
    let requested = parse_optional_uuid("patientId", params.patient_id.as_deref())?;
    let store = state.store.as_ref();
    let patient = own_patient(store, &caller).await?;
    if requested.is_some_and(|id| id != patient.id) {
        return Err(ApiError::not_found("Patient"));
    }

    let vitals = store
        .query_vitals(&VitalsQuery::recent(patient.id, RECENT_VITALS))
        .await?;
    let records = store
        .query_medical_records(&RecordsQuery {
            patient_id: Some(patient.id),
            limit: Some(RECENT_RECORDS),
            ..Default::default()
        })
        .await?;

    let data = HealthData {
        vitals: vitals.iter().map(VitalSnapshot::from).collect(),
        medical_history: patient.medical_history.clone(),
        allergies: patient.allergies.iter().cloned().collect(),
        recent_records: records
            .iter()
            .map(|r| RecentRecord {
                record_type: r.record_type.clone(),
                description: r.description.clone(),
                date: r.date.to_rfc3339(),
            })
            .collect(),
    };
    let verdict = state.predictor.predict_health_status(&data).await;
    info!(patient_id = %patient.id, status = %verdict.status, risk = %verdict.risk_level, "Health status evaluated");

    Ok(Json(json!({
        "success": true,
        "healthStatus": {
            "status": verdict.status,
            "riskLevel": verdict.risk_level,
            "recommendations": verdict.recommendations,
            "summary": verdict.summary,
            "lastEvaluated": Utc::now(),
        },
    })))
}
