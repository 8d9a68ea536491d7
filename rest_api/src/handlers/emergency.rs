// rest_api/src/handlers/emergency.rs
use std::str::FromStr;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use models::medical::{Emergency, Location, VitalSnapshot, VitalType, VitalValue};
use models::validation::{
    check_max_len, parse_optional_uuid, parse_uuid, require, validate_coordinates, CANCELLATION_REASON_MAX_LEN,
    EMERGENCY_NOTES_MAX_LEN,
};
use models::ValidationError;
use security::RoleGate;
use storage::RecordStore;

use super::own_patient;
use super::vitals::parse_timestamp;
use crate::dispatch::{DispatchOutcome, Dispatcher, PatientRef, TriggerRequest};
use crate::errors::ApiResult;
use crate::extractors::{ApiJson, Caller};
use crate::state::AppState;

// --- Request bodies ---

#[derive(Debug, Deserialize)]
pub struct LocationInput {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct VitalInput {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub value: Option<VitalValue>,
    pub unit: Option<String>,
    pub timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerBody {
    pub location: Option<LocationInput>,
    pub notes: Option<String>,
    pub current_vitals: Option<Vec<VitalInput>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrTriggerBody {
    pub patient_code: Option<String>,
    pub location: Option<LocationInput>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelBody {
    pub emergency_id: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusParams {
    pub emergency_id: Option<String>,
}

// --- Validation ---

fn parse_location(input: Option<LocationInput>) -> Result<Location, ValidationError> {
    let (latitude, longitude) = match input {
        Some(l) => validate_coordinates(l.latitude, l.longitude)?,
        None => validate_coordinates(None, None)?,
    };
    Ok(Location { latitude, longitude })
}

fn snapshot(input: Vec<VitalInput>) -> Result<Vec<VitalSnapshot>, ValidationError> {
    input
        .into_iter()
        .map(|v| {
            let kind = VitalType::from_str(&require("currentVitals.type", v.kind.as_deref())?)?;
            let value = v
                .value
                .ok_or_else(|| ValidationError::MissingField("currentVitals.value".to_string()))?;
            let unit = require("currentVitals.unit", v.unit.as_deref())?;
            let timestamp = parse_timestamp(
                "currentVitals.timestamp",
                &require("currentVitals.timestamp", v.timestamp.as_deref())?,
            )?;
            Ok(VitalSnapshot { kind, value, unit, timestamp })
        })
        .collect()
}

fn dispatch_json(outcome: &DispatchOutcome) -> Value {
    json!({
        "id": outcome.emergency.id,
        "status": outcome.emergency.status,
        "location": outcome.emergency.location,
        "hospitalId": outcome.resources.hospital_id,
        "hospitalName": outcome.resources.hospital_name,
        "ambulanceId": outcome.resources.ambulance_id,
        "estimatedAmbulanceArrival": outcome.resources.estimated_arrival_time,
    })
}

async fn status_json(store: &dyn RecordStore, emergency: &Emergency) -> ApiResult<Value> {
    let hospital = store.hospital_by_id(&emergency.assigned_hospital_id).await?;
    let ambulance = store.ambulance_by_id(&emergency.assigned_ambulance_id).await?;
    Ok(json!({
        "id": emergency.id,
        "status": emergency.status,
        "triggeredAt": emergency.triggered_at,
        "triggeredBy": emergency.triggered_by,
        "location": emergency.location,
        "hospital": {
            "id": emergency.assigned_hospital_id,
            "name": hospital.as_ref().map(|h| h.name.clone()),
            "address": hospital.as_ref().and_then(|h| h.address.clone()),
        },
        "ambulance": {
            "id": emergency.assigned_ambulance_id,
            "name": ambulance.as_ref().map(|a| a.name.clone()),
            "currentLocation": ambulance.as_ref().and_then(|a| a.current_location.clone()),
            "estimatedArrival": ambulance
                .as_ref()
                .and_then(|a| a.estimated_arrival_time.clone())
                .or_else(|| emergency.estimated_arrival.clone()),
        },
    }))
}

// --- Handlers ---

/// Handler for `POST /api/emergency/trigger`.
pub async fn trigger_emergency_handler(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(payload): ApiJson<TriggerBody>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    caller.authorize(RoleGate::PATIENT, state.store.as_ref()).await?;
    let location = parse_location(payload.location)?;
    let notes = payload.notes.map(|n| n.trim().to_string()).unwrap_or_default();
    check_max_len("notes", &notes, EMERGENCY_NOTES_MAX_LEN)?;
    let vitals = payload.current_vitals.map(snapshot).transpose()?;

    let dispatcher = Dispatcher::new(state.store.as_ref(), state.predictor.as_ref());
    let outcome = dispatcher
        .trigger(TriggerRequest { patient: PatientRef::User(caller.0.user_id), location, notes, vitals })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "emergency": dispatch_json(&outcome) })),
    ))
}

/// Handler for `POST /api/emergency/trigger-by-qr`. Unauthenticated.
pub async fn trigger_by_qr_handler(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<QrTriggerBody>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let code = require("patientCode", payload.patient_code.as_deref())?;
    let patient_id = parse_uuid("patientCode", &code)?;
    let location = parse_location(payload.location)?;

    let dispatcher = Dispatcher::new(state.store.as_ref(), state.predictor.as_ref());
    let outcome = dispatcher
        .trigger(TriggerRequest {
            patient: PatientRef::Code(patient_id),
            location,
            notes: String::new(),
            vitals: None,
        })
        .await?;
    let mut emergency = dispatch_json(&outcome);
    emergency["patientName"] = json!(outcome.patient_name);
    info!(emergency_id = %outcome.emergency.id, "Emergency triggered from QR code");
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "emergency": emergency }))))
}

/// Handler for `GET /api/emergency/status`.
pub async fn get_emergency_status_handler(
    State(state): State<AppState>,
    caller: Caller,
    Query(params): Query<StatusParams>,
) -> ApiResult<Json<Value>> {
    caller.authorize(RoleGate::PATIENT, state.store.as_ref()).await?;
    let only = parse_optional_uuid("emergencyId", params.emergency_id.as_deref())?;
    let store = state.store.as_ref();
    let patient = own_patient(store, &caller).await?;

    let emergencies = store.emergencies_for_patient(patient.id, only).await?;
    let active = emergencies.iter().any(Emergency::is_active);
    let mut out = Vec::with_capacity(emergencies.len());
    for emergency in &emergencies {
        out.push(status_json(store, emergency).await?);
    }
    Ok(Json(json!({ "success": true, "active": active, "emergencies": out })))
}

/// Handler for `POST /api/emergency/cancel`.
pub async fn cancel_emergency_handler(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(payload): ApiJson<CancelBody>,
) -> ApiResult<Json<Value>> {
    caller.authorize(RoleGate::PATIENT, state.store.as_ref()).await?;
    let emergency_id = parse_uuid("emergencyId", &require("emergencyId", payload.emergency_id.as_deref())?)?;
    if let Some(reason) = payload.reason.as_deref() {
        check_max_len("reason", reason, CANCELLATION_REASON_MAX_LEN)?;
    }

    let dispatcher = Dispatcher::new(state.store.as_ref(), state.predictor.as_ref());
    let emergency = dispatcher.cancel(caller.0.user_id, emergency_id, payload.reason).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Emergency cancelled successfully",
        "emergency": {
            "id": emergency.id,
            "status": emergency.status,
            "cancelledAt": emergency.cancelled_at,
            "cancellationReason": emergency.cancellation_reason,
        },
    })))
}
