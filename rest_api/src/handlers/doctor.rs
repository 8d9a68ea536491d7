// rest_api/src/handlers/doctor.rs
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use models::medical::{DoctorNote, DoctorProfile, User};
use models::validation::{check_max_len, parse_optional_uuid, parse_uuid, require, DOCTOR_NOTE_MAX_LEN};
use security::RoleGate;
use storage::RecordStore;

use crate::errors::{ApiError, ApiResult};
use crate::extractors::{ApiJson, Caller};
use crate::state::AppState;

pub(crate) fn doctor_json(user: &User, doctor: &DoctorProfile) -> Value {
    json!({
        "id": doctor.id,
        "userId": doctor.user_id,
        "name": user.name,
        "email": user.email,
        "role": user.role,
        "phone": user.phone,
        "specialization": doctor.specialization.as_deref().unwrap_or("General Practitioner"),
        "licenseNumber": doctor.license_number.as_deref().unwrap_or("DOC123456"),
        "hospitalAffiliation": doctor.hospital_affiliation.as_deref().unwrap_or("City Hospital"),
        "yearsOfExperience": doctor
            .years_of_experience
            .map(|y| format!("{} years", y))
            .unwrap_or_else(|| "10 years".to_string()),
        "createdAt": doctor.created_at,
    })
}

async fn own_doctor(store: &dyn RecordStore, caller: &Caller) -> ApiResult<DoctorProfile> {
    store
        .doctor_by_user(caller.0.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Doctor"))
}

/// Handler for `GET /api/doctor/profile`.
pub async fn get_doctor_profile_handler(State(state): State<AppState>, caller: Caller) -> ApiResult<Json<Value>> {
    caller.authorize(RoleGate::DOCTOR, state.store.as_ref()).await?;
    let store = state.store.as_ref();
    let doctor = own_doctor(store, &caller).await?;
    let user = store
        .user_by_id(caller.0.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;
    let mut body = doctor_json(&user, &doctor);
    body["success"] = json!(true);
    Ok(Json(body))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotesParams {
    pub patient_id: Option<String>,
}

/// Handler for `GET /api/doctor/notes`.
pub async fn get_notes_handler(
    State(state): State<AppState>,
    caller: Caller,
    Query(params): Query<NotesParams>,
) -> ApiResult<Json<Value>> {
    caller.authorize(RoleGate::DOCTOR, state.store.as_ref()).await?;
    let patient_filter = parse_optional_uuid("patientId", params.patient_id.as_deref())?;
    let store = state.store.as_ref();
    let doctor = own_doctor(store, &caller).await?;

    let notes = store.notes_by_doctor(doctor.id, patient_filter).await?;
    let mut out = Vec::with_capacity(notes.len());
    for note in &notes {
        let patient = match store.patient_by_id(note.patient_id).await? {
            Some(p) => {
                let user = store.user_by_id(p.user_id).await?;
                json!({
                    "id": p.id,
                    "userId": p.user_id,
                    "name": user.as_ref().map(|u| u.name.clone()),
                    "email": user.as_ref().map(|u| u.email.clone()),
                })
            }
            None => json!({ "id": note.patient_id }),
        };
        out.push(json!({
            "id": note.id,
            "note": note.note,
            "createdAt": note.created_at,
            "patient": patient,
        }));
    }
    Ok(Json(json!({ "success": true, "notes": out })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteRequest {
    pub patient_id: Option<String>,
    pub note: Option<String>,
}

/// Handler for `POST /api/doctor/notes`.
pub async fn create_note_handler(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(payload): ApiJson<CreateNoteRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    caller.authorize(RoleGate::DOCTOR, state.store.as_ref()).await?;
    let patient_id: Uuid = parse_uuid("patientId", &require("patientId", payload.patient_id.as_deref())?)?;
    let text = require("note", payload.note.as_deref())?;
    check_max_len("note", &text, DOCTOR_NOTE_MAX_LEN)?;

    let store = state.store.as_ref();
    let doctor = own_doctor(store, &caller).await?;
    if store.patient_by_id(patient_id).await?.is_none() {
        return Err(ApiError::not_found("Patient"));
    }

    let note = DoctorNote {
        id: Uuid::new_v4(),
        doctor_id: doctor.id,
        patient_id,
        note: text,
        created_at: Utc::now(),
    };
    store.insert_note(&note).await?;
    info!(doctor_id = %doctor.id, patient_id = %patient_id, "Doctor note created");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "note": {
                "id": note.id,
                "note": note.note,
                "createdAt": note.created_at,
                "patientId": note.patient_id,
            },
        })),
    ))
}
