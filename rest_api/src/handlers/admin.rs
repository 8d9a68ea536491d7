// rest_api/src/handlers/admin.rs
use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};
use tracing::{info, warn};

use models::validation::parse_uuid;
use security::RoleGate;

use super::doctor::doctor_json;
use crate::errors::{ApiError, ApiResult};
use crate::extractors::Caller;
use crate::state::AppState;

/// Handler for `GET /api/admin/users`. Newest accounts first.
pub async fn list_users_handler(State(state): State<AppState>, caller: Caller) -> ApiResult<Json<Value>> {
    caller.authorize(RoleGate::ADMIN, state.store.as_ref()).await?;
    let mut users = state.store.list_users().await?;
    users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let users: Vec<Value> = users
        .iter()
        .map(|u| {
            json!({
                "id": u.id,
                "name": u.name,
                "email": u.email,
                "role": u.role,
                "createdAt": u.created_at,
            })
        })
        .collect();
    Ok(Json(json!({ "success": true, "users": users })))
}

/// Handler for `GET /api/admin/patients`.
pub async fn list_patients_handler(State(state): State<AppState>, caller: Caller) -> ApiResult<Json<Value>> {
    caller.authorize(RoleGate::ADMIN, state.store.as_ref()).await?;
    let store = state.store.as_ref();
    let mut out = Vec::new();
    for patient in store.list_patients().await? {
        let user = store.user_by_id(patient.user_id).await?;
        out.push(json!({
            "id": patient.id,
            "userId": patient.user_id,
            "name": user.as_ref().map(|u| u.name.clone()),
            "email": user.as_ref().map(|u| u.email.clone()),
            "role": user.as_ref().map(|u| u.role),
            "medicalHistory": patient.medical_history,
            "allergies": patient.allergies,
            "emergencyContacts": patient.emergency_contacts,
            "createdAt": patient.created_at,
        }));
    }
    Ok(Json(json!({ "success": true, "patients": out })))
}

/// Handler for `GET /api/admin/doctors`.
pub async fn list_doctors_handler(State(state): State<AppState>, caller: Caller) -> ApiResult<Json<Value>> {
    caller.authorize(RoleGate::ADMIN, state.store.as_ref()).await?;
    let store = state.store.as_ref();
    let mut out = Vec::new();
    for doctor in store.list_doctors().await? {
        match store.user_by_id(doctor.user_id).await? {
            Some(user) => out.push(doctor_json(&user, &doctor)),
            None => warn!(doctor_id = %doctor.id, "Doctor profile without user row"),
        }
    }
    Ok(Json(json!({ "success": true, "doctors": out })))
}

/// Handler for `GET /api/admin/notifications`.
pub async fn list_notifications_handler(State(state): State<AppState>, caller: Caller) -> ApiResult<Json<Value>> {
    caller.authorize(RoleGate::ADMIN, state.store.as_ref()).await?;
    let notifications = state.store.list_notifications().await?;
    Ok(Json(json!({ "success": true, "notifications": notifications })))
}

/// Handler for `DELETE /api/admin/users/:userId`. Profile rows and vitals go
/// with the user.
pub async fn delete_user_handler(
    State(state): State<AppState>,
    caller: Caller,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Value>> {
    caller.authorize(RoleGate::ADMIN, state.store.as_ref()).await?;
    let user_id = parse_uuid("userId", &user_id)?;
    if !state.store.delete_user(user_id).await? {
        return Err(ApiError::not_found("User"));
    }
    info!(user_id = %user_id, deleted_by = %caller.0.user_id, "User deleted");
    Ok(Json(json!({ "success": true, "message": "User deleted successfully" })))
}
