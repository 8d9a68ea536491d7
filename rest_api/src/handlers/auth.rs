// rest_api/src/handlers/auth.rs
use std::str::FromStr;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use models::medical::{
    AdminProfile, DoctorProfile, EmergencyContact, MedicalHistoryEntry, NewUser, PatientProfile, Role, User,
};
use models::validation::{check_max_len, check_min_len, require, validate_email, NAME_MAX_LEN, PASSWORD_MIN_LEN};
use security::{hash_password, verify_password, AuthError};
use storage::{RecordStore, StorageError};

use super::doctor::doctor_json;
use super::patient::patient_json;
use super::user_json;
use crate::errors::{ApiError, ApiResult};
use crate::extractors::{ApiJson, Caller};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    #[serde(alias = "userType")]
    pub role: Option<String>,
    pub emergency_contact: Option<EmergencyContact>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// Profile fields a caller may change. The role is not among them.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub blood_type: Option<String>,
    pub height: Option<String>,
    pub weight: Option<String>,
    pub allergies: Option<Vec<String>>,
    pub medical_history: Option<Vec<MedicalHistoryEntry>>,
    pub emergency_contacts: Option<Vec<EmergencyContact>>,
    pub specialization: Option<String>,
    pub license_number: Option<String>,
    pub hospital_affiliation: Option<String>,
    pub years_of_experience: Option<u32>,
}

// Profile rows are secondary to the user row; a failure here is logged and
// the account stays usable.
async fn create_profile(store: &dyn RecordStore, user: &User, contact: Option<EmergencyContact>) {
    let result = match user.role {
        Role::Patient => {
            let mut profile = PatientProfile::new(user.id);
            profile.emergency_contacts.extend(contact);
            store.insert_patient(&profile).await
        }
        Role::Doctor => store.insert_doctor(&DoctorProfile::new(user.id)).await,
        Role::Admin => store.insert_admin(&AdminProfile::new(user.id)).await,
    };
    if let Err(e) = result {
        warn!(user_id = %user.id, role = %user.role, error = %e, "Failed to create profile row");
    }
}

/// Handler for `POST /api/auth/register`.
pub async fn register_handler(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let email = validate_email(&require("email", payload.email.as_deref())?)?;
    let password = require("password", payload.password.as_deref())?;
    check_min_len("password", &password, PASSWORD_MIN_LEN)?;
    let name = require("name", payload.name.as_deref())?;
    check_max_len("name", &name, NAME_MAX_LEN)?;
    let phone = require("phone", payload.phone.as_deref())?;
    let role = Role::from_str(&require("role", payload.role.as_deref())?)?;

    if state.store.user_by_email(&email).await?.is_some() {
        return Err(AuthError::UserExists.into());
    }

    let password_hash = hash_password(&password)?;
    let new_user = NewUser {
        email,
        name,
        phone: Some(phone),
        password,
        role,
    };
    let user = User::from_new_user(new_user, password_hash);
    match state.store.insert_user(&user).await {
        Ok(()) => {}
        Err(StorageError::Conflict(_)) => return Err(AuthError::UserExists.into()),
        Err(e) => return Err(e.into()),
    }
    create_profile(state.store.as_ref(), &user, payload.emergency_contact).await;

    let token = state.tokens.issue(&user)?;
    info!(user_id = %user.id, role = %user.role, "Registered user");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "token": token, "user": user_json(&user) })),
    ))
}

/// Handler for `POST /api/auth/login`.
pub async fn login_handler(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<Json<Value>> {
    let email = require("email", payload.email.as_deref())?;
    let password = require("password", payload.password.as_deref())?;

    let user = state
        .store
        .user_by_email(&email)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;
    if !verify_password(&password, &user.password_hash)? {
        warn!(user_id = %user.id, "Rejected login");
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = state.tokens.issue(&user)?;
    info!(user_id = %user.id, "User logged in");
    Ok(Json(json!({ "success": true, "token": token, "user": user_json(&user) })))
}

/// Handler for `POST /api/auth/reset-password`.
pub async fn reset_password_handler(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ResetPasswordRequest>,
) -> ApiResult<Json<Value>> {
    let email = require("email", payload.email.as_deref())?;
    let current = require("currentPassword", payload.current_password.as_deref())?;
    let new_password = require("newPassword", payload.new_password.as_deref())?;
    check_min_len("newPassword", &new_password, PASSWORD_MIN_LEN)?;

    let mut user = state
        .store
        .user_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;
    if !verify_password(&current, &user.password_hash)? {
        return Err(ApiError::Unauthorized("Current password is incorrect".to_string()));
    }

    user.password_hash = hash_password(&new_password)?;
    user.updated_at = Utc::now();
    state.store.update_user(&user).await?;
    info!(user_id = %user.id, "Password reset");
    Ok(Json(json!({ "success": true, "message": "Password reset successfully" })))
}

async fn profile_payload(store: &dyn RecordStore, user: &User) -> ApiResult<Value> {
    let profile = match user.role {
        Role::Patient => store
            .patient_by_user(user.id)
            .await?
            .map(|p| patient_json(user, &p)),
        Role::Doctor => store
            .doctor_by_user(user.id)
            .await?
            .map(|d| doctor_json(user, &d)),
        Role::Admin => None,
    };
    Ok(json!({
        "success": true,
        "user": user_json(user),
        "profile": profile,
    }))
}

/// Handler for `GET /api/auth/profile`.
pub async fn get_profile_handler(State(state): State<AppState>, caller: Caller) -> ApiResult<Json<Value>> {
    caller.ensure_active(state.store.as_ref()).await?;
    let user = state
        .store
        .user_by_id(caller.0.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;
    Ok(Json(profile_payload(state.store.as_ref(), &user).await?))
}

/// Handler for `PUT /api/auth/profile`.
pub async fn update_profile_handler(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(payload): ApiJson<UpdateProfileRequest>,
) -> ApiResult<Json<Value>> {
    caller.ensure_active(state.store.as_ref()).await?;
    if let Some(name) = payload.name.as_deref() {
        let name = require("name", Some(name))?;
        check_max_len("name", &name, NAME_MAX_LEN)?;
    }

    let store = state.store.as_ref();
    let mut user = store
        .user_by_id(caller.0.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    if let Some(name) = payload.name {
        user.name = name.trim().to_string();
    }
    if let Some(phone) = payload.phone {
        user.phone = Some(phone).filter(|p| !p.trim().is_empty());
    }
    user.updated_at = Utc::now();
    store.update_user(&user).await?;

    match user.role {
        Role::Patient => {
            if let Some(mut patient) = store.patient_by_user(user.id).await? {
                if payload.blood_type.is_some() {
                    patient.blood_type = payload.blood_type;
                }
                if payload.height.is_some() {
                    patient.height = payload.height;
                }
                if payload.weight.is_some() {
                    patient.weight = payload.weight;
                }
                if let Some(allergies) = payload.allergies {
                    patient.allergies = allergies.into_iter().collect();
                }
                if let Some(history) = payload.medical_history {
                    patient.medical_history = history;
                }
                if let Some(contacts) = payload.emergency_contacts {
                    patient.emergency_contacts = contacts;
                }
                store.update_patient(&patient).await?;
            }
        }
        Role::Doctor => {
            if let Some(mut doctor) = store.doctor_by_user(user.id).await? {
                if payload.specialization.is_some() {
                    doctor.specialization = payload.specialization;
                }
                if payload.license_number.is_some() {
                    doctor.license_number = payload.license_number;
                }
                if payload.hospital_affiliation.is_some() {
                    doctor.hospital_affiliation = payload.hospital_affiliation;
                }
                if payload.years_of_experience.is_some() {
                    doctor.years_of_experience = payload.years_of_experience;
                }
                store.update_doctor(&doctor).await?;
            }
        }
        Role::Admin => {}
    }

    info!(user_id = %user.id, "Updated profile");
    Ok(Json(profile_payload(store, &user).await?))
}
