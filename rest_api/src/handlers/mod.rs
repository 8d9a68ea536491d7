// rest_api/src/handlers/mod.rs
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use models::medical::{PatientProfile, User};
use models::ValidationError;
use storage::RecordStore;

use crate::errors::{ApiError, ApiResult};
use crate::extractors::Caller;

pub mod admin;
pub mod alerts;
pub mod auth;
pub mod comms;
pub mod doctor;
pub mod emergency;
pub mod health_status;
pub mod patient;
pub mod vitals;

/// Handler for `GET /api/health`.
pub async fn health_check_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now(),
    }))
}

pub(crate) fn user_json(user: &User) -> Value {
    json!({
        "id": user.id,
        "email": user.email,
        "name": user.name,
        "phone": user.phone,
        "role": user.role,
        "createdAt": user.created_at,
    })
}

/// Parses an optional `limit` query parameter into `1..=max`.
pub(crate) fn parse_limit(raw: Option<&str>, default: usize, max: usize) -> ApiResult<usize> {
    let Some(raw) = raw else { return Ok(default) };
    match raw.trim().parse::<usize>() {
        Ok(n) if (1..=max).contains(&n) => Ok(n),
        _ => Err(ValidationError::OutOfRange("limit".to_string()).into()),
    }
}

/// The caller's own patient profile, or 404.
pub(crate) async fn own_patient(store: &dyn RecordStore, caller: &Caller) -> ApiResult<PatientProfile> {
    store
        .patient_by_user(caller.0.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Patient"))
}

/// The display name of a user, if the row still exists.
pub(crate) async fn user_name(store: &dyn RecordStore, user_id: Uuid) -> ApiResult<Option<String>> {
    Ok(store.user_by_id(user_id).await?.map(|u| u.name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_defaults_and_bounds() {
        assert_eq!(parse_limit(None, 10, 100).unwrap(), 10);
        assert_eq!(parse_limit(Some("25"), 10, 100).unwrap(), 25);
        assert!(parse_limit(Some("0"), 10, 100).is_err());
        assert!(parse_limit(Some("101"), 10, 100).is_err());
        assert!(parse_limit(Some("ten"), 10, 100).is_err());
    }
}
