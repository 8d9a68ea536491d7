// rest_api/src/handlers/comms.rs
use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use models::medical::{CommSession, ParticipantStatus, SessionParticipant, SessionStatus};
use models::validation::{check_max_len, parse_optional_uuid, parse_uuid, require, NAME_MAX_LEN};
use models::ValidationError;
use security::CommsTokenIssuer;

use crate::errors::{ApiError, ApiResult};
use crate::extractors::{ApiJson, Caller};
use crate::state::AppState;

fn comms_issuer(state: &AppState) -> ApiResult<Arc<CommsTokenIssuer>> {
    state
        .comms
        .clone()
        .ok_or_else(|| ApiError::NotImplemented("Communication service not configured".to_string()))
}

fn session_token_json(session: &CommSession, issuer: &CommsTokenIssuer, user_id: Uuid) -> ApiResult<Value> {
    let token = issuer.issue(session.id, user_id)?;
    Ok(json!({
        "id": session.id,
        "type": session.session_type,
        "token": token,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub participant_ids: Option<Vec<String>>,
    pub session_type: Option<String>,
    pub emergency_id: Option<String>,
}

/// Handler for `POST /api/comms/sessions`.
///
/// The caller is always a participant. Every named participant must exist
/// before anything is written.
pub async fn create_session_handler(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(payload): ApiJson<CreateSessionRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    caller.ensure_active(state.store.as_ref()).await?;
    let session_type = require("sessionType", payload.session_type.as_deref())?;
    check_max_len("sessionType", &session_type, NAME_MAX_LEN)?;
    let raw_ids = payload
        .participant_ids
        .ok_or_else(|| ValidationError::MissingField("participantIds".to_string()))?;
    let mut participant_ids = Vec::with_capacity(raw_ids.len() + 1);
    for raw in &raw_ids {
        let id = parse_uuid("participantIds", raw)?;
        if !participant_ids.contains(&id) {
            participant_ids.push(id);
        }
    }
    if !participant_ids.contains(&caller.0.user_id) {
        participant_ids.push(caller.0.user_id);
    }
    let emergency_id = parse_optional_uuid("emergencyId", payload.emergency_id.as_deref())?;
    let issuer = comms_issuer(&state)?;

    let store = state.store.as_ref();
    for id in &participant_ids {
        if store.user_by_id(*id).await?.is_none() {
            return Err(ApiError::NotFound(format!("Participant {} not found", id)));
        }
    }
    if let Some(id) = emergency_id {
        if store.emergency_by_id(id).await?.is_none() {
            return Err(ApiError::not_found("Emergency"));
        }
    }

    let session = CommSession {
        id: Uuid::new_v4(),
        session_type,
        created_by: caller.0.user_id,
        status: SessionStatus::Active,
        emergency_id,
        created_at: Utc::now(),
        ended_at: None,
        ended_by: None,
    };
    store.insert_session(&session).await?;
    let participants: Vec<SessionParticipant> = participant_ids
        .iter()
        .map(|user_id| SessionParticipant::joined(session.id, *user_id))
        .collect();
    store.insert_participants(&participants).await?;

    info!(session_id = %session.id, participants = participants.len(), created_by = %caller.0.user_id, "Communication session created");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "session": session_token_json(&session, &issuer, caller.0.user_id)?,
        })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct SessionsParams {
    pub status: Option<String>,
}

/// Handler for `GET /api/comms/sessions`.
pub async fn list_sessions_handler(
    State(state): State<AppState>,
    caller: Caller,
    Query(params): Query<SessionsParams>,
) -> ApiResult<Json<Value>> {
    caller.ensure_active(state.store.as_ref()).await?;
    let status = match params.status.as_deref() {
        Some(raw) => SessionStatus::from_str(raw)?,
        None => SessionStatus::Active,
    };
    let sessions = state.store.sessions_for_user(caller.0.user_id, status).await?;
    let sessions: Vec<Value> = sessions
        .iter()
        .map(|s| {
            json!({
                "id": s.id,
                "type": s.session_type,
                "createdAt": s.created_at,
                "status": s.status,
                "emergencyId": s.emergency_id,
            })
        })
        .collect();
    Ok(Json(json!({ "success": true, "sessions": sessions })))
}

/// Handler for `PUT /api/comms/sessions/:sessionId/end`.
pub async fn end_session_handler(
    State(state): State<AppState>,
    caller: Caller,
    Path(session_id): Path<String>,
) -> ApiResult<Json<Value>> {
    caller.ensure_active(state.store.as_ref()).await?;
    let session_id = parse_uuid("sessionId", &session_id)?;
    let store = state.store.as_ref();
    if store.participant(session_id, caller.0.user_id).await?.is_none() {
        return Err(ApiError::Forbidden("Not authorized to end this session".to_string()));
    }

    let now = Utc::now();
    if store.end_session(session_id, caller.0.user_id, now).await?.is_none() {
        return Err(ApiError::NotFound("Active session not found".to_string()));
    }

    // Participant rows follow the session; a failed sweep leaves the session ended.
    match store.participants(session_id).await {
        Ok(rows) => {
            for mut row in rows.into_iter().filter(|p| p.status == ParticipantStatus::Active) {
                row.status = ParticipantStatus::Inactive;
                row.left_at = Some(now);
                if let Err(e) = store.update_participant(&row).await {
                    warn!(session_id = %session_id, user_id = %row.user_id, error = %e, "Failed to deactivate participant");
                }
            }
        }
        Err(e) => warn!(session_id = %session_id, error = %e, "Failed to load session participants"),
    }

    info!(session_id = %session_id, ended_by = %caller.0.user_id, "Communication session ended");
    Ok(Json(json!({ "success": true, "message": "Communication session ended successfully" })))
}

/// Handler for `POST /api/comms/sessions/:sessionId/join`.
pub async fn join_session_handler(
    State(state): State<AppState>,
    caller: Caller,
    Path(session_id): Path<String>,
) -> ApiResult<Json<Value>> {
    caller.ensure_active(state.store.as_ref()).await?;
    let session_id = parse_uuid("sessionId", &session_id)?;
    let issuer = comms_issuer(&state)?;
    let store = state.store.as_ref();
    let session = store
        .session_by_id(session_id)
        .await?
        .filter(|s| s.status == SessionStatus::Active)
        .ok_or_else(|| ApiError::NotFound("Active session not found".to_string()))?;

    match store.participant(session_id, caller.0.user_id).await? {
        Some(mut existing) => {
            if existing.status != ParticipantStatus::Active {
                existing.status = ParticipantStatus::Active;
                existing.joined_at = Utc::now();
                existing.left_at = None;
                store.update_participant(&existing).await?;
            }
        }
        None => {
            store
                .insert_participants(&[SessionParticipant::joined(session_id, caller.0.user_id)])
                .await?;
        }
    }

    info!(session_id = %session_id, user_id = %caller.0.user_id, "Joined communication session");
    Ok(Json(json!({
        "success": true,
        "session": session_token_json(&session, &issuer, caller.0.user_id)?,
    })))
}

/// Handler for `POST /api/comms/sessions/:sessionId/leave`.
pub async fn leave_session_handler(
    State(state): State<AppState>,
    caller: Caller,
    Path(session_id): Path<String>,
) -> ApiResult<Json<Value>> {
    caller.ensure_active(state.store.as_ref()).await?;
    let session_id = parse_uuid("sessionId", &session_id)?;
    let store = state.store.as_ref();
    let mut participant = store
        .participant(session_id, caller.0.user_id)
        .await?
        .ok_or_else(|| ApiError::Forbidden("Not a participant in this session".to_string()))?;

    participant.status = ParticipantStatus::Inactive;
    participant.left_at = Some(Utc::now());
    store.update_participant(&participant).await?;
    info!(session_id = %session_id, user_id = %caller.0.user_id, "Left communication session");
    Ok(Json(json!({ "success": true, "message": "Successfully left communication session" })))
}

/// Handler for `GET /api/comms/sessions/:sessionId/participants`.
pub async fn list_participants_handler(
    State(state): State<AppState>,
    caller: Caller,
    Path(session_id): Path<String>,
) -> ApiResult<Json<Value>> {
    caller.ensure_active(state.store.as_ref()).await?;
    let session_id = parse_uuid("sessionId", &session_id)?;
    let store = state.store.as_ref();
    if store.participant(session_id, caller.0.user_id).await?.is_none() {
        return Err(ApiError::Forbidden("Not authorized to view this session".to_string()));
    }

    let mut out = Vec::new();
    for participant in store.participants(session_id).await? {
        let user = store.user_by_id(participant.user_id).await?;
        out.push(json!({
            "id": participant.user_id,
            "name": user.as_ref().map(|u| u.name.clone()),
            "email": user.as_ref().map(|u| u.email.clone()),
            "role": user.as_ref().map(|u| u.role),
            "status": participant.status,
            "joinedAt": participant.joined_at,
            "leftAt": participant.left_at,
        }));
    }
    Ok(Json(json!({ "success": true, "participants": out })))
}
