// rest_api/src/extractors.rs
use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::Json;

use security::{authenticate_header, CallerIdentity, RoleGate};
use storage::RecordStore;
use tracing::warn;

use crate::errors::ApiError;
use crate::state::AppState;

/// The authenticated caller. Rejects with 401 before the handler runs.
#[derive(Debug, Clone)]
pub struct Caller(pub CallerIdentity);

impl Caller {
    /// 403 unless the caller's role passes `gate`.
    pub fn require(&self, gate: RoleGate) -> Result<(), ApiError> {
        Ok(gate.check(&self.0)?)
    }

    /// 401 when the account behind the token has been deleted.
    pub async fn ensure_active(&self, store: &dyn RecordStore) -> Result<(), ApiError> {
        if store.user_by_id(self.0.user_id).await?.is_some() {
            return Ok(());
        }
        warn!(user_id = %self.0.user_id, "Token presented for a deleted account");
        Err(ApiError::Unauthorized("Invalid token, user not found".to_string()))
    }

    /// Role gate, then the account check. A rejected role never reaches the store.
    pub async fn authorize(&self, gate: RoleGate, store: &dyn RecordStore) -> Result<(), ApiError> {
        self.require(gate)?;
        self.ensure_active(store).await
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts.headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
        let identity = authenticate_header(header, &state.tokens)?;
        Ok(Caller(identity))
    }
}

/// `Json<T>` whose rejection renders as a 400 `{ "error": ... }` body.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(ApiError::Validation(rejection.body_text())),
        }
    }
}
