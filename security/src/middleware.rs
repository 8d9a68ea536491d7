// security/src/middleware.rs
use serde::Serialize;
use uuid::Uuid;

use models::medical::Role;

use crate::{AuthError, TokenIssuer};

/// The authenticated caller attached to each request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallerIdentity {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

/// Extracts the bearer credential from an `Authorization` header value and
/// validates it. The identity comes entirely from the signed claims; no
/// store lookup happens here.
pub fn authenticate_header(header: Option<&str>, issuer: &TokenIssuer) -> Result<CallerIdentity, AuthError> {
    let token = header
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingToken)?;

    issuer.caller(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use models::medical::User;

    #[test]
    fn should_require_bearer_scheme() {
        let issuer = TokenIssuer::new(b"secret", 60);
        assert_eq!(authenticate_header(None, &issuer).unwrap_err(), AuthError::MissingToken);
        assert_eq!(authenticate_header(Some("Basic abc"), &issuer).unwrap_err(), AuthError::MissingToken);
        assert_eq!(authenticate_header(Some("Bearer "), &issuer).unwrap_err(), AuthError::MissingToken);
        assert_eq!(authenticate_header(Some("Bearer garbage"), &issuer).unwrap_err(), AuthError::InvalidToken);
    }

    #[test]
    fn should_authenticate_valid_header() {
        let issuer = TokenIssuer::new(b"secret", 60);
        let user = User {
            id: Uuid::new_v4(),
            email: "a@b.co".to_string(),
            name: "A".to_string(),
            phone: None,
            password_hash: String::new(),
            role: Role::Admin,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let header = format!("Bearer {}", issuer.issue(&user).unwrap());
        let caller = authenticate_header(Some(&header), &issuer).unwrap();
        assert_eq!(caller.user_id, user.id);
        assert_eq!(caller.role, Role::Admin);
    }
}
