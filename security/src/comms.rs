// security/src/comms.rs
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::AuthError;

const COMMS_TOKEN_TTL_MINUTES: i64 = 60;

#[derive(Debug, Serialize, Deserialize)]
struct CommsClaims {
    sid: String,
    sub: String,
    iss: String,
    exp: i64,
    iat: i64,
}

/// A client-side token for joining a communication session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommsToken {
    pub token: String,
    pub endpoint: String,
    pub expires_on: DateTime<Utc>,
}

/// Issues session tokens for the communication service, keyed from its
/// connection string (`endpoint=<url>;accesskey=<key>`).
#[derive(Clone)]
pub struct CommsTokenIssuer {
    endpoint: String,
    access_key: Vec<u8>,
}

impl fmt::Debug for CommsTokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("CommsTokenIssuer").field("endpoint", &self.endpoint).finish()
    }
}

impl CommsTokenIssuer {
    /// Parses a connection string. Returns `None` unless both the endpoint and
    /// the access key are present.
    pub fn from_connection_string(conn: &str) -> Option<Self> {
        let mut endpoint = None;
        let mut access_key = None;
        for part in conn.split(';') {
            let Some((key, value)) = part.split_once('=') else { continue };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.trim().to_lowercase().as_str() {
                "endpoint" => endpoint = Some(value.to_string()),
                "accesskey" => access_key = Some(value.as_bytes().to_vec()),
                _ => {}
            }
        }
        Some(CommsTokenIssuer { endpoint: endpoint?, access_key: access_key? })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn issue(&self, session_id: Uuid, user_id: Uuid) -> Result<CommsToken, AuthError> {
        let now = Utc::now();
        let expires_on = now + Duration::minutes(COMMS_TOKEN_TTL_MINUTES);
        let claims = CommsClaims {
            sid: session_id.to_string(),
            sub: user_id.to_string(),
            iss: self.endpoint.clone(),
            exp: expires_on.timestamp(),
            iat: now.timestamp(),
        };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(&self.access_key))
            .map_err(|e| AuthError::JwtError(format!("Failed to encode session token: {}", e)))?;
        Ok(CommsToken { token, endpoint: self.endpoint.clone(), expires_on })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_connection_string() {
        let issuer = CommsTokenIssuer::from_connection_string(
            "endpoint=https://comms.example.net/;AccessKey=c2VjcmV0",
        )
        .unwrap();
        assert_eq!(issuer.endpoint(), "https://comms.example.net/");
    }

    #[test]
    fn should_reject_incomplete_connection_string() {
        assert!(CommsTokenIssuer::from_connection_string("endpoint=https://x/").is_none());
        assert!(CommsTokenIssuer::from_connection_string("accesskey=abc").is_none());
        assert!(CommsTokenIssuer::from_connection_string("").is_none());
        assert!(CommsTokenIssuer::from_connection_string("endpoint=;accesskey=abc").is_none());
    }

    #[test]
    fn issued_token_carries_session_claims() {
        let issuer = CommsTokenIssuer::from_connection_string("endpoint=https://x/;accesskey=k").unwrap();
        let session = Uuid::new_v4();
        let token = issuer.issue(session, Uuid::new_v4()).unwrap();
        let mut validation = jsonwebtoken::Validation::default();
        validation.set_issuer(&["https://x/"]);
        let decoded = jsonwebtoken::decode::<CommsClaims>(
            &token.token,
            &jsonwebtoken::DecodingKey::from_secret(b"k"),
            &validation,
        )
        .unwrap();
        assert_eq!(decoded.claims.sid, session.to_string());
        assert!(token.expires_on > Utc::now());
    }
}
