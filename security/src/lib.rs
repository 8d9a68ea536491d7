// security/src/lib.rs
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2, PasswordHash, PasswordVerifier,
};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use models::medical::{Role, User};

pub mod comms;
pub mod middleware;
pub mod roles;

pub use comms::{CommsToken, CommsTokenIssuer};
pub use middleware::{authenticate_header, CallerIdentity};
pub use roles::{require_role, RoleGate};

/// Claims for the access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (user id)
    pub email: String,
    pub role: Role,
    pub exp: u64, // Expiration time
    pub iat: u64, // Issued at
}

/// Custom authentication errors.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthError {
    UserExists,
    InvalidCredentials,
    MissingToken,
    TokenExpired,
    InvalidToken,
    Forbidden(String),
    InternalError(String),
    JwtError(String),
    PasswordHashError(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AuthError::UserExists => write!(f, "User with this email already exists"),
            AuthError::InvalidCredentials => write!(f, "Invalid email or password"),
            AuthError::MissingToken => write!(f, "No token, authorization denied"),
            AuthError::TokenExpired => write!(f, "Token expired"),
            AuthError::InvalidToken => write!(f, "Invalid token"),
            AuthError::Forbidden(msg) => write!(f, "{}", msg),
            AuthError::InternalError(msg) => write!(f, "Internal server error: {}", msg),
            AuthError::JwtError(msg) => write!(f, "JWT error: {}", msg),
            AuthError::PasswordHashError(msg) => write!(f, "Password hashing error: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

/// Hashes a password using Argon2.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::PasswordHashError(format!("Failed to hash password with Argon2: {}", e)))
}

/// Verifies a password against an Argon2 hash. A mismatch is `Ok(false)`;
/// only a malformed stored hash is an error.
pub fn verify_password(password: &str, hashed_password: &str) -> Result<bool, AuthError> {
    let password_hash = PasswordHash::new(hashed_password)
        .map_err(|e| AuthError::PasswordHashError(format!("Failed to parse Argon2 password hash: {}", e)))?;
    match Argon2::default().verify_password(password.as_bytes(), &password_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::PasswordHashError(format!("Failed to verify Argon2 password: {}", e))),
    }
}

fn now_secs() -> Result<u64, AuthError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| AuthError::JwtError(format!("System time error: {}", e)))
}

/// Issues and validates HS256 access tokens with a configured secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: u64,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TokenIssuer").field("ttl_secs", &self.ttl_secs).finish()
    }
}

impl TokenIssuer {
    pub fn new(secret: &[u8], ttl_secs: u64) -> Self {
        TokenIssuer {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl_secs,
        }
    }

    /// Generates a token for `user`.
    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        let now = now_secs()?;
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
            exp: now + self.ttl_secs,
            iat: now,
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::JwtError(format!("Failed to encode JWT: {}", e)))
    }

    /// Decodes and validates a token, distinguishing expiry from other
    /// failures.
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })
    }

    /// Validates a token and resolves the caller it was issued to.
    pub fn caller(&self, token: &str) -> Result<CallerIdentity, AuthError> {
        let claims = self.validate(token)?;
        let user_id = Uuid::from_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;
        Ok(CallerIdentity { user_id, email: claims.email, role: claims.role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            email: "jane@example.com".to_string(),
            name: "Jane".to_string(),
            phone: None,
            password_hash: String::new(),
            role,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn should_verify_hashed_password() {
        let hash = hash_password("supersecret").unwrap();
        assert!(verify_password("supersecret", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn should_reject_malformed_hash() {
        assert!(matches!(
            verify_password("secret", "not-a-hash"),
            Err(AuthError::PasswordHashError(_))
        ));
    }

    #[test]
    fn issued_token_resolves_caller() {
        let issuer = TokenIssuer::new(b"test-secret", 3600);
        let u = user(Role::Doctor);
        let token = issuer.issue(&u).unwrap();
        let caller = issuer.caller(&token).unwrap();
        assert_eq!(caller.user_id, u.id);
        assert_eq!(caller.role, Role::Doctor);
        assert_eq!(caller.email, u.email);
    }

    #[test]
    fn token_signed_with_other_secret_is_invalid() {
        let token = TokenIssuer::new(b"one", 3600).issue(&user(Role::Patient)).unwrap();
        let err = TokenIssuer::new(b"two", 3600).validate(&token).unwrap_err();
        assert_eq!(err, AuthError::InvalidToken);
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let issuer = TokenIssuer::new(b"secret", 3600);
        let now = now_secs().unwrap();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            email: "old@example.com".to_string(),
            role: Role::Patient,
            exp: now - 120,
            iat: now - 3720,
        };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"secret")).unwrap();
        assert_eq!(issuer.validate(&token).unwrap_err(), AuthError::TokenExpired);
    }
}
