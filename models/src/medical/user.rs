// models/src/medical/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::role::Role;

// --- DTO for New User Registration ---
// Holds the plaintext password only until it is hashed by the security crate.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub password: String,
    pub role: Role,
}

// --- Stored User Struct ---
// Contains the password hash, never the plaintext password.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a new `User` from a registration DTO and an already computed
    /// password hash. The email is stored lowercased.
    pub fn from_new_user(new_user: NewUser, password_hash: String) -> Self {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: new_user.email.to_lowercase(),
            name: new_user.name,
            phone: new_user.phone,
            password_hash,
            role: new_user.role,
            created_at: now,
            updated_at: now,
        }
    }
}
