// models/src/medical/doctor.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub specialization: Option<String>,
    pub license_number: Option<String>,
    pub hospital_affiliation: Option<String>,
    pub years_of_experience: Option<u32>,
    pub created_at: DateTime<Utc>,
}

impl DoctorProfile {
    pub fn new(user_id: Uuid) -> Self {
        DoctorProfile {
            id: Uuid::new_v4(),
            user_id,
            specialization: None,
            license_number: None,
            hospital_affiliation: None,
            years_of_experience: None,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl AdminProfile {
    pub fn new(user_id: Uuid) -> Self {
        AdminProfile { id: Uuid::new_v4(), user_id, created_at: Utc::now() }
    }
}
