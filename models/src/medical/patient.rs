// models/src/medical/patient.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub relationship: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalHistoryEntry {
    pub condition: String,
    #[serde(default)]
    pub diagnosed_at: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Patient profile, one per patient `User`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub medical_history: Vec<MedicalHistoryEntry>,
    #[serde(default)]
    pub allergies: BTreeSet<String>,
    #[serde(default)]
    pub emergency_contacts: Vec<EmergencyContact>,
    pub blood_type: Option<String>,
    pub height: Option<String>,
    pub weight: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PatientProfile {
    pub fn new(user_id: Uuid) -> Self {
        PatientProfile {
            id: Uuid::new_v4(),
            user_id,
            medical_history: Vec::new(),
            allergies: BTreeSet::new(),
            emergency_contacts: Vec::new(),
            blood_type: None,
            height: None,
            weight: None,
            created_at: Utc::now(),
        }
    }
}
