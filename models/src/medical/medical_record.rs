// models/src/medical/medical_record.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalRecord {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Option<Uuid>,
    pub record_type: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    pub file_type: Option<String>,
    pub file_size: Option<String>,
}

impl MedicalRecord {
    /// Title shown in listings; falls back to `<type> - <date>`.
    pub fn display_title(&self) -> String {
        match &self.title {
            Some(t) => t.clone(),
            None => format!(
                "{} - {}",
                self.record_type.as_deref().unwrap_or("Other"),
                self.date.format("%Y-%m-%d")
            ),
        }
    }
}
