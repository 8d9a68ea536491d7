// predictor/src/types.rs
use serde::{Deserialize, Serialize};
use serde_json::Value;

use models::medical::{MedicalHistoryEntry, VitalSnapshot};

pub const FALLBACK_HOSPITAL_ID: &str = "fallback-hospital";
pub const FALLBACK_HOSPITAL_NAME: &str = "General Hospital";
pub const FALLBACK_AMBULANCE_ID: &str = "fallback-ambulance";
pub const FALLBACK_ARRIVAL: &str = "15 minutes";

/// Responders matched to an emergency location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedResources {
    pub hospital_id: String,
    pub hospital_name: String,
    pub ambulance_id: String,
    pub estimated_arrival_time: String,
}

impl AssignedResources {
    pub fn fallback() -> Self {
        AssignedResources {
            hospital_id: FALLBACK_HOSPITAL_ID.to_string(),
            hospital_name: FALLBACK_HOSPITAL_NAME.to_string(),
            ambulance_id: FALLBACK_AMBULANCE_ID.to_string(),
            estimated_arrival_time: FALLBACK_ARRIVAL.to_string(),
        }
    }

    /// Whether the assignment names both responders.
    pub fn is_complete(&self) -> bool {
        !self.hospital_id.is_empty() && !self.ambulance_id.is_empty()
    }
}

/// An out-of-range reading flagged by the anomaly model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentRecord {
    #[serde(rename = "type")]
    pub record_type: Option<String>,
    pub description: Option<String>,
    pub date: String,
}

/// Input to the risk model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthData {
    pub vitals: Vec<VitalSnapshot>,
    pub medical_history: Vec<MedicalHistoryEntry>,
    pub allergies: Vec<String>,
    pub recent_records: Vec<RecentRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthVerdict {
    pub status: String,
    pub risk_level: String,
    #[serde(default)]
    pub recommendations: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl HealthVerdict {
    pub fn unknown() -> Self {
        HealthVerdict {
            status: "Unknown".to_string(),
            risk_level: "Unknown".to_string(),
            recommendations: Vec::new(),
            summary: Some("Failed to predict health risks".to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ResourceRequest {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct AnomalyRequest<'a> {
    pub vitals: &'a [models::medical::VitalReading],
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnomalyResponse {
    #[serde(default)]
    pub anomalies: Vec<Anomaly>,
}
