// models/src/medical/emergency.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::vitals::VitalSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmergencyStatus {
    Active,
    Cancelled,
    Resolved,
}

impl EmergencyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmergencyStatus::Active => "active",
            EmergencyStatus::Cancelled => "cancelled",
            EmergencyStatus::Resolved => "resolved",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    Patient,
    QrCode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Emergency {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub location: Location,
    pub status: EmergencyStatus,
    pub triggered_at: DateTime<Utc>,
    pub triggered_by: TriggerSource,
    pub notes: String,
    #[serde(default)]
    pub current_vitals: Vec<VitalSnapshot>,
    pub assigned_hospital_id: String,
    pub assigned_ambulance_id: String,
    pub estimated_arrival: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
}

impl Emergency {
    pub fn is_active(&self) -> bool {
        self.status == EmergencyStatus::Active
    }

    /// Applies the one permitted transition, active to cancelled. Returns
    /// `false` and leaves the record untouched for any other state.
    pub fn cancel(&mut self, reason: String, at: DateTime<Utc>) -> bool {
        if !self.is_active() {
            return false;
        }
        self.status = EmergencyStatus::Cancelled;
        self.cancelled_at = Some(at);
        self.cancellation_reason = Some(reason);
        true
    }
}
