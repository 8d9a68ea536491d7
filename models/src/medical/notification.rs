// models/src/medical/notification.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientType {
    EmergencyContact,
    Ambulance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Pending,
    Sent,
    Failed,
}

/// A persisted intent-to-notify. This service only ever writes `Pending`
/// rows; delivery happens elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    pub recipient_type: RecipientType,
    pub recipient_id: String,
    pub title: String,
    pub message: String,
    pub status: NotificationStatus,
    pub data: Value,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn pending(
        kind: &str,
        recipient_type: RecipientType,
        recipient_id: String,
        title: &str,
        message: String,
        data: Value,
    ) -> Self {
        Notification {
            id: Uuid::new_v4(),
            kind: kind.to_string(),
            recipient_type,
            recipient_id,
            title: title.to_string(),
            message,
            status: NotificationStatus::Pending,
            data,
            created_at: Utc::now(),
        }
    }
}
