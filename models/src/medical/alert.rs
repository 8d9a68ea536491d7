// models/src/medical/alert.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    Anomaly,
    Emergency,
    System,
}

impl FromStr for AlertType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "anomaly" => Ok(AlertType::Anomaly),
            "emergency" => Ok(AlertType::Emergency),
            "system" => Ok(AlertType::System),
            _ => Err(ValidationError::InvalidEnumValue {
                field: "alert type".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: AlertType,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}
