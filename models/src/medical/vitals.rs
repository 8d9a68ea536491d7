// models/src/medical/vitals.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalType {
    HeartRate,
    BloodPressure,
    Temperature,
    OxygenLevel,
}

impl VitalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VitalType::HeartRate => "heart_rate",
            VitalType::BloodPressure => "blood_pressure",
            VitalType::Temperature => "temperature",
            VitalType::OxygenLevel => "oxygen_level",
        }
    }

    /// Display color used by the dashboard.
    pub fn color(&self) -> &'static str {
        match self {
            VitalType::HeartRate => "#ff4d4d",
            VitalType::BloodPressure => "#007bff",
            VitalType::OxygenLevel => "#28a745",
            VitalType::Temperature => "#666",
        }
    }
}

impl fmt::Display for VitalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VitalType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "heart_rate" => Ok(VitalType::HeartRate),
            "blood_pressure" => Ok(VitalType::BloodPressure),
            "temperature" => Ok(VitalType::Temperature),
            "oxygen_level" => Ok(VitalType::OxygenLevel),
            _ => Err(ValidationError::InvalidEnumValue {
                field: "vital type".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// A reading value. Most vitals are numeric; blood pressure arrives as
/// `systolic/diastolic` text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VitalValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for VitalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VitalValue::Number(n) => write!(f, "{}", n),
            VitalValue::Text(t) => f.write_str(t),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    #[default]
    Stable,
    Increasing,
    Decreasing,
}

impl FromStr for Trend {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stable" => Ok(Trend::Stable),
            "increasing" => Ok(Trend::Increasing),
            "decreasing" => Ok(Trend::Decreasing),
            _ => Err(ValidationError::InvalidEnumValue {
                field: "trend".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// A stored vital reading. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalReading {
    pub id: Uuid,
    pub patient_id: Uuid,
    #[serde(rename = "type")]
    pub kind: VitalType,
    pub value: VitalValue,
    pub unit: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub trend: Trend,
}

/// A point-in-time vital copied onto an emergency record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalSnapshot {
    #[serde(rename = "type")]
    pub kind: VitalType,
    pub value: VitalValue,
    pub unit: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&VitalReading> for VitalSnapshot {
    fn from(reading: &VitalReading) -> Self {
        VitalSnapshot {
            kind: reading.kind,
            value: reading.value.clone(),
            unit: reading.unit.clone(),
            timestamp: reading.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_decode_numeric_and_text_values() {
        let n: VitalValue = serde_json::from_str("72").unwrap();
        let t: VitalValue = serde_json::from_str("\"120/80\"").unwrap();
        assert_eq!(n, VitalValue::Number(72.0));
        assert_eq!(t, VitalValue::Text("120/80".to_string()));
    }

    #[test]
    fn reading_uses_type_key() {
        let reading = VitalReading {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            kind: VitalType::OxygenLevel,
            value: VitalValue::Number(98.0),
            unit: "%".to_string(),
            timestamp: Utc::now(),
            trend: Trend::default(),
        };
        let json = serde_json::to_value(&reading).unwrap();
        assert_eq!(json["type"], "oxygen_level");
        assert_eq!(json["trend"], "stable");
        assert!(json.get("patientId").is_some());
    }
}
