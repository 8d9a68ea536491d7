// models/src/medical/communication.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Ended,
}

impl FromStr for SessionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SessionStatus::Active),
            "ended" => Ok(SessionStatus::Ended),
            _ => Err(ValidationError::InvalidEnumValue {
                field: "session status".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommSession {
    pub id: Uuid,
    pub session_type: String,
    pub created_by: Uuid,
    pub status: SessionStatus,
    pub emergency_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub ended_by: Option<Uuid>,
}

impl CommSession {
    /// Marks the session ended. Ending is terminal: an already ended session
    /// is left as is and `false` is returned.
    pub fn end(&mut self, by: Uuid, at: DateTime<Utc>) -> bool {
        if self.status == SessionStatus::Ended {
            return false;
        }
        self.status = SessionStatus::Ended;
        self.ended_at = Some(at);
        self.ended_by = Some(by);
        true
    }
}

/// Membership of a user in a session; unique per `(session_id, user_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionParticipant {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub status: ParticipantStatus,
    pub joined_at: DateTime<Utc>,
    pub left_at: Option<DateTime<Utc>>,
}

impl SessionParticipant {
    pub fn joined(session_id: Uuid, user_id: Uuid) -> Self {
        SessionParticipant {
            session_id,
            user_id,
            status: ParticipantStatus::Active,
            joined_at: Utc::now(),
            left_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ending_a_session_is_terminal() {
        let creator = Uuid::new_v4();
        let mut session = CommSession {
            id: Uuid::new_v4(),
            session_type: "video".to_string(),
            created_by: creator,
            status: SessionStatus::Active,
            emergency_id: None,
            created_at: Utc::now(),
            ended_at: None,
            ended_by: None,
        };
        assert!(session.end(creator, Utc::now()));
        let first_end = session.ended_at;
        assert!(!session.end(Uuid::new_v4(), Utc::now()));
        assert_eq!(session.ended_at, first_end);
        assert_eq!(session.ended_by, Some(creator));
    }
}
