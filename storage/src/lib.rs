// storage/src/lib.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use models::medical::{
    AdminProfile, Alert, AlertType, Ambulance, CommSession, DoctorNote, DoctorProfile, Emergency,
    Hospital, MedicalRecord, Notification, PatientProfile, SessionParticipant, SessionStatus, User,
    VitalReading, VitalType,
};
use models::validation::DateRange;

pub mod errors;
mod keys;
pub mod sled_store;

pub use errors::{StorageError, StorageResult};
pub use sled_store::SledRecordStore;

/// Filter for vital readings of one patient.
#[derive(Debug, Clone, Default)]
pub struct VitalsQuery {
    pub patient_id: Uuid,
    pub kind: Option<VitalType>,
    pub range: DateRange,
    pub limit: Option<usize>,
}

impl VitalsQuery {
    pub fn recent(patient_id: Uuid, limit: usize) -> Self {
        VitalsQuery { patient_id, limit: Some(limit), ..Default::default() }
    }
}

/// Filter for the alerts of one user.
#[derive(Debug, Clone, Default)]
pub struct AlertsQuery {
    pub user_id: Uuid,
    pub kind: Option<AlertType>,
    pub range: DateRange,
    pub limit: Option<usize>,
}

/// Filter for medical records. `patient_id: None` scans every patient.
#[derive(Debug, Clone, Default)]
pub struct RecordsQuery {
    pub patient_id: Option<Uuid>,
    pub range: DateRange,
    pub limit: Option<usize>,
}

/// The record store gateway. Every handler reaches persisted state through
/// this trait; listing operations return rows most-recent-first.
///
/// Inserts referencing another row (`user_id`, `patient_id`, `doctor_id`,
/// `session_id`) fail with `StorageError::MissingReference` when the
/// referenced row is absent.
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    /// Inserts a user. Fails with `Conflict` when the email is taken.
    async fn insert_user(&self, user: &User) -> StorageResult<()>;
    async fn user_by_id(&self, id: Uuid) -> StorageResult<Option<User>>;
    async fn user_by_email(&self, email: &str) -> StorageResult<Option<User>>;
    /// Overwrites a user row. The email is not re-indexed.
    async fn update_user(&self, user: &User) -> StorageResult<()>;
    async fn list_users(&self) -> StorageResult<Vec<User>>;
    /// Deletes a user together with its profile rows, alerts and session
    /// memberships. Patients also lose their vitals, records and the notes
    /// written about them; doctors lose the notes they wrote. Emergencies are
    /// kept. Returns `false` when no such user exists.
    async fn delete_user(&self, id: Uuid) -> StorageResult<bool>;

    async fn insert_patient(&self, patient: &PatientProfile) -> StorageResult<()>;
    async fn update_patient(&self, patient: &PatientProfile) -> StorageResult<()>;
    async fn patient_by_id(&self, id: Uuid) -> StorageResult<Option<PatientProfile>>;
    async fn patient_by_user(&self, user_id: Uuid) -> StorageResult<Option<PatientProfile>>;
    async fn list_patients(&self) -> StorageResult<Vec<PatientProfile>>;

    async fn insert_doctor(&self, doctor: &DoctorProfile) -> StorageResult<()>;
    async fn update_doctor(&self, doctor: &DoctorProfile) -> StorageResult<()>;
    async fn doctor_by_id(&self, id: Uuid) -> StorageResult<Option<DoctorProfile>>;
    async fn doctor_by_user(&self, user_id: Uuid) -> StorageResult<Option<DoctorProfile>>;
    async fn list_doctors(&self) -> StorageResult<Vec<DoctorProfile>>;

    async fn insert_admin(&self, admin: &AdminProfile) -> StorageResult<()>;

    async fn insert_vital(&self, reading: &VitalReading) -> StorageResult<()>;
    async fn query_vitals(&self, query: &VitalsQuery) -> StorageResult<Vec<VitalReading>>;

    async fn insert_alert(&self, alert: &Alert) -> StorageResult<()>;
    async fn query_alerts(&self, query: &AlertsQuery) -> StorageResult<Vec<Alert>>;

    async fn insert_medical_record(&self, record: &MedicalRecord) -> StorageResult<()>;
    async fn query_medical_records(&self, query: &RecordsQuery) -> StorageResult<Vec<MedicalRecord>>;

    async fn insert_note(&self, note: &DoctorNote) -> StorageResult<()>;
    async fn notes_by_doctor(&self, doctor_id: Uuid, patient_id: Option<Uuid>) -> StorageResult<Vec<DoctorNote>>;

    async fn insert_emergency(&self, emergency: &Emergency) -> StorageResult<()>;
    async fn emergency_by_id(&self, id: Uuid) -> StorageResult<Option<Emergency>>;
    async fn emergencies_for_patient(&self, patient_id: Uuid, only: Option<Uuid>) -> StorageResult<Vec<Emergency>>;
    /// Conditionally moves an emergency owned by `patient_id` from active to
    /// cancelled. Returns `None`, writing nothing, when the emergency does not
    /// exist, belongs to someone else, or is no longer active.
    async fn cancel_emergency(
        &self,
        id: Uuid,
        patient_id: Uuid,
        reason: &str,
        at: DateTime<Utc>,
    ) -> StorageResult<Option<Emergency>>;

    async fn upsert_hospital(&self, hospital: &Hospital) -> StorageResult<()>;
    async fn upsert_ambulance(&self, ambulance: &Ambulance) -> StorageResult<()>;
    async fn hospital_by_id(&self, id: &str) -> StorageResult<Option<Hospital>>;
    async fn ambulance_by_id(&self, id: &str) -> StorageResult<Option<Ambulance>>;

    /// Writes a batch of notifications, returning how many were written.
    async fn insert_notifications(&self, notifications: &[Notification]) -> StorageResult<usize>;
    async fn list_notifications(&self) -> StorageResult<Vec<Notification>>;

    async fn insert_session(&self, session: &CommSession) -> StorageResult<()>;
    async fn session_by_id(&self, id: Uuid) -> StorageResult<Option<CommSession>>;
    /// Conditionally ends an active session. `None` when absent or already
    /// ended.
    async fn end_session(&self, id: Uuid, by: Uuid, at: DateTime<Utc>) -> StorageResult<Option<CommSession>>;
    /// Inserts participant rows. Fails with `Conflict` on the first
    /// `(session_id, user_id)` pair that already exists.
    async fn insert_participants(&self, participants: &[SessionParticipant]) -> StorageResult<()>;
    async fn participant(&self, session_id: Uuid, user_id: Uuid) -> StorageResult<Option<SessionParticipant>>;
    async fn update_participant(&self, participant: &SessionParticipant) -> StorageResult<()>;
    async fn participants(&self, session_id: Uuid) -> StorageResult<Vec<SessionParticipant>>;
    async fn sessions_for_user(&self, user_id: Uuid, status: SessionStatus) -> StorageResult<Vec<CommSession>>;
}
