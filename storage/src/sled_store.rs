// storage/src/sled_store.rs
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sled::{Batch, Db, IVec, Tree};
use tracing::{debug, info, warn};
use uuid::Uuid;

use models::medical::{
    AdminProfile, Alert, Ambulance, CommSession, DoctorNote, DoctorProfile, Emergency, Hospital,
    MedicalRecord, Notification, PatientProfile, SessionParticipant, SessionStatus, User,
    VitalReading,
};
use models::validation::DateRange;

use crate::errors::{StorageError, StorageResult};
use crate::keys::{pair_key, scoped_bounds, scoped_key, trailing_uuid, uuid_from_value};
use crate::{AlertsQuery, RecordStore, RecordsQuery, VitalsQuery};

/// Prefix accepted in front of a sled path in `DATABASE_URL`.
pub const SLED_URL_SCHEME: &str = "sled://";

#[derive(Debug, Clone, Copy)]
enum Table {
    Users,
    UsersByEmail,
    Patients,
    PatientsByUser,
    Doctors,
    DoctorsByUser,
    Admins,
    AdminsByUser,
    Vitals,
    Alerts,
    MedicalRecords,
    DoctorNotes,
    Emergencies,
    EmergenciesByPatient,
    Hospitals,
    Ambulances,
    Notifications,
    Sessions,
    Participants,
    ParticipantsByUser,
}

impl Table {
    const ALL: [Table; 20] = [
        Table::Users,
        Table::UsersByEmail,
        Table::Patients,
        Table::PatientsByUser,
        Table::Doctors,
        Table::DoctorsByUser,
        Table::Admins,
        Table::AdminsByUser,
        Table::Vitals,
        Table::Alerts,
        Table::MedicalRecords,
        Table::DoctorNotes,
        Table::Emergencies,
        Table::EmergenciesByPatient,
        Table::Hospitals,
        Table::Ambulances,
        Table::Notifications,
        Table::Sessions,
        Table::Participants,
        Table::ParticipantsByUser,
    ];

    fn name(self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::UsersByEmail => "users_by_email",
            Table::Patients => "patients",
            Table::PatientsByUser => "patients_by_user",
            Table::Doctors => "doctors",
            Table::DoctorsByUser => "doctors_by_user",
            Table::Admins => "admins",
            Table::AdminsByUser => "admins_by_user",
            Table::Vitals => "vitals",
            Table::Alerts => "alerts",
            Table::MedicalRecords => "medical_records",
            Table::DoctorNotes => "doctor_notes",
            Table::Emergencies => "emergencies",
            Table::EmergenciesByPatient => "emergencies_by_patient",
            Table::Hospitals => "hospitals",
            Table::Ambulances => "ambulances",
            Table::Notifications => "notifications",
            Table::Sessions => "communication_sessions",
            Table::Participants => "session_participants",
            Table::ParticipantsByUser => "participants_by_user",
        }
    }
}

/// Sled-backed implementation of `RecordStore`. One tree per table plus the
/// secondary index trees listed in `Table`.
pub struct SledRecordStore {
    db: Db,
    trees: Vec<Tree>,
    operations: AtomicU64,
}

impl SledRecordStore {
    /// Opens (or creates) the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let db = sled::open(path.as_ref())?;
        info!("Opened record store at {:?}", path.as_ref());
        Self::from_db(db)
    }

    /// Opens the database named by a `DATABASE_URL` value, with or without
    /// the `sled://` prefix.
    pub fn open_url(url: &str) -> StorageResult<Self> {
        let path = url.strip_prefix(SLED_URL_SCHEME).unwrap_or(url);
        Self::open(path)
    }

    /// A throwaway database removed when dropped.
    pub fn temporary() -> StorageResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> StorageResult<Self> {
        let trees = Table::ALL
            .iter()
            .map(|t| db.open_tree(t.name()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SledRecordStore { db, trees, operations: AtomicU64::new(0) })
    }

    /// Number of tree accesses performed so far.
    pub fn operations(&self) -> u64 {
        self.operations.load(Ordering::Relaxed)
    }

    pub async fn flush(&self) -> StorageResult<usize> {
        Ok(self.db.flush_async().await?)
    }

    fn tree(&self, table: Table) -> &Tree {
        self.operations.fetch_add(1, Ordering::Relaxed);
        &self.trees[table as usize]
    }

    fn get<T: DeserializeOwned>(&self, table: Table, key: &[u8]) -> StorageResult<Option<T>> {
        match self.tree(table).get(key)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put<T: Serialize>(&self, table: Table, key: &[u8], value: &T) -> StorageResult<()> {
        self.tree(table).insert(key, encode(value)?)?;
        Ok(())
    }

    fn exists(&self, table: Table, key: &[u8]) -> StorageResult<bool> {
        Ok(self.tree(table).contains_key(key)?)
    }

    fn require(&self, table: Table, key: &[u8], what: &str) -> StorageResult<()> {
        if self.exists(table, key)? {
            Ok(())
        } else {
            Err(StorageError::MissingReference(what.to_string()))
        }
    }

    /// Claims a unique index slot. `Conflict` when already taken.
    fn claim(&self, table: Table, key: &[u8], value: Vec<u8>, what: &str) -> StorageResult<()> {
        match self.tree(table).compare_and_swap(key, None::<&[u8]>, Some(value))? {
            Ok(()) => Ok(()),
            Err(_) => Err(StorageError::Conflict(what.to_string())),
        }
    }

    fn all<T: DeserializeOwned>(&self, table: Table) -> StorageResult<Vec<T>> {
        self.tree(table)
            .iter()
            .values()
            .map(|v| decode(&v?))
            .collect()
    }

    /// Rows of a scoped tree inside `range`, newest first.
    fn scoped<T, F>(
        &self,
        table: Table,
        scope: Uuid,
        range: &DateRange,
        limit: Option<usize>,
        mut keep: F,
    ) -> StorageResult<Vec<T>>
    where
        T: DeserializeOwned,
        F: FnMut(&T) -> bool,
    {
        let (low, high) = scoped_bounds(scope, range.start.as_ref(), range.end.as_ref());
        let mut out = Vec::new();
        for entry in self.tree(table).range(low..=high).rev() {
            let (_, value) = entry?;
            let row: T = decode(&value)?;
            if keep(&row) {
                out.push(row);
                if limit.is_some_and(|n| out.len() >= n) {
                    break;
                }
            }
        }
        Ok(out)
    }

    fn profile_id(&self, index: Table, user_id: Uuid) -> StorageResult<Option<Uuid>> {
        match self.tree(index).get(user_id.as_bytes())? {
            Some(id) => Ok(Some(uuid_from_value(&id)?)),
            None => Ok(None),
        }
    }

    /// Deletes every row of a scoped tree under `scope`.
    fn purge_scope(&self, table: Table, scope: Uuid) -> StorageResult<usize> {
        let tree = self.tree(table);
        let mut batch = Batch::default();
        let mut count = 0;
        for entry in tree.scan_prefix(scope.as_bytes()) {
            let (key, _) = entry?;
            batch.remove(key);
            count += 1;
        }
        tree.apply_batch(batch)?;
        Ok(count)
    }

    /// Deletes every row of `table` whose decoded value matches `doomed`.
    fn purge_where<T, F>(&self, table: Table, doomed: F) -> StorageResult<usize>
    where
        T: DeserializeOwned,
        F: Fn(&T) -> bool,
    {
        let tree = self.tree(table);
        let mut batch = Batch::default();
        let mut count = 0;
        for entry in tree.iter() {
            let (key, value) = entry?;
            if doomed(&decode::<T>(&value)?) {
                batch.remove(key);
                count += 1;
            }
        }
        tree.apply_batch(batch)?;
        Ok(count)
    }

    /// Drops the user from every session along with the reverse index.
    fn purge_participation(&self, user_id: Uuid) -> StorageResult<usize> {
        let index = self.tree(Table::ParticipantsByUser);
        let mut rows = Batch::default();
        let mut entries = Batch::default();
        let mut count = 0;
        for entry in index.scan_prefix(user_id.as_bytes()) {
            let (key, _) = entry?;
            let session_id = trailing_uuid(&key)?;
            rows.remove(pair_key(session_id, user_id));
            entries.remove(key);
            count += 1;
        }
        self.tree(Table::Participants).apply_batch(rows)?;
        index.apply_batch(entries)?;
        Ok(count)
    }
}

fn encode<T: Serialize>(value: &T) -> StorageResult<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

fn decode<T: DeserializeOwned>(bytes: &IVec) -> StorageResult<T> {
    Ok(serde_json::from_slice(bytes)?)
}

fn newest_first<T, K: Ord>(mut rows: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
    rows
}

#[async_trait]
impl RecordStore for SledRecordStore {
    // --- Users ---

    async fn insert_user(&self, user: &User) -> StorageResult<()> {
        let email = user.email.to_lowercase();
        self.claim(
            Table::UsersByEmail,
            email.as_bytes(),
            user.id.as_bytes().to_vec(),
            &format!("user with email {}", email),
        )?;
        if let Err(e) = self.put(Table::Users, user.id.as_bytes(), user) {
            self.tree(Table::UsersByEmail).remove(email.as_bytes())?;
            return Err(e);
        }
        debug!(user_id = %user.id, "Inserted user");
        Ok(())
    }

    async fn user_by_id(&self, id: Uuid) -> StorageResult<Option<User>> {
        self.get(Table::Users, id.as_bytes())
    }

    async fn user_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        let email = email.to_lowercase();
        match self.tree(Table::UsersByEmail).get(email.as_bytes())? {
            Some(id) => self.get(Table::Users, &id),
            None => Ok(None),
        }
    }

    async fn update_user(&self, user: &User) -> StorageResult<()> {
        if !self.exists(Table::Users, user.id.as_bytes())? {
            return Err(StorageError::NotFound(format!("user {}", user.id)));
        }
        self.put(Table::Users, user.id.as_bytes(), user)
    }

    async fn list_users(&self) -> StorageResult<Vec<User>> {
        Ok(newest_first(self.all(Table::Users)?, |u: &User| u.created_at))
    }

    async fn delete_user(&self, id: Uuid) -> StorageResult<bool> {
        let Some(user) = self.get::<User>(Table::Users, id.as_bytes())? else {
            return Ok(false);
        };

        // Emergencies stay behind as dispatch history.
        if let Some(patient_id) = self.profile_id(Table::PatientsByUser, id)? {
            let vitals = self.purge_scope(Table::Vitals, patient_id)?;
            let records = self.purge_scope(Table::MedicalRecords, patient_id)?;
            let notes = self.purge_where(Table::DoctorNotes, |n: &DoctorNote| n.patient_id == patient_id)?;
            self.tree(Table::Patients).remove(patient_id.as_bytes())?;
            self.tree(Table::PatientsByUser).remove(id.as_bytes())?;
            debug!(patient_id = %patient_id, vitals, records, notes, "Removed patient profile");
        }
        if let Some(doctor_id) = self.profile_id(Table::DoctorsByUser, id)? {
            let notes = self.purge_scope(Table::DoctorNotes, doctor_id)?;
            debug!(doctor_id = %doctor_id, notes, "Removed doctor profile");
            self.tree(Table::Doctors).remove(doctor_id.as_bytes())?;
            self.tree(Table::DoctorsByUser).remove(id.as_bytes())?;
        }
        if let Some(admin_id) = self.profile_id(Table::AdminsByUser, id)? {
            self.tree(Table::Admins).remove(admin_id.as_bytes())?;
            self.tree(Table::AdminsByUser).remove(id.as_bytes())?;
        }

        let alerts = self.purge_scope(Table::Alerts, id)?;
        let sessions = self.purge_participation(id)?;

        self.tree(Table::UsersByEmail).remove(user.email.to_lowercase().as_bytes())?;
        self.tree(Table::Users).remove(id.as_bytes())?;
        info!(user_id = %id, alerts, sessions, "Deleted user");
        Ok(true)
    }

    // --- Profiles ---

    async fn insert_patient(&self, patient: &PatientProfile) -> StorageResult<()> {
        self.require(Table::Users, patient.user_id.as_bytes(), "user")?;
        self.claim(
            Table::PatientsByUser,
            patient.user_id.as_bytes(),
            patient.id.as_bytes().to_vec(),
            &format!("patient profile for user {}", patient.user_id),
        )?;
        self.put(Table::Patients, patient.id.as_bytes(), patient)
    }

    async fn update_patient(&self, patient: &PatientProfile) -> StorageResult<()> {
        if !self.exists(Table::Patients, patient.id.as_bytes())? {
            return Err(StorageError::NotFound(format!("patient {}", patient.id)));
        }
        self.put(Table::Patients, patient.id.as_bytes(), patient)
    }

    async fn patient_by_id(&self, id: Uuid) -> StorageResult<Option<PatientProfile>> {
        self.get(Table::Patients, id.as_bytes())
    }

    async fn patient_by_user(&self, user_id: Uuid) -> StorageResult<Option<PatientProfile>> {
        match self.profile_id(Table::PatientsByUser, user_id)? {
            Some(id) => self.get(Table::Patients, id.as_bytes()),
            None => Ok(None),
        }
    }

    async fn list_patients(&self) -> StorageResult<Vec<PatientProfile>> {
        Ok(newest_first(self.all(Table::Patients)?, |p: &PatientProfile| p.created_at))
    }

    async fn insert_doctor(&self, doctor: &DoctorProfile) -> StorageResult<()> {
        self.require(Table::Users, doctor.user_id.as_bytes(), "user")?;
        self.claim(
            Table::DoctorsByUser,
            doctor.user_id.as_bytes(),
            doctor.id.as_bytes().to_vec(),
            &format!("doctor profile for user {}", doctor.user_id),
        )?;
        self.put(Table::Doctors, doctor.id.as_bytes(), doctor)
    }

    async fn update_doctor(&self, doctor: &DoctorProfile) -> StorageResult<()> {
        if !self.exists(Table::Doctors, doctor.id.as_bytes())? {
            return Err(StorageError::NotFound(format!("doctor {}", doctor.id)));
        }
        self.put(Table::Doctors, doctor.id.as_bytes(), doctor)
    }

    async fn doctor_by_id(&self, id: Uuid) -> StorageResult<Option<DoctorProfile>> {
        self.get(Table::Doctors, id.as_bytes())
    }

    async fn doctor_by_user(&self, user_id: Uuid) -> StorageResult<Option<DoctorProfile>> {
        match self.profile_id(Table::DoctorsByUser, user_id)? {
            Some(id) => self.get(Table::Doctors, id.as_bytes()),
            None => Ok(None),
        }
    }

    async fn list_doctors(&self) -> StorageResult<Vec<DoctorProfile>> {
        Ok(newest_first(self.all(Table::Doctors)?, |d: &DoctorProfile| d.created_at))
    }

    async fn insert_admin(&self, admin: &AdminProfile) -> StorageResult<()> {
        self.require(Table::Users, admin.user_id.as_bytes(), "user")?;
        self.claim(
            Table::AdminsByUser,
            admin.user_id.as_bytes(),
            admin.id.as_bytes().to_vec(),
            &format!("admin profile for user {}", admin.user_id),
        )?;
        self.put(Table::Admins, admin.id.as_bytes(), admin)
    }

    // --- Vitals and alerts ---

    async fn insert_vital(&self, reading: &VitalReading) -> StorageResult<()> {
        self.require(Table::Patients, reading.patient_id.as_bytes(), "patient")?;
        let key = scoped_key(reading.patient_id, &reading.timestamp, reading.id);
        self.put(Table::Vitals, &key, reading)
    }

    async fn query_vitals(&self, query: &VitalsQuery) -> StorageResult<Vec<VitalReading>> {
        self.scoped(Table::Vitals, query.patient_id, &query.range, query.limit, |v: &VitalReading| {
            query.kind.is_none_or(|k| v.kind == k)
        })
    }

    async fn insert_alert(&self, alert: &Alert) -> StorageResult<()> {
        self.require(Table::Users, alert.user_id.as_bytes(), "user")?;
        let key = scoped_key(alert.user_id, &alert.created_at, alert.id);
        self.put(Table::Alerts, &key, alert)
    }

    async fn query_alerts(&self, query: &AlertsQuery) -> StorageResult<Vec<Alert>> {
        self.scoped(Table::Alerts, query.user_id, &query.range, query.limit, |a: &Alert| {
            query.kind.is_none_or(|k| a.kind == k)
        })
    }

    // --- Medical records and notes ---

    async fn insert_medical_record(&self, record: &MedicalRecord) -> StorageResult<()> {
        self.require(Table::Patients, record.patient_id.as_bytes(), "patient")?;
        let key = scoped_key(record.patient_id, &record.date, record.id);
        self.put(Table::MedicalRecords, &key, record)
    }

    async fn query_medical_records(&self, query: &RecordsQuery) -> StorageResult<Vec<MedicalRecord>> {
        match query.patient_id {
            Some(patient_id) => {
                self.scoped(Table::MedicalRecords, patient_id, &query.range, query.limit, |_: &MedicalRecord| true)
            }
            None => {
                let mut rows: Vec<MedicalRecord> = self
                    .all::<MedicalRecord>(Table::MedicalRecords)?
                    .into_iter()
                    .filter(|r| query.range.contains(&r.date))
                    .collect();
                rows = newest_first(rows, |r: &MedicalRecord| r.date);
                if let Some(n) = query.limit {
                    rows.truncate(n);
                }
                Ok(rows)
            }
        }
    }

    async fn insert_note(&self, note: &DoctorNote) -> StorageResult<()> {
        self.require(Table::Doctors, note.doctor_id.as_bytes(), "doctor")?;
        self.require(Table::Patients, note.patient_id.as_bytes(), "patient")?;
        let key = scoped_key(note.doctor_id, &note.created_at, note.id);
        self.put(Table::DoctorNotes, &key, note)
    }

    async fn notes_by_doctor(&self, doctor_id: Uuid, patient_id: Option<Uuid>) -> StorageResult<Vec<DoctorNote>> {
        self.scoped(Table::DoctorNotes, doctor_id, &DateRange::default(), None, |n: &DoctorNote| {
            patient_id.is_none_or(|p| n.patient_id == p)
        })
    }

    // --- Emergencies ---

    async fn insert_emergency(&self, emergency: &Emergency) -> StorageResult<()> {
        self.require(Table::Patients, emergency.patient_id.as_bytes(), "patient")?;
        self.put(Table::Emergencies, emergency.id.as_bytes(), emergency)?;
        let index = scoped_key(emergency.patient_id, &emergency.triggered_at, emergency.id);
        self.tree(Table::EmergenciesByPatient).insert(index, Vec::new())?;
        info!(emergency_id = %emergency.id, patient_id = %emergency.patient_id, "Recorded emergency");
        Ok(())
    }

    async fn emergency_by_id(&self, id: Uuid) -> StorageResult<Option<Emergency>> {
        self.get(Table::Emergencies, id.as_bytes())
    }

    async fn emergencies_for_patient(&self, patient_id: Uuid, only: Option<Uuid>) -> StorageResult<Vec<Emergency>> {
        let mut out = Vec::new();
        for entry in self.tree(Table::EmergenciesByPatient).scan_prefix(patient_id.as_bytes()).rev() {
            let (key, _) = entry?;
            let id = trailing_uuid(&key)?;
            if only.is_some_and(|o| o != id) {
                continue;
            }
            match self.get::<Emergency>(Table::Emergencies, id.as_bytes())? {
                Some(e) => out.push(e),
                None => warn!(emergency_id = %id, "Dangling emergency index entry"),
            }
        }
        Ok(out)
    }

    async fn cancel_emergency(
        &self,
        id: Uuid,
        patient_id: Uuid,
        reason: &str,
        at: DateTime<Utc>,
    ) -> StorageResult<Option<Emergency>> {
        let tree = self.tree(Table::Emergencies);
        loop {
            let Some(current) = tree.get(id.as_bytes())? else {
                return Ok(None);
            };
            let mut emergency: Emergency = decode(&current)?;
            if emergency.patient_id != patient_id || !emergency.cancel(reason.to_string(), at) {
                return Ok(None);
            }
            match tree.compare_and_swap(id.as_bytes(), Some(&current), Some(encode(&emergency)?))? {
                Ok(()) => return Ok(Some(emergency)),
                // Row changed underneath us; re-read and re-check status.
                Err(_) => continue,
            }
        }
    }

    // --- Responders ---

    async fn upsert_hospital(&self, hospital: &Hospital) -> StorageResult<()> {
        self.put(Table::Hospitals, hospital.id.as_bytes(), hospital)
    }

    async fn upsert_ambulance(&self, ambulance: &Ambulance) -> StorageResult<()> {
        self.put(Table::Ambulances, ambulance.id.as_bytes(), ambulance)
    }

    async fn hospital_by_id(&self, id: &str) -> StorageResult<Option<Hospital>> {
        self.get(Table::Hospitals, id.as_bytes())
    }

    async fn ambulance_by_id(&self, id: &str) -> StorageResult<Option<Ambulance>> {
        self.get(Table::Ambulances, id.as_bytes())
    }

    // --- Notifications ---

    async fn insert_notifications(&self, notifications: &[Notification]) -> StorageResult<usize> {
        let mut batch = Batch::default();
        for n in notifications {
            batch.insert(n.id.as_bytes().to_vec(), encode(n)?);
        }
        self.tree(Table::Notifications).apply_batch(batch)?;
        Ok(notifications.len())
    }

    async fn list_notifications(&self) -> StorageResult<Vec<Notification>> {
        Ok(newest_first(self.all(Table::Notifications)?, |n: &Notification| n.created_at))
    }

    // --- Communication sessions ---

    async fn insert_session(&self, session: &CommSession) -> StorageResult<()> {
        self.require(Table::Users, session.created_by.as_bytes(), "user")?;
        self.put(Table::Sessions, session.id.as_bytes(), session)
    }

    async fn session_by_id(&self, id: Uuid) -> StorageResult<Option<CommSession>> {
        self.get(Table::Sessions, id.as_bytes())
    }

    async fn end_session(&self, id: Uuid, by: Uuid, at: DateTime<Utc>) -> StorageResult<Option<CommSession>> {
        let tree = self.tree(Table::Sessions);
        loop {
            let Some(current) = tree.get(id.as_bytes())? else {
                return Ok(None);
            };
            let mut session: CommSession = decode(&current)?;
            if !session.end(by, at) {
                return Ok(None);
            }
            match tree.compare_and_swap(id.as_bytes(), Some(&current), Some(encode(&session)?))? {
                Ok(()) => return Ok(Some(session)),
                Err(_) => continue,
            }
        }
    }

    async fn insert_participants(&self, participants: &[SessionParticipant]) -> StorageResult<()> {
        for p in participants {
            self.require(Table::Sessions, p.session_id.as_bytes(), "session")?;
            self.require(Table::Users, p.user_id.as_bytes(), "user")?;
            self.claim(
                Table::Participants,
                &pair_key(p.session_id, p.user_id),
                encode(p)?,
                &format!("user {} already in session {}", p.user_id, p.session_id),
            )?;
            self.tree(Table::ParticipantsByUser)
                .insert(pair_key(p.user_id, p.session_id), Vec::new())?;
        }
        Ok(())
    }

    async fn participant(&self, session_id: Uuid, user_id: Uuid) -> StorageResult<Option<SessionParticipant>> {
        self.get(Table::Participants, &pair_key(session_id, user_id))
    }

    async fn update_participant(&self, participant: &SessionParticipant) -> StorageResult<()> {
        let key = pair_key(participant.session_id, participant.user_id);
        if !self.exists(Table::Participants, &key)? {
            return Err(StorageError::NotFound(format!(
                "participant {} in session {}",
                participant.user_id, participant.session_id
            )));
        }
        self.put(Table::Participants, &key, participant)
    }

    async fn participants(&self, session_id: Uuid) -> StorageResult<Vec<SessionParticipant>> {
        self.tree(Table::Participants)
            .scan_prefix(session_id.as_bytes())
            .values()
            .map(|v| decode(&v?))
            .collect()
    }

    async fn sessions_for_user(&self, user_id: Uuid, status: SessionStatus) -> StorageResult<Vec<CommSession>> {
        let mut sessions = Vec::new();
        for entry in self.tree(Table::ParticipantsByUser).scan_prefix(user_id.as_bytes()) {
            let (key, _) = entry?;
            let session_id = trailing_uuid(&key)?;
            if let Some(session) = self.get::<CommSession>(Table::Sessions, session_id.as_bytes())? {
                if session.status == status {
                    sessions.push(session);
                }
            }
        }
        Ok(newest_first(sessions, |s: &CommSession| s.created_at))
    }
}
