// rest_api/src/dispatch/workflow.rs
use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use models::medical::{
    Emergency, EmergencyStatus, Location, PatientProfile, TriggerSource, VitalSnapshot,
};
use predictor::{AssignedResources, Predictor};
use storage::{RecordStore, VitalsQuery};

use super::notifier;
use crate::errors::{ApiError, ApiResult};

pub const QR_TRIGGER_NOTE: &str = "Triggered via QR code - patient may be unconscious";
pub const DEFAULT_CANCELLATION_REASON: &str = "Cancelled by patient";
const UNKNOWN_PATIENT_NAME: &str = "Unknown patient";

/// How the triggering patient is identified.
#[derive(Debug, Clone, Copy)]
pub enum PatientRef {
    /// The authenticated caller's user id.
    User(Uuid),
    /// A patient id read from a QR code.
    Code(Uuid),
}

#[derive(Debug, Clone)]
pub struct TriggerRequest {
    pub patient: PatientRef,
    pub location: Location,
    pub notes: String,
    pub vitals: Option<Vec<VitalSnapshot>>,
}

#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub emergency: Emergency,
    pub resources: AssignedResources,
    pub patient_name: String,
    pub notifications: usize,
}

/// Runs the emergency lifecycle against the store and the predictor.
pub struct Dispatcher<'a> {
    store: &'a dyn RecordStore,
    predictor: &'a dyn Predictor,
}

impl<'a> Dispatcher<'a> {
    pub fn new(store: &'a dyn RecordStore, predictor: &'a dyn Predictor) -> Self {
        Dispatcher { store, predictor }
    }

    async fn resolve(&self, patient: PatientRef) -> ApiResult<(PatientProfile, String)> {
        let profile = match patient {
            PatientRef::User(user_id) => self
                .store
                .patient_by_user(user_id)
                .await?
                .ok_or_else(|| ApiError::not_found("Patient"))?,
            PatientRef::Code(patient_id) => self
                .store
                .patient_by_id(patient_id)
                .await?
                .ok_or_else(|| ApiError::NotFound("Invalid patient code".to_string()))?,
        };
        let name = match self.store.user_by_id(profile.user_id).await {
            Ok(Some(user)) => user.name,
            Ok(None) => UNKNOWN_PATIENT_NAME.to_string(),
            Err(e) => {
                warn!(patient_id = %profile.id, error = %e, "Could not load patient user row");
                UNKNOWN_PATIENT_NAME.to_string()
            }
        };
        Ok((profile, name))
    }

    /// The supplied snapshot, else the most recent stored reading.
    async fn snapshot(&self, patient_id: Uuid, supplied: Option<Vec<VitalSnapshot>>) -> Vec<VitalSnapshot> {
        if let Some(vitals) = supplied.filter(|v| !v.is_empty()) {
            return vitals;
        }
        match self.store.query_vitals(&VitalsQuery::recent(patient_id, 1)).await {
            Ok(latest) => latest.iter().map(VitalSnapshot::from).collect(),
            Err(e) => {
                warn!(patient_id = %patient_id, error = %e, "Could not load latest vitals");
                Vec::new()
            }
        }
    }

    pub async fn trigger(&self, request: TriggerRequest) -> ApiResult<DispatchOutcome> {
        let (patient, patient_name) = self.resolve(request.patient).await?;
        let current_vitals = self.snapshot(patient.id, request.vitals).await;
        let resources = self.predictor.nearest_resources(request.location).await;

        let (triggered_by, notes) = match request.patient {
            PatientRef::User(_) => (TriggerSource::Patient, request.notes),
            PatientRef::Code(_) => (TriggerSource::QrCode, QR_TRIGGER_NOTE.to_string()),
        };

        let emergency = Emergency {
            id: Uuid::new_v4(),
            patient_id: patient.id,
            location: request.location,
            status: EmergencyStatus::Active,
            triggered_at: Utc::now(),
            triggered_by,
            notes,
            current_vitals,
            assigned_hospital_id: resources.hospital_id.clone(),
            assigned_ambulance_id: resources.ambulance_id.clone(),
            estimated_arrival: Some(resources.estimated_arrival_time.clone()),
            cancelled_at: None,
            cancellation_reason: None,
        };

        if let Err(e) = self.store.insert_emergency(&emergency).await {
            error!(patient_id = %patient.id, error = %e, "Failed to record emergency");
            return Err(ApiError::Internal("Failed to trigger emergency".to_string()));
        }

        let notifications = notifier::notify_contacts(self.store, &emergency, &patient, &patient_name).await
            + notifier::notify_ambulance(self.store, &emergency, &patient, &patient_name).await;

        info!(
            emergency_id = %emergency.id,
            patient_id = %patient.id,
            hospital_id = %resources.hospital_id,
            ambulance_id = %resources.ambulance_id,
            notifications,
            "Emergency dispatched"
        );
        Ok(DispatchOutcome { emergency, resources, patient_name, notifications })
    }

    /// Moves the caller's emergency from active to cancelled.
    pub async fn cancel(&self, user_id: Uuid, emergency_id: Uuid, reason: Option<String>) -> ApiResult<Emergency> {
        let (patient, patient_name) = self.resolve(PatientRef::User(user_id)).await?;
        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_CANCELLATION_REASON.to_string());

        let emergency = self
            .store
            .cancel_emergency(emergency_id, patient.id, &reason, Utc::now())
            .await?
            .ok_or_else(|| ApiError::NotFound("Active emergency not found".to_string()))?;

        notifier::notify_cancellation(self.store, &emergency, &patient_name).await;
        info!(emergency_id = %emergency.id, patient_id = %patient.id, "Emergency cancelled");
        Ok(emergency)
    }
}
