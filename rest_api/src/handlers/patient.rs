// rest_api/src/handlers/patient.rs
use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use models::medical::{EmergencyContact, MedicalRecord, PatientProfile, Role, User};
use models::validation::DateRange;
use security::RoleGate;
use storage::{RecordStore, RecordsQuery};

use super::{own_patient, user_name};
use crate::errors::{ApiError, ApiResult};
use crate::extractors::Caller;
use crate::state::AppState;

const UNKNOWN_PROVIDER: &str = "Unknown Provider";

// --- Response shaping ---

pub(crate) fn patient_json(user: &User, patient: &PatientProfile) -> Value {
    json!({
        "id": patient.id,
        "userId": patient.user_id,
        "name": user.name,
        "email": user.email,
        "role": user.role,
        "phone": user.phone.as_deref().unwrap_or("Not Provided"),
        "dob": "1990-01-01",
        "gender": "Not Specified",
        "bloodType": patient.blood_type.as_deref().unwrap_or("O+"),
        "height": patient.height.as_deref().unwrap_or("170 cm"),
        "weight": patient.weight.as_deref().unwrap_or("70 kg"),
        "allergies": patient.allergies,
        "medicalHistory": patient.medical_history,
        "emergencyContacts": patient.emergency_contacts,
        "createdAt": patient.created_at,
    })
}

fn contact_json(id: String, contact: &EmergencyContact) -> Value {
    let or = |v: &str, default: &'static str| if v.trim().is_empty() { default.to_string() } else { v.to_string() };
    json!({
        "id": id,
        "name": or(&contact.name, "Unknown Contact"),
        "relationship": contact.relationship.as_deref().unwrap_or("Not Specified"),
        "phone": or(&contact.phone, "Not Provided"),
        "email": contact.email.as_deref().unwrap_or("Not Provided"),
        "isPrimary": contact.is_primary,
    })
}

fn record_json(record: &MedicalRecord, provider: &str) -> Value {
    json!({
        "id": record.id,
        "title": record.display_title(),
        "date": record.date,
        "provider": provider,
        "type": record.record_type.as_deref().unwrap_or("Other"),
        "description": record.description.as_deref().unwrap_or("No description provided"),
        "fileType": record.file_type.as_deref().unwrap_or("pdf"),
        "fileSize": record.file_size.as_deref().unwrap_or("1.2 MB"),
    })
}

/// Resolves doctor ids to names, remembering answers across records.
struct ProviderNames<'a> {
    store: &'a dyn RecordStore,
    cache: HashMap<Uuid, String>,
}

impl<'a> ProviderNames<'a> {
    fn new(store: &'a dyn RecordStore) -> Self {
        ProviderNames { store, cache: HashMap::new() }
    }

    async fn name(&mut self, doctor_id: Option<Uuid>) -> ApiResult<String> {
        let Some(doctor_id) = doctor_id else {
            return Ok(UNKNOWN_PROVIDER.to_string());
        };
        if let Some(name) = self.cache.get(&doctor_id) {
            return Ok(name.clone());
        }
        let name = match self.store.doctor_by_id(doctor_id).await? {
            Some(doctor) => user_name(self.store, doctor.user_id).await?,
            None => None,
        }
        .unwrap_or_else(|| UNKNOWN_PROVIDER.to_string());
        self.cache.insert(doctor_id, name.clone());
        Ok(name)
    }
}

// --- Handlers ---

/// Handler for `GET /api/patient/profile`.
pub async fn get_patient_profile_handler(State(state): State<AppState>, caller: Caller) -> ApiResult<Json<Value>> {
    caller.authorize(RoleGate::PATIENT, state.store.as_ref()).await?;
    let store = state.store.as_ref();
    let patient = own_patient(store, &caller).await?;
    let user = store
        .user_by_id(caller.0.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;
    info!(user_id = %user.id, "Patient profile fetched");
    let mut body = patient_json(&user, &patient);
    body["success"] = json!(true);
    Ok(Json(body))
}

/// Handler for `GET /api/patient/emergency-contacts`.
///
/// Admins see every patient's contacts tagged with the patient's name;
/// doctors get an empty list.
pub async fn get_emergency_contacts_handler(State(state): State<AppState>, caller: Caller) -> ApiResult<Json<Value>> {
    caller.ensure_active(state.store.as_ref()).await?;
    let store = state.store.as_ref();
    match caller.0.role {
        Role::Admin => {
            let mut contacts = Vec::new();
            for patient in store.list_patients().await? {
                let patient_name = user_name(store, patient.user_id).await?;
                for (index, contact) in patient.emergency_contacts.iter().enumerate() {
                    let mut entry = contact_json(format!("contact-{}-{}", patient.user_id, index), contact);
                    entry["patientName"] = json!(patient_name);
                    contacts.push(entry);
                }
            }
            info!(user_id = %caller.0.user_id, count = contacts.len(), "Emergency contacts fetched for admin");
            Ok(Json(json!(contacts)))
        }
        Role::Patient => {
            let patient = own_patient(store, &caller).await?;
            let contacts: Vec<Value> = patient
                .emergency_contacts
                .iter()
                .enumerate()
                .map(|(index, c)| contact_json(format!("contact-{}", index), c))
                .collect();
            Ok(Json(json!(contacts)))
        }
        Role::Doctor => Ok(Json(json!([]))),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordsParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Handler for `GET /api/patient/medical-records`.
pub async fn get_medical_records_handler(
    State(state): State<AppState>,
    caller: Caller,
    Query(params): Query<RecordsParams>,
) -> ApiResult<Json<Value>> {
    caller.ensure_active(state.store.as_ref()).await?;
    let range = DateRange::from_params(params.start_date.as_deref(), params.end_date.as_deref())?;
    let store = state.store.as_ref();

    let (query, with_patient_name) = match caller.0.role {
        Role::Admin => (RecordsQuery { patient_id: None, range, limit: None }, true),
        Role::Patient => {
            let patient = own_patient(store, &caller).await?;
            (RecordsQuery { patient_id: Some(patient.id), range, limit: None }, false)
        }
        Role::Doctor => return Ok(Json(json!([]))),
    };

    let records = store.query_medical_records(&query).await?;
    let mut providers = ProviderNames::new(store);
    let mut patient_names: HashMap<Uuid, Option<String>> = HashMap::new();
    let mut out = Vec::with_capacity(records.len());
    for record in &records {
        let provider = providers.name(record.doctor_id).await?;
        let mut entry = record_json(record, &provider);
        if with_patient_name {
            if !patient_names.contains_key(&record.patient_id) {
                let name = match store.patient_by_id(record.patient_id).await? {
                    Some(p) => user_name(store, p.user_id).await?,
                    None => None,
                };
                patient_names.insert(record.patient_id, name);
            }
            entry["patientName"] = json!(patient_names.get(&record.patient_id).cloned().flatten());
        }
        out.push(entry);
    }
    info!(user_id = %caller.0.user_id, count = out.len(), "Medical records fetched");
    Ok(Json(json!(out)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn record_defaults_fill_missing_fields() {
        let record = MedicalRecord {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            doctor_id: None,
            record_type: Some("Lab".to_string()),
            title: None,
            description: None,
            date: Utc.with_ymd_and_hms(2024, 3, 2, 9, 0, 0).unwrap(),
            file_type: None,
            file_size: None,
        };
        let view = record_json(&record, UNKNOWN_PROVIDER);
        assert_eq!(view["title"], "Lab - 2024-03-02");
        assert_eq!(view["fileType"], "pdf");
        assert_eq!(view["fileSize"], "1.2 MB");
        assert_eq!(view["description"], "No description provided");
    }

    #[test]
    fn contact_defaults_fill_blanks() {
        let contact = EmergencyContact {
            name: String::new(),
            phone: "555".to_string(),
            relationship: None,
            is_primary: true,
            email: None,
        };
        let view = contact_json("contact-0".to_string(), &contact);
        assert_eq!(view["name"], "Unknown Contact");
        assert_eq!(view["relationship"], "Not Specified");
        assert_eq!(view["email"], "Not Provided");
        assert_eq!(view["isPrimary"], true);
    }
}
