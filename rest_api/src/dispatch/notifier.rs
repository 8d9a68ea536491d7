// rest_api/src/dispatch/notifier.rs
//
// Notification rows are written with status `pending`; delivery happens
// elsewhere. Every function here swallows storage failures and reports how
// many rows it actually wrote.

use serde_json::json;
use tracing::{debug, error};

use models::medical::{Emergency, Notification, PatientProfile, RecipientType};
use storage::RecordStore;

async fn write(store: &dyn RecordStore, rows: Vec<Notification>, purpose: &str) -> usize {
    if rows.is_empty() {
        debug!(purpose, "No recipients to notify");
        return 0;
    }
    match store.insert_notifications(&rows).await {
        Ok(written) => written,
        Err(e) => {
            error!(purpose, error = %e, "Failed to write notifications");
            0
        }
    }
}

fn location_json(emergency: &Emergency) -> serde_json::Value {
    json!({
        "latitude": emergency.location.latitude,
        "longitude": emergency.location.longitude,
    })
}

/// One `emergency` row per contact, as a single batch.
pub async fn notify_contacts(
    store: &dyn RecordStore,
    emergency: &Emergency,
    patient: &PatientProfile,
    patient_name: &str,
) -> usize {
    let rows = patient
        .emergency_contacts
        .iter()
        .map(|contact| {
            Notification::pending(
                "emergency",
                RecipientType::EmergencyContact,
                contact.phone.clone(),
                "Emergency Alert",
                format!("{} has triggered an emergency alert.", patient_name),
                json!({
                    "patientId": patient.id,
                    "patientName": patient_name,
                    "emergencyId": emergency.id,
                    "contactName": contact.name,
                    "contactEmail": contact.email,
                    "location": location_json(emergency),
                }),
            )
        })
        .collect();
    write(store, rows, "emergency_contacts").await
}

/// The dispatch row for the assigned ambulance, carrying the clinical context
/// a crew needs en route.
pub async fn notify_ambulance(
    store: &dyn RecordStore,
    emergency: &Emergency,
    patient: &PatientProfile,
    patient_name: &str,
) -> usize {
    if emergency.assigned_ambulance_id.is_empty() {
        return 0;
    }
    let row = Notification::pending(
        "emergency_dispatch",
        RecipientType::Ambulance,
        emergency.assigned_ambulance_id.clone(),
        "Emergency Dispatch",
        format!("New emergency dispatch for patient {}", patient_name),
        json!({
            "patientId": patient.id,
            "patientName": patient_name,
            "emergencyId": emergency.id,
            "medicalHistory": patient.medical_history,
            "allergies": patient.allergies,
            "currentVitals": emergency.current_vitals,
            "location": location_json(emergency),
        }),
    );
    write(store, vec![row], "ambulance").await
}

pub async fn notify_cancellation(store: &dyn RecordStore, emergency: &Emergency, patient_name: &str) -> usize {
    if emergency.assigned_ambulance_id.is_empty() {
        return 0;
    }
    let row = Notification::pending(
        "emergency_cancelled",
        RecipientType::Ambulance,
        emergency.assigned_ambulance_id.clone(),
        "Emergency Cancelled",
        format!("Emergency for patient {} has been cancelled", patient_name),
        json!({
            "emergencyId": emergency.id,
            "patientId": emergency.patient_id,
            "reason": emergency.cancellation_reason,
            "cancelledAt": emergency.cancelled_at,
        }),
    );
    write(store, vec![row], "cancellation").await
}
