// models/src/medical/mod.rs

pub mod alert;
pub mod communication;
pub mod doctor;
pub mod doctor_note;
pub mod emergency;
pub mod medical_record;
pub mod notification;
pub mod patient;
pub mod responder;
pub mod role;
pub mod user;
pub mod vitals;

pub use alert::{Alert, AlertType};
pub use communication::{CommSession, ParticipantStatus, SessionParticipant, SessionStatus};
pub use doctor::{AdminProfile, DoctorProfile};
pub use doctor_note::DoctorNote;
pub use emergency::{Emergency, EmergencyStatus, Location, TriggerSource};
pub use medical_record::MedicalRecord;
pub use notification::{Notification, NotificationStatus, RecipientType};
pub use patient::{EmergencyContact, MedicalHistoryEntry, PatientProfile};
pub use responder::{Ambulance, Hospital};
pub use role::Role;
pub use user::{NewUser, User};
pub use vitals::{Trend, VitalReading, VitalSnapshot, VitalType, VitalValue};
