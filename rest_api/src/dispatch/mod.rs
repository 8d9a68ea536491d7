// rest_api/src/dispatch/mod.rs
pub mod notifier;
pub mod workflow;

pub use workflow::{DispatchOutcome, Dispatcher, PatientRef, TriggerRequest};
