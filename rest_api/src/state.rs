// rest_api/src/state.rs
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use predictor::Predictor;
use security::{CommsTokenIssuer, TokenIssuer};
use storage::RecordStore;

use crate::config::RespondersFile;

/// Shared state for the Axum application. Every external collaborator is a
/// trait object so tests can substitute fakes.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub predictor: Arc<dyn Predictor>,
    pub tokens: Arc<TokenIssuer>,
    pub comms: Option<Arc<CommsTokenIssuer>>,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>, predictor: Arc<dyn Predictor>, tokens: TokenIssuer) -> Self {
        AppState { store, predictor, tokens: Arc::new(tokens), comms: None }
    }

    pub fn with_comms(mut self, comms: Option<CommsTokenIssuer>) -> Self {
        self.comms = comms.map(Arc::new);
        self
    }
}

/// Upserts every hospital and ambulance in `responders`.
pub async fn seed_responders(store: &dyn RecordStore, responders: &RespondersFile) -> Result<usize> {
    for hospital in &responders.hospitals {
        store
            .upsert_hospital(hospital)
            .await
            .with_context(|| format!("Failed to seed hospital {}", hospital.id))?;
    }
    for ambulance in &responders.ambulances {
        store
            .upsert_ambulance(ambulance)
            .await
            .with_context(|| format!("Failed to seed ambulance {}", ambulance.id))?;
    }
    let total = responders.hospitals.len() + responders.ambulances.len();
    info!(hospitals = responders.hospitals.len(), ambulances = responders.ambulances.len(), "Seeded responders");
    Ok(total)
}
